// ---------------------------------------------------------------------------
// Content Similarity -- TF-IDF over (topic, difficulty) labels
// ---------------------------------------------------------------------------
//
// Each question becomes a short label document: its topic tokens plus its
// difficulty token. Documents are weighted with smoothed TF-IDF and compared
// pairwise with cosine similarity. The resulting matrix is square,
// symmetric, and has 1.0 on the diagonal.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::config::SimilarityConfig;
use crate::cosine::{compute_magnitude, cosine_similarity_with_magnitude};
use crate::error::RecommendError;
use crate::tokenize::tokenize;
use crate::types::Question;

// ---------------------------------------------------------------------------
// SimilarityMatrix
// ---------------------------------------------------------------------------

/// Pairwise content similarity, indexed by catalog position and by id.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
	ids: Vec<String>,
	positions: HashMap<String, usize>,
	/// Row-major n x n values.
	values: Vec<f64>,
}

impl SimilarityMatrix {
	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn ids(&self) -> &[String] {
		&self.ids
	}

	pub fn position(&self, id: &str) -> Option<usize> {
		self.positions.get(id).copied()
	}

	pub fn get(&self, i: usize, j: usize) -> f64 {
		self.values[i * self.ids.len() + j]
	}

	pub fn row(&self, i: usize) -> &[f64] {
		let n = self.ids.len();
		&self.values[i * n..(i + 1) * n]
	}

	pub fn by_id(&self, a: &str, b: &str) -> Option<f64> {
		Some(self.get(self.position(a)?, self.position(b)?))
	}
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless TF-IDF similarity builder.
pub struct ContentSimilarityEngine<'a> {
	config: &'a SimilarityConfig,
}

impl<'a> ContentSimilarityEngine<'a> {
	pub fn new(config: &'a SimilarityConfig) -> Self {
		Self { config }
	}

	/// Build the pairwise similarity matrix for `catalog`.
	///
	/// Fails on an empty catalog (no vocabulary) or duplicate question ids.
	pub fn compute(&self, catalog: &[Question]) -> Result<SimilarityMatrix, RecommendError> {
		if catalog.is_empty() {
			return Err(RecommendError::EmptyCatalog);
		}
		let positions = index_catalog(catalog)?;

		let vectors = self.tfidf_vectors(catalog);
		let magnitudes: Vec<f64> = vectors.iter().map(|v| compute_magnitude(v)).collect();

		let n = catalog.len();
		let mut values = vec![0.0; n * n];
		for i in 0..n {
			values[i * n + i] = 1.0;
			for j in (i + 1)..n {
				let sim = cosine_similarity_with_magnitude(
					&vectors[i],
					&vectors[j],
					magnitudes[i],
					magnitudes[j],
				)
				.max(0.0);
				values[i * n + j] = sim;
				values[j * n + i] = sim;
			}
		}

		tracing::debug!(questions = n, "computed similarity matrix");

		Ok(SimilarityMatrix {
			ids: catalog.iter().map(|q| q.id.clone()).collect(),
			positions,
			values,
		})
	}

	/// Boosted term counts per question, keyed by vocabulary column.
	fn term_frequencies(
		&self,
		catalog: &[Question],
		vocabulary: &mut HashMap<String, usize>,
	) -> Vec<HashMap<usize, f64>> {
		catalog
			.iter()
			.map(|q| {
				let mut tf: HashMap<usize, f64> = HashMap::new();
				let sources = [
					(tokenize(&q.topic), self.config.topic_boost),
					(tokenize(q.difficulty.label()), self.config.difficulty_boost),
				];
				for (tokens, boost) in sources {
					for token in tokens {
						let next = vocabulary.len();
						let col = *vocabulary.entry(token).or_insert(next);
						*tf.entry(col).or_insert(0.0) += boost;
					}
				}
				tf
			})
			.collect()
	}

	/// Dense TF-IDF vectors with smoothed idf: ln((1 + n) / (1 + df)) + 1.
	fn tfidf_vectors(&self, catalog: &[Question]) -> Vec<Vec<f64>> {
		let mut vocabulary = HashMap::new();
		let tfs = self.term_frequencies(catalog, &mut vocabulary);

		let mut df = vec![0usize; vocabulary.len()];
		for tf in &tfs {
			for &col in tf.keys() {
				df[col] += 1;
			}
		}

		let n = catalog.len() as f64;
		let idf: Vec<f64> = df
			.iter()
			.map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
			.collect();

		tfs.into_iter()
			.map(|tf| {
				let mut v = vec![0.0; idf.len()];
				for (col, count) in tf {
					v[col] = count * idf[col];
				}
				v
			})
			.collect()
	}
}

/// Map each question id to its catalog position, rejecting duplicates.
pub fn index_catalog(catalog: &[Question]) -> Result<HashMap<String, usize>, RecommendError> {
	let mut positions = HashMap::with_capacity(catalog.len());
	for (i, q) in catalog.iter().enumerate() {
		if positions.insert(q.id.clone(), i).is_some() {
			return Err(RecommendError::DuplicateQuestion(q.id.clone()));
		}
	}
	Ok(positions)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Difficulty;

	fn sample_catalog() -> Vec<Question> {
		vec![
			Question::new("a", "arrays", Difficulty::Easy),
			Question::new("b", "arrays", Difficulty::Hard),
			Question::new("c", "graphs", Difficulty::Easy),
		]
	}

	#[test]
	fn empty_catalog_is_an_error() {
		let config = SimilarityConfig::default();
		let err = ContentSimilarityEngine::new(&config).compute(&[]).unwrap_err();
		assert!(matches!(err, RecommendError::EmptyCatalog));
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let config = SimilarityConfig::default();
		let catalog = vec![
			Question::new("a", "arrays", Difficulty::Easy),
			Question::new("a", "trees", Difficulty::Hard),
		];
		let err = ContentSimilarityEngine::new(&config).compute(&catalog).unwrap_err();
		assert!(matches!(err, RecommendError::DuplicateQuestion(id) if id == "a"));
	}

	#[test]
	fn single_question_is_identity() {
		let config = SimilarityConfig::default();
		let catalog = vec![Question::new("only", "trees", Difficulty::Medium)];
		let m = ContentSimilarityEngine::new(&config).compute(&catalog).unwrap();
		assert_eq!(m.len(), 1);
		assert!((m.get(0, 0) - 1.0).abs() < 1e-10);
	}

	#[test]
	fn symmetric_with_unit_diagonal() {
		let config = SimilarityConfig::default();
		let mut catalog = sample_catalog();
		catalog.push(Question::new("d", "linked_lists", Difficulty::Medium));
		catalog.push(Question::new("e", "graphs", Difficulty::Hard));
		let m = ContentSimilarityEngine::new(&config).compute(&catalog).unwrap();
		for i in 0..m.len() {
			assert!((m.get(i, i) - 1.0).abs() < 1e-6);
			for j in 0..m.len() {
				assert!((m.get(i, j) - m.get(j, i)).abs() < 1e-6);
				assert!((0.0..=1.0 + 1e-9).contains(&m.get(i, j)));
			}
		}
	}

	#[test]
	fn shared_topic_beats_shared_difficulty() {
		let config = SimilarityConfig::default();
		let m = ContentSimilarityEngine::new(&config)
			.compute(&sample_catalog())
			.unwrap();
		let ab = m.by_id("a", "b").unwrap();
		let ac = m.by_id("a", "c").unwrap();
		assert!(ab > ac, "ab={ab} ac={ac}");
		assert!(ac > 0.0);
	}

	#[test]
	fn unboosted_shared_terms_tie() {
		let config = SimilarityConfig {
			topic_boost: 1.0,
			difficulty_boost: 1.0,
		};
		let m = ContentSimilarityEngine::new(&config)
			.compute(&sample_catalog())
			.unwrap();
		let ab = m.by_id("a", "b").unwrap();
		let ac = m.by_id("a", "c").unwrap();
		assert!((ab - ac).abs() < 1e-10);
	}

	#[test]
	fn disjoint_labels_are_orthogonal() {
		let config = SimilarityConfig::default();
		let catalog = vec![
			Question::new("x", "arrays", Difficulty::Easy),
			Question::new("y", "graphs", Difficulty::Hard),
		];
		let m = ContentSimilarityEngine::new(&config).compute(&catalog).unwrap();
		assert!(m.get(0, 1).abs() < 1e-10);
	}

	#[test]
	fn unknown_id_lookup_is_none() {
		let config = SimilarityConfig::default();
		let m = ContentSimilarityEngine::new(&config)
			.compute(&sample_catalog())
			.unwrap();
		assert!(m.by_id("a", "zzz").is_none());
		assert_eq!(m.position("c"), Some(2));
	}
}
