// ---------------------------------------------------------------------------
// Score Fusion -- weighted merge of similarity and affinity signals
// ---------------------------------------------------------------------------
//
// Every question the learner interacted with acts as a source row: each
// other catalog question receives
//
//     (similarity[i][j] * w_sim + affinity[j] * w_aff) * status_weight
//
// Sources never score themselves. Ranking is a stable descending sort with
// catalog position as the explicit tie-breaker.
// ---------------------------------------------------------------------------

use crate::config::FusionWeights;
use crate::factorization::AffinityVector;
use crate::similarity::SimilarityMatrix;
use crate::types::{InteractionEntry, InteractionStatus};

impl FusionWeights {
	/// Status weight of a source question: pending questions pull harder.
	pub fn status_weight(&self, status: InteractionStatus) -> f64 {
		match status {
			InteractionStatus::Pending => self.pending,
			_ => self.other,
		}
	}
}

// ---------------------------------------------------------------------------
// ScoreTable
// ---------------------------------------------------------------------------

/// Accumulated score per catalog question, in catalog order.
#[derive(Debug, Clone)]
pub struct ScoreTable {
	ids: Vec<String>,
	scores: Vec<f64>,
}

impl ScoreTable {
	pub fn new(ids: Vec<String>) -> Self {
		let scores = vec![0.0; ids.len()];
		Self { ids, scores }
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn add(&mut self, i: usize, contribution: f64) {
		self.scores[i] += contribution;
	}

	pub fn score(&self, id: &str) -> Option<f64> {
		self.ids
			.iter()
			.position(|q| q == id)
			.map(|i| self.scores[i])
	}

	pub fn scores(&self) -> &[f64] {
		&self.scores
	}

	/// Consume the table into the top `k` ids, highest score first.
	pub fn into_ranked(self, k: usize) -> Vec<String> {
		let order = rank_indices(&self.scores, k);
		let mut ids: Vec<Option<String>> = self.ids.into_iter().map(Some).collect();
		order.into_iter().filter_map(|i| ids[i].take()).collect()
	}
}

/// Indices of the top `k` scores. Stable: equal scores keep ascending index
/// order. NaN scores rank below every number.
pub fn rank_indices(scores: &[f64], k: usize) -> Vec<usize> {
	let key = |i: usize| {
		let s = scores[i];
		if s.is_nan() { f64::NEG_INFINITY } else { s }
	};
	let mut order: Vec<usize> = (0..scores.len()).collect();
	order.sort_by(|&a, &b| key(b).total_cmp(&key(a)).then(a.cmp(&b)));
	order.truncate(k);
	order
}

// ---------------------------------------------------------------------------
// Fusion
// ---------------------------------------------------------------------------

/// Merge similarity and affinity into a score table for `entries`.
///
/// Entries whose question is not in the matrix are skipped. Repeated
/// entries contribute once each.
pub fn fuse(
	similarity: &SimilarityMatrix,
	affinity: &AffinityVector,
	entries: &[InteractionEntry],
	weights: &FusionWeights,
) -> ScoreTable {
	let mut table = ScoreTable::new(similarity.ids().to_vec());
	let n = similarity.len();

	for entry in entries {
		let Some(i) = similarity.position(&entry.question_id) else {
			tracing::debug!(question = %entry.question_id, "interaction outside catalog skipped");
			continue;
		};
		let weight = weights.status_weight(entry.status);
		let row = similarity.row(i);
		for j in (0..n).filter(|&j| j != i) {
			let contribution =
				(row[j] * weights.similarity + affinity.get(j) * weights.affinity) * weight;
			table.add(j, contribution);
		}
	}

	table
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SimilarityConfig;
	use crate::similarity::ContentSimilarityEngine;
	use crate::types::{Difficulty, Question};

	fn catalog() -> Vec<Question> {
		vec![
			Question::new("a", "arrays", Difficulty::Easy),
			Question::new("b", "arrays", Difficulty::Hard),
			Question::new("c", "graphs", Difficulty::Easy),
			Question::new("d", "trees", Difficulty::Medium),
		]
	}

	fn matrix(catalog: &[Question]) -> SimilarityMatrix {
		let config = SimilarityConfig::default();
		ContentSimilarityEngine::new(&config).compute(catalog).unwrap()
	}

	// -- rank_indices tests ---------------------------------------------------

	#[test]
	fn rank_is_descending_and_stable() {
		let order = rank_indices(&[0.5, 0.9, 0.5, 0.1, 0.9], 5);
		assert_eq!(order, vec![1, 4, 0, 2, 3]);
	}

	#[test]
	fn rank_truncates_to_k() {
		assert_eq!(rank_indices(&[0.1, 0.2, 0.3], 2), vec![2, 1]);
		assert!(rank_indices(&[0.1], 0).is_empty());
		assert_eq!(rank_indices(&[0.1], 10), vec![0]);
	}

	#[test]
	fn nan_scores_rank_last() {
		let order = rank_indices(&[f64::NAN, 1.0, 0.0], 3);
		assert_eq!(order, vec![1, 2, 0]);
	}

	#[test]
	fn interleaved_nan_scores_sort_totally() {
		let scores: Vec<f64> = (0..40)
			.map(|i| if i % 3 == 0 { f64::NAN } else { (i % 7) as f64 })
			.collect();
		let order = rank_indices(&scores, scores.len());
		assert_eq!(order.len(), 40);

		let numbers = scores.iter().filter(|s| !s.is_nan()).count();
		assert!(order[numbers..].iter().all(|&i| scores[i].is_nan()));
		for pair in order[..numbers].windows(2) {
			let (a, b) = (pair[0], pair[1]);
			assert!(scores[a] > scores[b] || (scores[a] == scores[b] && a < b));
		}
		for pair in order[numbers..].windows(2) {
			assert!(pair[0] < pair[1]);
		}
	}

	// -- status weight tests --------------------------------------------------

	#[test]
	fn pending_weighs_more_than_other_statuses() {
		let w = FusionWeights::default();
		assert!((w.status_weight(InteractionStatus::Pending) - 0.6).abs() < 1e-10);
		assert!((w.status_weight(InteractionStatus::Completed) - 0.4).abs() < 1e-10);
		assert!((w.status_weight(InteractionStatus::Skipped) - 0.4).abs() < 1e-10);
	}

	// -- fuse tests -----------------------------------------------------------

	#[test]
	fn no_entries_leaves_all_scores_zero() {
		let q = catalog();
		let m = matrix(&q);
		let table = fuse(&m, &AffinityVector::zeros(q.len()), &[], &FusionWeights::default());
		assert!(table.scores().iter().all(|&s| s == 0.0));
		assert_eq!(table.into_ranked(3), vec!["a", "b", "c"]);
	}

	#[test]
	fn source_question_never_scores_itself() {
		let q = catalog();
		let m = matrix(&q);
		let entries = vec![InteractionEntry::new("a", InteractionStatus::Completed)];
		let table = fuse(&m, &AffinityVector::zeros(q.len()), &entries, &FusionWeights::default());
		assert_eq!(table.score("a"), Some(0.0));
		assert!(table.score("b").unwrap() > table.score("c").unwrap());
		assert!(table.score("c").unwrap() > 0.0);
	}

	#[test]
	fn contribution_matches_formula() {
		let q = catalog();
		let m = matrix(&q);
		let affinity = AffinityVector::zeros(q.len());
		let entries = vec![InteractionEntry::new("a", InteractionStatus::Pending)];
		let table = fuse(&m, &affinity, &entries, &FusionWeights::default());
		let expected = m.by_id("a", "b").unwrap() * 0.7 * 0.6;
		assert!((table.score("b").unwrap() - expected).abs() < 1e-12);
	}

	#[test]
	fn unknown_entries_are_skipped() {
		let q = catalog();
		let m = matrix(&q);
		let entries = vec![InteractionEntry::new("zzz", InteractionStatus::Completed)];
		let table = fuse(&m, &AffinityVector::zeros(q.len()), &entries, &FusionWeights::default());
		assert!(table.scores().iter().all(|&s| s == 0.0));
	}

	#[test]
	fn ranked_ids_are_unique() {
		let q = catalog();
		let m = matrix(&q);
		let entries = vec![
			InteractionEntry::new("a", InteractionStatus::Completed),
			InteractionEntry::new("c", InteractionStatus::Pending),
		];
		let table = fuse(&m, &AffinityVector::zeros(q.len()), &entries, &FusionWeights::default());
		let ranked = table.into_ranked(10);
		assert_eq!(ranked.len(), 4);
		let mut sorted = ranked.clone();
		sorted.sort();
		sorted.dedup();
		assert_eq!(sorted.len(), 4);
	}
}
