// ---------------------------------------------------------------------------
// Interaction Factorization -- truncated SVD over learner x question signals
// ---------------------------------------------------------------------------
//
// Builds an interaction matrix (+1 completed, -1 skipped at least once,
// 0 otherwise) and reconstructs it from a rank-clamped SVD computed by power
// iteration with deflation. The reconstructed row of the requesting learner
// is the affinity vector.
//
// The rank is clamped to `min(1, cols - 1, rows - 1)`: a truncated
// decomposition must stay strictly below both matrix dimensions. The serving
// path only ever populates one learner row, so its rank is 0 and the
// affinity vector is all zeros. Cross-learner signal appears once a
// multi-learner matrix is built with `InteractionMatrix::from_records`.
//
// A zero rank and any numerical breakdown both degrade to an all-zero
// affinity vector.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use thiserror::Error;

use crate::config::FactorizationConfig;
use crate::cosine::{compute_magnitude, dot};
use crate::types::{InteractionEntry, InteractionRecord, InteractionStatus, Question};

/// Upper bound on the factorization rank.
const MAX_RANK: usize = 1;

#[derive(Debug, Error)]
enum FactorizationError {
	#[error("matrix needs at least 2 columns, got {0}")]
	TooFewColumns(usize),
	#[error("rank clamps to 0 for a {0}x{1} matrix")]
	ZeroRank(usize, usize),
	#[error("degenerate singular value {0:e} at component {1}")]
	Degenerate(f64, usize),
	#[error("non-finite value during power iteration")]
	NonFinite,
}

// ---------------------------------------------------------------------------
// Interaction matrix
// ---------------------------------------------------------------------------

/// Signal carried by one interaction entry.
pub fn interaction_signal(entry: &InteractionEntry) -> f64 {
	if entry.status == InteractionStatus::Completed {
		1.0
	} else if entry.skips > 0 {
		-1.0
	} else {
		0.0
	}
}

/// Dense learner x question matrix in catalog column order.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
	learners: Vec<String>,
	rows: usize,
	cols: usize,
	values: Vec<f64>,
}

impl InteractionMatrix {
	/// Build one row per record. Entries for questions outside the catalog
	/// are ignored; a later entry for the same question overwrites an
	/// earlier one.
	pub fn from_records(records: &[&InteractionRecord], catalog: &[Question]) -> Self {
		let columns: HashMap<&str, usize> = catalog
			.iter()
			.enumerate()
			.map(|(i, q)| (q.id.as_str(), i))
			.collect();

		let rows = records.len();
		let cols = catalog.len();
		let mut values = vec![0.0; rows * cols];
		for (r, record) in records.iter().enumerate() {
			for entry in &record.entries {
				if let Some(&c) = columns.get(entry.question_id.as_str()) {
					values[r * cols + c] = interaction_signal(entry);
				}
			}
		}

		Self {
			learners: records.iter().map(|r| r.learner_id.clone()).collect(),
			rows,
			cols,
			values,
		}
	}

	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn cols(&self) -> usize {
		self.cols
	}

	pub fn row(&self, r: usize) -> &[f64] {
		&self.values[r * self.cols..(r + 1) * self.cols]
	}

	pub fn learner_row(&self, learner_id: &str) -> Option<usize> {
		self.learners.iter().position(|l| l == learner_id)
	}

	/// Effective rank used for reconstruction: `min(1, cols - 1, rows - 1)`.
	pub fn clamped_rank(&self) -> usize {
		MAX_RANK
			.min(self.cols.saturating_sub(1))
			.min(self.rows.saturating_sub(1))
	}

	fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
		(0..self.rows).map(|r| dot(self.row(r), v)).collect()
	}

	fn transpose_mul_vec(&self, u: &[f64]) -> Vec<f64> {
		let mut out = vec![0.0; self.cols];
		for (r, &ur) in u.iter().enumerate() {
			for (o, &a) in out.iter_mut().zip(self.row(r)) {
				*o += ur * a;
			}
		}
		out
	}
}

// ---------------------------------------------------------------------------
// Truncated SVD
// ---------------------------------------------------------------------------

/// Rank-k factors: `A ~= U * diag(sigma) * Vt`.
#[derive(Debug, Clone)]
struct TruncatedSvd {
	/// k left singular vectors, each of length `rows`.
	u: Vec<Vec<f64>>,
	sigma: Vec<f64>,
	/// k right singular vectors, each of length `cols`.
	vt: Vec<Vec<f64>>,
}

impl TruncatedSvd {
	/// Reconstruct row `r` of the approximated matrix.
	fn reconstruct_row(&self, r: usize, cols: usize) -> Vec<f64> {
		let mut out = vec![0.0; cols];
		for ((u, &s), v) in self.u.iter().zip(&self.sigma).zip(&self.vt) {
			let scale = u[r] * s;
			for (o, &vj) in out.iter_mut().zip(v) {
				*o += scale * vj;
			}
		}
		out
	}
}

fn normalized(v: Vec<f64>) -> Option<Vec<f64>> {
	let norm = compute_magnitude(&v);
	if norm == 0.0 || !norm.is_finite() {
		return None;
	}
	Some(v.into_iter().map(|x| x / norm).collect())
}

fn truncated_svd(
	matrix: &InteractionMatrix,
	rank: usize,
	config: &FactorizationConfig,
) -> Result<TruncatedSvd, FactorizationError> {
	if matrix.cols < 2 {
		return Err(FactorizationError::TooFewColumns(matrix.cols));
	}
	if rank == 0 {
		return Err(FactorizationError::ZeroRank(matrix.rows, matrix.cols));
	}

	let mut residual = matrix.clone();
	let mut svd = TruncatedSvd {
		u: Vec::with_capacity(rank),
		sigma: Vec::with_capacity(rank),
		vt: Vec::with_capacity(rank),
	};

	for component in 0..rank {
		// Start from the heaviest residual row; it lies in the row space.
		let start = (0..residual.rows)
			.map(|r| residual.row(r).to_vec())
			.max_by(|a, b| compute_magnitude(a).total_cmp(&compute_magnitude(b)));
		let mut v = start
			.and_then(normalized)
			.ok_or(FactorizationError::Degenerate(0.0, component))?;

		for _ in 0..config.max_iterations {
			let next = residual.transpose_mul_vec(&residual.mul_vec(&v));
			let next = normalized(next).ok_or(FactorizationError::Degenerate(0.0, component))?;
			let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
			v = next;
			if delta < config.tolerance {
				break;
			}
		}

		let av = residual.mul_vec(&v);
		let sigma = compute_magnitude(&av);
		if !sigma.is_finite() {
			return Err(FactorizationError::NonFinite);
		}
		if sigma <= config.min_singular_value {
			return Err(FactorizationError::Degenerate(sigma, component));
		}
		let u: Vec<f64> = av.into_iter().map(|x| x / sigma).collect();

		for r in 0..residual.rows {
			let cols = residual.cols;
			for c in 0..cols {
				residual.values[r * cols + c] -= sigma * u[r] * v[c];
			}
		}

		svd.u.push(u);
		svd.sigma.push(sigma);
		svd.vt.push(v);
	}

	Ok(svd)
}

// ---------------------------------------------------------------------------
// Factorizer
// ---------------------------------------------------------------------------

/// Per-question latent affinity, aligned with catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityVector(Vec<f64>);

impl AffinityVector {
	pub fn zeros(len: usize) -> Self {
		Self(vec![0.0; len])
	}

	pub fn get(&self, i: usize) -> f64 {
		self.0.get(i).copied().unwrap_or(0.0)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|&x| x == 0.0)
	}

	pub fn as_slice(&self) -> &[f64] {
		&self.0
	}
}

pub struct InteractionFactorizer<'a> {
	config: &'a FactorizationConfig,
}

impl<'a> InteractionFactorizer<'a> {
	pub fn new(config: &'a FactorizationConfig) -> Self {
		Self { config }
	}

	/// Estimate affinities for the learner owning `record`.
	///
	/// Never fails. A single record forms a one-row matrix whose rank clamps
	/// to 0, so the result is a zero vector, as it is for catalogs with fewer
	/// than two questions and for numerical breakdowns.
	pub fn affinities(&self, record: &InteractionRecord, catalog: &[Question]) -> AffinityVector {
		if catalog.len() < 2 {
			return AffinityVector::zeros(catalog.len());
		}
		let matrix = InteractionMatrix::from_records(&[record], catalog);
		self.affinities_for(&matrix, 0)
	}

	/// Reconstruct row `row` of `matrix` from its rank-clamped SVD.
	pub fn affinities_for(&self, matrix: &InteractionMatrix, row: usize) -> AffinityVector {
		if matrix.cols() < 2 || row >= matrix.rows() {
			return AffinityVector::zeros(matrix.cols());
		}
		match truncated_svd(matrix, matrix.clamped_rank(), self.config) {
			Ok(svd) => AffinityVector(svd.reconstruct_row(row, matrix.cols())),
			Err(e) => {
				tracing::warn!("Factorization degraded to zero affinity: {}", e);
				AffinityVector::zeros(matrix.cols())
			}
		}
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Difficulty;

	fn catalog(n: usize) -> Vec<Question> {
		(0..n)
			.map(|i| Question::new(format!("q{i}"), "arrays", Difficulty::Easy))
			.collect()
	}

	fn record(entries: Vec<InteractionEntry>) -> InteractionRecord {
		InteractionRecord::new("learner", entries)
	}

	// -- interaction_signal tests ---------------------------------------------

	#[test]
	fn signal_values() {
		let done = InteractionEntry::new("q0", InteractionStatus::Completed).with_skips(3);
		let skipped = InteractionEntry::new("q0", InteractionStatus::Skipped).with_skips(1);
		let pending = InteractionEntry::new("q0", InteractionStatus::Pending);
		assert_eq!(interaction_signal(&done), 1.0);
		assert_eq!(interaction_signal(&skipped), -1.0);
		assert_eq!(interaction_signal(&pending), 0.0);
	}

	// -- InteractionMatrix tests ----------------------------------------------

	#[test]
	fn matrix_ignores_unknown_questions_and_keeps_last_entry() {
		let r = record(vec![
			InteractionEntry::new("q1", InteractionStatus::Completed),
			InteractionEntry::new("missing", InteractionStatus::Completed),
			InteractionEntry::new("q1", InteractionStatus::Pending).with_skips(2),
		]);
		let m = InteractionMatrix::from_records(&[&r], &catalog(3));
		assert_eq!(m.rows(), 1);
		assert_eq!(m.row(0), &[0.0, -1.0, 0.0]);
		assert_eq!(m.learner_row("learner"), Some(0));
	}

	#[test]
	fn rank_is_clamped_below_both_dimensions() {
		let r = record(vec![]);
		let mut other = record(vec![]);
		other.learner_id = "other".into();
		assert_eq!(InteractionMatrix::from_records(&[&r], &catalog(9)).clamped_rank(), 0);
		assert_eq!(InteractionMatrix::from_records(&[&r, &other], &catalog(1)).clamped_rank(), 0);
		assert_eq!(InteractionMatrix::from_records(&[&r, &other], &catalog(2)).clamped_rank(), 1);
		assert_eq!(InteractionMatrix::from_records(&[&r, &other], &catalog(9)).clamped_rank(), 1);
	}

	// -- factorizer tests -----------------------------------------------------

	#[test]
	fn small_catalogs_yield_zero_vector() {
		let config = FactorizationConfig::default();
		let f = InteractionFactorizer::new(&config);
		let r = record(vec![InteractionEntry::new("q0", InteractionStatus::Completed)]);
		assert!(f.affinities(&r, &catalog(1)).is_zero());
		assert_eq!(f.affinities(&r, &catalog(1)).len(), 1);
		assert!(f.affinities(&r, &[]).is_empty());
	}

	#[test]
	fn empty_record_degrades_to_zero() {
		let config = FactorizationConfig::default();
		let f = InteractionFactorizer::new(&config);
		let a = f.affinities(&record(vec![]), &catalog(4));
		assert_eq!(a.len(), 4);
		assert!(a.is_zero());
	}

	#[test]
	fn single_learner_degrades_to_zero_vector() {
		let config = FactorizationConfig::default();
		let f = InteractionFactorizer::new(&config);
		let r = record(vec![
			InteractionEntry::new("q0", InteractionStatus::Completed),
			InteractionEntry::new("q2", InteractionStatus::Completed),
			InteractionEntry::new("q3", InteractionStatus::Skipped).with_skips(1),
		]);
		let a = f.affinities(&r, &catalog(4));
		assert_eq!(a.len(), 4);
		assert!(a.is_zero(), "got {:?}", a.as_slice());
	}

	#[test]
	fn multi_learner_rank_one_approximation() {
		let config = FactorizationConfig::default();
		let f = InteractionFactorizer::new(&config);
		let q = catalog(3);
		let a = record(vec![
			InteractionEntry::new("q0", InteractionStatus::Completed),
			InteractionEntry::new("q1", InteractionStatus::Completed),
		]);
		let mut b = record(vec![InteractionEntry::new("q0", InteractionStatus::Completed)]);
		b.learner_id = "other".into();
		let m = InteractionMatrix::from_records(&[&a, &b], &q);
		let row_b = m.learner_row("other").unwrap();
		let affinity = f.affinities_for(&m, row_b);
		// The shared pattern lends learner b some affinity for q1.
		assert!(affinity.get(1) > 0.0);
		assert!(affinity.get(2).abs() < 1e-9);
	}

	#[test]
	fn out_of_range_row_is_zero() {
		let config = FactorizationConfig::default();
		let f = InteractionFactorizer::new(&config);
		let r = record(vec![InteractionEntry::new("q0", InteractionStatus::Completed)]);
		let m = InteractionMatrix::from_records(&[&r], &catalog(3));
		assert!(f.affinities_for(&m, 5).is_zero());
	}
}
