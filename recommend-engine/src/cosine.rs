/// Compute the magnitude (L2 norm) of a vector.
pub fn compute_magnitude(v: &[f64]) -> f64 {
	v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Compute cosine similarity using pre-computed magnitudes.
/// Returns 0.0 for zero magnitudes or dimension mismatches; the result is
/// clamped to [-1.0, 1.0].
pub fn cosine_similarity_with_magnitude(a: &[f64], b: &[f64], mag_a: f64, mag_b: f64) -> f64 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let denom = mag_a * mag_b;
	if denom == 0.0 {
		return 0.0;
	}

	let result = dot(a, b) / denom;
	if !result.is_finite() {
		return 0.0;
	}
	result.clamp(-1.0, 1.0)
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}
