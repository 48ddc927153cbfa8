//! Cosine distance and vector validation.
//!
//! Distances follow the pgvector `<=>` convention: `1 - cosine_similarity`,
//! in `[0, 2]`, where 0 means identical direction.

use embindex_core::{Error, Result};

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Cosine distance between two vectors, clamped to `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).clamp(0.0, 2.0)
}

/// Check that `vector` has exactly `expected` finite components, not all zero.
///
/// A zero vector has no direction, so its cosine distance is undefined.
pub fn validate_vector(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::validation(format!(
            "dimension mismatch: expected {expected}, got {}",
            vector.len()
        )));
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(Error::validation(format!(
            "non-finite component at position {pos}"
        )));
    }
    if vector.iter().all(|v| *v == 0.0) {
        return Err(Error::validation("zero-magnitude vector"));
    }
    Ok(())
}
