//! Distance computations used by the in-process server.
//!
//! All metrics are normalized so that lower values mean more similar:
//! L2 is reported as squared Euclidean distance, COSINE as `1 - cos`, and
//! IP as the negated inner product.

use crate::index::MetricType;

impl MetricType {
    /// Computes the distance between two float vectors using this metric.
    ///
    /// Returns `None` for binary-only metrics.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Option<f32> {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            MetricType::L2 => Some(euclidean_distance_squared(a, b)),
            MetricType::Ip => Some(-dot_product(a, b)),
            MetricType::Cosine => Some(cosine_distance(a, b)),
            MetricType::Hamming | MetricType::Jaccard => None,
        }
    }
}

/// Computes squared Euclidean distance.
#[inline]
pub fn euclidean_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Computes cosine distance between two vectors.
///
/// Formula: 1 - (a · b) / (||a|| * ||b||)
/// Range: [0, 2] where 0 = identical direction, 2 = opposite direction
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 1.0; // Undefined, treat as maximally dissimilar
    }

    1.0 - (dot / denominator)
}

/// Computes dot product (inner product) between two vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_is_squared() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert!((MetricType::L2.distance(&a, &b).unwrap() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_vector_has_zero_l2() {
        let a = [1.0, 2.0, 3.0];
        assert!(euclidean_distance_squared(&a, &a) < 1e-10);
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ip_is_negated() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert!((MetricType::Ip.distance(&a, &b).unwrap() + 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_binary_metrics_have_no_float_distance() {
        assert!(MetricType::Hamming.distance(&[1.0], &[0.0]).is_none());
        assert!(MetricType::Jaccard.distance(&[1.0], &[0.0]).is_none());
    }
}
