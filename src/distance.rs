//! Weighted (Tokhura) distance between feature vectors.
//!
//! Vector quantization of cepstral features does not weigh every dimension
//! equally: higher-order coefficients carry less energy but more
//! perceptually relevant detail, so each dimension gets a fixed positive
//! weight in the distance computation.
//!
//! # The Metric
//!
//! ```text
//! d(v, c) = Σⱼ wⱼ · (vⱼ - cⱼ)²
//! ```
//!
//! A weighted **squared** Euclidean distance. No square root is taken:
//! nearest-codeword queries only compare relative magnitudes, and the
//! square root is monotone, so skipping it changes nothing and saves work.
//!
//! With all weights set to 1 this degenerates to the plain squared
//! Euclidean distance used by ordinary K-means.
//!
//! # Tie-breaking
//!
//! The nearest-codeword scan (exposed through
//! [`Codebook::quantize`](crate::Codebook::quantize)) walks codewords in
//! index order and only a strictly smaller distance replaces the current
//! minimum, so a tie keeps the earliest (lowest) index. Callers may rely
//! on this.
//!
//! # References
//!
//! - Tohkura (1987). "A weighted cepstral distance measure for speech
//!   recognition."

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// Per-dimension weights for 12 liftered cepstral coefficients, the
/// standard choice for Tokhura's distance over LPC-cepstra.
pub const CEPSTRAL_WEIGHTS: [f32; 12] = [
    1.0, 3.0, 7.0, 13.0, 19.0, 22.0, 25.0, 33.0, 42.0, 50.0, 56.0, 61.0,
];

/// Nearest-codeword query result: the winning index and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index of the nearest codeword.
    pub index: usize,
    /// Weighted squared distance to that codeword.
    pub distance: f32,
}

/// Tokhura-weighted squared Euclidean distance.
///
/// Owns one positive weight per dimension, fixed for the lifetime of a
/// training run.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokhura {
    weights: Vec<f32>,
}

impl Tokhura {
    /// Create a metric from explicit per-dimension weights.
    ///
    /// Every weight must be finite and strictly positive.
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidParameter {
                name: "weights",
                message: "weight vector is empty",
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(Error::InvalidParameter {
                name: "weights",
                message: "weights must be finite and strictly positive",
            });
        }
        Ok(Self { weights })
    }

    /// Unit weights: plain squared Euclidean distance in `dim` dimensions.
    pub fn unit(dim: usize) -> Self {
        Self {
            weights: vec![1.0; dim],
        }
    }

    /// The classic 12-dimension cepstral weights ([`CEPSTRAL_WEIGHTS`]).
    pub fn cepstral12() -> Self {
        Self {
            weights: CEPSTRAL_WEIGHTS.to_vec(),
        }
    }

    /// Dimension this metric applies to.
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// The weight vector.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Weighted squared distance between two vectors of this metric's
    /// dimension.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != self.weights.len() {
            return Err(Error::DimensionMismatch {
                expected: self.weights.len(),
                found: a.len(),
            });
        }
        if b.len() != self.weights.len() {
            return Err(Error::DimensionMismatch {
                expected: self.weights.len(),
                found: b.len(),
            });
        }
        Ok(weighted_squared(
            &ArrayView1::from(a),
            &ArrayView1::from(b),
            &self.weights,
        ))
    }
}

/// Weighted squared Euclidean distance between two equal-length vectors.
///
/// Dimensions are validated at the public seams; this is the unchecked hot
/// path.
#[inline]
pub(crate) fn weighted_squared(
    a: &ArrayView1<'_, f32>,
    b: &ArrayView1<'_, f32>,
    weights: &[f32],
) -> f32 {
    a.iter()
        .zip(b.iter())
        .zip(weights.iter())
        .map(|((x, y), w)| w * (x - y).powi(2))
        .sum()
}

/// Scan `codewords` in index order and return the nearest entry to `v`.
///
/// Strict `<` comparison: a later codeword at equal distance never
/// replaces an earlier minimum.
#[inline]
pub(crate) fn nearest_codeword(
    v: &ArrayView1<'_, f32>,
    codewords: &Array2<f32>,
    weights: &[f32],
) -> Nearest {
    let mut best_index = 0;
    let mut best_dist = f32::MAX;

    for i in 0..codewords.nrows() {
        let dist = weighted_squared(v, &codewords.row(i), weights);
        if dist < best_dist {
            best_dist = dist;
            best_index = i;
        }
    }

    Nearest {
        index: best_index,
        distance: best_dist,
    }
}
