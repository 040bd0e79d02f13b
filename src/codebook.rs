//! The codebook: K representative vectors (centroids) of dimension P.
//!
//! A trained codebook is the product of the LBG loop and the object later
//! stages of a speech pipeline care about: once it exists, any feature
//! vector can be encoded as the index of its nearest codeword
//! ([`Codebook::quantize`]).

use crate::distance::{nearest_codeword, Nearest, Tokhura};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// An ordered set of K codewords of dimension P.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    codewords: Array2<f32>,
}

impl Codebook {
    /// Build a codebook from explicit rows, e.g. as a warm start for
    /// [`Lbg::with_initial_codebook`](crate::Lbg::with_initial_codebook).
    ///
    /// Every row must have the same length; the first row fixes the
    /// dimension.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidParameter {
                name: "codebook",
                message: "codebook must contain at least one codeword",
            });
        }

        let dim = rows[0].len();
        let mut flat: Vec<f32> = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: row.len(),
                });
            }
            flat.extend(row);
        }

        let codewords = Array2::from_shape_vec((rows.len(), dim), flat)
            .expect("row-validated shape");
        Ok(Self { codewords })
    }

    pub(crate) fn from_array(codewords: Array2<f32>) -> Self {
        Self { codewords }
    }

    /// Number of codewords (K).
    pub fn len(&self) -> usize {
        self.codewords.nrows()
    }

    /// True if the codebook holds no codewords. Constructors reject empty
    /// input, so this is always false for a constructed codebook.
    pub fn is_empty(&self) -> bool {
        self.codewords.nrows() == 0
    }

    /// Codeword dimension (P).
    pub fn dim(&self) -> usize {
        self.codewords.ncols()
    }

    /// Borrow codeword `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.codewords.row(i)
    }

    /// Copy the codebook out as plain rows, for printing or persistence by
    /// the caller.
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.codewords
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect()
    }

    /// Encode one feature vector as its nearest codeword.
    ///
    /// Returns both the winning index and its weighted squared distance.
    /// Ties keep the lowest index (see [`crate::distance`]).
    pub fn quantize(&self, v: &[f32], metric: &Tokhura) -> Result<Nearest> {
        if v.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: v.len(),
            });
        }
        if metric.dim() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: metric.dim(),
            });
        }
        Ok(nearest_codeword(
            &ArrayView1::from(v),
            &self.codewords,
            metric.weights(),
        ))
    }

    pub(crate) fn as_array(&self) -> &Array2<f32> {
        &self.codewords
    }

    pub(crate) fn as_array_mut(&mut self) -> &mut Array2<f32> {
        &mut self.codewords
    }
}

/// Outcome of one [`Lbg::train`](crate::Lbg::train) run.
///
/// Hitting the iteration cap is not an error: the report carries the
/// best-so-far codebook with `converged == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Training {
    /// The final codebook.
    pub codebook: Codebook,
    /// Mean nearest-codeword distance over the universe at the last pass.
    pub mean_distortion: f64,
    /// Assignment/update cycles actually run.
    pub iterations: usize,
    /// Whether the distortion delta fell below the threshold before the
    /// iteration cap.
    pub converged: bool,
    /// Regions that received no assignments and were reseeded from a
    /// random universe vector.
    pub reseeded_regions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_shape() {
        let codebook =
            Codebook::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]]).unwrap();
        assert_eq!(codebook.len(), 3);
        assert_eq!(codebook.dim(), 2);
        assert_eq!(codebook.row(2)[0], 2.0);
    }

    #[test]
    fn test_from_rows_empty() {
        assert!(Codebook::from_rows(&[]).is_err());
    }

    #[test]
    fn test_from_rows_ragged() {
        let result = Codebook::from_rows(&[vec![0.0, 0.0], vec![1.0]]);
        assert_eq!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_quantize_returns_nearest_index() {
        let codebook = Codebook::from_rows(&[vec![0.0, 0.0], vec![10.0, 10.0]]).unwrap();
        let metric = Tokhura::unit(2);

        let near_origin = codebook.quantize(&[1.0, 1.0], &metric).unwrap();
        assert_eq!(near_origin.index, 0);
        assert!((near_origin.distance - 2.0).abs() < 1e-6);

        let near_far = codebook.quantize(&[9.0, 9.0], &metric).unwrap();
        assert_eq!(near_far.index, 1);
    }

    #[test]
    fn test_quantize_dimension_mismatch() {
        let codebook = Codebook::from_rows(&[vec![0.0, 0.0]]).unwrap();

        let bad_vector = codebook.quantize(&[1.0], &Tokhura::unit(2));
        assert_eq!(
            bad_vector,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );

        let bad_metric = codebook.quantize(&[1.0, 1.0], &Tokhura::unit(3));
        assert_eq!(
            bad_metric,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_to_rows_round_trip() {
        let rows = vec![vec![0.5, 1.5], vec![2.5, 3.5]];
        let codebook = Codebook::from_rows(&rows).unwrap();
        assert_eq!(codebook.to_rows(), rows);
    }
}
