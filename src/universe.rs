//! The training universe: an owned, contiguous M×P block of feature
//! vectors.
//!
//! The universe is read-only once built. Training borrows it; nothing in
//! this crate takes ownership of it or mutates it.
//!
//! Two ways in:
//!
//! - [`Universe::from_rows`] for vectors already in memory,
//! - [`Universe::from_csv`] for the flat numeric table produced by feature
//!   extraction (one comma-separated row of P floats per vector, no
//!   header).
//!
//! Both validate that every row has the same dimension. Ragged input is an
//! error, never truncated or padded.

use crate::error::{Error, Result};
use csv::{ReaderBuilder, Trim};
use ndarray::{Array2, ArrayView1};
use std::path::Path;

/// An ordered, read-only set of M fixed-dimension feature vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    data: Array2<f32>,
}

impl Universe {
    /// Build a universe from in-memory rows.
    ///
    /// Every row must have the same length; the first row fixes the
    /// dimension.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyUniverse);
        }

        let dim = rows[0].len();
        if dim == 0 {
            return Err(Error::DimensionMismatch {
                expected: 1,
                found: 0,
            });
        }

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

        let data = Array2::from_shape_vec((rows.len(), dim), flat)
            .expect("row-validated shape");
        Ok(Self { data })
    }

    /// Load a universe from a headerless CSV file of floats.
    ///
    /// Each record is one feature vector; the first record fixes the
    /// dimension. Field-count and parse failures report the offending
    /// 1-based line.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| Error::Io(e.to_string()))?;

        let mut rows: Vec<Vec<f32>> = Vec::new();
        let mut dim = 0usize;

        for (i, record) in reader.records().enumerate() {
            let line = i + 1;
            let record = record.map_err(|e| Error::Io(e.to_string()))?;

            if rows.is_empty() {
                dim = record.len();
            } else if record.len() != dim {
                return Err(Error::MalformedRow {
                    line,
                    message: format!("expected {dim} fields, found {}", record.len()),
                });
            }

            let mut row = Vec::with_capacity(dim);
            for field in record.iter() {
                let value: f32 = field.parse().map_err(|_| Error::MalformedRow {
                    line,
                    message: format!("not a number: '{field}'"),
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        Self::from_rows(&rows)
    }

    /// Number of vectors (M).
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// True if the universe holds no vectors. Constructors reject empty
    /// input, so this is always false for a constructed universe.
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Vector dimension (P).
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow vector `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.data.row(i)
    }

    /// The backing M×P matrix.
    pub(crate) fn as_array(&self) -> &Array2<f32> {
        &self.data
    }
}
