//! # vq
//!
//! Vector-quantization codebook training for speech feature pipelines:
//! Linde-Buzo-Gray / K-means clustering under a weighted (Tokhura)
//! distance.
//!
//! Given a universe of M fixed-dimension feature vectors (typically
//! cepstral coefficients), [`Lbg`] derives a K-entry [`Codebook`] of
//! representative vectors by iterating nearest-codeword assignment and
//! centroid recomputation until the mean distortion settles. The trained
//! codebook then encodes arbitrary vectors as codeword indices
//! ([`Codebook::quantize`]).
//!
//! ```rust
//! use vq::{Lbg, Tokhura, Universe};
//!
//! let universe = Universe::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ])?;
//!
//! let training = Lbg::new(2).with_seed(42).train(&universe)?;
//! assert!(training.converged);
//! assert!(training.mean_distortion >= 0.0);
//!
//! // Encode a fresh vector as a codebook index.
//! let nearest = training.codebook.quantize(&[9.5, 10.2], &Tokhura::unit(2))?;
//! assert!(nearest.index < 2);
//! # Ok::<(), vq::Error>(())
//! ```
//!
//! Real cepstral data wants the Tokhura weights
//! ([`Tokhura::cepstral12`]) and usually arrives as a flat CSV table
//! ([`Universe::from_csv`]).
//!
//! The assignment pass parallelizes across universe vectors when the
//! `parallel` feature is enabled.

pub mod codebook;
pub mod distance;
/// Error types used across `vq`.
pub mod error;
pub mod lbg;
pub mod universe;

pub use codebook::{Codebook, Training};
pub use distance::{Nearest, Tokhura, CEPSTRAL_WEIGHTS};
pub use error::{Error, Result};
pub use lbg::Lbg;
pub use universe::Universe;
