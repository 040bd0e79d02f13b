//! Linde-Buzo-Gray codebook training.
//!
//! Derives a K-entry codebook from an M-vector universe by iterating the
//! classic K-means cycle under a weighted (Tokhura) distance. Used in
//! speech pipelines to turn a large set of cepstral feature vectors into a
//! small set of representative codewords, so that later stages can encode
//! frames as codebook indices.
//!
//! # The Objective
//!
//! ```text
//! D = (1/M) Σᵢ min_k d(xᵢ, cₖ)
//! ```
//!
//! Mean nearest-codeword distance over the universe, with `d` the weighted
//! squared Euclidean distance of [`crate::distance`]. This mean distortion
//! is both the quantity being minimized and the convergence signal.
//!
//! # The Loop
//!
//! 1. Seed the codebook with K vectors drawn uniformly (with replacement)
//!    from the universe
//! 2. **Assign**: each universe vector → nearest codeword; accumulate
//!    per-region sums, counts, and total distortion in one pass
//! 3. **Update**: each codeword → component-wise mean of its region
//! 4. Stop once the mean distortion moves by at most `delta` between
//!    consecutive passes, or the iteration cap is hit
//!
//! **Why it converges**: assignment never increases distortion given fixed
//! codewords, and the per-dimension mean minimizes the weighted squared
//! distance given fixed assignments (positive weights factor out of the
//! minimizer). Bounded below by 0, the sequence settles; the cap exists
//! because `delta` alone is not guaranteed to be reached on adversarial
//! input, and hitting it is reported rather than raised.
//!
//! # Empty Regions
//!
//! A codeword can end a pass with no assigned vectors (a duplicate seed
//! loses every tie, or a region empties mid-run). Such a codeword is
//! reseeded from a uniformly random universe vector and the event is
//! counted in [`Training::reseeded_regions`].
//!
//! # References
//!
//! - Linde, Buzo & Gray (1980). "An Algorithm for Vector Quantizer
//!   Design."
//! - Lloyd (1957/1982). "Least squares quantization in PCM."

use crate::codebook::{Codebook, Training};
use crate::distance::{nearest_codeword, Nearest, Tokhura};
use crate::error::{Error, Result};
use crate::universe::Universe;
use ndarray::Array2;
use rand::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Linde-Buzo-Gray codebook trainer.
#[derive(Debug, Clone)]
pub struct Lbg {
    /// Number of codewords.
    k: usize,
    /// Convergence threshold on the change in mean distortion.
    delta: f64,
    /// Iteration cap.
    max_iter: usize,
    /// Random seed.
    seed: Option<u64>,
    /// Distance weights; unit weights when absent.
    metric: Option<Tokhura>,
    /// Warm-start codebook; random initialization when absent.
    initial: Option<Codebook>,
}

impl Lbg {
    /// Create a trainer for a `k`-entry codebook.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            delta: 1e-5,
            max_iter: 100,
            seed: None,
            metric: None,
            initial: None,
        }
    }

    /// Set the convergence threshold on the change in mean distortion.
    ///
    /// Values in `[1e-6, 1e-3]` are sensible for cepstral data; the
    /// default is `1e-5`.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the iteration cap. Exhausting it is reported via
    /// [`Training::converged`], not raised as an error.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the random seed for reproducible initialization and reseeding.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the distance weights. Unweighted (plain squared Euclidean)
    /// when not set.
    pub fn with_metric(mut self, metric: Tokhura) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Start from an explicit codebook instead of random universe rows.
    ///
    /// The codebook must have exactly `k` rows of the universe's
    /// dimension.
    pub fn with_initial_codebook(mut self, codebook: Codebook) -> Self {
        self.initial = Some(codebook);
        self
    }

    /// Number of codewords this trainer produces.
    pub fn codebook_size(&self) -> usize {
        self.k
    }

    /// Train a codebook on `universe`.
    ///
    /// Runs assignment/update cycles until the mean distortion changes by
    /// at most `delta` between consecutive passes, or the iteration cap is
    /// hit. The returned [`Training`] carries the final codebook either
    /// way.
    pub fn train(&self, universe: &Universe) -> Result<Training> {
        let m = universe.len();
        let p = universe.dim();

        if m == 0 {
            return Err(Error::EmptyUniverse);
        }
        if self.k == 0 || self.k > m {
            return Err(Error::InvalidCodebookSize {
                requested: self.k,
                n_vectors: m,
            });
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "delta",
                message: "convergence threshold must be finite and positive",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "iteration cap must be at least 1",
            });
        }

        let metric = match &self.metric {
            Some(metric) => {
                if metric.dim() != p {
                    return Err(Error::DimensionMismatch {
                        expected: p,
                        found: metric.dim(),
                    });
                }
                metric.clone()
            }
            None => Tokhura::unit(p),
        };
        let weights = metric.weights();

        // Initialize RNG
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let data = universe.as_array();

        let mut codewords = match &self.initial {
            Some(initial) => {
                if initial.len() != self.k {
                    return Err(Error::InvalidParameter {
                        name: "initial_codebook",
                        message: "initial codebook row count differs from k",
                    });
                }
                if initial.dim() != p {
                    return Err(Error::DimensionMismatch {
                        expected: p,
                        found: initial.dim(),
                    });
                }
                initial.as_array().clone()
            }
            None => init_codebook(data, self.k, &mut rng),
        };

        // The +inf sentinel guarantees the first comparison never
        // converges, so at least two passes run before the delta test can
        // fire.
        let mut previous = f64::INFINITY;
        let mut current = 0.0f64;
        let mut converged = false;
        let mut iterations = 0;
        let mut reseeded_regions = 0;

        for iter in 0..self.max_iter {
            let pass = assign_pass(data, &codewords, weights);
            current = pass.total_distortion / m as f64;

            let reseeded = update_codewords(&mut codewords, &pass, data, &mut rng);
            reseeded_regions += reseeded;

            iterations = iter + 1;
            debug!(
                iteration = iterations,
                mean_distortion = current,
                reseeded,
                "assignment pass complete"
            );

            if (previous - current).abs() <= self.delta {
                converged = true;
                break;
            }
            previous = current;
        }

        Ok(Training {
            codebook: Codebook::from_array(codewords),
            mean_distortion: current,
            iterations,
            converged,
            reseeded_regions,
        })
    }
}

/// Per-pass accumulator: region sums, region sizes, total distortion.
///
/// Zeroed for every pass; never reused across iterations.
struct AssignPass {
    sums: Array2<f32>,
    counts: Vec<usize>,
    total_distortion: f64,
}

/// One full pass over the universe: nearest codeword per vector, region
/// sum/count accumulation, total distortion.
fn assign_pass(data: &Array2<f32>, codewords: &Array2<f32>, weights: &[f32]) -> AssignPass {
    let n = data.nrows();
    let k = codewords.nrows();
    let p = codewords.ncols();

    // Each vector's nearest-codeword query is independent of every other;
    // only the accumulation below needs to be sequential.
    #[cfg(feature = "parallel")]
    let nearest: Vec<Nearest> = (0..n)
        .into_par_iter()
        .map(|i| nearest_codeword(&data.row(i), codewords, weights))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let nearest: Vec<Nearest> = (0..n)
        .map(|i| nearest_codeword(&data.row(i), codewords, weights))
        .collect();

    let mut sums = Array2::<f32>::zeros((k, p));
    let mut counts = vec![0usize; k];
    let mut total_distortion = 0.0f64;

    for (i, near) in nearest.iter().enumerate() {
        total_distortion += f64::from(near.distance);
        counts[near.index] += 1;
        for j in 0..p {
            sums[[near.index, j]] += data[[i, j]];
        }
    }

    AssignPass {
        sums,
        counts,
        total_distortion,
    }
}

/// Replace every codeword with the mean of its region. Empty regions are
/// reseeded from a random universe vector; returns how many were.
fn update_codewords(
    codewords: &mut Array2<f32>,
    pass: &AssignPass,
    data: &Array2<f32>,
    rng: &mut impl Rng,
) -> usize {
    let k = codewords.nrows();
    let p = codewords.ncols();
    let mut reseeded = 0;

    for i in 0..k {
        if pass.counts[i] > 0 {
            for j in 0..p {
                codewords[[i, j]] = pass.sums[[i, j]] / pass.counts[i] as f32;
            }
        } else {
            let source = rng.random_range(0..data.nrows());
            codewords.row_mut(i).assign(&data.row(source));
            reseeded += 1;
            debug!(region = i, source, "reseeded empty region");
        }
    }

    reseeded
}

/// Seed a codebook with `k` universe rows drawn uniformly at random,
/// with replacement: the same row may seed more than one codeword.
fn init_codebook(data: &Array2<f32>, k: usize, rng: &mut impl Rng) -> Array2<f32> {
    let p = data.ncols();
    let mut codewords = Array2::zeros((k, p));

    for i in 0..k {
        let row = rng.random_range(0..data.nrows());
        codewords.row_mut(i).assign(&data.row(row));
    }

    codewords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_universe() -> Universe {
        Universe::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_two_clusters_converge_to_region_means() {
        let universe = two_cluster_universe();
        let training = Lbg::new(2).with_seed(42).train(&universe).unwrap();

        assert!(training.converged);
        assert!((training.mean_distortion - 0.25).abs() < 1e-3);

        let mut rows = training.codebook.to_rows();
        rows.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap());

        assert!((rows[0][0] - 0.0).abs() < 1e-4);
        assert!((rows[0][1] - 0.5).abs() < 1e-4);
        assert!((rows[1][0] - 10.0).abs() < 1e-4);
        assert!((rows[1][1] - 10.5).abs() < 1e-4);
    }

    #[test]
    fn test_single_codeword_converges_to_universe_mean() {
        let universe = Universe::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![3.0, 2.0, 1.0],
            vec![2.0, 5.0, 2.0],
            vec![6.0, 3.0, 2.0],
        ])
        .unwrap();

        let training = Lbg::new(1).with_seed(7).train(&universe).unwrap();

        assert!(training.converged);
        let rows = training.codebook.to_rows();
        assert!((rows[0][0] - 3.0).abs() < 1e-5);
        assert!((rows[0][1] - 3.0).abs() < 1e-5);
        assert!((rows[0][2] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_codebook_larger_than_universe_rejected() {
        let universe =
            Universe::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]]).unwrap();
        let result = Lbg::new(5).train(&universe);

        assert_eq!(
            result,
            Err(Error::InvalidCodebookSize {
                requested: 5,
                n_vectors: 3
            })
        );
    }

    #[test]
    fn test_zero_codebook_size_rejected() {
        let universe = two_cluster_universe();
        assert!(matches!(
            Lbg::new(0).train(&universe),
            Err(Error::InvalidCodebookSize { requested: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_delta_rejected() {
        let universe = two_cluster_universe();
        for delta in [0.0, -1.0, f64::NAN] {
            let result = Lbg::new(2).with_delta(delta).train(&universe);
            assert!(matches!(
                result,
                Err(Error::InvalidParameter { name: "delta", .. })
            ));
        }
    }

    #[test]
    fn test_zero_iteration_cap_rejected() {
        let universe = two_cluster_universe();
        let result = Lbg::new(2).with_max_iter(0).train(&universe);
        assert!(matches!(
            result,
            Err(Error::InvalidParameter {
                name: "max_iter",
                ..
            })
        ));
    }

    #[test]
    fn test_metric_dimension_mismatch_rejected() {
        let universe = two_cluster_universe();
        let result = Lbg::new(2)
            .with_metric(Tokhura::cepstral12())
            .train(&universe);

        assert_eq!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 12
            })
        );
    }

    #[test]
    fn test_initial_codebook_validated() {
        let universe = two_cluster_universe();

        let wrong_rows = Codebook::from_rows(&[vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            Lbg::new(2)
                .with_initial_codebook(wrong_rows)
                .train(&universe),
            Err(Error::InvalidParameter {
                name: "initial_codebook",
                ..
            })
        ));

        let wrong_dim = Codebook::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(
            Lbg::new(2).with_initial_codebook(wrong_dim).train(&universe),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_empty_region_reseeded() {
        // An adversarial warm start: the second codeword is so far away it
        // receives nothing in the first pass.
        let universe =
            Universe::from_rows(&[vec![0.0, 0.0], vec![0.1, 0.0], vec![0.0, 0.1]]).unwrap();
        let far = Codebook::from_rows(&[vec![0.0, 0.0], vec![1000.0, 1000.0]]).unwrap();

        let training = Lbg::new(2)
            .with_initial_codebook(far)
            .with_seed(11)
            .train(&universe)
            .unwrap();

        assert!(training.reseeded_regions >= 1);
        for row in training.codebook.to_rows() {
            for value in row {
                assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let universe = two_cluster_universe();
        assert_eq!(Lbg::new(2).codebook_size(), 2);

        let first = Lbg::new(2).with_seed(42).train(&universe).unwrap();
        let second = Lbg::new(2).with_seed(42).train(&universe).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_first_comparison_never_converges() {
        // The previous-distortion sentinel starts at +inf, so a run capped
        // at one iteration must report non-convergence.
        let universe = two_cluster_universe();
        let training = Lbg::new(2)
            .with_seed(42)
            .with_max_iter(1)
            .train(&universe)
            .unwrap();

        assert!(!training.converged);
        assert_eq!(training.iterations, 1);
        assert!(training.mean_distortion.is_finite());
    }

    #[test]
    fn test_distortion_non_increasing_across_caps() {
        // Warm-started runs share a deterministic trajectory, so training
        // with a larger cap replays the shorter run's passes. The mean
        // distortion observed at increasing caps must never rise.
        let universe = Universe::from_rows(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![5.0, 5.0],
            vec![6.0, 5.0],
            vec![5.0, 6.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![10.0, 1.0],
        ])
        .unwrap();
        let start =
            Codebook::from_rows(&[vec![0.0, 0.0], vec![5.0, 5.0], vec![10.0, 0.0]]).unwrap();

        let mut last = f64::INFINITY;
        for cap in 1..=6 {
            let training = Lbg::new(3)
                .with_initial_codebook(start.clone())
                .with_max_iter(cap)
                .train(&universe)
                .unwrap();
            assert_eq!(training.reseeded_regions, 0);
            assert!(
                training.mean_distortion <= last + 1e-9,
                "distortion rose at cap {cap}: {} > {last}",
                training.mean_distortion
            );
            last = training.mean_distortion;
        }
    }

    #[test]
    fn test_extra_cycle_on_converged_codebook_is_idempotent() {
        let universe = two_cluster_universe();
        let delta = 1e-5;

        let first = Lbg::new(2)
            .with_seed(42)
            .with_delta(delta)
            .train(&universe)
            .unwrap();
        assert!(first.converged);

        let again = Lbg::new(2)
            .with_initial_codebook(first.codebook.clone())
            .with_max_iter(1)
            .train(&universe)
            .unwrap();

        assert!((again.mean_distortion - first.mean_distortion).abs() < delta);
    }

    #[test]
    fn test_codebook_size_equal_to_universe() {
        let rows = vec![vec![0.0, 0.0], vec![5.0, 0.0], vec![0.0, 5.0]];
        let universe = Universe::from_rows(&rows).unwrap();
        let start = Codebook::from_rows(&rows).unwrap();

        let training = Lbg::new(3)
            .with_initial_codebook(start)
            .train(&universe)
            .unwrap();

        assert!(training.converged);
        assert_eq!(training.mean_distortion, 0.0);
    }

    #[test]
    fn test_weights_steer_the_partition() {
        // Four corners of a unit square; the heavily weighted dimension
        // decides which pairs end up sharing a region.
        let universe = Universe::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        let start = Codebook::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();

        let by_first = Lbg::new(2)
            .with_metric(Tokhura::new(vec![100.0, 1.0]).unwrap())
            .with_initial_codebook(start.clone())
            .train(&universe)
            .unwrap();
        let mut rows = by_first.codebook.to_rows();
        rows.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap());
        assert!((rows[0][0] - 0.0).abs() < 1e-4);
        assert!((rows[0][1] - 0.5).abs() < 1e-4);
        assert!((rows[1][0] - 1.0).abs() < 1e-4);
        assert!((rows[1][1] - 0.5).abs() < 1e-4);

        let by_second = Lbg::new(2)
            .with_metric(Tokhura::new(vec![1.0, 100.0]).unwrap())
            .with_initial_codebook(start)
            .train(&universe)
            .unwrap();
        let mut rows = by_second.codebook.to_rows();
        rows.sort_by(|a, b| a[1].partial_cmp(&b[1]).unwrap());
        assert!((rows[0][0] - 0.5).abs() < 1e-4);
        assert!((rows[0][1] - 0.0).abs() < 1e-4);
        assert!((rows[1][0] - 0.5).abs() < 1e-4);
        assert!((rows[1][1] - 1.0).abs() < 1e-4);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_mean_distortion_non_negative_and_finite(
                (k, rows) in (1usize..5, 1usize..6).prop_flat_map(|(k, dim)| {
                    (
                        Just(k),
                        proptest::collection::vec(
                            proptest::collection::vec(-100.0f32..100.0, dim),
                            k..40,
                        ),
                    )
                })
            ) {
                let universe = Universe::from_rows(&rows).unwrap();
                let training = Lbg::new(k)
                    .with_seed(7)
                    .with_max_iter(25)
                    .train(&universe)
                    .unwrap();

                prop_assert!(training.mean_distortion >= 0.0);
                prop_assert!(training.mean_distortion.is_finite());
                prop_assert!(training.iterations >= 1);
                prop_assert!(training.iterations <= 25);
                for row in training.codebook.to_rows() {
                    for value in row {
                        prop_assert!(value.is_finite());
                    }
                }
            }
        }
    }
}
