use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

use crate::error::ClusterError;

/// Simple Linear Congruential Generator for deterministic seeding.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    pub fn next(&mut self) -> u64 {
        // LCG constants from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// k-means parameters. One k-means++ initialisation, then Lloyd iterations.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iter: usize,
    /// Relative to the mean per-feature variance of the data.
    pub tol: f64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centers: Array2<f64>,
    pub inertia: f64,
    pub n_iter: usize,
}

pub(crate) fn check_matrix(x: &Array2<f64>) -> Result<(), ClusterError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ClusterError::EmptyMatrix);
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ClusterError::NonFinite);
    }
    Ok(())
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the nearest center; ties go to the lowest index.
fn nearest(row: ArrayView1<f64>, centers: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centers.axis_iter(Axis(0)).enumerate() {
        let d = squared_distance(row, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn mean_variance(x: &Array2<f64>) -> f64 {
    let n = x.nrows() as f64;
    let mut total = 0.0;
    for col in x.axis_iter(Axis(1)) {
        let mean = col.sum() / n;
        total += col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    }
    total / x.ncols() as f64
}

impl KMeans {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            seed,
            max_iter: 300,
            tol: 1e-4,
        }
    }

    /// k-means++ seeding driven by [`LcgRng`].
    ///
    /// When every remaining point sits on a chosen center the lowest unused
    /// index is taken.
    fn init_centers(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut rng = LcgRng::new(self.seed);
        let mut chosen: Vec<usize> = Vec::with_capacity(self.n_clusters);
        chosen.push((rng.next() % n as u64) as usize);

        let mut closest: Vec<f64> = x
            .axis_iter(Axis(0))
            .map(|row| squared_distance(row, x.row(chosen[0])))
            .collect();

        while chosen.len() < self.n_clusters {
            let potential: f64 = closest.iter().sum();
            let next = if potential > 0.0 {
                let target = rng.next_f64() * potential;
                let mut acc = 0.0;
                let mut pick = None;
                for (i, &d) in closest.iter().enumerate() {
                    acc += d;
                    if d > 0.0 && acc > target {
                        pick = Some(i);
                        break;
                    }
                }
                // rounding can leave target just past the last bucket
                pick.or_else(|| closest.iter().rposition(|&d| d > 0.0))
            } else {
                None
            };
            let next = next
                .or_else(|| (0..n).find(|i| !chosen.contains(i)))
                .unwrap_or(0);
            chosen.push(next);

            for (i, row) in x.axis_iter(Axis(0)).enumerate() {
                let d = squared_distance(row, x.row(next));
                if d < closest[i] {
                    closest[i] = d;
                }
            }
        }

        let mut centers = Array2::<f64>::zeros((self.n_clusters, x.ncols()));
        for (c, &i) in chosen.iter().enumerate() {
            centers.row_mut(c).assign(&x.row(i));
        }
        centers
    }

    /// Fit on `x` (rows are samples) and return labels in row order.
    pub fn fit(&self, x: &Array2<f64>) -> Result<KMeansFit, ClusterError> {
        if self.n_clusters == 0 {
            return Err(ClusterError::NoClusters);
        }
        if self.max_iter == 0 {
            return Err(ClusterError::InvalidParameter(
                "max_iter must be at least 1".into(),
            ));
        }
        check_matrix(x)?;
        if x.nrows() < self.n_clusters {
            return Err(ClusterError::TooFewSamples {
                samples: x.nrows(),
                clusters: self.n_clusters,
            });
        }

        let n = x.nrows();
        let k = self.n_clusters;
        let tol = self.tol * mean_variance(x);

        let mut centers = self.init_centers(x);
        let mut labels = vec![usize::MAX; n];
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            let new_labels: Vec<usize> = x
                .axis_iter(Axis(0))
                .map(|row| nearest(row, &centers).0)
                .collect();

            let mut sums = Array2::<f64>::zeros(centers.dim());
            let mut counts = Array1::<f64>::zeros(k);
            for (i, &label) in new_labels.iter().enumerate() {
                counts[label] += 1.0;
                let mut sum = sums.row_mut(label);
                sum += &x.row(i);
            }

            let mut shift = 0.0;
            for c in 0..k {
                // empty cluster keeps its previous center
                if counts[c] > 0.0 {
                    let center = sums.row(c).mapv(|v| v / counts[c]);
                    shift += squared_distance(center.view(), centers.row(c));
                    centers.row_mut(c).assign(&center);
                }
            }

            if new_labels == labels {
                break;
            }
            labels = new_labels;
            if shift <= tol {
                // labels must reflect the final centers
                labels = x
                    .axis_iter(Axis(0))
                    .map(|row| nearest(row, &centers).0)
                    .collect();
                break;
            }
        }

        let inertia: f64 = x
            .axis_iter(Axis(0))
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, centers.row(label)))
            .sum();

        debug!(k, n_iter, inertia, "k-means converged");

        Ok(KMeansFit {
            labels,
            centers,
            inertia,
            n_iter,
        })
    }
}
