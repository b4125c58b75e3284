use linfa::traits::Transformer;
use linfa_clustering::Dbscan as LinfaDbscan;
use ndarray::Array2;
use tracing::debug;

use crate::algo::kmeans::check_matrix;
use crate::error::ClusterError;

/// Density-based clustering with Euclidean distance, backed by
/// `linfa-clustering`.
///
/// A point is a core point when at least `min_samples` points (itself
/// included) lie within `eps`. Points not reachable from any core point are
/// noise (`None`).
#[derive(Debug, Clone)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Labels in row order; clusters are numbered in discovery order.
    pub fn fit(&self, x: &Array2<f64>) -> Result<Vec<Option<usize>>, ClusterError> {
        if !(self.eps > 0.0) {
            return Err(ClusterError::InvalidParameter(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.min_samples < 2 {
            return Err(ClusterError::InvalidParameter(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        check_matrix(x)?;

        let labels = LinfaDbscan::params(self.min_samples)
            .tolerance(self.eps)
            .transform(x)
            .map_err(|e| ClusterError::InvalidParameter(e.to_string()))?
            .to_vec();

        let clusters = labels.iter().flatten().max().map_or(0, |&c| c + 1);
        let noise = labels.iter().filter(|l| l.is_none()).count();
        debug!(clusters, noise, "dbscan finished");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn finds_dense_groups_and_noise() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [20.0, 20.0]
        ];
        let labels = Dbscan::new(0.5, 2).fit(&x).unwrap();
        assert_eq!(
            labels,
            vec![Some(0), Some(0), Some(0), Some(1), Some(1), None]
        );
    }

    #[test]
    fn point_counts_toward_its_own_neighbourhood() {
        let x = array![[0.0], [0.3]];
        let labels = Dbscan::new(0.5, 2).fit(&x).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0)]);
    }

    #[test]
    fn border_points_join_but_do_not_expand() {
        // 0.4 apart steps with min_samples = 3 leave the end points as border points
        let x = array![[0.0], [0.4], [0.8], [1.2]];
        let labels = Dbscan::new(0.45, 3).fit(&x).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), Some(0)]);

        let x = array![[0.0], [0.4], [0.8], [1.6]];
        let labels = Dbscan::new(0.45, 3).fit(&x).unwrap();
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn all_noise_when_sparse() {
        let x = array![[0.0, 0.0], [3.0, 0.0], [0.0, 3.0]];
        let labels = Dbscan::new(0.5, 2).fit(&x).unwrap();
        assert!(labels.iter().all(Option::is_none));
    }

    #[test]
    fn rejects_bad_parameters() {
        let x = array![[0.0], [1.0]];
        assert!(Dbscan::new(0.0, 2).fit(&x).is_err());
        assert!(Dbscan::new(0.5, 0).fit(&x).is_err());
        assert!(Dbscan::new(0.5, 1).fit(&x).is_err());
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(
            Dbscan::new(0.5, 2).fit(&empty).unwrap_err(),
            ClusterError::EmptyMatrix
        );
    }
}
