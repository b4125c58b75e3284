use ndarray::Array2;
use tracing::{debug, warn};

use crate::algo::dbscan::Dbscan;
use crate::algo::kmeans::KMeans;
use crate::config::ThemeConfig;
use crate::error::ClusterError;

/// Which strategy produced a [`ClusterAssignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    KMeans,
    Dbscan,
    /// Every strategy failed; nothing is clustered.
    Unclustered,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KMeans => "kmeans",
            Self::Dbscan => "dbscan",
            Self::Unclustered => "unclustered",
        }
    }
}

/// A clustering strategy over the rows of a dense matrix.
pub trait Clusterer: Send + Sync {
    fn method(&self) -> Method;
    /// One label per row, `None` for noise.
    fn cluster(&self, x: &Array2<f64>) -> Result<Vec<Option<usize>>, ClusterError>;
}

impl Clusterer for KMeans {
    fn method(&self) -> Method {
        Method::KMeans
    }

    fn cluster(&self, x: &Array2<f64>) -> Result<Vec<Option<usize>>, ClusterError> {
        Ok(self.fit(x)?.labels.into_iter().map(Some).collect())
    }
}

impl Clusterer for Dbscan {
    fn method(&self) -> Method {
        Method::Dbscan
    }

    fn cluster(&self, x: &Array2<f64>) -> Result<Vec<Option<usize>>, ClusterError> {
        self.fit(x)
    }
}

/// Row index → cluster label, `None` meaning noise / unclustered.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub labels: Vec<Option<usize>>,
    pub method: Method,
}

impl ClusterAssignment {
    pub fn unclustered(n: usize) -> Self {
        Self {
            labels: vec![None; n],
            method: Method::Unclustered,
        }
    }

    /// Row indices grouped by label, groups in order of first appearance.
    /// Groups smaller than `min_size` are dropped and at most `max_groups`
    /// are returned.
    pub fn groups(&self, min_size: usize, max_groups: usize) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        for (i, label) in self.labels.iter().enumerate() {
            let Some(label) = label else { continue };
            match order.iter().position(|l| l == label) {
                Some(slot) => members[slot].push(i),
                None => {
                    order.push(*label);
                    members.push(vec![i]);
                }
            }
        }

        let mut kept = Vec::new();
        for (label, group) in order.into_iter().zip(members) {
            if group.len() < min_size {
                debug!(label, size = group.len(), min_size, "dropping undersized cluster");
                continue;
            }
            if kept.len() == max_groups {
                debug!(label, "dropping cluster beyond max_themes");
                continue;
            }
            kept.push(group);
        }
        kept
    }
}

/// Try each clusterer in order and keep the first success.
pub fn assign_with(x: &Array2<f64>, clusterers: &[&dyn Clusterer]) -> ClusterAssignment {
    for clusterer in clusterers {
        match clusterer.cluster(x) {
            Ok(labels) => {
                debug!(method = clusterer.method().as_str(), "clustering succeeded");
                return ClusterAssignment {
                    labels,
                    method: clusterer.method(),
                };
            }
            Err(e) => warn!(
                method = clusterer.method().as_str(),
                error = %e,
                rows = x.nrows(),
                "clustering failed"
            ),
        }
    }
    ClusterAssignment::unclustered(x.nrows())
}

/// k-means with `k` clusters, falling back to DBSCAN, falling back to
/// leaving every row unclustered.
pub fn assign(x: &Array2<f64>, k: usize, config: &ThemeConfig) -> ClusterAssignment {
    let kmeans = KMeans {
        n_clusters: k,
        seed: config.seed,
        max_iter: config.max_iter,
        tol: config.tol,
    };
    let dbscan = Dbscan::new(config.dbscan_eps, config.min_ideas_per_theme);
    let chain: [&dyn Clusterer; 2] = [&kmeans, &dbscan];
    assign_with(x, &chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assignment(labels: Vec<Option<usize>>) -> ClusterAssignment {
        ClusterAssignment {
            labels,
            method: Method::KMeans,
        }
    }

    #[test]
    fn groups_follow_first_appearance() {
        let a = assignment(vec![Some(2), Some(0), Some(2), Some(0), Some(1), Some(1)]);
        assert_eq!(a.groups(2, 8), vec![vec![0, 2], vec![1, 3], vec![4, 5]]);
    }

    #[test]
    fn groups_skip_noise_and_small_clusters() {
        let a = assignment(vec![Some(0), None, Some(1), Some(0), None]);
        assert_eq!(a.groups(2, 8), vec![vec![0, 3]]);
    }

    #[test]
    fn groups_capped() {
        let a = assignment(vec![Some(0), Some(0), Some(1), Some(1), Some(2), Some(2)]);
        assert_eq!(a.groups(2, 2).len(), 2);
    }

    #[test]
    fn assign_uses_kmeans_when_possible() {
        let x = array![[0.0, 0.0], [0.0, 0.1], [5.0, 5.0], [5.0, 5.1]];
        let a = assign(&x, 2, &ThemeConfig::default());
        assert_eq!(a.method, Method::KMeans);
        assert_eq!(a.labels[0], a.labels[1]);
        assert_ne!(a.labels[0], a.labels[2]);
    }

    #[test]
    fn assign_falls_back_to_dbscan() {
        // k larger than the sample count makes k-means fail
        let x = array![[0.0, 0.0], [0.0, 0.1], [5.0, 5.0]];
        let a = assign(&x, 4, &ThemeConfig::default());
        assert_eq!(a.method, Method::Dbscan);
        assert_eq!(a.labels, vec![Some(0), Some(0), None]);
    }

    #[test]
    fn assign_gives_up_on_non_finite() {
        let x = array![[0.0, f64::INFINITY], [0.0, 0.1]];
        let a = assign(&x, 2, &ThemeConfig::default());
        assert_eq!(a.method, Method::Unclustered);
        assert_eq!(a.labels, vec![None, None]);
        assert!(a.groups(1, 8).is_empty());
    }
}
