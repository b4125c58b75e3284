//! Idea-to-theme clustering: normalize free-text ideas, vectorize them with
//! TF-IDF, cluster with k-means (DBSCAN fallback) and name each cluster.

pub mod algo;
pub mod config;
pub mod engine;
pub mod error;
pub mod ops;

pub use config::ThemeConfig;
pub use engine::{Idea, Theme, ThemeEngine, ThemeResult};
pub use error::ThemeError;
