use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every tunable of the theme pipeline.
///
/// Missing keys in a config file fall back to the defaults below, so a file
/// containing only `{"max_themes": 5}` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Smallest group that may become a theme. Also the DBSCAN `min_samples`.
    pub min_ideas_per_theme: usize,
    /// Upper bound on the number of themes (and on k for k-means).
    pub max_themes: usize,
    /// Vocabulary cap, keeping the most frequent terms.
    pub max_features: usize,
    /// Terms must appear in at least this many documents.
    pub min_df: usize,
    /// Terms appearing in more than this fraction of documents are dropped.
    pub max_df: f64,
    /// Vocabularies larger than this are reduced with truncated SVD.
    pub svd_threshold: usize,
    /// Maximum number of latent dimensions kept by SVD.
    pub max_components: usize,
    /// Seed for k-means++ initialisation.
    pub seed: u64,
    pub max_iter: usize,
    pub tol: f64,
    /// DBSCAN neighbourhood radius.
    pub dbscan_eps: f64,
    pub name_max_len: usize,
    pub description_max_len: usize,
    /// Characters taken from each member text when building a description.
    pub summary_chars: usize,
    /// Member texts consulted when building a description.
    pub description_texts: usize,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            min_ideas_per_theme: 2,
            max_themes: 8,
            max_features: 5000,
            min_df: 1,
            max_df: 0.8,
            svd_threshold: 100,
            max_components: 100,
            seed: 42,
            max_iter: 300,
            tol: 1e-4,
            dbscan_eps: 0.5,
            name_max_len: 40,
            description_max_len: 120,
            summary_chars: 40,
            description_texts: 3,
        }
    }
}

impl ThemeConfig {
    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ideas_per_theme == 0 {
            return Err(ConfigError::Invalid(
                "min_ideas_per_theme must be at least 1".into(),
            ));
        }
        if self.max_themes == 0 {
            return Err(ConfigError::Invalid("max_themes must be at least 1".into()));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(ConfigError::Invalid("max_features must be at least 1".into()));
        }
        if !(self.dbscan_eps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "dbscan_eps must be positive, got {}",
                self.dbscan_eps
            )));
        }
        Ok(())
    }

    /// Number of k-means clusters for `n` ideas: one per three ideas,
    /// clamped to `[2, max_themes]`.
    pub fn target_cluster_count(&self, n: usize) -> usize {
        (n / 3).max(2).min(self.max_themes)
    }
}

/// Parse a config from a JSON string. Call `validate` before use.
pub fn parse_config(json: &str) -> Result<ThemeConfig, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load a config file from disk.
pub fn load_config(path: &str) -> Result<ThemeConfig, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    let config = parse_config(&json).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Resolve the active configuration:
///
/// 1. An explicit `path` (CLI `--config`)
/// 2. `$THEMES_CONFIG` env var (path to JSON file)
/// 3. Built-in defaults
///
/// An explicit path that fails to load is an error; a broken env var path
/// falls through to the defaults.
pub fn resolve_config(path: Option<&str>) -> Result<ThemeConfig, ConfigError> {
    if let Some(path) = path {
        return load_config(path);
    }

    if let Ok(path) = std::env::var("THEMES_CONFIG") {
        match load_config(&path) {
            Ok(config) => return Ok(config),
            Err(e) => tracing::warn!(error = %e, "ignoring THEMES_CONFIG"),
        }
    }

    Ok(ThemeConfig::default())
}
