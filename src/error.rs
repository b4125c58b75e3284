use thiserror::Error;

/// Errors raised inside the theme pipeline.
///
/// None of these reach callers of `ThemeEngine::compute_themes`; every variant
/// degrades to a smaller (possibly empty) result there.
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("need at least {required} ideas to form a theme, got {actual}")]
    InsufficientInput { required: usize, actual: usize },

    #[error("vectorization failed: {0}")]
    Vectorize(#[from] VectorizeError),

    #[error("clustering failed: {0}")]
    Cluster(#[from] ClusterError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures while building the TF-IDF matrix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("empty vocabulary; the documents only contain stopwords or nothing at all")]
    EmptyVocabulary,

    #[error("after pruning, no terms remain (max_df={max_df}, documents={documents})")]
    NoTermsRemain { max_df: String, documents: usize },

    #[error("truncated svd failed: {0}")]
    Reduction(String),
}

/// Failures from the partition or density clusterers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("requested zero clusters")]
    NoClusters,

    #[error("n_samples={samples} should be >= n_clusters={clusters}")]
    TooFewSamples { samples: usize, clusters: usize },

    #[error("feature matrix has no rows or no columns")]
    EmptyMatrix,

    #[error("feature matrix contains NaN or infinite values")]
    NonFinite,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failures while reading configuration or lexicon files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
