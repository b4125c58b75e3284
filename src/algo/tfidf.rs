use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

use crate::algo::lexicon::english_stopwords;
use crate::algo::svd;
use crate::config::ThemeConfig;
use crate::error::VectorizeError;

/// What the columns of a [`FeatureMatrix`] stand for.
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// One column per vocabulary term, alphabetical.
    Terms(Vec<String>),
    /// Latent dimensions after truncated SVD.
    Latent(usize),
}

/// Dense document-feature matrix, one row per input document in input order.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub columns: Columns,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Vocabulary terms, or `None` once the matrix has been reduced.
    pub fn terms(&self) -> Option<&[String]> {
        match &self.columns {
            Columns::Terms(terms) => Some(terms),
            Columns::Latent(_) => None,
        }
    }
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Split a document into lowercase terms of two or more word characters,
/// dropping English stopwords.
pub fn analyze(text: &str) -> Vec<String> {
    let stopwords = english_stopwords();
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stopwords.contains(*t))
        .map(str::to_string)
        .collect()
}

/// TF-IDF vectorizer fitted fresh on every corpus.
///
/// Raw counts weighted by smoothed IDF `ln((1 + n) / (1 + df)) + 1`, rows
/// L2-normalized. Vocabularies wider than `svd_threshold` are reduced to
/// `min(max_components, n_docs - 1)` latent dimensions.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    pub max_features: usize,
    pub min_df: usize,
    pub max_df: f64,
    pub svd_threshold: usize,
    pub max_components: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

impl TfidfVectorizer {
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            max_features: config.max_features,
            min_df: config.min_df,
            max_df: config.max_df,
            svd_threshold: config.svd_threshold,
            max_components: config.max_components,
        }
    }

    /// Build the vocabulary: document-frequency pruning, then the
    /// `max_features` most frequent terms (ties alphabetical), returned in
    /// alphabetical order.
    pub fn build_vocabulary(&self, docs: &[Vec<String>]) -> Result<Vec<String>, VectorizeError> {
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total: HashMap<&str, usize> = HashMap::new();
        for tokens in docs {
            let mut seen: Vec<&str> = Vec::with_capacity(tokens.len());
            for token in tokens {
                *total.entry(token.as_str()).or_insert(0) += 1;
                if !seen.contains(&token.as_str()) {
                    seen.push(token.as_str());
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        if doc_freq.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let max_doc_count = self.max_df * docs.len() as f64;
        let mut kept: Vec<&str> = doc_freq
            .iter()
            .filter(|&(_, &df)| df >= self.min_df && (df as f64) <= max_doc_count)
            .map(|(&term, _)| term)
            .collect();

        if kept.is_empty() {
            return Err(VectorizeError::NoTermsRemain {
                max_df: self.max_df.to_string(),
                documents: docs.len(),
            });
        }

        if kept.len() > self.max_features {
            // stable sort keeps alphabetical order among equal counts
            kept.sort_by(|a, b| total[b].cmp(&total[a]));
            kept.truncate(self.max_features);
            kept.sort_unstable();
        }

        Ok(kept.into_iter().map(str::to_string).collect())
    }

    /// Fit on `docs` and return their weighted matrix.
    pub fn fit_transform(&self, docs: &[String]) -> Result<FeatureMatrix, VectorizeError> {
        let tokenized: Vec<Vec<String>> = docs.par_iter().map(|d| analyze(d)).collect();
        let vocabulary = self.build_vocabulary(&tokenized)?;
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let n_docs = docs.len();
        let mut values = Array2::<f64>::zeros((n_docs, vocabulary.len()));
        for (row, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = index.get(token.as_str()) {
                    values[[row, col]] += 1.0;
                }
            }
        }

        let idf: Vec<f64> = values
            .axis_iter(Axis(1))
            .map(|col| {
                let df = col.iter().filter(|&&c| c > 0.0).count() as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        for mut row in values.axis_iter_mut(Axis(0)) {
            for (v, w) in row.iter_mut().zip(&idf) {
                *v *= w;
            }
            let norm = row.mapv(|v| v * v).sum().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }

        debug!(
            documents = n_docs,
            terms = vocabulary.len(),
            "built tf-idf matrix"
        );

        let matrix = FeatureMatrix {
            values,
            columns: Columns::Terms(vocabulary),
        };
        self.reduce(matrix)
    }

    /// Apply truncated SVD when the vocabulary is wider than the threshold.
    pub fn reduce(&self, matrix: FeatureMatrix) -> Result<FeatureMatrix, VectorizeError> {
        let components = self.max_components.min(matrix.n_rows().saturating_sub(1));
        if matrix.n_cols() <= self.svd_threshold || components == 0 {
            return Ok(matrix);
        }
        let reduced = svd::truncated_svd(&matrix.values, components)?;
        debug!(
            from = matrix.n_cols(),
            to = reduced.ncols(),
            "reduced feature matrix with truncated svd"
        );
        let columns = Columns::Latent(reduced.ncols());
        Ok(FeatureMatrix {
            values: reduced,
            columns,
        })
    }
}
