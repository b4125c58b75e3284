//! Idea → theme orchestration.
//!
//! [`ThemeEngine::compute_themes`] never fails: input that is too small,
//! vocabularies that prune to nothing and clusterers that give up all end in
//! a smaller (possibly empty) [`ThemeResult`], logged on the way.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::algo::clustering;
use crate::algo::concepts::{default_concepts, ConceptTable};
use crate::algo::labeler::{Labeler, ThemeLabel};
use crate::algo::lexicon::{shared_model, SharedModel};
use crate::algo::normalize::normalize;
use crate::algo::tfidf::TfidfVectorizer;
use crate::config::ThemeConfig;
use crate::error::ThemeError;

/// One submitted idea. Content that is missing, null or not a string is
/// treated as empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    #[serde(default, deserialize_with = "text_or_none")]
    pub content: Option<String>,
}

impl Idea {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
        }
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// A named group of ideas, minted fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub idea_count: usize,
}

/// Themes plus the idea id → theme id mapping for every themed idea.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeResult {
    pub themes: Vec<Theme>,
    pub mapping: BTreeMap<String, String>,
}

impl ThemeResult {
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

/// Clusters ideas into labelled themes.
pub struct ThemeEngine {
    config: ThemeConfig,
    model: SharedModel,
    concepts: ConceptTable,
}

impl ThemeEngine {
    /// Engine backed by the process-wide linguistic model and concept table.
    pub fn new(config: ThemeConfig) -> Self {
        Self::with_model(config, shared_model())
    }

    /// Engine with an explicit model; `None` forces degraded mode.
    pub fn with_model(config: ThemeConfig, model: SharedModel) -> Self {
        Self {
            config,
            model,
            concepts: default_concepts(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    pub fn normalize(&self, text: Option<&str>) -> String {
        normalize(text, self.model.as_deref())
    }

    pub fn label<S: AsRef<str>>(&self, texts: &[S]) -> ThemeLabel {
        Labeler::new(self.model.as_deref(), &self.concepts, &self.config).label(texts)
    }

    /// Group `ideas` into themes. Ideas in input order; ids should be unique.
    pub fn compute_themes(&self, ideas: &[Idea]) -> ThemeResult {
        match self.run(ideas) {
            Ok(result) => result,
            Err(ThemeError::InsufficientInput { required, actual }) => {
                debug!(required, actual, "not enough ideas for themes");
                ThemeResult::default()
            }
            Err(e) => {
                warn!(error = %e, ideas = ideas.len(), "theme generation failed");
                ThemeResult::default()
            }
        }
    }

    fn run(&self, ideas: &[Idea]) -> Result<ThemeResult, ThemeError> {
        self.config.validate()?;
        let min = self.config.min_ideas_per_theme;
        if ideas.len() < min {
            return Err(ThemeError::InsufficientInput {
                required: min,
                actual: ideas.len(),
            });
        }

        let model = self.model.as_deref();
        let normalized: Vec<String> = ideas
            .par_iter()
            .map(|idea| normalize(idea.content.as_deref(), model))
            .collect();
        debug_assert_eq!(normalized.len(), ideas.len(), "normalization dropped rows");

        let matrix = TfidfVectorizer::from_config(&self.config).fit_transform(&normalized)?;
        let k = self.config.target_cluster_count(ideas.len());
        let assignment = clustering::assign(&matrix.values, k, &self.config);
        let groups = assignment.groups(min, self.config.max_themes);

        let labeler = Labeler::new(model, &self.concepts, &self.config);
        let mut result = ThemeResult::default();
        for group in groups {
            let texts: Vec<&str> = group.iter().map(|&i| ideas[i].text()).collect();
            let ThemeLabel { name, description } = labeler.label(&texts);
            let id = Uuid::new_v4();
            for &i in &group {
                result.mapping.insert(ideas[i].id.clone(), id.to_string());
            }
            result.themes.push(Theme {
                id,
                name,
                description,
                idea_count: group.len(),
            });
        }

        info!(
            ideas = ideas.len(),
            k,
            method = assignment.method.as_str(),
            themes = result.themes.len(),
            themed = result.mapping.len(),
            degraded = self.is_degraded(),
            "computed themes"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::algo::lexicon::Lexicon;

    fn engine() -> ThemeEngine {
        ThemeEngine::with_model(ThemeConfig::default(), Some(Arc::new(Lexicon::standard())))
    }

    #[test]
    fn idea_content_is_lenient() {
        let idea: Idea = serde_json::from_str(r#"{"id": "a", "content": 42}"#).unwrap();
        assert_eq!(idea.content, None);
        let idea: Idea = serde_json::from_str(r#"{"id": "b"}"#).unwrap();
        assert_eq!(idea.content, None);
        let idea: Idea = serde_json::from_str(r#"{"id": "c", "content": null}"#).unwrap();
        assert_eq!(idea.text(), "");
        let idea: Idea = serde_json::from_str(r#"{"id": "d", "content": "menu"}"#).unwrap();
        assert_eq!(idea.text(), "menu");
    }

    #[test]
    fn too_few_ideas_is_empty() {
        let result = engine().compute_themes(&[Idea::new("1", "Seasonal menu")]);
        assert!(result.is_empty());
        assert!(result.mapping.is_empty());
    }

    #[test]
    fn invalid_config_is_empty() {
        let config = ThemeConfig {
            max_df: 0.0,
            ..ThemeConfig::default()
        };
        let engine = ThemeEngine::with_model(config, None);
        let ideas = vec![Idea::new("1", "menu"), Idea::new("2", "staff")];
        assert!(engine.compute_themes(&ideas).is_empty());
    }

    #[test]
    fn process_model_engine_handles_empty_input() {
        let engine = ThemeEngine::new(ThemeConfig::default());
        assert!(engine.compute_themes(&[]).is_empty());
    }

    #[test]
    fn degraded_engine_reports_itself() {
        let engine = ThemeEngine::with_model(ThemeConfig::default(), None);
        assert!(engine.is_degraded());
        assert_eq!(engine.normalize(Some("Menus!")), "menus ");
        assert!(!self::engine().is_degraded());
    }

    #[test]
    fn theme_ids_match_mapping() {
        let ideas = vec![
            Idea::new("1", "Seasonal dessert menu"),
            Idea::new("2", "Rotate seasonal menu"),
            Idea::new("3", "Hire weekend staff"),
            Idea::new("4", "Staff recognition awards"),
        ];
        let result = engine().compute_themes(&ideas);
        for theme in &result.themes {
            let count = result
                .mapping
                .values()
                .filter(|v| **v == theme.id.to_string())
                .count();
            assert_eq!(count, theme.idea_count);
        }
    }
}
