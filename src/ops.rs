//! Shared operation wrappers for every interface (CLI, library callers).
//!
//! Each `op_*` function is a pure, synchronous wrapper around the engine and
//! the `algo` modules. Input and output are `serde_json::Value`, with no
//! dependency on clap or any transport.

use std::collections::HashSet;

use serde_json::Value;

use crate::algo::concepts::default_concepts;
use crate::algo::lexicon::SharedModel;
use crate::config::ThemeConfig;
use crate::engine::{Idea, ThemeEngine};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a text field from a JSON object, `None` if missing or not a string.
pub fn get_text(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(|v| v.as_str()).map(str::to_string)
}

/// Extract an id field as a string. Numbers are stringified; anything else
/// is `None`.
pub fn get_id(row: &Value, field: &str) -> Option<String> {
    match row.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert JSON rows into ideas, keeping input order.
///
/// Rows without a usable id get `#<row index>`, suffixed until it clashes
/// with no id supplied elsewhere in the input.
pub fn rows_to_ideas(rows: &[Value], id_field: &str, content_field: &str) -> Vec<Idea> {
    let explicit: Vec<Option<String>> = rows.iter().map(|row| get_id(row, id_field)).collect();
    let mut taken: HashSet<String> = explicit.iter().flatten().cloned().collect();

    rows.iter()
        .zip(explicit)
        .enumerate()
        .map(|(i, (row, id))| {
            let id = id.unwrap_or_else(|| {
                let mut candidate = format!("#{i}");
                let mut suffix = 1;
                while taken.contains(&candidate) {
                    candidate = format!("#{i}-{suffix}");
                    suffix += 1;
                }
                taken.insert(candidate.clone());
                candidate
            });
            Idea {
                id,
                content: get_text(row, content_field),
            }
        })
        .collect()
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn op_themes(
    rows: &[Value],
    id_field: &str,
    content_field: &str,
    config: &ThemeConfig,
    model: SharedModel,
) -> Result<Value, String> {
    config.validate().map_err(|e| e.to_string())?;

    let ideas = rows_to_ideas(rows, id_field, content_field);
    let engine = ThemeEngine::with_model(config.clone(), model);
    let result = engine.compute_themes(&ideas);

    let themes: Vec<Value> = result
        .themes
        .iter()
        .map(|t| {
            serde_json::json!({
                "id": t.id.to_string(),
                "name": t.name,
                "description": t.description,
                "idea_count": t.idea_count,
            })
        })
        .collect();

    Ok(serde_json::json!({
        "num_ideas": ideas.len(),
        "num_themes": themes.len(),
        "unthemed": ideas.len() - result.mapping.len().min(ideas.len()),
        "degraded": engine.is_degraded(),
        "themes": themes,
        "mapping": result.mapping,
    }))
}

pub fn op_normalize(text: Option<&str>, model: SharedModel) -> Value {
    let degraded = model.is_none();
    let engine = ThemeEngine::with_model(ThemeConfig::default(), model);
    serde_json::json!({
        "original": text,
        "normalized": engine.normalize(text),
        "degraded": degraded,
    })
}

pub fn op_label(texts: &[Value], config: &ThemeConfig, model: SharedModel) -> Result<Value, String> {
    if texts.is_empty() {
        return Err("Need at least 1 text to label".into());
    }
    let texts: Vec<&str> = texts.iter().map(|t| t.as_str().unwrap_or("")).collect();
    let engine = ThemeEngine::with_model(config.clone(), model);
    let label = engine.label(&texts);
    Ok(serde_json::json!({
        "name": label.name,
        "description": label.description,
        "size": texts.len(),
    }))
}

pub fn op_concepts() -> Result<Value, String> {
    serde_json::to_value(default_concepts()).map_err(|e| e.to_string())
}
