use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::algo::concepts::ConceptTable;
use crate::algo::lexicon::LanguageModel;
use crate::config::ThemeConfig;

/// Terms too specific to name a theme after.
const BLACKLIST: &[&str] = &["wine", "pairing", "wednesday", "murder", "mystery"];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Ordered keyword rules used without a model or when nothing salient is found.
const CASCADE: &[(&[&str], &str)] = &[
    (&["customer", "loyalty"], "Customer Experience"),
    (&["menu", "food", "seasonal"], "Menu & Food Innovation"),
    (&["app", "mobile", "technology"], "Technology Solutions"),
    (&["staff", "employee"], "Staff & Operations"),
    (&["marketing", "social"], "Marketing & Promotion"),
    (&["event", "dinner"], "Events & Entertainment"),
];

const DEFAULT_NAME: &str = "Business Innovation";
const DEFAULT_DESCRIPTION: &str = "A collection of related ideas";

/// Name and description for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeLabel {
    pub name: String,
    pub description: String,
}

/// Names and describes clusters of idea texts.
pub struct Labeler<'a> {
    model: Option<&'a dyn LanguageModel>,
    concepts: &'a ConceptTable,
    name_max_len: usize,
    description_max_len: usize,
    summary_chars: usize,
    description_texts: usize,
}

impl<'a> Labeler<'a> {
    pub fn new(
        model: Option<&'a dyn LanguageModel>,
        concepts: &'a ConceptTable,
        config: &ThemeConfig,
    ) -> Self {
        Self {
            model,
            concepts,
            name_max_len: config.name_max_len,
            description_max_len: config.description_max_len,
            summary_chars: config.summary_chars,
            description_texts: config.description_texts,
        }
    }

    pub fn label<S: AsRef<str>>(&self, texts: &[S]) -> ThemeLabel {
        ThemeLabel {
            name: self.name(texts),
            description: self.description(texts),
        }
    }

    /// Lowercase lemmas of the content words (nouns, verbs, adjectives)
    /// longer than three characters, in text order.
    pub fn salient_tokens(&self, text: &str) -> Vec<String> {
        let Some(model) = self.model else {
            return Vec::new();
        };
        text.unicode_words()
            .filter(|w| w.chars().count() > 3)
            .map(str::to_lowercase)
            .filter(|w| !model.is_stopword(w) && model.part_of_speech(w).is_content())
            .map(|w| model.lemma(&w))
            .collect()
    }

    pub fn name<S: AsRef<str>>(&self, texts: &[S]) -> String {
        let combined = join(texts);
        let name = self
            .concept_name(&combined)
            .unwrap_or_else(|| keyword_name(&combined).to_string());
        truncate_chars(&name, self.name_max_len)
    }

    fn concept_name(&self, combined: &str) -> Option<String> {
        let tokens = self.salient_tokens(combined);
        if tokens.is_empty() {
            return None;
        }
        if let Some(concept) = self.concepts.best_concept(&tokens) {
            return Some(concept.to_string());
        }

        let words: Vec<String> = most_common(&tokens, 3)
            .into_iter()
            .filter(|w| !BLACKLIST.contains(&w.as_str()))
            .filter(|w| !WEEKDAYS.iter().any(|day| w.contains(day)))
            .take(2)
            .map(|w| capitalize(&w))
            .collect();

        match words.as_slice() {
            [] => None,
            [one] => Some(format!("{one} Solutions")),
            _ => Some(words.join(" & ")),
        }
    }

    /// Leading characters of the first few member texts, deduplicated.
    pub fn description<S: AsRef<str>>(&self, texts: &[S]) -> String {
        let mut summaries: Vec<String> = Vec::new();
        for text in texts.iter().take(self.description_texts) {
            let head: String = text.as_ref().chars().take(self.summary_chars).collect();
            let summary = head.trim();
            if !summary.is_empty() && !summaries.iter().any(|s| s == summary) {
                summaries.push(summary.to_string());
            }
        }

        if summaries.is_empty() {
            return DEFAULT_DESCRIPTION.to_string();
        }
        let joined = summaries.join(" | ");
        if joined.chars().count() > self.description_max_len {
            format!("{}...", truncate_chars(&joined, self.description_max_len))
        } else {
            joined
        }
    }
}

/// Name from the keyword cascade over whitespace-split lowercase text.
pub fn keyword_name(combined: &str) -> &'static str {
    let lower = combined.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    CASCADE
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| words.contains(k)))
        .map_or(DEFAULT_NAME, |(_, name)| *name)
}

fn join<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Up to `n` most frequent tokens, ties broken by first occurrence.
fn most_common(tokens: &[String], n: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for token in tokens {
        match counts.iter_mut().find(|(t, _)| *t == token) {
            Some((_, c)) => *c += 1,
            None => counts.push((token.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(t, _)| t.to_string())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
