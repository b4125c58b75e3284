//! Process-wide linguistic model: stopwords, lemmas and coarse part-of-speech.
//!
//! The model is a capability handed to the normalizer and the labeler as an
//! `Option<Arc<dyn LanguageModel>>`. `None` means degraded mode: no
//! lemmatization, no stopword removal during normalization, and keyword
//! cascade naming only.
//!
//! The shared instance is resolved once per process:
//!
//! 1. `$THEMES_NLP` set to `off`/`none`/`0`/`false` → no model
//! 2. `$THEMES_LEXICON` (path to JSON overrides) → standard lexicon + overrides
//! 3. Standard built-in lexicon
//!
//! A failing tier falls through to the next one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Coarse part-of-speech classes, enough to pick salient label terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Number,
    Function,
}

impl PartOfSpeech {
    /// Nouns, verbs and adjectives carry topic meaning.
    pub fn is_content(self) -> bool {
        matches!(self, Self::Noun | Self::Verb | Self::Adjective)
    }
}

/// Linguistic capability used by the normalizer and the theme labeler.
///
/// Implementations must be immutable after construction; the shared
/// instance is read concurrently by every clustering invocation.
pub trait LanguageModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;
    /// `word` must already be lowercase.
    fn is_stopword(&self, word: &str) -> bool;
    /// Root form of a lowercase word.
    fn lemma(&self, word: &str) -> String;
    fn part_of_speech(&self, word: &str) -> PartOfSpeech;
}

/// Shared handle to an optional model; `None` is degraded mode.
pub type SharedModel = Option<Arc<dyn LanguageModel>>;

/// English stopwords, loaded once: the NLTK list from the `stop-words` crate
/// plus the modal and auxiliary words it leaves out.
pub fn english_stopwords() -> &'static HashSet<String> {
    static STOPWORDS: OnceLock<HashSet<String>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .chain(EXTRA_STOPWORDS.iter().map(|w| w.to_string()))
            .collect()
    })
}

const EXTRA_STOPWORDS: &[&str] = &[
    "also", "could", "would", "may", "might", "must", "shall", "us", "etc", "via", "yet",
];

/// User-supplied additions layered over the standard lexicon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconOverrides {
    /// inflected form → lemma
    pub lemmas: HashMap<String, String>,
    pub stopwords: Vec<String>,
    /// base verb forms
    pub verbs: Vec<String>,
}

/// Rule-based English lexicon: irregular lemma table, base-verb list,
/// suffix rules for plurals and verb inflections.
#[derive(Debug, Clone)]
pub struct Lexicon {
    name: String,
    stopwords: HashSet<String>,
    lemmas: HashMap<String, String>,
    verbs: HashSet<String>,
    adjectives: HashSet<String>,
}

impl Lexicon {
    /// The built-in lexicon.
    pub fn standard() -> Self {
        Self {
            name: "standard".into(),
            stopwords: english_stopwords().clone(),
            lemmas: IRREGULAR_LEMMAS
                .iter()
                .map(|(w, l)| (w.to_string(), l.to_string()))
                .collect(),
            verbs: BASE_VERBS.iter().map(|v| v.to_string()).collect(),
            adjectives: ADJECTIVES.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Layer overrides on top of this lexicon.
    pub fn with_overrides(mut self, overrides: LexiconOverrides) -> Self {
        for (word, lemma) in overrides.lemmas {
            self.lemmas.insert(word.to_lowercase(), lemma.to_lowercase());
        }
        for w in overrides.stopwords {
            self.stopwords.insert(w.to_lowercase());
        }
        for v in overrides.verbs {
            self.verbs.insert(v.to_lowercase());
        }
        self.name = format!("{}+custom", self.name);
        self
    }

    fn verb_base(&self, word: &str) -> Option<String> {
        for suffix in ["ing", "ed"] {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.len() < 2 {
                continue;
            }
            let with_e = format!("{stem}e");
            if self.verbs.contains(stem) {
                return Some(stem.to_string());
            }
            if self.verbs.contains(&with_e) {
                return Some(with_e);
            }
            if let Some(undoubled) = undouble(stem) {
                if self.verbs.contains(undoubled) {
                    return Some(undoubled.to_string());
                }
            }
        }
        None
    }
}

impl LanguageModel for Lexicon {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    fn lemma(&self, word: &str) -> String {
        if let Some(lemma) = self.lemmas.get(word) {
            return lemma.clone();
        }
        if word.chars().count() <= 3
            || self.verbs.contains(word)
            || self.adjectives.contains(word)
            || !word.chars().all(char::is_alphabetic)
        {
            return word.to_string();
        }
        if let Some(base) = self.verb_base(word) {
            return base;
        }
        singularize(word)
    }

    fn part_of_speech(&self, word: &str) -> PartOfSpeech {
        if self.stopwords.contains(word) {
            return PartOfSpeech::Function;
        }
        if word.chars().all(|c| c.is_numeric()) {
            return PartOfSpeech::Number;
        }
        if self.verbs.contains(word) {
            return PartOfSpeech::Verb;
        }
        if self.adjectives.contains(word) || has_adjective_suffix(word) {
            return PartOfSpeech::Adjective;
        }
        if word.ends_with("ly") && !LY_NOUNS.contains(&word) {
            return PartOfSpeech::Adverb;
        }
        PartOfSpeech::Noun
    }
}

/// Parse lexicon overrides from JSON.
pub fn parse_overrides(json: &str) -> Result<LexiconOverrides, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load lexicon overrides from a file path.
pub fn load_overrides(path: &str) -> Result<LexiconOverrides, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_overrides(&json).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Resolve a model from explicit settings (see module docs for the order).
pub fn load_model(disabled: bool, overrides_path: Option<&str>) -> SharedModel {
    if disabled {
        warn!("linguistic model unavailable, running in degraded mode");
        return None;
    }

    if let Some(path) = overrides_path {
        match load_overrides(path) {
            Ok(overrides) => {
                let lexicon = Lexicon::standard().with_overrides(overrides);
                info!(model = lexicon.name(), "loaded linguistic model");
                return Some(Arc::new(lexicon));
            }
            Err(e) => warn!(error = %e, "custom lexicon failed to load, using standard lexicon"),
        }
    }

    let lexicon = Lexicon::standard();
    info!(model = lexicon.name(), "loaded linguistic model");
    Some(Arc::new(lexicon))
}

/// The process-wide model, initialised on first use from the environment.
pub fn shared_model() -> SharedModel {
    static MODEL: OnceLock<SharedModel> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            let disabled = std::env::var("THEMES_NLP")
                .map(|v| matches!(v.to_lowercase().as_str(), "off" | "none" | "0" | "false"))
                .unwrap_or(false);
            let overrides = std::env::var("THEMES_LEXICON").ok();
            load_model(disabled, overrides.as_deref())
        })
        .clone()
}

/// Strip a regular English plural.
fn singularize(word: &str) -> String {
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zzes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// `"runn"` → `"run"`, `"plann"` → `"plan"`.
fn undouble(stem: &str) -> Option<&str> {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if stem.is_ascii() && n >= 3 && bytes[n - 1] == bytes[n - 2] && !b"aeiouls".contains(&bytes[n - 1]) {
        Some(&stem[..n - 1])
    } else {
        None
    }
}

fn has_adjective_suffix(word: &str) -> bool {
    if word.len() <= 5 {
        return false;
    }
    if ["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"]
        .iter()
        .any(|s| word.ends_with(s))
    {
        return true;
    }
    word.ends_with("al") && !AL_NOUNS.contains(&word)
}

const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("menus", "menu"),
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("data", "data"),
    ("media", "media"),
    ("news", "news"),
    ("series", "series"),
    ("species", "species"),
    ("canvas", "canvas"),
    ("atlas", "atlas"),
    ("lens", "lens"),
    ("bias", "bias"),
    ("gas", "gas"),
    ("chaos", "chaos"),
    ("always", "always"),
    ("perhaps", "perhaps"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("wolves", "wolf"),
    ("heroes", "hero"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("went", "go"),
    ("gone", "go"),
    ("made", "make"),
    ("built", "build"),
    ("brought", "bring"),
    ("bought", "buy"),
    ("thought", "think"),
    ("taught", "teach"),
    ("caught", "catch"),
    ("sold", "sell"),
    ("told", "tell"),
    ("held", "hold"),
    ("kept", "keep"),
    ("left", "leave"),
    ("felt", "feel"),
    ("met", "meet"),
    ("paid", "pay"),
    ("sent", "send"),
    ("spent", "spend"),
    ("ran", "run"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("drank", "drink"),
    ("drunk", "drink"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("wrote", "write"),
    ("written", "write"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("grew", "grow"),
    ("grown", "grow"),
    ("knew", "know"),
    ("known", "know"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
];

const BASE_VERBS: &[&str] = &[
    "add", "adopt", "allow", "analyze", "automate", "book", "boost", "bring", "build", "buy",
    "celebrate", "change", "collaborate", "collect", "combine", "connect", "cook", "create",
    "cut", "deliver", "design", "develop", "discount", "drive", "eat", "engage", "enhance",
    "expand", "explore", "extend", "feature", "focus", "gather", "grow", "guide", "help",
    "hire", "host", "improve", "include", "increase", "install", "integrate", "introduce",
    "invest", "invite", "join", "keep", "launch", "lead", "learn", "lower", "maintain",
    "manage", "measure", "mentor", "offer", "open", "optimize", "order", "organize",
    "partner", "pay", "plan", "prepare", "promote", "provide", "raise", "recognize",
    "recruit", "redesign", "reduce", "refresh", "remove", "renovate", "replace", "retain",
    "reward", "rotate", "run", "schedule", "sell", "send", "serve", "share", "simplify",
    "source", "sponsor", "start", "streamline", "support", "survey", "switch", "teach",
    "test", "track", "train", "update", "upgrade", "use", "welcome", "write",
];

const ADJECTIVES: &[&str] = &[
    "new", "fresh", "local", "free", "quick", "fast", "slow", "easy", "happy", "loyal",
    "digital", "mobile", "social", "seasonal", "weekly", "monthly", "daily", "yearly",
    "friendly", "healthy", "vegan", "organic", "online", "special", "better", "green",
    "smart", "live", "private", "public", "open", "modern", "cozy", "premium", "exclusive",
];

const LY_NOUNS: &[&str] = &[
    "family", "supply", "reply", "assembly", "anomaly", "monopoly", "rally", "ally", "belly",
    "jelly", "lily", "bully", "italy", "july", "butterfly", "firefly", "homily",
];

const AL_NOUNS: &[&str] = &[
    "proposal", "approval", "arrival", "rental", "festival", "animal", "capital", "journal",
    "signal", "material", "potential", "total", "manual", "hospital", "terminal", "portal",
    "referral", "renewal", "removal", "survival", "tutorial", "interval", "professional",
    "individual", "official", "criminal", "principal", "ritual", "carnival", "denial",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> Lexicon {
        Lexicon::standard()
    }

    #[test]
    fn lemma_regular_plurals() {
        let l = lex();
        assert_eq!(l.lemma("rewards"), "reward");
        assert_eq!(l.lemma("loyalties"), "loyalty");
        assert_eq!(l.lemma("boxes"), "box");
        assert_eq!(l.lemma("glasses"), "glass");
        assert_eq!(l.lemma("menus"), "menu");
    }

    #[test]
    fn lemma_keeps_words_ending_in_s() {
        let l = lex();
        assert_eq!(l.lemma("business"), "business");
        assert_eq!(l.lemma("bonus"), "bonus");
        assert_eq!(l.lemma("analysis"), "analysis");
    }

    #[test]
    fn lemma_verb_inflections() {
        let l = lex();
        assert_eq!(l.lemma("hiring"), "hire");
        assert_eq!(l.lemma("planned"), "plan");
        assert_eq!(l.lemma("launched"), "launch");
        assert_eq!(l.lemma("training"), "train");
        assert_eq!(l.lemma("running"), "run");
    }

    #[test]
    fn lemma_unknown_ing_word_is_not_verb_stripped() {
        let l = lex();
        assert_eq!(l.lemma("morning"), "morning");
        assert_eq!(l.lemma("pairing"), "pairing");
    }

    #[test]
    fn lemma_is_idempotent() {
        let l = lex();
        for w in [
            "rewards", "loyalties", "hiring", "children", "boxes", "menus", "customers",
            "planned", "glasses", "staff", "desserts",
        ] {
            let once = l.lemma(w);
            assert_eq!(l.lemma(&once), once, "lemma not idempotent for {w}");
        }
    }

    #[test]
    fn part_of_speech_classes() {
        let l = lex();
        assert_eq!(l.part_of_speech("customer"), PartOfSpeech::Noun);
        assert_eq!(l.part_of_speech("seasonal"), PartOfSpeech::Adjective);
        assert_eq!(l.part_of_speech("launch"), PartOfSpeech::Verb);
        assert_eq!(l.part_of_speech("loudly"), PartOfSpeech::Adverb);
        assert_eq!(l.part_of_speech("family"), PartOfSpeech::Noun);
        assert_eq!(l.part_of_speech("2024"), PartOfSpeech::Number);
        assert_eq!(l.part_of_speech("the"), PartOfSpeech::Function);
    }

    #[test]
    fn stopwords_loaded() {
        let l = lex();
        assert!(l.is_stopword("the"));
        assert!(l.is_stopword("and"));
        assert!(l.is_stopword("could"));
        assert!(!l.is_stopword("customer"));
        assert!(!l.is_stopword(""));
    }

    #[test]
    fn ordinary_content_words_are_not_stopwords() {
        let l = lex();
        for w in [
            "order", "group", "system", "work", "room", "member", "research", "information",
            "open", "test", "page", "area", "value", "new",
        ] {
            assert!(!l.is_stopword(w), "{w} should carry meaning");
        }
        assert!(english_stopwords().len() < 400);
    }

    #[test]
    fn overrides_extend_lexicon() {
        let overrides = parse_overrides(
            r#"{"lemmas": {"brunches": "brunch"}, "stopwords": ["cafe"], "verbs": ["brew"]}"#,
        )
        .unwrap();
        let l = Lexicon::standard().with_overrides(overrides);
        assert_eq!(l.name(), "standard+custom");
        assert!(l.is_stopword("cafe"));
        assert_eq!(l.lemma("brewing"), "brew");
        assert_eq!(l.lemma("brunches"), "brunch");
    }

    #[test]
    fn load_model_disabled_is_none() {
        assert!(load_model(true, None).is_none());
    }

    #[test]
    fn load_model_bad_overrides_falls_back_to_standard() {
        let model = load_model(false, Some("/nonexistent/lexicon.json")).unwrap();
        assert_eq!(model.name(), "standard");
    }
}
