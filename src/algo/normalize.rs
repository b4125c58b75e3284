use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::algo::lexicon::LanguageModel;

fn punctuation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"))
}

/// Lowercase and turn every non-word, non-space character into a space.
pub fn clean(text: &str) -> String {
    punctuation()
        .replace_all(&text.to_lowercase(), " ")
        .into_owned()
}

/// Normalize idea text into a canonical token string.
///
/// With a model: stopwords and single-character tokens are dropped and the
/// rest reduced to lemmas, joined by single spaces. Without one the cleaned
/// string is returned as-is. Absent or empty input yields `""`.
pub fn normalize(text: Option<&str>, model: Option<&dyn LanguageModel>) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let cleaned = clean(text);
    let Some(model) = model else {
        return cleaned;
    };

    cleaned
        .unicode_words()
        .filter(|w| w.chars().count() > 1 && !model.is_stopword(w))
        .map(|w| model.lemma(w))
        .filter(|lemma| lemma.chars().count() > 1 && !model.is_stopword(lemma))
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::lexicon::Lexicon;

    #[test]
    fn clean_strips_punctuation() {
        assert_eq!(clean("Hello, World!"), "hello  world ");
    }

    #[test]
    fn clean_keeps_underscores_and_digits() {
        assert_eq!(clean("top_10 ideas"), "top_10 ideas");
    }

    #[test]
    fn normalize_empty_and_absent() {
        let lex = Lexicon::standard();
        assert_eq!(normalize(None, Some(&lex)), "");
        assert_eq!(normalize(Some(""), Some(&lex)), "");
        assert_eq!(normalize(None, None), "");
    }

    #[test]
    fn normalize_lemmatizes_and_drops_stopwords() {
        let lex = Lexicon::standard();
        let out = normalize(Some("Launch the customer rewards app!"), Some(&lex));
        assert_eq!(out, "launch customer reward app");
    }

    #[test]
    fn normalize_keeps_ordinary_content_words() {
        let lex = Lexicon::standard();
        assert_eq!(
            normalize(Some("Group ordering system"), Some(&lex)),
            "group order system"
        );
        assert_eq!(
            normalize(Some("Open member research room"), Some(&lex)),
            "open member research room"
        );
    }

    #[test]
    fn normalize_drops_single_characters() {
        let lex = Lexicon::standard();
        let out = normalize(Some("x menus y"), Some(&lex));
        assert_eq!(out, "menu");
    }

    #[test]
    fn degraded_mode_passes_cleaned_text_through() {
        let out = normalize(Some("Launch the Customer-Rewards app!"), None);
        assert_eq!(out, "launch the customer rewards app ");
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_text() {
        let lex = Lexicon::standard();
        for text in [
            "Improve customer loyalty program",
            "Rotate seasonal dessert menus",
            "Hiring more weekend staff members",
            "Planned tasting events for families",
        ] {
            let once = normalize(Some(text), Some(&lex));
            let twice = normalize(Some(&once), Some(&lex));
            assert_eq!(once, twice, "not idempotent for {text:?}");
        }
    }
}
