//! Text cleaning shared by training and inference.
//!
//! [`normalize`] is the only cleaning routine the classifier ever sees. The
//! corpus is passed through it before the vectorizer is fitted, and every
//! inference input is passed through it before the bundle scores it, so any
//! change here invalidates previously trained bundles.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL: Regex = Regex::new(r"(?i)http\S+\s*").unwrap();
    static ref MARKERS: Regex = Regex::new(r"RT|(?i:cc)").unwrap();
    static ref HASHTAG: Regex = Regex::new(r"#\S+").unwrap();
    static ref MENTION: Regex = Regex::new(r"@\S+").unwrap();
}

/// Cleans raw résumé text into the canonical form used by the classifier.
///
/// Steps, in order:
/// 1. drop URL-like runs starting with `http`
/// 2. drop `RT` / `cc` markers, `#hashtags` and `@mentions`
/// 3. replace ASCII punctuation with a space
/// 4. replace non-ASCII characters with a space
/// 5. collapse whitespace and trim
/// 6. lower-case
///
/// The result is a fixed point: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let text = URL.replace_all(raw, " ");
    let text = MARKERS.replace_all(&text, " ");
    let text = HASHTAG.replace_all(&text, " ");
    let text = MENTION.replace_all(&text, " ");

    let stripped: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() || !c.is_ascii() {
                ' '
            } else {
                c
            }
        })
        .collect();

    collapse_whitespace(&stripped).to_ascii_lowercase()
}

/// Light cleaning for text that goes to the sentence encoder.
///
/// The encoder works on natural text, so casing and punctuation are kept and
/// only layout noise from extraction is removed.
pub fn normalize_for_similarity(raw: &str) -> String {
    collapse_whitespace(raw)
}

/// First `max_chars` characters of `text` with line breaks turned into spaces.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cleaning_sequence() {
        let raw = "Skills: Python, SQL & ML \u{2014} see https://x.io/me #data @bob RT\n\tdone";
        assert_eq!(normalize(raw), "skills python sql ml see done");
    }

    #[test]
    fn test_url_removal_is_case_insensitive() {
        assert_eq!(normalize("Portfolio HTTPS://Example.com/Me now"), "portfolio now");
        assert_eq!(normalize("link:http://a.b"), "link");
    }

    #[test]
    fn test_cc_markers_inside_words() {
        // Parity with the corpus cleaning: marker removal is not word-bounded.
        assert_eq!(normalize("Accounts"), "a ounts");
        assert_eq!(normalize("ART director"), "a director");
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        assert_eq!(normalize("Café Résumé – naïve"), "caf r sum na ve");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n\t  "), "");
        assert_eq!(normalize("!!! ### @@@"), "");
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "Data Scientist | Python, R, SQL | https://github.com/me",
            "Cc: HR Team; RT @recruiter #hiring",
            "HTTPfoo bar http",
            "ccc Cc cC CC",
            "Senior   Java\u{00a0}Developer\r\n(Spring Boot)",
            "naïve café — 100% remote!!!",
            "http\u{00a0}x",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_similarity_normalization_keeps_case() {
        assert_eq!(
            normalize_for_similarity("  Senior\n\nRust  Engineer, Berlin "),
            "Senior Rust Engineer, Berlin"
        );
    }

    #[test]
    fn test_preview_truncates_and_flattens_lines() {
        assert_eq!(preview("line one\nline two", 300), "line one line two");
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("é\nü", 2), "é ");
    }
}
