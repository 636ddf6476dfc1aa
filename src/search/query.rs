//! Full-text query building / 全文查询构建

use unicode_segmentation::UnicodeSegmentation;

/// Turn free text into an FTS5 natural-language query / 构建FTS5查询
///
/// Words follow Unicode word boundaries, so combining marks stay attached to
/// their base letter. Each word is quoted (inner quotes doubled) and OR-ed so
/// any word may match; inside the quotes `unicode61` tokenizes it the same
/// way it tokenized the stored text. Returns None when the term has no words.
pub fn build_fts_query(term: &str) -> Option<String> {
    let words: Vec<String> = term
        .unicode_words()
        .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" OR "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word() {
        assert_eq!(build_fts_query("corp").as_deref(), Some("\"corp\""));
    }

    #[test]
    fn test_punctuation_splits_words() {
        assert_eq!(
            build_fts_query("acme-corp, reno").as_deref(),
            Some("\"acme\" OR \"corp\" OR \"reno\"")
        );
    }

    #[test]
    fn test_operators_are_neutralised() {
        assert_eq!(build_fts_query("\"OR\" *").as_deref(), Some("\"OR\""));
        assert_eq!(build_fts_query("--").as_deref(), None);
    }

    #[test]
    fn test_combining_marks_stay_in_the_word() {
        let decomposed = "cafe\u{0301} au lait";
        assert_eq!(
            build_fts_query(decomposed).as_deref(),
            Some("\"cafe\u{0301}\" OR \"au\" OR \"lait\"")
        );
    }
}
