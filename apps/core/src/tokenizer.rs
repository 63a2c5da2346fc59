use std::ops::Range;

/// Character range of the word under `cursor` (a character index into
/// `text`, clamped to its length).
///
/// The word starts after the nearest space before the cursor and ends at the
/// next space at or after it. The range is empty when the cursor sits between
/// two spaces or at the end of text ending in a space.
pub fn word_span(text: &str, cursor: usize) -> Range<usize> {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());

    let mut start = cursor;
    while start > 0 && chars[start - 1] != ' ' {
        start -= 1;
    }

    let mut end = cursor;
    while end < chars.len() && chars[end] != ' ' {
        end += 1;
    }
    start..end
}

/// Returns the word under `cursor`. A cursor right after a space yields the
/// word that follows it, or an empty token when none does.
pub fn extract_token(text: &str, cursor: usize) -> String {
    let span = word_span(text, cursor);
    text.chars()
        .skip(span.start)
        .take(span.len())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Character length, the unit every text position in the resolver uses.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::{extract_token, word_span};
    use rstest::rstest;

    #[rstest]
    #[case("", 0, "")]
    #[case("BU", 2, "BU")]
    #[case("BUY EUR", 7, "EUR")]
    #[case("BUY ", 4, "")]
    #[case("BUY EUR", 2, "BUY")]
    #[case("BUY EUR", 3, "BUY")]
    #[case("BUY EUR", 4, "EUR")]
    #[case("BUY EUR", 99, "EUR")]
    #[case("  spaced   out ", 9, "")]
    #[case("prix café", 9, "café")]
    fn extracts_word_under_cursor(#[case] text: &str, #[case] cursor: usize, #[case] expected: &str) {
        assert_eq!(extract_token(text, cursor), expected);
    }

    #[test]
    fn token_never_contains_spaces_and_is_part_of_a_word() {
        let text = "SELL 100 EUR/USD  at market ";
        let words: Vec<&str> = text.split(' ').collect();
        for cursor in 0..=text.chars().count() {
            let token = extract_token(text, cursor);
            assert!(!token.contains(' '), "cursor {cursor}: {token:?}");
            assert!(
                words.iter().any(|word| word.ends_with(token.as_str())),
                "cursor {cursor}: {token:?}"
            );
        }
    }

    #[rstest]
    #[case("BUY EUR", 2, 0..3)]
    #[case("BUY EUR", 4, 4..7)]
    #[case("BUY ", 4, 4..4)]
    #[case("prix café", 99, 5..9)]
    fn spans_are_character_ranges(#[case] text: &str, #[case] cursor: usize, #[case] expected: std::ops::Range<usize>) {
        assert_eq!(word_span(text, cursor), expected);
    }
}
