//! Keyword matching shared by every analyzer.
//!
//! Latin keywords only match whole words: a hit must not be glued to another
//! ASCII letter or digit. Arabic attaches articles and conjunctions directly
//! to words, so Arabic keywords effectively match as substrings. The
//! exception is very short non-Latin keywords, which must stand alone:
//! `كم` would otherwise hit inside `عليكم`.

const SHORT_KEYWORD_CHARS: usize = 2;

/// Lower-cases a message once so callers can match many keyword lists.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Number of bounded occurrences of `keyword` in `haystack`.
pub fn count_occurrences(haystack: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    haystack
        .match_indices(keyword)
        .filter(|(start, _)| is_bounded(haystack, *start, keyword))
        .count()
}

/// True when `keyword` occurs at least once as a bounded phrase.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    count_occurrences(haystack, keyword) > 0
}

/// Number of distinct keywords from the list present in `haystack`.
pub fn count_matches(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| contains_keyword(haystack, keyword))
        .count()
}

/// Total occurrences of every keyword from the list.
pub fn count_all_occurrences(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|keyword| count_occurrences(haystack, keyword))
        .sum()
}

/// First keyword from the list found in `haystack`.
pub fn first_match<'a>(haystack: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|keyword| contains_keyword(haystack, keyword))
        .map(String::as_str)
}

/// Case-sensitive replacement of bounded occurrences of `from`.
pub fn replace_phrase(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, matched) in text.match_indices(from) {
        if is_bounded(text, start, from) {
            result.push_str(&text[cursor..start]);
            result.push_str(to);
            cursor = start + matched.len();
        }
    }
    result.push_str(&text[cursor..]);
    result
}

fn is_bounded(haystack: &str, start: usize, keyword: &str) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[start + keyword.len()..].chars().next();
    let boundary: fn(char) -> bool = if is_short_script_word(keyword) {
        char::is_alphanumeric
    } else {
        is_word_char
    };
    !before.is_some_and(boundary) && !after.is_some_and(boundary)
}

fn is_short_script_word(keyword: &str) -> bool {
    !keyword.is_ascii() && keyword.chars().count() <= SHORT_KEYWORD_CHARS
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
