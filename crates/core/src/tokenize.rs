use unicode_segmentation::UnicodeSegmentation;

/// Splits an identifier on camel-case boundaries: a lowercase letter followed
/// by an uppercase one, or an uppercase letter followed by an uppercase letter
/// that itself starts a lowercase run (`IMDBRating` -> `IMDB`, `Rating`).
pub fn split_camel_case(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    for (idx, ch) in chars.iter().enumerate() {
        if idx > 0 && is_boundary(&chars, idx) {
            parts.push(std::mem::take(&mut current));
        }
        current.push(*ch);
    }
    parts.push(current);
    parts
}

fn is_boundary(chars: &[char], idx: usize) -> bool {
    let prev = chars[idx - 1];
    let cur = chars[idx];
    if prev.is_ascii_lowercase() && cur.is_ascii_uppercase() {
        return true;
    }
    prev.is_ascii_uppercase()
        && cur.is_ascii_uppercase()
        && chars.get(idx + 1).is_some_and(|next| next.is_ascii_lowercase())
}

/// Context words contributed by a JSON key: camel-case parts, each split on
/// literal spaces. Empty pieces are dropped.
pub fn split_key_words(key: &str) -> Vec<String> {
    split_camel_case(key)
        .iter()
        .flat_map(|part| part.split(' '))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn contains_letter_or_digit(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_alphanumeric())
}

pub fn filter_alphanumeric(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .filter(|token| contains_letter_or_digit(token))
        .collect()
}

/// Word-level tokenization on Unicode word boundaries. Whitespace segments are
/// discarded; punctuation survives as its own token.
pub fn tokenize_text(text: &str) -> Vec<String> {
    text.split_word_bounds()
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn tokenize_and_filter_alphanumeric(text: &str) -> Vec<String> {
    filter_alphanumeric(tokenize_text(text))
}
