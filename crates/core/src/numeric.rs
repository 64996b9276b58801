const NUMERIC_CHARS: &str = "0123456789,.%/$E";

/// True when `token` is made only of digits and the punctuation that
/// commonly decorates quantities (`,.%/$E`), with at least one digit.
pub fn is_numeric_looking(token: &str) -> bool {
    let mut any_digit = false;
    for ch in token.chars() {
        if !NUMERIC_CHARS.contains(ch) {
            return false;
        }
        if ch.is_ascii_digit() {
            any_digit = true;
        }
    }
    any_digit
}

/// Placeholder key some pretrained tables use for numbers of a given width:
/// one `#` per character of the original token.
pub fn numeric_placeholder(token: &str) -> String {
    "#".repeat(token.chars().count())
}
