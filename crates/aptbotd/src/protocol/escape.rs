//! Tag value unescaping.

/// Resolves the escape sequences used in tag values.
///
/// `\\` becomes a backslash and `\s` a space. A trailing lone backslash is
/// kept as is; any other escaped character is dropped together with its
/// backslash.
#[must_use]
pub fn decode_tag_value(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(current) = chars.next() {
        if current != '\\' {
            decoded.push(current);
            continue;
        }
        match chars.next() {
            Some('\\') => decoded.push('\\'),
            Some('s') => decoded.push(' '),
            Some(_) => {}
            None => decoded.push('\\'),
        }
    }
    decoded
}

/// Collapses every run of whitespace into a single space and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
