//! Key case conversion between the REST API (snake_case) and GraphQL (camelCase).

/// Convert a snake_case key into camelCase.
///
/// The key is split on `_`, every segment but the first has its first character
/// upper-cased, and the segments are concatenated. Two different keys may map to
/// the same output (`a_b` and `a__b`); no attempt is made to detect that.
pub fn snake_to_camel(key: &str) -> String {
    let mut segments = key.split('_');
    let mut camel = String::with_capacity(key.len());
    if let Some(first) = segments.next() {
        camel.push_str(first);
    }
    for segment in segments {
        let mut chars = segment.chars();
        if let Some(head) = chars.next() {
            camel.extend(head.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }
    camel
}

/// Convert a camelCase key into snake_case. Used when GraphQL input is sent
/// back to the REST API as resource attributes.
pub fn camel_to_snake(key: &str) -> String {
    let mut snake = String::with_capacity(key.len() + 4);
    for (index, ch) in key.char_indices() {
        if ch.is_uppercase() {
            if index != 0 {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
        } else {
            snake.push(ch);
        }
    }
    snake
}
