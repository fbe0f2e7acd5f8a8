//! Typecode tokenization.
//!
//! A raw typecode is split into uppercase tokens on:
//! - runs of two or more underscores
//! - runs of hyphens and/or whitespace
//! - a single underscore strictly between two word characters
//!
//! The first token is the family, the rest are the "groups".

/// Splits a raw typecode into normalized uppercase tokens.
///
/// Never fails: empty or delimiter-only input yields an empty list.
pub fn split_typecode(raw: &str) -> Vec<String> {
    let chars = raw.trim().chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut cursor = 0usize;

    while cursor < chars.len() {
        let ch = chars[cursor];

        if ch == '_' {
            let run = chars[cursor..].iter().take_while(|c| **c == '_').count();
            if run >= 2 {
                flush_token(&mut current, &mut tokens);
                cursor += run;
                continue;
            }
            let before = cursor.checked_sub(1).map(|index| chars[index]);
            let after = chars.get(cursor + 1).copied();
            if before.is_some_and(is_word_char) && after.is_some_and(is_word_char) {
                flush_token(&mut current, &mut tokens);
                cursor += 1;
                continue;
            }
            current.push(ch);
            cursor += 1;
            continue;
        }

        if is_dash_or_space(ch) {
            flush_token(&mut current, &mut tokens);
            cursor += chars[cursor..]
                .iter()
                .take_while(|c| is_dash_or_space(**c))
                .count();
            continue;
        }

        current.push(ch);
        cursor += 1;
    }
    flush_token(&mut current, &mut tokens);

    tokens
}

/// Returns the '-'-joined token list of a code with at least two tokens.
///
/// This is the form used to detect intermediate codes.
pub fn normalized_code(raw: &str) -> Option<String> {
    let tokens = split_typecode(raw);
    if tokens.len() < 2 {
        return None;
    }
    Some(tokens.join("-"))
}

/// Builds the canonical `"<FAMILY> <TOK1>-<TOK2>-..."` representation.
pub fn canonical_typecode<S: AsRef<str>>(family: &str, tokens: &[S]) -> String {
    if tokens.is_empty() {
        return family.to_string();
    }
    let mut canonical = String::with_capacity(family.len() + 1 + tokens.len() * 4);
    canonical.push_str(family);
    canonical.push(' ');
    for (index, token) in tokens.iter().enumerate() {
        if index > 0 {
            canonical.push('-');
        }
        canonical.push_str(token.as_ref());
    }
    canonical
}

/// Character length of a token, counted in Unicode scalar values.
#[inline]
pub fn token_len(token: &str) -> usize {
    token.chars().count()
}

#[inline]
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[inline]
fn is_dash_or_space(ch: char) -> bool {
    ch == '-' || ch.is_whitespace()
}

fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let upper = current.to_uppercase();
    current.clear();
    if !upper.is_empty() {
        tokens.push(upper);
    }
}
