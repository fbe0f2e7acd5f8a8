//! Prefix matching with an optional character-class boundary.
//!
//! In strict mode a value `V` only matches a token `T` that continues past
//! `V` if the continuation switches character class: a letter may not follow
//! a trailing letter and a digit may not follow a trailing digit.

/// Returns true if `token` equals `value` or starts with it, honoring the
/// strict boundary when `strict` is set. An empty value never matches.
pub fn prefix_matches(token: &str, value: &str, strict: bool) -> bool {
    if value.is_empty() || !token.starts_with(value) {
        return false;
    }
    if !strict || token.len() == value.len() {
        return true;
    }
    let Some(next) = token[value.len()..].chars().next() else {
        return true;
    };
    let Some(last) = value.chars().next_back() else {
        return false;
    };
    !same_class(last, next)
}

fn same_class(left: char, right: char) -> bool {
    (left.is_alphabetic() && right.is_alphabetic()) || (left.is_numeric() && right.is_numeric())
}
