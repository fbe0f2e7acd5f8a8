//! Shared helpers for the compact filter mini-grammars.

use std::str::FromStr;

use crate::error::{Result, TaxonomyError};

pub(crate) const PREFIX_FLAG: &str = ":prefix";
pub(crate) const CASE_FLAG: &str = ":case";
pub(crate) const STRICT_FLAG: &str = ":strict";

/// Splits on `separator`, trimming parts and dropping empty ones.
pub(crate) fn split_parts(raw: &str, separator: char) -> impl Iterator<Item = &str> {
    raw.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

pub(crate) fn parse_number<T: FromStr>(filter: &'static str, raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    trimmed
        .parse()
        .map_err(|_| TaxonomyError::filter(filter, format!("expected a number, got {trimmed:?}")))
}

/// Parses a 1-based index that must be at least 1.
pub(crate) fn parse_index(filter: &'static str, raw: &str, what: &str) -> Result<usize> {
    let value: i64 = parse_number(filter, raw)?;
    if value < 1 {
        return Err(TaxonomyError::filter(
            filter,
            format!("{what} must be >= 1, got {value}"),
        ));
    }
    Ok(value as usize)
}

/// Removes every occurrence of `flag` from `value`, reporting whether it was present.
pub(crate) fn take_flag(value: &str, flag: &str) -> (String, bool) {
    if value.contains(flag) {
        (value.replace(flag, ""), true)
    } else {
        (value.to_string(), false)
    }
}

/// Splits `left=right` or `left!=right`, returning `(left, negate, right)`.
pub(crate) fn split_assignment<'a>(filter: &'static str, part: &'a str) -> Result<(&'a str, bool, &'a str)> {
    if let Some((left, right)) = part.split_once("!=") {
        return Ok((left.trim(), true, right.trim()));
    }
    if let Some((left, right)) = part.split_once('=') {
        return Ok((left.trim(), false, right.trim()));
    }
    Err(TaxonomyError::filter(filter, format!("expected '=' in {part:?}")))
}

/// Splits `left=right`, rejecting the negated form.
pub(crate) fn split_equals<'a>(filter: &'static str, part: &'a str) -> Result<(&'a str, &'a str)> {
    match split_assignment(filter, part)? {
        (left, false, right) => Ok((left, right)),
        (_, true, _) => Err(TaxonomyError::filter(
            filter,
            format!("'!=' is not supported in {part:?}"),
        )),
    }
}

/// Returns the value with its `:prefix` flag stripped, rejecting empty values.
pub(crate) fn parse_value(filter: &'static str, raw: &str) -> Result<(String, bool)> {
    let (value, is_prefix) = take_flag(raw, PREFIX_FLAG);
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(TaxonomyError::filter(filter, "value must not be empty"));
    }
    Ok((value, is_prefix))
}

/// Substring of `text` covering `len` chars from char index `start`.
pub(crate) fn char_slice(text: &str, start: usize, len: usize) -> Option<&str> {
    let mut indices = text.char_indices().map(|(index, _)| index).chain([text.len()]);
    let begin = indices.nth(start)?;
    if len == 0 {
        return Some(&text[begin..begin]);
    }
    let end = indices.nth(len - 1)?;
    Some(&text[begin..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_parts() {
        let parts = split_parts(" a , ,b,", ',').collect::<Vec<_>>();
        assert_eq!(parts, vec!["a", "b"]);
    }

    #[test]
    fn assignment_forms() {
        assert_eq!(split_assignment("t", "3!=2").expect("parse"), ("3", true, "2"));
        assert_eq!(split_assignment("t", "3 = 2").expect("parse"), ("3", false, "2"));
        assert!(split_assignment("t", "32").is_err());
        assert!(split_equals("t", "3!=2").is_err());
    }

    #[test]
    fn index_must_be_positive() {
        assert_eq!(parse_index("t", "4", "group").expect("parse"), 4);
        assert!(parse_index("t", "0", "group").is_err());
        assert!(parse_index("t", "-2", "group").is_err());
        assert!(parse_index("t", "x", "group").is_err());
    }

    #[test]
    fn value_flags() {
        assert_eq!(parse_value("t", "M:prefix").expect("parse"), ("M".to_string(), true));
        assert_eq!(parse_value("t", " PX ").expect("parse"), ("PX".to_string(), false));
        assert!(parse_value("t", ":prefix").is_err());
    }

    #[test]
    fn char_slices() {
        assert_eq!(char_slice("ABC 123", 4, 3), Some("123"));
        assert_eq!(char_slice("ABC 123", 4, 4), None);
        assert_eq!(char_slice("ÄBC", 0, 2), Some("ÄB"));
        assert_eq!(char_slice("ABC", 3, 0), Some(""));
        assert_eq!(char_slice("ABC", 4, 0), None);
    }
}
