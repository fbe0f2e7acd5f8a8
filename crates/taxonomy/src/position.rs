//! Absolute character offsets within the canonical string.
//!
//! In `"ABC 123-XY"` the family and its trailing space occupy offsets
//! 1..=4, so the first remainder token starts at `len(family) + 2` and
//! each following token starts one past the previous token's end.

/// 1-based start offset of the first remainder token.
#[inline]
pub fn first_token_offset(family_len: usize) -> usize {
    family_len + 2
}

/// Start offsets of every remainder token, derived from lengths alone.
pub fn token_offsets(family_len: usize, lengths: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut offset = first_token_offset(family_len);
    for length in lengths {
        offsets.push(offset);
        offset += length + 1;
    }
    offsets
}

/// Start offsets of every remainder token, walking backward from a known
/// offset of the last token.
///
/// Returns `None` if the anchor is too small to fit the preceding tokens.
pub fn token_offsets_from_last(last_offset: usize, lengths: &[usize]) -> Option<Vec<usize>> {
    let mut offsets = vec![0; lengths.len()];
    let mut offset = last_offset;
    for index in (0..lengths.len()).rev() {
        offsets[index] = offset;
        if index > 0 {
            offset = offset.checked_sub(lengths[index - 1] + 1)?;
        }
    }
    Some(offsets)
}

/// 1-based start offset of `group` (1-based) among the remainder tokens.
///
/// With `anchor` set, offsets are resolved backward from the last token's
/// known offset; otherwise forward from the family length.
pub fn group_start(
    family_len: usize,
    lengths: &[usize],
    anchor: Option<usize>,
    group: usize,
) -> Option<usize> {
    let index = group.checked_sub(1)?;
    if index >= lengths.len() {
        return None;
    }
    let offsets = match anchor {
        Some(last_offset) => token_offsets_from_last(last_offset, lengths)?,
        None => token_offsets(family_len, lengths),
    };
    offsets.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_offsets_follow_token_lengths() {
        assert_eq!(token_offsets(3, &[3, 2]), vec![5, 9]);
        assert_eq!(token_offsets(4, &[1, 2, 6]), vec![6, 8, 11]);
        assert!(token_offsets(3, &[]).is_empty());
    }

    #[test]
    fn backward_offsets_match_forward() {
        let lengths = [4, 4, 2, 3, 6, 3];
        let forward = token_offsets(3, &lengths);
        let last = *forward.last().expect("offset");
        assert_eq!(token_offsets_from_last(last, &lengths), Some(forward));
    }

    #[test]
    fn backward_offsets_reject_short_anchor() {
        assert_eq!(token_offsets_from_last(3, &[5, 2]), None);
    }

    #[test]
    fn group_start_with_and_without_anchor() {
        assert_eq!(group_start(3, &[3, 2], None, 1), Some(5));
        assert_eq!(group_start(3, &[3, 2], None, 2), Some(9));
        assert_eq!(group_start(3, &[3, 2], Some(9), 1), Some(5));
        // A shifted anchor shifts every group.
        assert_eq!(group_start(3, &[3, 2], Some(10), 1), Some(6));
        assert_eq!(group_start(3, &[3, 2], None, 3), None);
        assert_eq!(group_start(3, &[3, 2], None, 0), None);
    }
}
