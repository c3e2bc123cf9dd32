//! Bridge between the UTF-8 text we store and the UTF-16 code units entities are measured in.

/// Number of UTF-16 code units `c` occupies: 2 for anything outside the BMP.
#[inline]
pub fn units(c: char) -> u32 {
    c.len_utf16() as u32
}

/// UTF-16 length of `s`, saturating at [`u32::MAX`].
pub fn len(s: &str) -> u32 {
    s.chars()
        .fold(0u32, |total, c| total.saturating_add(units(c)))
}

/// Convert a UTF-16 offset into a byte offset of `s`.
///
/// Returns `None` if the offset is past the end of `s` or points into the
/// middle of a surrogate pair.
pub fn byte_offset(s: &str, utf16_offset: u32) -> Option<usize> {
    let mut position = 0u32;
    for (index, c) in s.char_indices() {
        if position == utf16_offset {
            return Some(index);
        }
        if position > utf16_offset {
            return None;
        }
        position = position.saturating_add(units(c));
    }
    (position == utf16_offset).then_some(s.len())
}

/// Convert a byte offset of `s` into a UTF-16 offset.
///
/// Returns `None` if `byte_offset` is out of range or not on a char boundary.
pub fn utf16_offset(s: &str, byte_offset: usize) -> Option<u32> {
    if !s.is_char_boundary(byte_offset) {
        return None;
    }
    Some(len(&s[..byte_offset]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn astral_chars_take_two_units() {
        assert_eq!(units('a'), 1);
        assert_eq!(units('é'), 1);
        assert_eq!(units('\u{FFFF}'), 1);
        assert_eq!(units('🙂'), 2);
        assert_eq!(len("a🙂b"), 4);
    }

    #[test]
    fn offsets_convert_both_ways() {
        let s = "a🙂b";
        assert_eq!(byte_offset(s, 0), Some(0));
        assert_eq!(byte_offset(s, 1), Some(1));
        // Inside the surrogate pair.
        assert_eq!(byte_offset(s, 2), None);
        assert_eq!(byte_offset(s, 3), Some(5));
        assert_eq!(byte_offset(s, 4), Some(6));
        assert_eq!(byte_offset(s, 5), None);

        assert_eq!(utf16_offset(s, 5), Some(3));
        assert_eq!(utf16_offset(s, 2), None);
        assert_eq!(utf16_offset(s, 7), None);
    }
}
