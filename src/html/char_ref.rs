//! HTML character references.

/// Longest reference we try to decode, `&` and `;` included.
const MAX_REFERENCE_LEN: usize = 12;

/// Decode the character reference at the start of `input`, which must begin with `&`.
///
/// Returns the decoded char and how many bytes of `input` it spans, or `None`
/// if there is no well-formed reference there.
pub(super) fn decode(input: &str) -> Option<(char, usize)> {
    let body = input.strip_prefix('&')?;
    let semicolon = body
        .bytes()
        .take(MAX_REFERENCE_LEN - 1)
        .position(|b| b == b';')?;
    let name = &body[..semicolon];
    let consumed = semicolon + 2;

    let c = match name.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) if is_all(hex, |b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                None if is_all(number, |b| b.is_ascii_digit()) => number.parse().ok()?,
                _ => return None,
            };
            char::from_u32(code).filter(|&c| c != '\0')?
        }
        None => match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{A0}',
            _ => return None,
        },
    };
    Some((c, consumed))
}

fn is_all(digits: &str, predicate: impl Fn(u8) -> bool) -> bool {
    !digits.is_empty() && digits.bytes().all(predicate)
}

/// Decode every well-formed reference in `input`, leaving malformed ones as they are.
pub(super) fn unescape(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode(rest) {
            Some((c, consumed)) => {
                output.push(c);
                rest = &rest[consumed..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// The escaped spelling of `c` in text content, if it needs one.
pub(super) fn escape_text(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

/// Escape `value` for use inside a double-quoted attribute.
pub(super) fn escape_attribute(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => output.push_str("&quot;"),
            c => match escape_text(c) {
                Some(escaped) => output.push_str(escaped),
                None => output.push(c),
            },
        }
    }
    output
}
