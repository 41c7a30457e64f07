//! Escape codec for filter values.
//!
//! Characters that carry meaning in filter expressions are written as
//! `#<codepoint>;`, e.g. `,` becomes `#44;`. `#` itself is reserved so the
//! encoding is unambiguous.

/// Characters that must be escaped inside a filter value.
pub const RESERVED: &[char] = &['#', '{', '}', '[', ']', ',', '=', '"'];

/// Returns true if `c` must be escaped inside a filter value.
#[inline]
pub fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

/// Encodes every reserved character as `#<codepoint>;`.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if is_reserved(c) {
            out.push('#');
            out.push_str(&(c as u32).to_string());
            out.push(';');
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes `#<codepoint>;` sequences.
///
/// A `#` that does not start a well-formed sequence is kept literally, so
/// decoding never fails.
pub fn unescape(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        match decode_sequence(tail) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('#');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses `<digits>;` at the start of `tail`, returning the char and the
/// number of bytes consumed.
fn decode_sequence(tail: &str) -> Option<(char, usize)> {
    let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || tail.as_bytes().get(digits) != Some(&b';') {
        return None;
    }
    let code: u32 = tail[..digits].parse().ok()?;
    let c = char::from_u32(code)?;
    Some((c, digits + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape("a,b"), "a#44;b");
        assert_eq!(escape("x=y"), "x#61;y");
        assert_eq!(escape("#"), "#35;");
        assert_eq!(escape("{[\"]}"), "#123;#91;#34;#93;#125;");
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a#44;b"), "a,b");
        assert_eq!(unescape("#35;#61;"), "#=");
        assert_eq!(unescape("#9731;"), "\u{2603}");
    }

    #[test]
    fn test_unescape_malformed_is_literal() {
        assert_eq!(unescape("#"), "#");
        assert_eq!(unescape("#44"), "#44");
        assert_eq!(unescape("#x;"), "#x;");
        assert_eq!(unescape("a#;b"), "a#;b");
        // Surrogate code points are not chars.
        assert_eq!(unescape("#55296;"), "#55296;");
    }

    #[test]
    fn test_roundtrip_unicode() {
        let raw = "naïve, \"quoted\" #tag {x=[1,2]}";
        assert_eq!(unescape(&escape(raw)), raw);
    }
}
