//! Recursive-descent JSON parser.
//!
//! Input arrives from untrusted network callers, so the parser enforces a
//! nesting depth cap and reports precise failures instead of panicking.

use crate::value::Value;
use thiserror::Error;

/// Maximum nesting depth accepted from the wire.
const MAX_DEPTH: usize = 64;

/// Error produced by [`parse`] on malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {ch:?} at byte {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("trailing garbage at byte {pos}")]
    TrailingGarbage { pos: usize },

    #[error("unterminated string starting at byte {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid escape sequence at byte {pos}")]
    InvalidEscape { pos: usize },

    #[error("raw control character in string at byte {pos}")]
    ControlCharacter { pos: usize },

    #[error("number at byte {pos} is out of range")]
    NumberOutOfRange { pos: usize },

    #[error("malformed number at byte {pos}")]
    InvalidNumber { pos: usize },

    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// Parse a complete JSON document. Trailing non-whitespace is an error.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    let mut p = Parser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    p.skip_ws();
    let value = p.value(0)?;
    p.skip_ws();
    if p.pos < p.bytes.len() {
        return Err(ParseError::TrailingGarbage { pos: p.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(b) => ParseError::UnexpectedChar {
                pos: self.pos,
                ch: b as char,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn literal(&mut self, word: &str, value: Value) -> Result<Value, ParseError> {
        if self.bytes[self.pos..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.unexpected())
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep);
        }
        match self.peek().ok_or(ParseError::UnexpectedEnd)? {
            b'{' => self.object(depth),
            b'[' => self.array(depth),
            b'"' => Ok(Value::String(self.string()?)),
            b't' => self.literal("true", Value::Bool(true)),
            b'f' => self.literal("false", Value::Bool(false)),
            b'n' => self.literal("null", Value::Null),
            b'-' | b'0'..=b'9' => self.number(),
            _ => Err(self.unexpected()),
        }
    }

    fn object(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect(b'{')?;
        let mut out = Value::object();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(out);
        }
        loop {
            self.skip_ws();
            let key = self.string()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;
            // duplicate keys: last value wins, first position kept
            out.set(key, value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(out);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn array(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            let b = self
                .peek()
                .ok_or(ParseError::UnterminatedString { pos: start })?;
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    self.pos += 1;
                    self.escape(&mut out)?;
                }
                0x00..=0x1F => {
                    return Err(ParseError::ControlCharacter { pos: self.pos });
                }
                _ => {
                    // copy a full UTF-8 sequence; input is a &str so the
                    // continuation bytes are guaranteed well-formed
                    let len = utf8_len(b);
                    let end = self.pos + len;
                    if end > self.bytes.len() {
                        return Err(ParseError::UnterminatedString { pos: start });
                    }
                    out.push_str(
                        std::str::from_utf8(&self.bytes[self.pos..end])
                            .map_err(|_| ParseError::UnterminatedString { pos: start })?,
                    );
                    self.pos = end;
                }
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let pos = self.pos - 1;
        let b = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let first = self.hex4(pos)?;
                let ch = if (0xD800..0xDC00).contains(&first) {
                    // high surrogate: require a paired \uXXXX low surrogate
                    if self.peek() != Some(b'\\') {
                        return Err(ParseError::InvalidEscape { pos });
                    }
                    self.pos += 1;
                    if self.peek() != Some(b'u') {
                        return Err(ParseError::InvalidEscape { pos });
                    }
                    self.pos += 1;
                    let second = self.hex4(pos)?;
                    if !(0xDC00..0xE000).contains(&second) {
                        return Err(ParseError::InvalidEscape { pos });
                    }
                    let cp = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    char::from_u32(cp).ok_or(ParseError::InvalidEscape { pos })?
                } else if (0xDC00..0xE000).contains(&first) {
                    return Err(ParseError::InvalidEscape { pos });
                } else {
                    char::from_u32(first).ok_or(ParseError::InvalidEscape { pos })?
                };
                out.push(ch);
            }
            _ => return Err(ParseError::InvalidEscape { pos }),
        }
        Ok(())
    }

    fn hex4(&mut self, escape_pos: usize) -> Result<u32, ParseError> {
        let end = self.pos + 4;
        if end > self.bytes.len() {
            return Err(ParseError::UnexpectedEnd);
        }
        let digits = std::str::from_utf8(&self.bytes[self.pos..end])
            .map_err(|_| ParseError::InvalidEscape { pos: escape_pos })?;
        let n = u32::from_str_radix(digits, 16)
            .map_err(|_| ParseError::InvalidEscape { pos: escape_pos })?;
        self.pos = end;
        Ok(n)
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(ParseError::InvalidNumber { pos: start });
        }
        // leading zeros are not valid JSON
        if self.pos - digits_start > 1 && self.bytes[digits_start] == b'0' {
            return Err(ParseError::InvalidNumber { pos: start });
        }
        let mut is_double = false;
        if self.peek() == Some(b'.') {
            is_double = true;
            self.pos += 1;
            let frac_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(ParseError::InvalidNumber { pos: start });
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_double = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(ParseError::InvalidNumber { pos: start });
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| ParseError::InvalidNumber { pos: start })?;
        if is_double {
            let d: f64 = text
                .parse()
                .map_err(|_| ParseError::InvalidNumber { pos: start })?;
            if !d.is_finite() {
                return Err(ParseError::NumberOutOfRange { pos: start });
            }
            return Ok(Value::Double(d));
        }
        if negative {
            let n: i64 = text
                .parse()
                .map_err(|_| ParseError::NumberOutOfRange { pos: start })?;
            Ok(Value::Int(n))
        } else {
            let n: u64 = text
                .parse()
                .map_err(|_| ParseError::NumberOutOfRange { pos: start })?;
            match i64::try_from(n) {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => Ok(Value::UInt(n)),
            }
        }
    }
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("42").unwrap(), Value::Int(42));
        assert_eq!(parse("-7").unwrap(), Value::Int(-7));
        assert_eq!(parse("3.25").unwrap(), Value::Double(3.25));
        assert_eq!(parse("\"hi\"").unwrap(), Value::String("hi".into()));
    }

    #[test]
    fn large_unsigned_keeps_precision() {
        let v = parse(&u64::MAX.to_string()).unwrap();
        assert_eq!(v, Value::UInt(u64::MAX));
    }

    #[test]
    fn preserves_object_key_order() {
        let v = parse(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&str> = v.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(
            parse("{} x"),
            Err(ParseError::TrailingGarbage { .. })
        ));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            parse("\"abc"),
            Err(ParseError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn rejects_invalid_escape() {
        assert!(matches!(
            parse(r#""\q""#),
            Err(ParseError::InvalidEscape { .. })
        ));
        assert!(matches!(
            parse(r#""\uD800""#),
            Err(ParseError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn decodes_surrogate_pairs() {
        let v = parse(r#""\uD83D\uDE00""#).unwrap();
        assert_eq!(v.as_str(), Some("\u{1F600}"));
    }

    #[test]
    fn passes_multibyte_utf8_through() {
        let v = parse("\"héllo 😀\"").unwrap();
        assert_eq!(v.as_str(), Some("héllo 😀"));
    }

    #[test]
    fn rejects_integer_overflow() {
        let too_big = format!("{}0", u64::MAX);
        assert!(matches!(
            parse(&too_big),
            Err(ParseError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_leading_zero() {
        assert!(matches!(parse("01"), Err(ParseError::InvalidNumber { .. })));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = "[".repeat(100) + &"]".repeat(100);
        assert_eq!(parse(&deep), Err(ParseError::TooDeep));
    }

    #[test]
    fn duplicate_keys_last_value_wins() {
        let v = parse(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.get("a").as_i64(), Some(2));
    }

    #[test]
    fn rejects_raw_control_character() {
        assert!(matches!(
            parse("\"a\u{0001}b\""),
            Err(ParseError::ControlCharacter { .. })
        ));
    }
}
