use crate::utf8_lossy_lines::Utf8LossyLinesExt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Returns an iterator over the lines of a file. Invalid UTF-8 is replaced, not rejected.
pub fn file_lines<P: AsRef<Path>>(
    filepath: P,
) -> Result<impl Iterator<Item = io::Result<String>>, io::Error> {
    let reader = File::open(filepath).map(BufReader::new)?;
    Ok(reader.utf8_lossy_lines())
}

/// Parses an integer literal: decimal, `0x` hex, `0b` binary or `0o` octal, with an optional
/// leading `-`.
/// ```
/// use niosim::parser::parse_integer;
/// assert_eq!(parse_integer("-0x10"), Some(-16));
/// assert_eq!(parse_integer("0b101"), Some(5));
/// assert_eq!(parse_integer("loop"), None);
/// ```
pub fn parse_integer(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    // from_str_radix would happily take a second sign after the prefix
    let prefixed = |prefix: &str| {
        digits
            .strip_prefix(prefix)
            .or_else(|| digits.strip_prefix(&prefix.to_uppercase()))
            .filter(|body| !body.starts_with(['+', '-']))
    };

    let magnitude = if let Some(hex) = prefixed("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = prefixed("0b") {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = prefixed("0o") {
        i64::from_str_radix(oct, 8)
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse::<i64>()
    } else {
        return None;
    };

    let magnitude = magnitude.ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
