//!
//! Bit-width normalization. Every arithmetic result in the simulator goes through here before it
//! lands in a register, so overflow behaves like two's-complement hardware would.
//!
//! Note that the unsigned mode is *magnitude based*: it takes the absolute value before
//! truncating, instead of reinterpreting the bits. Programs written for the classroom simulator
//! depend on it (`cmpgeu r1, r2, r3` compares |r2| and |r3|, for example).
//!

/// Default width of a machine word
pub const WORD_BITS: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Mask with the `width` lowest bits set
const fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

/// The raw `width`-bit pattern `value` is truncated to
fn truncated(value: i64, mode: Signedness, width: u32) -> u64 {
    debug_assert!(
        (1..=WORD_BITS).contains(&width),
        "width {width} is not a valid word width"
    );

    let bits = match mode {
        Signedness::Signed => value as u64,
        Signedness::Unsigned => value.unsigned_abs(),
    };
    bits & low_mask(width)
}

/// Coerces `value` into a `width`-bit integer.
/// - `Signed`: keeps the low `width` bits and sign-extends them, so `0x7FFF_FFFF + 1` wraps to
///   `-2147483648` at width 32.
/// - `Unsigned`: keeps the low `width` bits of `|value|`. The result is never negative.
///
/// ```
/// use niosim::bits::{normalize, Signedness::*};
/// assert_eq!(normalize(0x7FFF_FFFF + 1, Signed, 32), -2147483648);
/// assert_eq!(normalize(-5, Unsigned, 32), 5);
/// assert_eq!(normalize(0x1FF, Signed, 8), -1);
/// ```
pub fn normalize(value: i64, mode: Signedness, width: u32) -> i64 {
    let bits = truncated(value, mode, width);
    match mode {
        Signedness::Unsigned => bits as i64,
        Signedness::Signed => {
            let sign = 1u64 << (width - 1);
            if bits & sign != 0 {
                bits as i64 - (1i64 << width)
            } else {
                bits as i64
            }
        }
    }
}

/// Same as [`normalize`], but returns the binary representation. The string always has exactly
/// `width` characters: high-order bits are discarded and missing ones are zero-padded.
///
/// ```
/// use niosim::bits::{normalize_bits, Signedness::*};
/// assert_eq!(normalize_bits(-1, Signed, 8), "11111111");
/// assert_eq!(normalize_bits(-1, Unsigned, 8), "00000001");
/// ```
pub fn normalize_bits(value: i64, mode: Signedness, width: u32) -> String {
    format!(
        "{:0width$b}",
        truncated(value, mode, width),
        width = width as usize
    )
}

/// Shorthand for a signed, 32-bit [`normalize`]
pub fn signed32(value: i64) -> i32 {
    normalize(value, Signedness::Signed, WORD_BITS) as i32
}

/// Shorthand for an unsigned, 32-bit [`normalize`]. Remember this takes the magnitude first!
pub fn unsigned32(value: i64) -> u32 {
    normalize(value, Signedness::Unsigned, WORD_BITS) as u32
}
