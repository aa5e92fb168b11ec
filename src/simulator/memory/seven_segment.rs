//! Seven segment encoding. Bit 0 is segment `a`, bit 6 is segment `g`, and bit 7 (the decimal
//! point) is ignored.

use super::consts::DISPLAY_DIGITS;
use hashbrown::HashMap;
use lazy_static::lazy_static;

/// Shown for codes that don't match any glyph
pub const BLANK: char = ' ';

/// Standard codes first, so [`code`] prefers them over the aliases
const TABLE: [(u8, char); 20] = [
    (0x3F, '0'),
    (0x06, '1'),
    (0x5B, '2'),
    (0x4F, '3'),
    (0x66, '4'),
    (0x6D, '5'),
    (0x7D, '6'),
    (0x07, '7'),
    (0x7F, '8'),
    (0x6F, '9'),
    (0x67, '9'), // without the bottom segment
    (0x26, '4'), // the classroom simulator's codes for 4 and 5
    (0x5D, '5'),
    (0x40, '-'),
    (0x77, 'A'),
    (0x7C, 'b'),
    (0x39, 'C'),
    (0x5E, 'd'),
    (0x79, 'E'),
    (0x71, 'F'),
];

lazy_static! {
    static ref GLYPHS: HashMap<u8, char> = TABLE.iter().copied().collect();
}

pub fn glyph(code: u8) -> char {
    GLYPHS.get(&(code & 0x7F)).copied().unwrap_or(BLANK)
}

/// Inverse of [`glyph`], mostly useful to build display words
pub fn code(glyph: char) -> Option<u8> {
    TABLE.iter().find(|(_, g)| *g == glyph).map(|(c, _)| *c)
}

/// Renders a display word. The most significant byte is the leftmost digit.
pub fn render(word: i32) -> [char; DISPLAY_DIGITS] {
    let bytes = (word as u32).to_be_bytes();
    bytes.map(glyph)
}
