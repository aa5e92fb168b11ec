/// Number of addressable cells, `0x0000..=0xFFFF`
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Memory-mapped I/O starts here and runs to the end of memory
pub const IO_START: usize = 0xFFFE;

/// Seven segment display, one byte per digit
pub const DISPLAY_ADDRESS: usize = 0xFFFE;

/// Slide switches, bit `n` is switch `n`
pub const SWITCH_ADDRESS: usize = 0xFFFF;

pub const SWITCH_COUNT: u32 = 4;

/// Digits on the seven segment display
pub const DISPLAY_DIGITS: usize = 4;
