use crate::parser::register_names::{ALIASES, REGISTER_COUNT};
use owo_colors::OwoColorize;
use std::fmt;

/// 32 general purpose registers. `r0` is not hardwired to zero, the decoder just refuses to
/// write it. A register can also be undefined, which only happens after a division by zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [Option<i32>; REGISTER_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            regs: [Some(0); REGISTER_COUNT],
        }
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register as a source operand. Undefined reads as 0.
    pub fn read(&self, i: u8) -> i32 {
        match self.get(i) {
            Some(x) => x,
            None => {
                tracing::warn!(register = i, "reading undefined register as 0");
                0
            }
        }
    }

    /// `None` if the register is undefined
    pub fn get(&self, i: u8) -> Option<i32> {
        self.regs[i as usize]
    }

    pub fn write(&mut self, i: u8, x: i32) {
        self.regs[i as usize] = Some(x);
    }

    pub fn set_undefined(&mut self, i: u8) {
        self.regs[i as usize] = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<i32>> + '_ {
        self.regs.iter().copied()
    }

    /// Colored dump for the terminal, 4 registers per line
    pub fn print(&self) {
        eprintln!("{}", "Registers:".bright_blue());
        for (i, reg) in self.regs.iter().enumerate() {
            match reg {
                Some(x) => eprint!("{}{:02}: {:08x} ", "r".bright_blue(), i.bright_blue(), x),
                None => eprint!("{}{:02}: {} ", "r".bright_blue(), i.bright_blue(), "undefd".red()),
            }
            if i % 4 == 3 {
                eprintln!();
            }
        }
        eprintln!();
    }
}

fn name(i: usize) -> String {
    match i.checked_sub(24).and_then(|k| ALIASES.get(k)) {
        Some(alias) => format!("r{i} ({alias})"),
        None => format!("r{i}"),
    }
}

/// One register per line: name, decimal, hex
impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, reg) in self.regs.iter().enumerate() {
            match reg {
                Some(x) => writeln!(f, "{:<13}{:>12}  0x{:08X}", name(i), x, *x as u32)?,
                None => writeln!(f, "{:<13}{:>12}", name(i), "undefined")?,
            }
        }
        Ok(())
    }
}
