use crate::instruction::Mnemonic;
use crate::parser;
use owo_colors::OwoColorize;
use thiserror::Error;

/// Something went wrong while executing an instruction. Everything but
/// [`ExecError::DivideByZero`] halts the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("'{}' can't write to r0", .0.bright_yellow())]
    ReservedRegisterWrite(Mnemonic),

    #[error("Nothing stored at address {}", format!("{:#06X}", .address).bright_yellow())]
    UndefinedMemoryAccess { address: usize },

    #[error("Division by zero")]
    DivideByZero,

    #[error("Unidentified instruction '{}'", .0.bright_yellow())]
    UnidentifiedInstruction(String),

    #[error("Unknown register '{}'", .0.bright_yellow())]
    UnknownRegister(String),

    #[error("Address {} holds data, not an instruction", format!("{:#06X}", .address).bright_yellow())]
    NotAnInstruction { address: usize },

    #[error("Bad operand '{}', expected {expected}", .token.bright_yellow())]
    BadOperand {
        token: String,
        expected: &'static str,
    },

    #[error("Address {} is out of range", .0.bright_yellow())]
    AddressOutOfRange(i64),
}

impl ExecError {
    /// Whether execution can go on after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExecError::DivideByZero)
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{0}")]
    Parse(#[from] parser::error::Error),

    #[error("Can't load a program while another one is running")]
    Busy,

    #[error("The simulator has halted, restart or load a program first")]
    NotRunnable,
}
