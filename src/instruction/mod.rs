//!
//! Instruction representation. The assembler stores [`InstructionRecord`]s in memory, exactly as
//! they were written (minus comments and aliases), and the simulator decodes them into an
//! [`Instruction`] right before executing them. Labels are only resolved at that point, so
//! forward references work without a second assembler pass.
//!

use crate::parser::{self, register_names, Labels};
use crate::simulator::error::ExecError;
use hashbrown::HashMap;
use lazy_static::lazy_static;
use std::fmt;

/// Instruction encodings, distinguished by operand shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Three registers
    R,
    /// Two registers and an immediate
    I,
    /// A single address/immediate
    J,
    /// Pseudoinstructions that fit nowhere else
    Other,
}

macro_rules! mnemonics {
    ($($format:ident { $($variant:ident => $name:literal),* $(,)? })*) => {
        /// Every mnemonic the simulator knows about. Adding one here makes the executor fail to
        /// compile until its semantics are written down.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Mnemonic {
            $($($variant,)*)*
        }

        impl Mnemonic {
            pub const ALL: &'static [Mnemonic] = &[$($(Mnemonic::$variant,)*)*];

            pub fn name(self) -> &'static str {
                match self {
                    $($(Mnemonic::$variant => $name,)*)*
                }
            }

            pub fn format(self) -> Format {
                match self {
                    $($(Mnemonic::$variant => Format::$format,)*)*
                }
            }
        }
    };
}

mnemonics! {
    R {
        Add => "add", And => "and", Break => "break", Bret => "bret", Callr => "callr",
        Cmpeq => "cmpeq", Cmpge => "cmpge", Cmpgeu => "cmpgeu", Cmpgt => "cmpgt",
        Cmpgtu => "cmpgtu", Cmple => "cmple", Cmpleu => "cmpleu", Cmplt => "cmplt",
        Cmpltu => "cmpltu", Cmpne => "cmpne", Custom => "custom", Div => "div", Divu => "divu",
        Jmp => "jmp", Mov => "mov", Mul => "mul", Mulxss => "mulxss", Mulxsu => "mulxsu",
        Mulxuu => "mulxuu", Nextpc => "nextpc", Nor => "nor", Or => "or", Ret => "ret",
        Rol => "rol", Roli => "roli", Ror => "ror", Sll => "sll", Slli => "slli", Sra => "sra",
        Srai => "srai", Srl => "srl", Srli => "srli", Sub => "sub", Sync => "sync", Xor => "xor",
    }
    I {
        Addi => "addi", Andhi => "andhi", Andi => "andi", Beq => "beq", Bge => "bge",
        Bgeu => "bgeu", Bgt => "bgt", Bgtu => "bgtu", Ble => "ble", Bleu => "bleu", Blt => "blt",
        Bltu => "bltu", Bne => "bne", Br => "br", Cmpeqi => "cmpeqi", Cmpgei => "cmpgei",
        Cmpgeui => "cmpgeui", Cmpgti => "cmpgti", Cmpgtui => "cmpgtui", Cmplei => "cmplei",
        Cmpleui => "cmpleui", Cmplti => "cmplti", Cmpltui => "cmpltui", Cmpnei => "cmpnei",
        Ldb => "ldb", Ldbu => "ldbu", Ldh => "ldh", Ldhu => "ldhu", Ldw => "ldw",
        Movhi => "movhi", Movi => "movi", Movia => "movia", Movui => "movui", Muli => "muli",
        Orhi => "orhi", Ori => "ori", Stb => "stb", Sth => "sth", Stw => "stw", Subi => "subi",
        Xorhi => "xorhi", Xori => "xori",
    }
    J {
        Call => "call", Jmpi => "jmpi",
    }
    Other {
        Nop => "nop",
    }
}

lazy_static! {
    static ref BY_NAME: HashMap<&'static str, Mnemonic> =
        Mnemonic::ALL.iter().map(|&m| (m.name(), m)).collect();
}

impl Mnemonic {
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name).copied()
    }

    pub fn is_mnemonic(name: &str) -> bool {
        BY_NAME.contains_key(name)
    }

    /// Whether the first operand is a destination register. Those instructions can never name
    /// `r0`, see [`ExecError::ReservedRegisterWrite`].
    pub fn writes_first_operand(self) -> bool {
        use Mnemonic::*;
        !matches!(
            self,
            Break
                | Bret
                | Callr
                | Custom
                | Jmp
                | Ret
                | Sync
                | Beq
                | Bge
                | Bgeu
                | Bgt
                | Bgtu
                | Ble
                | Bleu
                | Blt
                | Bltu
                | Bne
                | Br
                | Stb
                | Sth
                | Stw
                | Call
                | Jmpi
                | Nop
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instruction as it sits in memory: the tokens the assembler found, plus the cleaned-up
/// source line so collaborators can show it back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRecord {
    pub mnemonic: String,
    /// Only the first three are ever decoded, the rest are kept for display
    pub operands: Vec<String>,
    pub text: String,
}

impl InstructionRecord {
    /// Builds a record from a non-empty token list. Returns `None` if `tokens` is empty.
    pub fn from_tokens(mut tokens: Vec<String>, text: impl Into<String>) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        let operands = tokens.split_off(1);
        let mnemonic = tokens.pop()?;
        Some(Self {
            mnemonic,
            operands,
            text: text.into(),
        })
    }
}

impl fmt::Display for InstructionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.text.is_empty() {
            return f.write_str(&self.text);
        }

        write!(f, "{}", self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{op}")?;
        }
        Ok(())
    }
}

/// A decoded operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operand {
    #[default]
    Missing,
    /// `rN`, already validated to be in `0..=31`
    Register(u8),
    /// A literal, or the address of a label
    Value(i32),
}

impl Operand {
    /// Decodes a single token: `rN` is a register, a known label is its address, and anything
    /// else must be an integer literal. Literals above `0x7FFFFFFF` become negative.
    pub fn decode(token: &str, labels: &Labels) -> Result<Self, ExecError> {
        if let Some(n) = register_names::register_number(token) {
            return u8::try_from(n)
                .ok()
                .filter(|&n| (n as usize) < register_names::REGISTER_COUNT)
                .map(Operand::Register)
                .ok_or_else(|| ExecError::UnknownRegister(token.to_owned()));
        }

        if let Some(&address) = labels.get(token) {
            return Ok(Operand::Value(address as i32));
        }

        parser::parse_integer(token)
            .map(|x| Operand::Value(crate::bits::signed32(x)))
            .ok_or_else(|| ExecError::BadOperand {
                token: token.to_owned(),
                expected: "a register, a label or an integer",
            })
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Missing => write!(f, "_"),
            Operand::Register(r) => write!(f, "r{r}"),
            Operand::Value(x) => write!(f, "{x}"),
        }
    }
}

/// A fully decoded instruction, ready to be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub operands: [Operand; 3],
}

impl Instruction {
    pub fn decode(record: &InstructionRecord, labels: &Labels) -> Result<Self, ExecError> {
        let mnemonic = Mnemonic::from_name(&record.mnemonic)
            .ok_or_else(|| ExecError::UnidentifiedInstruction(record.mnemonic.clone()))?;

        let mut operands = [Operand::Missing; 3];
        for (slot, token) in operands.iter_mut().zip(&record.operands) {
            *slot = Operand::decode(token, labels)?;
        }

        let instruction = Self { mnemonic, operands };
        if mnemonic.writes_first_operand() && instruction.operands[0] == Operand::Register(0) {
            return Err(ExecError::ReservedRegisterWrite(mnemonic));
        }

        Ok(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        let present = self.operands.iter().take_while(|op| **op != Operand::Missing);
        for (i, op) in present.enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{op}")?;
        }
        Ok(())
    }
}
