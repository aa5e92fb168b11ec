//!
//! Single-pass assembler. Turns source lines into a memory image (one cell per instruction or data
//! word, starting at address 0) plus the label table.
//!
//! Each line is tokenized, register aliases are resolved, and the first token decides what the
//! line is:
//! - a mnemonic: an instruction, stored at the current address
//! - `label:` (optionally followed by an instruction or data word): binds the label to the
//!   current address
//! - `.data`, `.text`, `.end`: switch regions or stop assembling
//! - anything else is a data word inside `.data`, and an error outside of it
//!
//! Nothing here touches the simulator. The caller gets a complete [`Parsed`] image or an error,
//! never half of a program.
//!

pub mod context;
pub mod error;
pub mod lexer;
pub mod register_names;
mod util;

use crate::instruction::{InstructionRecord, Mnemonic};
use crate::simulator::memory::{Cell, IO_START};
use context::Context;
use error::{Contextualize, Error, ParserError};
use hashbrown::HashMap;
use lexer::{Lexer, Token};
use std::io;
use std::path::Path;
use std::rc::Rc;
pub use util::*;

/// Label name to address
pub type Labels = HashMap<String, usize>;

/// Cells can't be placed at or after this address, it's reserved for memory-mapped I/O
pub const ADDRESS_LIMIT: usize = IO_START;

/// Represents a successful parser result. The image is meant to be copied to memory starting at
/// address 0.
#[derive(Debug, Default)]
pub struct Parsed {
    pub image: Vec<Cell>,
    pub labels: Labels,
    /// Whether assembling stopped at an `.end` directive
    pub ended: bool,
}

pub type ParseResult = Result<Parsed, Error>;

/// The "current" parser region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Region {
    #[default]
    Text,
    Data,
}

pub trait AsmParser {
    /// Assembles an iterator of source lines. `file` is only used in error messages.
    /// ```
    /// use niosim::parser::AsmParser;
    /// let parsed = "main: movi r2, 5\nbreak"
    ///     .lines()
    ///     .map(|line| Ok::<_, std::io::Error>(line))
    ///     .parse_asm("inline.s")
    ///     .unwrap();
    /// assert_eq!(parsed.image.len(), 2);
    /// assert_eq!(parsed.labels["main"], 0);
    /// ```
    fn parse_asm(self, file: &str) -> ParseResult;
}

impl<I, S> AsmParser for I
where
    I: Iterator<Item = io::Result<S>>,
    S: AsRef<str>,
{
    fn parse_asm(self, file: &str) -> ParseResult {
        let file = Rc::new(file.to_owned());
        let mut state = State::default();

        for (line, number) in self.zip(1u32..) {
            let line = line.map_err(ParserError::from)?;
            let line = line.as_ref();
            let ctx = Context::new(&file, number, line);

            if state.line(line, &ctx)? == Flow::Stop {
                state.parsed.ended = true;
                break;
            }
        }

        tracing::debug!(
            file = %file,
            cells = state.parsed.image.len(),
            labels = state.parsed.labels.len(),
            "assembled"
        );
        Ok(state.parsed)
    }
}

/// Assembles a string
pub fn parse_str(source: &str, file: &str) -> ParseResult {
    source.lines().map(Ok::<_, io::Error>).parse_asm(file)
}

/// Assembles a file from disk
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult {
    let name = path.as_ref().display().to_string();
    file_lines(&path)
        .map_err(ParserError::from)?
        .parse_asm(&name)
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[derive(Default)]
struct State {
    lexer: Lexer,
    region: Region,
    parsed: Parsed,
}

impl State {
    fn line(&mut self, line: &str, ctx: &Context) -> Result<Flow, Error> {
        let mut tokens = self.lexer.tokenize(line);
        for token in &mut tokens {
            match register_names::resolve(&token.text) {
                Ok(Some(name)) => token.text = name.to_owned(),
                Ok(None) => {}
                Err(e) => return Err(e.with_context(ctx.clone().at(token.span.start))),
            }
        }

        let Some(first) = tokens.first() else {
            return Ok(Flow::Continue);
        };

        if Mnemonic::is_mnemonic(&first.text) {
            let record = record(tokens, line);
            self.place(Cell::Instruction(record), ctx)?;
        } else if let Some(colon) = first.text.find(':') {
            let label = &first.text[..colon];
            if label.is_empty() {
                return Err(ParserError::UnrecognizedMnemonic(first.text.clone())
                    .with_context(ctx.clone().at(first.span.start)));
            }

            let address = self.parsed.image.len();
            if let Some(old) = self.parsed.labels.insert(label.to_owned(), address) {
                tracing::warn!(label, old, new = address, line = ctx.line, "label redefined");
            }

            // `label:instr` has no space between the label and the instruction
            let rest = first.text[colon + 1..].to_owned();
            let rest_span = first.span.start + colon + 1..first.span.end;
            let mut body = tokens.split_off(1);
            if !rest.is_empty() {
                body.insert(0, Token::new(rest, rest_span));
            }

            if body.is_empty() {
                return Ok(Flow::Continue);
            }

            let cell = if self.region == Region::Data && !Mnemonic::is_mnemonic(&body[0].text) {
                data_word(&body, ctx)?
            } else {
                Cell::Instruction(record(body, line))
            };
            self.place(cell, ctx)?;
        } else if first.text.starts_with('.') {
            match first.text.as_str() {
                ".data" => self.region = Region::Data,
                ".text" => self.region = Region::Text,
                ".end" => return Ok(Flow::Stop),
                other => tracing::debug!(directive = other, line = ctx.line, "ignoring directive"),
            }
        } else if self.region == Region::Data {
            let cell = data_word(&tokens, ctx)?;
            self.place(cell, ctx)?;
        } else {
            return Err(ParserError::UnrecognizedMnemonic(first.text.clone())
                .with_context(ctx.clone().at(first.span.start)));
        }

        Ok(Flow::Continue)
    }

    /// Puts `cell` at the current address, and moves to the next one
    fn place(&mut self, cell: Cell, ctx: &Context) -> Result<(), Error> {
        if self.parsed.image.len() >= ADDRESS_LIMIT {
            return Err(ParserError::CapacityExceeded {
                capacity: ADDRESS_LIMIT,
            }
            .with_context(ctx.clone())
            .with_tip("the last two addresses are reserved for the display and the switches"));
        }
        self.parsed.image.push(cell);
        Ok(())
    }
}

/// Builds an instruction record out of tokens. The display text is the part of the line the
/// tokens span, so labels and comments around the instruction are left out.
fn record(tokens: Vec<Token>, line: &str) -> InstructionRecord {
    let start = tokens.first().map_or(0, |t| t.span.start);
    let end = tokens.last().map_or(0, |t| t.span.end);
    // keep the closing parenthesis of `offset(base)`
    let parens = line
        .get(end..)
        .map_or(0, |rest| rest.len() - rest.trim_start_matches(')').len());
    let end = end + parens;
    let text = line
        .get(start..end)
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let tokens = tokens.into_iter().map(|t| t.text).collect();
    InstructionRecord::from_tokens(tokens, text).unwrap_or_else(|| InstructionRecord {
        mnemonic: String::new(),
        operands: Vec::new(),
        text: String::new(),
    })
}

fn data_word(tokens: &[Token], ctx: &Context) -> Result<Cell, Error> {
    match tokens {
        [token] => parse_integer(&token.text)
            .map(|x| Cell::Data(crate::bits::signed32(x)))
            .ok_or_else(|| {
                ParserError::InvalidDataWord(token.text.clone())
                    .with_context(ctx.clone().at(token.span.start))
            }),
        _ => {
            let text = tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let start = tokens.first().map_or(0, |t| t.span.start);
            Err(ParserError::InvalidDataWord(text).with_context(ctx.clone().at(start)))
        }
    }
}
