use super::context::Context;
use owo_colors::OwoColorize;
use std::{borrow::Cow, io};
use thiserror::Error;

/// Represents any kind of error the assembler may find. Any of these aborts the whole load.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Not the parser's fault, some std::io went wrong
    #[error("I/O Error: {0}")]
    IO(#[from] io::Error),

    #[error("Unknown Register '{}'", .0.bright_yellow())]
    UnknownRegister(String),

    #[error("Total instruction count exceeds memory limit: {} blocks", .capacity.bright_blue())]
    CapacityExceeded { capacity: usize },

    #[error("'{}' is not a proper instruction", .0.bright_yellow())]
    UnrecognizedMnemonic(String),

    #[error("Expected a single integer in the data region, but found '{}'", .0.bright_yellow())]
    InvalidDataWord(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Parser(#[from] ParserError),
    #[error("{}\n{}", err.bold(), ctx)]
    WithContext { err: Box<Error>, ctx: Context },
    #[error("{err}\n   {}: {tip}\n", "[tip]".bright_yellow())]
    WithTip {
        err: Box<Error>,
        tip: Cow<'static, str>,
    },
}

impl Error {
    /// The underlying error, without any context or tips around it
    pub fn kind(&self) -> &ParserError {
        match self {
            Error::Parser(e) => e,
            Error::WithContext { err, .. } | Error::WithTip { err, .. } => err.kind(),
        }
    }

    /// Where the error happened, if we know it
    pub fn context(&self) -> Option<&Context> {
        match self {
            Error::Parser(_) => None,
            Error::WithContext { ctx, .. } => Some(ctx),
            Error::WithTip { err, .. } => err.context(),
        }
    }

    /// 1-based source line of the error
    pub fn line(&self) -> Option<u32> {
        self.context().map(|ctx| ctx.line)
    }
}

pub trait Contextualize {
    fn with_context(self, ctx: Context) -> Error;
    fn with_tip(self, tip: impl Into<Cow<'static, str>>) -> Error;
}

impl Contextualize for Error {
    fn with_context(self, ctx: Context) -> Error {
        match self {
            Error::WithContext { err, .. } => Error::WithContext { err, ctx },
            _ => Error::WithContext {
                err: Box::new(self),
                ctx,
            },
        }
    }

    fn with_tip(self, tip: impl Into<Cow<'static, str>>) -> Error {
        Error::WithTip {
            err: Box::new(self),
            tip: tip.into(),
        }
    }
}

impl Contextualize for ParserError {
    fn with_context(self, ctx: Context) -> Error {
        Error::from(self).with_context(ctx)
    }

    fn with_tip(self, tip: impl Into<Cow<'static, str>>) -> Error {
        Error::from(self).with_tip(tip)
    }
}
