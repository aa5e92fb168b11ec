//!
//! Splits source lines into tokens. The only state carried from one line to the next is whether
//! we're inside a `/* ... */` block comment.
//!

use std::ops::Range;

/// A token and where it sits in its line (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

macro_rules! separator {
    () => {
        ' ' | ',' | ';' | '(' | ')' | '\t' | '\x0b'..='\x0d'
    };
}

/// Line lexer. Create one per load and feed it every line in order, so block comments that
/// span several lines are handled correctly.
#[derive(Debug, Default)]
pub struct Lexer {
    in_block_comment: bool,
}

/// Cursor over a single line
struct Cursor<'a> {
    line: &'a str,
    cursor: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.line.get(self.cursor..)?.chars().next()
    }

    fn rest(&self) -> &'a str {
        self.line.get(self.cursor..).unwrap_or("")
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn skip(&mut self, bytes: usize) {
        self.cursor = (self.cursor + bytes).min(self.line.len());
    }

    fn skip_to_end(&mut self) {
        self.cursor = self.line.len();
    }

    fn at_comment_open(&self) -> bool {
        self.rest().starts_with("/*")
    }

    fn at_comment_close(&self) -> bool {
        self.rest().starts_with("*/")
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_block_comment(&self) -> bool {
        self.in_block_comment
    }

    /// Tokenizes one line. Comments are dropped, as are stray `*/`.
    pub fn tokenize(&mut self, line: &str) -> Vec<Token> {
        let mut cur = Cursor { line, cursor: 0 };
        let mut tokens = Vec::new();

        loop {
            if self.in_block_comment {
                match cur.rest().find("*/") {
                    Some(end) => {
                        cur.skip(end + 2);
                        self.in_block_comment = false;
                    }
                    None => {
                        cur.skip_to_end();
                        break;
                    }
                }
            }

            match cur.peek() {
                None => break,
                Some(separator!()) => {
                    cur.consume();
                }
                Some('#') => break,
                Some(_) if cur.at_comment_open() => {
                    cur.skip(2);
                    self.in_block_comment = true;
                }
                Some(_) if cur.at_comment_close() => cur.skip(2),
                Some(_) => tokens.push(Self::next_token(&mut cur)),
            }
        }

        tokens
    }

    fn next_token(cur: &mut Cursor<'_>) -> Token {
        let start = cur.cursor;
        while let Some(c) = cur.peek() {
            if matches!(c, separator!()) || cur.at_comment_open() || cur.at_comment_close() {
                break;
            }
            cur.consume();
        }
        Token::new(&cur.line[start..cur.cursor], start..cur.cursor)
    }
}
