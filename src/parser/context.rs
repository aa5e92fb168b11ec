use owo_colors::OwoColorize;
use std::{fmt, rc::Rc};

/// Where something happened in the source: file, line, column, and the line itself so we can
/// print it back without opening the file again
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Context {
    pub file: Rc<String>,
    pub line: u32,
    pub column: u32,
    pub source: String,
}

impl Context {
    pub fn new(file: &Rc<String>, line: u32, source: &str) -> Self {
        Self {
            file: file.clone(),
            line,
            column: 1,
            source: source.to_owned(),
        }
    }

    /// Points the context at byte offset `offset` of the source line
    pub fn at(mut self, offset: usize) -> Self {
        let prefix = self.source.get(..offset).unwrap_or(&self.source);
        self.column = prefix.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum::<u32>() + 1;
        self
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "   {} {} at line {}, column {}",
            "-->".bright_blue().bold(),
            self.file.bright_yellow(),
            self.line.bright_yellow(),
            self.column.bright_yellow(),
        )?;

        let source = self.source.replace('\t', "    ");
        writeln!(f, "{:^4}{} {}", self.line.bright_blue(), "|".bright_blue(), source)?;
        for _ in 0..self.column + 4 {
            write!(f, "{}", ".".bright_red())?;
        }
        writeln!(f, "{}", "^ Here".bright_red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns() {
        let file = Rc::new("test.s".to_owned());
        let ctx = Context::new(&file, 3, "add r1, r2, r40").at(12);
        assert_eq!(ctx.line, 3);
        assert_eq!(ctx.column, 13);

        let ctx = Context::new(&file, 1, "\tadd r1").at(1);
        assert_eq!(ctx.column, 5);
    }
}
