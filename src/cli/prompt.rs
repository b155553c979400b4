//! Line-based prompting for the interactive commands.

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Reads answers from `input` after writing prompts to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    /// Prompter over the process's stdin and stdout.
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask a question. Returns the trimmed answer, or `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask, substituting `default` for an empty answer.
    pub fn ask_or(&mut self, prompt: &str, default: &str) -> io::Result<Option<String>> {
        Ok(self
            .ask(prompt)?
            .map(|answer| if answer.is_empty() { default.to_string() } else { answer }))
    }

    /// True only when the answer equals `expected`, ignoring case.
    pub fn confirm(&mut self, prompt: &str, expected: &str) -> io::Result<bool> {
        Ok(self
            .ask(prompt)?
            .is_some_and(|answer| answer.eq_ignore_ascii_case(expected)))
    }

    /// Write a line to the prompt's output.
    pub fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_trims_and_detects_eof() {
        let mut p = Prompter::new(Cursor::new("  hello \n"), Vec::new());
        assert_eq!(p.ask("Name: ").unwrap().as_deref(), Some("hello"));
        assert_eq!(p.ask("Again: ").unwrap(), None);
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "Name: Again: ");
    }

    #[test]
    fn test_confirm_and_default() {
        let mut p = Prompter::new(Cursor::new("YES\nno\n\n"), Vec::new());
        assert!(p.confirm("? ", "yes").unwrap());
        assert!(!p.confirm("? ", "yes").unwrap());
        assert_eq!(p.ask_or("File: ", "clip").unwrap().as_deref(), Some("clip"));
        assert!(!p.confirm("? ", "yes").unwrap());
    }
}
