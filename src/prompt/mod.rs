use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Why a raw selection was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidChoice {
    #[error("{0:?} is not a number")]
    NotANumber(String),
    #[error("{0} is out of range (1-{1})")]
    OutOfRange(String, usize),
}

#[derive(Debug, Error)]
pub enum ChooseError {
    #[error("input closed before a selection was made, aborted")]
    Aborted,
    #[error("nothing to choose from")]
    NoChoices,
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Validate a 1-based selection against `n` choices, returning the 0-based index
pub fn parse_choice(raw: &str, n: usize) -> Result<usize, InvalidChoice> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidChoice::NotANumber(raw.to_string()));
    }
    match raw.parse::<usize>() {
        Ok(i) if (1..=n).contains(&i) => Ok(i - 1),
        _ => Err(InvalidChoice::OutOfRange(raw.to_string(), n)),
    }
}

/// Chooser prompts an operator over a line-based reader/writer pair
pub struct Chooser<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Chooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Writer used for prompts; the session prints its report here too
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Read one line without its terminator. `None` means end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Show a numbered list and block until a valid selection is entered
    pub fn choose<'a>(&mut self, prompt: &str, choices: &'a [String]) -> Result<&'a str, ChooseError> {
        if choices.is_empty() {
            return Err(ChooseError::NoChoices);
        }

        writeln!(self.output)?;
        writeln!(self.output, "{}", prompt)?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, choice)?;
        }

        loop {
            write!(self.output, "Select: ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Err(ChooseError::Aborted);
            };

            match parse_choice(&line, choices.len()) {
                Ok(index) => return Ok(&choices[index]),
                Err(e) => {
                    tracing::debug!("Rejected selection: {}", e);
                    writeln!(self.output, "Enter a number between 1 and {}.", choices.len())?;
                }
            }
        }
    }

    /// Ask a yes/no question. Only "y" (any case) counts as yes.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool, ChooseError> {
        writeln!(self.output)?;
        write!(self.output, "{} [y/N]: ", prompt)?;
        self.output.flush()?;

        Ok(self
            .read_line()?
            .is_some_and(|line| line.trim().eq_ignore_ascii_case("y")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chooser(input: &str) -> Chooser<Cursor<Vec<u8>>, Vec<u8>> {
        Chooser::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn choices() -> Vec<String> {
        vec!["edge".to_string(), "spine".to_string()]
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1", 2), Ok(0));
        assert_eq!(parse_choice(" 2 ", 2), Ok(1));
        assert!(matches!(parse_choice("0", 2), Err(InvalidChoice::OutOfRange(..))));
        assert!(matches!(parse_choice("3", 2), Err(InvalidChoice::OutOfRange(..))));
        assert!(matches!(
            parse_choice("99999999999999999999999", 2),
            Err(InvalidChoice::OutOfRange(..))
        ));
        assert!(matches!(parse_choice("", 2), Err(InvalidChoice::NotANumber(_))));
        assert!(matches!(parse_choice("+1", 2), Err(InvalidChoice::NotANumber(_))));
        assert!(matches!(parse_choice("-1", 2), Err(InvalidChoice::NotANumber(_))));
        assert!(matches!(parse_choice("edge", 2), Err(InvalidChoice::NotANumber(_))));
    }

    #[test]
    fn test_choose_reprompts_until_valid() {
        let mut c = chooser("abc\n0\n7\n2\n");
        let choices = choices();
        assert_eq!(c.choose("Choose a role", &choices).unwrap(), "spine");

        let out = String::from_utf8(c.output().clone()).unwrap();
        assert!(out.contains("Choose a role"));
        assert!(out.contains("  1) edge"));
        assert!(out.contains("  2) spine"));
        assert_eq!(out.matches("Select: ").count(), 4);
    }

    #[test]
    fn test_choose_aborts_on_eof() {
        let mut c = chooser("nope\n");
        let choices = choices();
        assert!(matches!(c.choose("Choose a role", &choices), Err(ChooseError::Aborted)));
    }

    #[test]
    fn test_choose_without_choices() {
        let mut c = chooser("1\n");
        assert!(matches!(c.choose("Choose a site", &[]), Err(ChooseError::NoChoices)));
    }

    #[test]
    fn test_confirm() {
        assert!(chooser("y\n").confirm("Proceed?").unwrap());
        assert!(chooser("Y\r\n").confirm("Proceed?").unwrap());
        assert!(!chooser("yes\n").confirm("Proceed?").unwrap());
        assert!(!chooser("\n").confirm("Proceed?").unwrap());
        assert!(!chooser("").confirm("Proceed?").unwrap());
    }
}
