//! Asking the operator what to do about an existing output file

use crate::output::SinkError;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::{Path, PathBuf};

/// What to do with an output file that already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Overwrite,
    Continue,
    NewPath(PathBuf),
    Abort,
}

/// Decides how to treat an existing output file
pub trait ConflictResolver {
    fn resolve(&mut self, path: &Path) -> Result<Choice, SinkError>;
}

/// Options offered to the operator, in the order they are listed
const OPTIONS: [(char, &str); 4] = [
    ('o', "overwrite"),
    ('c', "continue"),
    ('n', "enter a new path"),
    ('a', "abort"),
];

/// "Enter 'o' to overwrite, 'c' to continue, ... or 'a' to abort: "
fn instructions() -> String {
    let phrases: Vec<String> = OPTIONS
        .iter()
        .map(|(key, action)| format!("'{}' to {}", key, action))
        .collect();
    let (last, rest) = phrases.split_last().map_or(("", &[][..]), |(last, rest)| {
        (last.as_str(), rest)
    });
    format!("Enter {}, or {}: ", rest.join(", "), last)
}

/// Single-character prompt over any line source
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl InteractivePrompt<StdinLock<'static>, Stdout> {
    /// Prompt on the process's terminal
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads one trimmed line, `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>, SinkError> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_path(&mut self) -> Result<Choice, SinkError> {
        loop {
            write!(self.output, "New output path: ")?;
            match self.read_line()? {
                None => return Ok(Choice::Abort),
                Some(path) if path.is_empty() => continue,
                Some(path) => return Ok(Choice::NewPath(PathBuf::from(path))),
            }
        }
    }
}

impl<R: BufRead, W: Write> ConflictResolver for InteractivePrompt<R, W> {
    fn resolve(&mut self, path: &Path) -> Result<Choice, SinkError> {
        writeln!(self.output, "Output file {} already exists.", path.display())?;
        write!(self.output, "{}", instructions())?;

        loop {
            let Some(answer) = self.read_line()? else {
                return Ok(Choice::Abort);
            };

            match answer.to_lowercase().as_str() {
                "o" => return Ok(Choice::Overwrite),
                "c" => return Ok(Choice::Continue),
                "n" => return self.ask_path(),
                "a" => return Ok(Choice::Abort),
                _ => write!(self.output, "Invalid choice. {}", instructions())?,
            }
        }
    }
}

/// Resolver for runs where a conflict is never expected
///
/// Used whenever the policy is decided up front, so reaching it means the
/// policy was `Prompt` without a terminal.
pub struct NoPrompt;

impl ConflictResolver for NoPrompt {
    fn resolve(&mut self, path: &Path) -> Result<Choice, SinkError> {
        tracing::error!("{} exists and no prompt is available", path.display());
        Ok(Choice::Abort)
    }
}
