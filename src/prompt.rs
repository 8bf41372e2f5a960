//! Interactive yes/no confirmation.
//!
//! Business logic asks questions through the [`Prompt`] trait so it can be
//! exercised without a terminal.
use std::io::{self, BufRead, Write};

use anyhow::{Context as _, Result};

/// A source of yes/no answers.
pub trait Prompt: Send + Sync + std::fmt::Debug {
    /// Ask `question`; an empty answer selects `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Interpret a typed answer. Anything other than `y`/`yes` is a no, except
/// an empty answer which selects the default.
#[must_use]
pub fn parse_answer(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    }
}

/// Asks on stdout and reads the answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    #[allow(clippy::print_stdout)]
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        print!("{question} {hint}: ");
        io::stdout().flush().context("failed to flush prompt")?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("failed to read user input")?;
        Ok(parse_answer(&answer, default))
    }
}

/// Answers every question with its default, as if enter were pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AutoPrompt;

impl Prompt for AutoPrompt {
    fn confirm(&self, _question: &str, default: bool) -> Result<bool> {
        Ok(default)
    }
}
