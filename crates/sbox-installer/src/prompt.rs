//! Operator interaction.

#![allow(async_fn_in_trait)]

use std::io::Write;

use sbox_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

/// Asks the operator questions.
pub trait Prompt {
    /// Print `question` and read one line, without its line terminator.
    async fn ask(&mut self, question: &str) -> Result<String>;

    /// Print `question` and read one line without echoing it.
    async fn ask_secret(&mut self, question: &str) -> Result<String>;
}

/// Remove the trailing line terminator and nothing else.
///
/// ```
/// use sbox_installer::prompt::strip_line_terminator;
///
/// assert_eq!(strip_line_terminator("Y\r\n"), "Y");
/// assert_eq!(strip_line_terminator(" Y \n"), " Y ");
/// ```
pub fn strip_line_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Prompt on the controlling terminal.
#[derive(Debug)]
pub struct TerminalPrompt {
    reader: BufReader<Stdin>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for TerminalPrompt {
    async fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        std::io::stdout().flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line).await?;
        Ok(strip_line_terminator(&line).to_string())
    }

    async fn ask_secret(&mut self, question: &str) -> Result<String> {
        let question = question.to_string();
        tokio::task::spawn_blocking(move || rpassword::prompt_password(question))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
            .map_err(Error::from)
    }
}
