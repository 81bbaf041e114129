//! Scripted collaborators for exercising the installer without a terminal,
//! root privilege, USB hardware or network access.
//!
//! Each mock shares its recorded state with clones of itself, so a test can
//! hand one copy to the installer and keep another to inspect afterwards.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use sbox_core::{Config, Error, Result};
use sbox_network::{Registrar, RegistrationError, RegistrationResponse};

use crate::prompt::Prompt;
use crate::shell::{CommandOutput, Shell, ShellCommand};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
enum ShellRule {
    Output(CommandOutput),
    SpawnFailure(String),
}

#[derive(Debug, Default)]
struct ShellState {
    rules: Vec<(String, ShellRule)>,
    commands: Vec<String>,
}

/// Shell that records command lines and answers from prefix rules.
///
/// Pipelines are recorded as `producer | filter` and matched against the
/// same rules. Commands without a matching rule succeed with empty output.
///
/// # Examples
///
/// ```
/// use sbox_installer::mock::ScriptedShell;
/// use sbox_installer::{CommandOutput, Shell, ShellCommand};
///
/// #[tokio::main]
/// async fn main() -> sbox_core::Result<()> {
///     let shell = ScriptedShell::new();
///     shell.respond("sudo cp", CommandOutput::failed(1, "not in sudoers"));
///
///     let output = shell.run(&ShellCommand::new("sudo").args(["cp", "sbox", "/usr/bin/"])).await?;
///     assert!(!output.success());
///     assert_eq!(shell.commands(), vec!["sudo cp sbox /usr/bin/".to_string()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    state: Arc<Mutex<ShellState>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`.
    pub fn respond(&self, prefix: impl Into<String>, output: CommandOutput) {
        lock(&self.state)
            .rules
            .push((prefix.into(), ShellRule::Output(output)));
    }

    /// Make commands starting with `prefix` fail to spawn.
    pub fn fail_to_spawn(&self, prefix: impl Into<String>, message: impl Into<String>) {
        lock(&self.state)
            .rules
            .push((prefix.into(), ShellRule::SpawnFailure(message.into())));
    }

    /// Command lines seen so far, in order.
    pub fn commands(&self) -> Vec<String> {
        lock(&self.state).commands.clone()
    }

    fn answer(&self, line: String) -> Result<CommandOutput> {
        let mut state = lock(&self.state);
        let rule = state
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, rule)| rule.clone());
        state.commands.push(line.clone());

        match rule {
            Some(ShellRule::Output(output)) => Ok(output),
            Some(ShellRule::SpawnFailure(message)) => Err(Error::external_tool(line, message)),
            None => Ok(CommandOutput::ok("")),
        }
    }
}

impl Shell for ScriptedShell {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput> {
        self.answer(command.to_string())
    }

    async fn pipe(&self, producer: &ShellCommand, filter: &ShellCommand) -> Result<CommandOutput> {
        self.answer(format!("{producer} | {filter}"))
    }
}

#[derive(Debug, Default)]
struct PromptState {
    answers: VecDeque<String>,
    secrets: VecDeque<String>,
    questions: Vec<String>,
}

/// Prompt that replays queued answers and records the questions asked.
///
/// Running out of answers behaves like a closed terminal: an empty line.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    state: Arc<Mutex<PromptState>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for [`Prompt::ask`].
    pub fn answer(self, answer: impl Into<String>) -> Self {
        lock(&self.state).answers.push_back(answer.into());
        self
    }

    /// Queue an answer for [`Prompt::ask_secret`].
    pub fn secret(self, secret: impl Into<String>) -> Self {
        lock(&self.state).secrets.push_back(secret.into());
        self
    }

    /// Questions asked so far, secret ones included.
    pub fn questions(&self) -> Vec<String> {
        lock(&self.state).questions.clone()
    }
}

impl Prompt for ScriptedPrompt {
    async fn ask(&mut self, question: &str) -> Result<String> {
        let mut state = lock(&self.state);
        state.questions.push(question.to_string());
        Ok(state.answers.pop_front().unwrap_or_default())
    }

    async fn ask_secret(&mut self, question: &str) -> Result<String> {
        let mut state = lock(&self.state);
        state.questions.push(question.to_string());
        Ok(state.secrets.pop_front().unwrap_or_default())
    }
}

#[derive(Debug)]
struct RegistrarState {
    answer: RegistrationResponse,
    received: Vec<Config>,
}

/// Registrar with a fixed answer that keeps every config it was sent.
///
/// A non-`success` answer is returned as a rejection, the way the HTTP
/// client reports it.
#[derive(Debug, Clone)]
pub struct MockRegistrar {
    state: Arc<Mutex<RegistrarState>>,
}

impl MockRegistrar {
    pub fn accepting() -> Self {
        Self::answering("success", "unit registered")
    }

    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::answering("error", message)
    }

    pub fn answering(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistrarState {
                answer: RegistrationResponse {
                    kind: kind.into(),
                    message: message.into(),
                },
                received: Vec::new(),
            })),
        }
    }

    /// Configs registered so far.
    pub fn received(&self) -> Vec<Config> {
        lock(&self.state).received.clone()
    }
}

impl Registrar for MockRegistrar {
    async fn register(&self, config: &Config) -> std::result::Result<RegistrationResponse, RegistrationError> {
        let mut state = lock(&self.state);
        state.received.push(config.clone());

        if state.answer.is_success() {
            Ok(state.answer.clone())
        } else {
            Err(RegistrationError::Rejected(state.answer.message.clone()))
        }
    }
}
