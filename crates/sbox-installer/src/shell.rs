//! External command execution.
//!
//! The installer delegates privileged work (copying the binary, binding the
//! serial driver, changing ownership) and USB enumeration to system tools.
//! [`Shell`] is the seam: [`SystemShell`] spawns real processes, the
//! [`mock`](crate::mock) module provides a scripted replacement.

#![allow(async_fn_in_trait)]

use std::fmt;
use std::process::Stdio;

use sbox_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, trace};

/// A program and its arguments.
///
/// # Examples
///
/// ```
/// use sbox_installer::ShellCommand;
///
/// let command = ShellCommand::new("sudo").arg("cp").args(["sbox", "/usr/bin/"]);
/// assert_eq!(command.to_string(), "sudo cp sbox /usr/bin/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        command
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful exit with the given standard output.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed exit with the given code and standard error.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Standard error if present, otherwise the exit status.
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands.
pub trait Shell {
    /// Run `command` to completion, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns `Error::ExternalTool` if the process cannot be spawned. A
    /// nonzero exit is not an error here; callers inspect
    /// [`CommandOutput::success`].
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput>;

    /// Run `producer | filter` and return the filter's output.
    ///
    /// Both processes are awaited before returning.
    async fn pipe(&self, producer: &ShellCommand, filter: &ShellCommand) -> Result<CommandOutput>;
}

/// Shell backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl Shell for SystemShell {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput> {
        debug!(%command, "Running command");

        let output = command
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::external_tool(command.to_string(), e.to_string()))?;

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(%command, status = ?output.status, stdout = %output.stdout, "Command finished");

        Ok(output)
    }

    async fn pipe(&self, producer: &ShellCommand, filter: &ShellCommand) -> Result<CommandOutput> {
        debug!(%producer, %filter, "Running pipeline");

        let spawn_error = |command: &ShellCommand, e: std::io::Error| {
            Error::external_tool(command.to_string(), e.to_string())
        };

        let mut upstream = producer
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(producer, e))?;

        let pipe: Stdio = upstream
            .stdout
            .take()
            .ok_or_else(|| Error::external_tool(producer.to_string(), "stdout not captured"))?
            .try_into()
            .map_err(|e| spawn_error(producer, e))?;

        let downstream = filter
            .to_command()
            .stdin(pipe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(filter, e))?;

        let output = downstream
            .wait_with_output()
            .await
            .map_err(|e| spawn_error(filter, e))?;
        let upstream_status = upstream.wait().await.map_err(|e| spawn_error(producer, e))?;

        trace!(
            %producer,
            producer_status = ?upstream_status.code(),
            filter_status = ?output.status.code(),
            "Pipeline finished"
        );

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
