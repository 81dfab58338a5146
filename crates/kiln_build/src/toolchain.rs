//! External tool invocation.
//!
//! The engine describes each compiler, linker or archiver call as a
//! [`ToolCommand`] and hands it to a [`CommandRunner`]. [`ProcessRunner`]
//! spawns real processes; tests plug in their own runner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::BuildError;

/// A program and its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program name or path.
    pub program: String,
    /// Arguments, one element per argv entry.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Starts a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolCommand {
    /// Renders the command as a shell-pastable line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// What to do with a tool's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Let output go straight to the terminal.
    Inherit,
    /// Collect output into the returned [`ToolOutput`].
    Capture,
}

/// Result of a finished tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Whether the tool exited with status zero.
    pub success: bool,
    /// Human-readable exit status.
    pub status: String,
    /// Captured stdout (empty with [`OutputMode::Inherit`]).
    pub stdout: String,
    /// Captured stderr (empty with [`OutputMode::Inherit`]).
    pub stderr: String,
}

/// Executes tool commands.
///
/// Implementations report a tool that ran but failed through
/// [`ToolOutput::success`]; `Err` is reserved for tools that could not run.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion.
    fn run(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput, BuildError>;
}

/// Runs tools as child processes in the project root.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    /// Creates a runner whose children start in `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput, BuildError> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).current_dir(&self.working_dir);

        let spawn_error = |source| BuildError::ToolSpawn {
            program: command.program.clone(),
            source,
        };

        match mode {
            OutputMode::Inherit => {
                let status = process.stdin(Stdio::null()).status().map_err(spawn_error)?;
                Ok(ToolOutput {
                    success: status.success(),
                    status: describe_status(status),
                    ..ToolOutput::default()
                })
            }
            OutputMode::Capture => {
                let output = process.stdin(Stdio::null()).output().map_err(spawn_error)?;
                Ok(ToolOutput {
                    success: output.status.success(),
                    status: describe_status(output.status),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
        }
    }
}

/// Formats an exit status for error messages.
pub fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

/// A runner plus the echo policy, shared by every build step.
#[derive(Clone, Copy)]
pub struct Toolchain<'a> {
    runner: &'a dyn CommandRunner,
    echo: bool,
}

impl<'a> Toolchain<'a> {
    /// Wraps `runner`. With `echo` set, build commands are printed to stdout
    /// before they run.
    pub fn new(runner: &'a dyn CommandRunner, echo: bool) -> Self {
        Self { runner, echo }
    }

    /// Runs a build command (compile, link, archive) and fails on non-zero exit.
    pub fn execute(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput, BuildError> {
        if self.echo {
            println!("{command}");
        }
        self.checked(command, mode)
    }

    /// Runs a query command with captured output, without echoing it.
    pub fn query(&self, command: &ToolCommand) -> Result<ToolOutput, BuildError> {
        self.checked(command, OutputMode::Capture)
    }

    fn checked(&self, command: &ToolCommand, mode: OutputMode) -> Result<ToolOutput, BuildError> {
        let output = self.runner.run(command, mode)?;
        if output.success {
            Ok(output)
        } else {
            Err(BuildError::ToolInvocation {
                command: command.to_string(),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}
