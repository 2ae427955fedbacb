//! Subprocess execution.
//!
//! All spawning goes through [`CommandRunner`] so the resolver and the plugin
//! can be driven by a recording runner in tests. The production runner wraps
//! `tokio::process` and imposes no timeout of its own.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{TriangleError, TriangleResult};

/// A program together with its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// The program is a POSIX shell builtin (such as `type`) and has to be run through `sh`.
    pub shell_builtin: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            shell_builtin: false,
        }
    }

    /// A shell builtin invocation, see [`CommandSpec::shell_builtin`].
    pub fn builtin(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            shell_builtin: true,
            ..Self::new(program, args)
        }
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured streams of a subprocess that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Something that can run a command to completion.
///
/// Implementations report a spawn failure as [`TriangleError::Spawn`] and a
/// non-zero exit as [`TriangleError::Subprocess`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> TriangleResult<CommandOutput>;
}

#[async_trait]
impl<R> CommandRunner for Arc<R>
where
    R: CommandRunner + ?Sized,
{
    async fn run(&self, command: &CommandSpec) -> TriangleResult<CommandOutput> {
        self.as_ref().run(command).await
    }
}

/// Runs commands as real child processes on the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    fn build(command: &CommandSpec) -> Command {
        let mut cmd = if command.shell_builtin {
            let mut sh = Command::new("sh");
            sh.arg("-c")
                .arg(format!("{} \"$@\"", command.program.display()))
                .arg("sh")
                .args(&command.args);
            sh
        } else {
            let mut direct = Command::new(&command.program);
            direct.args(&command.args);
            direct
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec) -> TriangleResult<CommandOutput> {
        tracing::debug!(command = %command, "spawning subprocess");
        let output = Self::build(command)
            .output()
            .await
            .map_err(|source| TriangleError::Spawn {
                program: command.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(TriangleError::Subprocess {
                program: command.program_name(),
                status: output.status,
                stderr: failure_text(&output.stdout, &output.stderr),
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Trimmed stderr, or trimmed stdout for tools that report errors there.
fn failure_text(stdout: &[u8], stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    String::from_utf8_lossy(stdout).trim().to_string()
}
