//! External process boundary
//!
//! Commands are built as argument vectors and executed without a shell, so
//! hostnames and credentials are never interpreted by one. Arguments that
//! carry secrets have a masked display form used when the command line is
//! logged or reported.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::{Command, Output};

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Placeholder for masked secrets
pub const REDACTED: &str = "****";

/// A program plus its argument vector
#[derive(Clone)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    /// Display form of each argument, `None` when the argument is shown as-is
    shown: Vec<Option<String>>,
}

impl ExternalCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            shown: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self.shown.push(None);
        self
    }

    /// Add an argument containing a secret, rendered as `shown` in logs and errors
    pub fn secret_arg(mut self, arg: impl AsRef<OsStr>, shown: impl Into<String>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self.shown.push(Some(shown.into()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Command line with secret arguments masked
    pub fn redacted(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for (arg, shown) in self.args.iter().zip(&self.shown) {
            line.push(' ');
            match shown {
                Some(shown) => line.push_str(shown),
                None => line.push_str(&arg.to_string_lossy()),
            }
        }
        line
    }
}

impl fmt::Debug for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExternalCommand")
            .field(&self.redacted())
            .finish()
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Result of running an external command to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; 128 + signal number when killed by a signal
    pub exit_code: i32,
    /// Captured stdout followed by stderr
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands to completion
pub trait CommandRunner {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs commands as child processes, blocking until they exit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
        debug!("Running {}", command);

        let output = Command::new(command.program())
            .args(command.args())
            .output()
            .map_err(|source| HarnessError::Spawn {
                program: command.program().to_string_lossy().into_owned(),
                source,
            })?;

        let result = collect_output(output);
        debug!("{} exited with {}", command, result.exit_code);
        Ok(result)
    }
}

fn collect_output(output: Output) -> CommandOutput {
    let exit_code = match output.status.code() {
        Some(code) => code,
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                output.status.signal().map(|s| 128 + s).unwrap_or(-1)
            }
            #[cfg(not(unix))]
            {
                -1
            }
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    CommandOutput {
        exit_code,
        output: text,
    }
}
