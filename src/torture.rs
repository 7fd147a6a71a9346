//! smbtorture suite runs
//!
//! A suite document maps smbtorture test names to their expected result:
//!
//! ```yaml
//! smb2.connect:
//!   expected_ret: true
//! smb2.lock.rw-exclusive:
//!   expected_ret: 0
//! ```
//!
//! `expected_ret` is a boolean or 0/1 and says whether smbtorture is expected
//! to exit successfully. Cases run in document order and the run stops at the
//! first case whose outcome differs from its expectation.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::command::{CommandRunner, ExternalCommand, REDACTED};
use crate::config::{ConfigError, DEFAULT_SMBTORTURE_PATH};
use crate::error::{HarnessError, Result};
use crate::interrupt::Interrupt;
use crate::params::MountParams;

/// Raw per-test record
#[derive(Debug, Clone, Deserialize)]
struct RawTortureCase {
    expected_ret: Option<ExpectedRet>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum ExpectedRet {
    Bool(bool),
    Int(i64),
}

/// One smbtorture test and whether it should pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TortureCase {
    pub name: String,
    pub expect_success: bool,
}

/// Ordered list of torture cases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TortureSuite {
    cases: Vec<TortureCase>,
}

impl TortureSuite {
    pub fn new(cases: Vec<TortureCase>) -> Self {
        Self { cases }
    }

    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> std::result::Result<Self, ConfigError> {
        // Mapping keeps document order
        let raw: serde_yaml::Mapping =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut cases = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let name = match key {
                serde_yaml::Value::String(s) => s,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "torture test name must be a string, got {:?}",
                        other
                    )))
                }
            };
            let record: RawTortureCase = serde_yaml::from_value(value)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", name, e)))?;

            let expect_success = match record.expected_ret {
                None => {
                    return Err(ConfigError::ValidationError(format!(
                        "{}: missing required field expected_ret",
                        name
                    )))
                }
                Some(ExpectedRet::Bool(b)) => b,
                Some(ExpectedRet::Int(1)) => true,
                Some(ExpectedRet::Int(0)) => false,
                Some(ExpectedRet::Int(n)) => {
                    return Err(ConfigError::ValidationError(format!(
                        "{}: expected_ret must be true/false or 1/0, got {}",
                        name, n
                    )))
                }
            };

            cases.push(TortureCase {
                name,
                expect_success,
            });
        }

        if cases.is_empty() {
            return Err(ConfigError::ValidationError(
                "torture suite contains no tests".to_string(),
            ));
        }

        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[TortureCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Result of one torture case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TortureOutcome {
    pub name: String,
    pub passed: bool,
    pub exit_code: i32,
    /// Combined stdout and stderr of smbtorture
    pub output: String,
}

/// Invokes the smbtorture binary against one share
pub struct Smbtorture<R: CommandRunner> {
    runner: R,
    binary: PathBuf,
}

impl<R: CommandRunner> Smbtorture<R> {
    pub fn new(runner: R, binary: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Use the binary at its default location
    pub fn with_default_binary(runner: R) -> Self {
        Self::new(runner, DEFAULT_SMBTORTURE_PATH)
    }

    /// `smbtorture --user=<user>%<password> //host/share <test>`
    pub fn command(&self, params: &MountParams, test: &str) -> ExternalCommand {
        ExternalCommand::new(&self.binary)
            .secret_arg(
                format!("--user={}%{}", params.username, params.password),
                format!("--user={}%{}", params.username, REDACTED),
            )
            .arg(params.share_uri())
            .arg(test)
    }

    /// Run one case and compare its exit status with the expectation
    pub fn run(&self, params: &MountParams, case: &TortureCase) -> Result<TortureOutcome> {
        let command = self.command(params, &case.name);
        debug!("Running torture test {}: {}", case.name, command);

        let output = self.runner.run(&command)?;
        let passed = output.success() == case.expect_success;

        Ok(TortureOutcome {
            name: case.name.clone(),
            passed,
            exit_code: output.exit_code,
            output: output.output,
        })
    }

    /// Run every case in order, writing one status line per case to `report`.
    ///
    /// Stops at the first failed case, writing its captured output and
    /// returning `TortureFailed`. `interrupt` is checked before each case.
    pub fn run_suite<W: Write>(
        &self,
        params: &MountParams,
        suite: &TortureSuite,
        report: &mut W,
        interrupt: &Interrupt,
    ) -> Result<Vec<TortureOutcome>> {
        info!("Running {} torture test(s) against {}", suite.len(), params);

        let mut outcomes = Vec::with_capacity(suite.len());
        for case in suite.cases() {
            interrupt.check()?;

            write!(report, "\t{:<20}", case.name)?;
            let outcome = self.run(params, case)?;

            if !outcome.passed {
                writeln!(report, "{:>10}", "[Failed]")?;
                writeln!(report)?;
                write!(report, "{}", outcome.output)?;
                report.flush()?;
                return Err(HarnessError::TortureFailed {
                    command: self.command(params, &outcome.name).redacted(),
                    name: outcome.name,
                    exit_code: outcome.exit_code,
                    output: outcome.output,
                });
            }

            writeln!(report, "{:>10}", "[OK]")?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
