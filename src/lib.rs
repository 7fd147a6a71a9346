//! cifs-harness: test harness for SMB/CIFS shares
//!
//! Mounts shares exported by a server under test, exercises them and reports
//! pass/fail, either through a simple write/read scenario or by running
//! smbtorture cases.
//!
//! # Architecture
//!
//! - **Config**: the test-info document listing public interfaces, exported
//!   shares and test users.
//! - **Params**: every (interface, user) pairing addressed by one integer.
//! - **Scratch**: per-process scratch root plus uniquely named mount points,
//!   files and directories.
//! - **Mount**: explicit mount/unmount of one share on one mount point,
//!   through external `mount`/`umount` invoked without a shell.
//! - **Scenario / Torture**: the test runners built on top.
//!
//! # Example
//!
//! ```no_run
//! use cifs_harness::command::SystemRunner;
//! use cifs_harness::config::TestConfig;
//! use cifs_harness::interrupt::Interrupt;
//! use cifs_harness::params::default_params;
//! use cifs_harness::scenario::MountScenario;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TestConfig::from_file("test-info.yml".as_ref())?;
//! let scenario = MountScenario::from_settings(SystemRunner, &config.harness);
//! scenario.run(&default_params(&config), &Interrupt::new())?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod mount;
pub mod params;
pub mod scenario;
pub mod scratch;
pub mod torture;

pub use error::{HarnessError, Result};
