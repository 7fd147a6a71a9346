//! Live tests for cifs-harness
//!
//! These tests mount real shares, so they need a server and root privileges.
//! They are skipped (and pass) unless `CIFS_HARNESS_TEST_INFO` names a
//! test-info document and the process runs as root.
//!
//! ```ignore
//! use cifs_harness_e2e::LiveTarget;
//!
//! #[test]
//! fn my_test() -> anyhow::Result<()> {
//!     let Some(target) = LiveTarget::from_env()? else {
//!         return Ok(());
//!     };
//!     // ... target.scratch(), target.config() ...
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod harness;

pub use assertions::*;
pub use harness::{init_logging, is_mount_point, LiveTarget};
