//! Live server discovery and per-test scratch space

use anyhow::{Context, Result};
use cifs_harness::config::TestConfig;
use cifs_harness::scratch::ScratchSpace;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Path to the test-info document describing the live server
pub const TEST_INFO_ENV: &str = "CIFS_HARNESS_TEST_INFO";

/// Optional path to a torture suite for the live server
pub const TORTURE_INFO_ENV: &str = "CIFS_HARNESS_TORTURE_INFO";

/// Initialize logging for tests (call once per test)
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// A reachable server plus a private scratch base for one test
pub struct LiveTarget {
    config: TestConfig,
    // Kept alive so the scratch base outlives the test
    temp_dir: TempDir,
}

impl LiveTarget {
    /// Load the live target, or `None` when live tests are not enabled
    pub fn from_env() -> Result<Option<Self>> {
        init_logging();

        let Ok(path) = env::var(TEST_INFO_ENV) else {
            eprintln!("{} not set; skipping live test", TEST_INFO_ENV);
            return Ok(None);
        };
        if !nix::unistd::geteuid().is_root() {
            eprintln!("Live tests need root to mount; skipping");
            return Ok(None);
        }

        let config_path = PathBuf::from(path);
        let config = TestConfig::from_file(&config_path)
            .with_context(|| format!("Failed to load {:?}", config_path))?;
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;

        info!(
            "Live target: {} interface(s), {} share(s), {} user(s)",
            config.public_interfaces().len(),
            config.exported_sharenames().len(),
            config.test_users().len()
        );

        Ok(Some(Self {
            config,
            temp_dir,
        }))
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Scratch space rooted in this test's private temp directory
    pub fn scratch(&self) -> ScratchSpace {
        ScratchSpace::new(self.temp_dir.path())
    }

    /// Base directory of the scratch space
    pub fn scratch_base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Torture suite path, when one is configured
    pub fn torture_info() -> Option<PathBuf> {
        env::var(TORTURE_INFO_ENV).ok().map(PathBuf::from)
    }
}

/// Check whether `path` is a mount point by comparing device IDs with its parent
pub fn is_mount_point(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let (Ok(meta), Some(parent)) = (std::fs::metadata(path), path.parent()) else {
        return false;
    };
    let Ok(parent_meta) = std::fs::metadata(parent) else {
        return false;
    };

    let mounted = meta.dev() != parent_meta.dev();
    debug!(
        "Mount check {:?}: dev={}, parent_dev={}, mounted={}",
        path,
        meta.dev(),
        parent_meta.dev(),
        mounted
    );
    mounted
}
