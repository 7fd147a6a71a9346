//! Mount-and-write scenario
//!
//! Mounts a share on a fresh mount point inside a scratch root, creates a
//! file on the share, writes a known string, reads it back, deletes it and
//! tears everything down again in strict order: unmount, remove the mount
//! point, remove the scratch root.

use std::fs;
use std::path::Path;

use scopeguard::ScopeGuard;
use tracing::{error, info, warn};

use crate::command::CommandRunner;
use crate::config::{HarnessSettings, TestConfig};
use crate::error::{HarnessError, Result};
use crate::interrupt::Interrupt;
use crate::mount::{MountSession, MountTools, DEFAULT_MOUNT_OPTIONS};
use crate::params::{all_params, MountParams};
use crate::scratch::{self, ScratchRoot, ScratchSpace};

/// Content written to the share
pub const TEST_STRING: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub struct MountScenario<R: CommandRunner> {
    runner: R,
    tools: MountTools,
    scratch: ScratchSpace,
    options: String,
}

impl<R: CommandRunner> MountScenario<R> {
    pub fn new(runner: R, scratch: ScratchSpace) -> Self {
        Self {
            runner,
            tools: MountTools::default(),
            scratch,
            options: DEFAULT_MOUNT_OPTIONS.to_string(),
        }
    }

    /// Scenario using the tools, options and scratch location from the config
    pub fn from_settings(runner: R, settings: &HarnessSettings) -> Self {
        let scratch = settings
            .scratch_dir
            .as_ref()
            .map(ScratchSpace::new)
            .unwrap_or_default();

        Self {
            runner,
            tools: settings.mount_tools(),
            scratch,
            options: settings.mount_options.clone(),
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    /// Run the scenario once against `params`.
    ///
    /// Teardown runs on every path. When the scenario itself failed, teardown
    /// errors are logged and the scenario error is returned.
    pub fn run(&self, params: &MountParams, interrupt: &Interrupt) -> Result<()> {
        info!("Mount test against {}", params);

        let root = self.scratch.create_root()?;
        let mount_point = match root.create_mount_point() {
            Ok(path) => path,
            Err(e) => {
                if let Err(cleanup) = self.scratch.remove_root(&root) {
                    warn!("Failed to remove scratch root: {}", cleanup);
                }
                return Err(e);
            }
        };

        let mut session =
            MountSession::with_tools(&self.runner, self.tools.clone(), mount_point.as_path());
        let result = self.exercise(&mut session, params, interrupt);
        let teardown = self.teardown(session, &mount_point, &root);

        match (result, teardown) {
            (Ok(()), teardown) => teardown,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                error!("Cleanup after failed test also failed: {}", cleanup);
                Err(e)
            }
        }
    }

    /// Run the scenario for every share and every combination, stopping at
    /// the first failure. Returns the number of runs.
    pub fn run_all(&self, config: &TestConfig, interrupt: &Interrupt) -> Result<usize> {
        let mut runs = 0;
        for share in config.exported_sharenames() {
            for (combo, params) in all_params(config, share) {
                interrupt.check()?;
                info!("Combination {} for share {}", combo, share);
                self.run(&params, interrupt)?;
                runs += 1;
            }
        }
        Ok(runs)
    }

    fn exercise<C: CommandRunner>(
        &self,
        session: &mut MountSession<C>,
        params: &MountParams,
        interrupt: &Interrupt,
    ) -> Result<()> {
        interrupt.check()?;
        session.mount_with_options(params, &self.options)?;

        interrupt.check()?;
        let test_file = scopeguard::guard(scratch::create_file(session.mount_point())?, |path| {
            if let Err(e) = scratch::remove_entry(&path) {
                warn!("Failed to remove test file: {}", e);
            }
        });

        fs::write(&*test_file, TEST_STRING)
            .map_err(|e| HarnessError::filesystem(&*test_file, e))?;
        let read_back =
            fs::read_to_string(&*test_file).map_err(|e| HarnessError::filesystem(&*test_file, e))?;
        if read_back != TEST_STRING {
            return Err(HarnessError::Verification(format!(
                "read back {} bytes from {:?}, expected {}",
                read_back.len(),
                *test_file,
                TEST_STRING.len()
            )));
        }

        let test_file = ScopeGuard::into_inner(test_file);
        scratch::remove_entry(&test_file)
    }

    fn teardown<C: CommandRunner>(
        &self,
        mut session: MountSession<C>,
        mount_point: &Path,
        root: &ScratchRoot,
    ) -> Result<()> {
        session.unmount()?;
        drop(session);
        scratch::remove_entry(mount_point)?;
        self.scratch.remove_root(root)
    }
}
