//! CIFS mount lifecycle

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::{CommandRunner, ExternalCommand, REDACTED};
use crate::error::{HarnessError, Result};
use crate::params::MountParams;

/// Options passed to `mount -o` when none are configured
pub const DEFAULT_MOUNT_OPTIONS: &str = "vers=2.1";

/// External programs used to mount and unmount shares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTools {
    pub mount_program: String,
    pub umount_program: String,
    /// Filesystem type given to `mount -t`
    pub fs_type: String,
}

impl Default for MountTools {
    fn default() -> Self {
        Self {
            mount_program: "mount".to_string(),
            umount_program: "umount".to_string(),
            fs_type: "cifs".to_string(),
        }
    }
}

impl MountTools {
    /// `mount -t cifs -o <options>,username=..,password=.. //host/share <mount_point>`
    pub fn mount_command(
        &self,
        params: &MountParams,
        mount_point: &Path,
        options: &str,
    ) -> Result<ExternalCommand> {
        for (field, value) in [("username", &params.username), ("password", &params.password)] {
            if value.contains(',') {
                return Err(HarnessError::InvalidArgument(format!(
                    "{} for {} contains ',' which cannot be passed in a mount option string",
                    field, params.username
                )));
            }
        }

        let mut prefix = options.trim_end_matches(',').to_string();
        if !prefix.is_empty() {
            prefix.push(',');
        }
        let option_string = format!(
            "{}username={},password={}",
            prefix, params.username, params.password
        );
        let shown = format!("{}username={},password={}", prefix, params.username, REDACTED);

        Ok(ExternalCommand::new(&self.mount_program)
            .arg("-t")
            .arg(&self.fs_type)
            .arg("-o")
            .secret_arg(option_string, shown)
            .arg(params.share_uri())
            .arg(mount_point))
    }

    /// Forced, lazy unmount: `umount -f -l <mount_point>`
    pub fn umount_command(&self, mount_point: &Path) -> ExternalCommand {
        ExternalCommand::new(&self.umount_program)
            .arg("-f")
            .arg("-l")
            .arg(mount_point)
    }
}

/// Whether this process has the privileges `mount -t cifs` normally needs
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Whether a session currently has a share mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounted,
}

/// One mount point and the share mounted on it.
///
/// Mounting and unmounting are explicit. A session dropped while still
/// mounted unmounts on a best-effort basis and only logs failures, unless an
/// explicit unmount already failed; failed unmounts are never retried.
pub struct MountSession<R: CommandRunner> {
    runner: R,
    tools: MountTools,
    mount_point: PathBuf,
    state: MountState,
    unmount_failed: bool,
}

impl<R: CommandRunner> MountSession<R> {
    pub fn new(runner: R, mount_point: impl Into<PathBuf>) -> Self {
        Self::with_tools(runner, MountTools::default(), mount_point)
    }

    pub fn with_tools(runner: R, tools: MountTools, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tools,
            mount_point: mount_point.into(),
            state: MountState::Unmounted,
            unmount_failed: false,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn state(&self) -> MountState {
        self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.state == MountState::Mounted
    }

    /// Mount `params` with the default options
    pub fn mount(&mut self, params: &MountParams) -> Result<()> {
        self.mount_with_options(params, DEFAULT_MOUNT_OPTIONS)
    }

    /// Mount `params` with `options` ahead of the credentials
    pub fn mount_with_options(&mut self, params: &MountParams, options: &str) -> Result<()> {
        if self.is_mounted() {
            return Err(HarnessError::AlreadyMounted(self.mount_point.clone()));
        }

        let command = self
            .tools
            .mount_command(params, &self.mount_point, options)?;
        info!("Mounting {} at {:?}", params, self.mount_point);

        let output = self.runner.run(&command)?;
        if !output.success() {
            if !output.output.is_empty() {
                warn!("mount output: {}", output.output.trim_end());
            }
            return Err(HarnessError::Mount {
                exit_code: output.exit_code,
                command: command.redacted(),
            });
        }

        self.state = MountState::Mounted;
        self.unmount_failed = false;
        debug!("Mounted {:?}", self.mount_point);
        Ok(())
    }

    /// Unmount the share; a no-op when nothing is mounted
    pub fn unmount(&mut self) -> Result<()> {
        if !self.is_mounted() {
            return Ok(());
        }

        let command = self.tools.umount_command(&self.mount_point);
        info!("Unmounting {:?}", self.mount_point);

        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(e) => {
                self.unmount_failed = true;
                return Err(e);
            }
        };
        if !output.success() {
            self.unmount_failed = true;
            return Err(HarnessError::Unmount {
                exit_code: output.exit_code,
                command: command.redacted(),
            });
        }

        self.state = MountState::Unmounted;
        self.unmount_failed = false;
        Ok(())
    }
}

impl<R: CommandRunner> Drop for MountSession<R> {
    fn drop(&mut self) {
        if !self.is_mounted() {
            return;
        }
        if self.unmount_failed {
            warn!("Leaving {:?} mounted after a failed unmount", self.mount_point);
        } else if let Err(e) = self.unmount() {
            warn!("Failed to unmount {:?} on drop: {}", self.mount_point, e);
        }
    }
}
