//! Test-info document parsing and structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::env::expand_env_in_value;
use crate::mount::{MountTools, DEFAULT_MOUNT_OPTIONS};

/// Default location of the smbtorture binary
pub const DEFAULT_SMBTORTURE_PATH: &str = "/bin/smbtorture";

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw test-info document as deserialized from YAML.
/// Required lists are optional here so that `resolve()` can name what is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Public interface hostnames of the server under test
    pub public_interfaces: Option<Vec<String>>,

    /// Exported share names
    pub exported_sharenames: Option<Vec<String>>,

    /// Credentials to mount with
    pub test_users: Option<Vec<RawTestUser>>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Harness tooling settings
    #[serde(default)]
    pub harness: HarnessSettings,
}

/// Raw credential record
#[derive(Clone, Deserialize)]
pub struct RawTestUser {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for RawTestUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTestUser")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings for the external tools and scratch location
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessSettings {
    /// Directory under which the scratch root is created (platform temp dir if unset)
    pub scratch_dir: Option<PathBuf>,

    /// Options passed to `mount -o` ahead of the credentials
    #[serde(default = "default_mount_options")]
    pub mount_options: String,

    /// Mount program
    #[serde(default = "default_mount_program")]
    pub mount_program: String,

    /// Unmount program
    #[serde(default = "default_umount_program")]
    pub umount_program: String,

    /// Path to the smbtorture binary
    #[serde(default = "default_smbtorture")]
    pub smbtorture: PathBuf,
}

fn default_mount_options() -> String {
    DEFAULT_MOUNT_OPTIONS.to_string()
}

fn default_mount_program() -> String {
    MountTools::default().mount_program
}

fn default_umount_program() -> String {
    MountTools::default().umount_program
}

fn default_smbtorture() -> PathBuf {
    PathBuf::from(DEFAULT_SMBTORTURE_PATH)
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            mount_options: default_mount_options(),
            mount_program: default_mount_program(),
            umount_program: default_umount_program(),
            smbtorture: default_smbtorture(),
        }
    }
}

impl HarnessSettings {
    /// Mount/unmount programs as a `MountTools`
    pub fn mount_tools(&self) -> MountTools {
        MountTools {
            mount_program: self.mount_program.clone(),
            umount_program: self.umount_program.clone(),
            ..MountTools::default()
        }
    }
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// One set of credentials from `test_users`
#[derive(Clone, PartialEq, Eq)]
pub struct TestUser {
    pub username: String,
    pub password: String,
}

impl TestUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for TestUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated test-info document.
///
/// The three lists are guaranteed non-empty, which the combination
/// arithmetic in [`crate::params`] relies on.
#[derive(Debug, Clone)]
pub struct TestConfig {
    public_interfaces: Vec<String>,
    exported_sharenames: Vec<String>,
    test_users: Vec<TestUser>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Harness tooling settings
    pub harness: HarnessSettings,
}

impl RawConfig {
    /// Resolve the raw document, rejecting missing or empty required lists
    pub fn resolve(self) -> Result<TestConfig, ConfigError> {
        let RawConfig {
            public_interfaces,
            exported_sharenames,
            test_users,
            logging,
            harness,
        } = self;

        let public_interfaces = required(public_interfaces, "public_interfaces")?;
        let exported_sharenames = required(exported_sharenames, "exported_sharenames")?;
        let raw_users = required(test_users, "test_users")?;

        let mut users = Vec::with_capacity(raw_users.len());
        for (i, raw) in raw_users.into_iter().enumerate() {
            let username = raw.username.ok_or_else(|| {
                ConfigError::ValidationError(format!("test_users[{}] has no username", i))
            })?;
            let password = raw.password.ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "test_users[{}] ({}) has no password",
                    i, username
                ))
            })?;
            users.push(TestUser { username, password });
        }

        let mut config = TestConfig::new(public_interfaces, exported_sharenames, users)?;
        config.logging = logging;
        config.harness = harness;
        Ok(config)
    }
}

fn required<T>(value: Option<Vec<T>>, field: &str) -> Result<Vec<T>, ConfigError> {
    match value {
        None => Err(ConfigError::ValidationError(format!(
            "missing required field {}",
            field
        ))),
        Some(v) if v.is_empty() => Err(ConfigError::ValidationError(format!(
            "{} must not be empty",
            field
        ))),
        Some(v) => Ok(v),
    }
}

impl TestConfig {
    /// Build a config from its parts with default logging and harness settings
    pub fn new(
        public_interfaces: Vec<String>,
        exported_sharenames: Vec<String>,
        test_users: Vec<TestUser>,
    ) -> Result<Self, ConfigError> {
        if public_interfaces.is_empty() {
            return Err(ConfigError::ValidationError(
                "public_interfaces must not be empty".to_string(),
            ));
        }
        if exported_sharenames.is_empty() {
            return Err(ConfigError::ValidationError(
                "exported_sharenames must not be empty".to_string(),
            ));
        }
        if test_users.is_empty() {
            return Err(ConfigError::ValidationError(
                "test_users must not be empty".to_string(),
            ));
        }

        Ok(Self {
            public_interfaces,
            exported_sharenames,
            test_users,
            logging: LoggingConfig::default(),
            harness: HarnessSettings::default(),
        })
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string, expanding `${VAR}` references
    /// in its string values
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let mut doc: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        expand_env_in_value(&mut doc)?;
        let raw: RawConfig =
            serde_yaml::from_value(doc).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    pub fn public_interfaces(&self) -> &[String] {
        &self.public_interfaces
    }

    pub fn exported_sharenames(&self) -> &[String] {
        &self.exported_sharenames
    }

    pub fn test_users(&self) -> &[TestUser] {
        &self.test_users
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
