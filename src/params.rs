//! Mount-parameter combinations
//!
//! Every (public interface, test user) pairing of a [`TestConfig`] is
//! addressed by a single integer, the combination index:
//!
//! ```text
//! interface  = public_interfaces[combo / test_users.len()]
//! credential = test_users[combo % test_users.len()]
//! ```
//!
//! Callers can pick a subset of combinations by index without building the
//! full cross product.

use std::fmt;

use crate::config::TestConfig;
use crate::error::{HarnessError, Result};

/// Everything needed to mount one share
#[derive(Clone, PartialEq, Eq)]
pub struct MountParams {
    pub host: String,
    pub share: String,
    pub username: String,
    pub password: String,
}

impl MountParams {
    pub fn new(
        host: impl Into<String>,
        share: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            share: share.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// UNC-style share URI, `//host/share`
    pub fn share_uri(&self) -> String {
        format!("//{}/{}", self.host, self.share)
    }
}

impl fmt::Debug for MountParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountParams")
            .field("host", &self.host)
            .field("share", &self.share)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for MountParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.share_uri(), self.username)
    }
}

/// A validated, non-negative combination index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComboIndex(usize);

impl ComboIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for ComboIndex {
    type Error = HarnessError;

    fn try_from(index: i64) -> Result<Self> {
        usize::try_from(index)
            .map(ComboIndex)
            .map_err(|_| {
                HarnessError::InvalidArgument(format!(
                    "combination index must not be negative, got {}",
                    index
                ))
            })
    }
}

impl fmt::Display for ComboIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of (interface, credential) combinations per share
pub fn combo_count(config: &TestConfig) -> usize {
    config.public_interfaces().len() * config.test_users().len()
}

/// Parameters for combination 0: first interface, first credential
pub fn first_params(config: &TestConfig, share: &str) -> MountParams {
    let user = &config.test_users()[0];
    MountParams::new(
        &config.public_interfaces()[0],
        share,
        &user.username,
        &user.password,
    )
}

/// Combination 0 against the first exported share
pub fn default_params(config: &TestConfig) -> MountParams {
    first_params(config, &config.exported_sharenames()[0])
}

/// Resolve a combination index into concrete mount parameters
pub fn params_for_combo(
    config: &TestConfig,
    share: &str,
    combo: impl Into<ComboIndex>,
) -> Result<MountParams> {
    let combo = combo.into().get();
    let count = combo_count(config);
    if combo >= count {
        return Err(HarnessError::OutOfRange {
            index: i64::try_from(combo).unwrap_or(i64::MAX),
            count,
        });
    }

    let users = config.test_users();
    let host = &config.public_interfaces()[combo / users.len()];
    let user = &users[combo % users.len()];

    Ok(MountParams::new(host, share, &user.username, &user.password))
}

/// Resolve a signed index, as given on a command line
pub fn params_for_signed_combo(config: &TestConfig, share: &str, combo: i64) -> Result<MountParams> {
    let index = ComboIndex::try_from(combo).map_err(|_| HarnessError::OutOfRange {
        index: combo,
        count: combo_count(config),
    })?;
    params_for_combo(config, share, index)
}

/// Iterate every combination for `share` in index order
pub fn all_params<'a>(
    config: &'a TestConfig,
    share: &'a str,
) -> impl Iterator<Item = (ComboIndex, MountParams)> + 'a {
    (0..combo_count(config)).filter_map(move |i| {
        params_for_combo(config, share, ComboIndex(i))
            .ok()
            .map(|p| (ComboIndex(i), p))
    })
}

impl From<usize> for ComboIndex {
    fn from(index: usize) -> Self {
        ComboIndex(index)
    }
}
