//! Configuration directory resolution.
//!
//! The default directory is `~/.aws-identity-manager`. Setting
//! `AWS_IDENTITY_MANAGER_HOME` overrides it, which is how tests and
//! alternate registries point the manager elsewhere.

use std::env;
use std::path::PathBuf;

use dirs::home_dir;

use crate::error::{IdentityError, Result};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "AWS_IDENTITY_MANAGER_HOME";

/// Name of the configuration directory under the user's home.
pub const CONFIG_DIR_NAME: &str = ".aws-identity-manager";

/// File name of the persisted identity registry.
pub const IDENTITIES_FILE: &str = "identities.json";

/// Resolve the default configuration directory.
///
/// # Errors
///
/// Returns `IdentityError::Config` if the override is unset and no home
/// directory can be determined.
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or_else(|| {
            IdentityError::Config(format!(
                "cannot determine home directory; set {CONFIG_DIR_ENV}"
            ))
        })
}
