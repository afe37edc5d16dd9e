use std::{
    fmt::{self},
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::{Deserialize, Serialize};

use super::{HttpConfig, KeysConfig, LoggingConfig, SessionConfig};
use crate::{error::WardenError, result::KResult};

/// The environment variable pointing to the server configuration file
pub const WARDEN_CONF_ENV: &str = "WARDEN_CONF";

pub(crate) const DEFAULT_WARDEN_CONF: &str = "/etc/warden/warden.toml";

#[derive(Parser, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[clap(version, about, long_about = None)]
#[serde(default)]
pub struct ClapConfig {
    #[clap(flatten)]
    pub http: HttpConfig,

    #[clap(flatten)]
    pub keys: KeysConfig,

    #[clap(flatten)]
    pub session: SessionConfig,

    #[clap(flatten)]
    pub logging: LoggingConfig,

    /// Print the server configuration information and exit
    #[clap(long, default_value = "false")]
    pub info: bool,
}

impl ClapConfig {
    /// Load the configuration.
    ///
    /// When the file named by `WARDEN_CONF` (default `/etc/warden/warden.toml`)
    /// exists, it is the only source: command line arguments and environment
    /// variables are ignored.
    ///
    /// # Errors
    ///
    /// Fails when `WARDEN_CONF` names a missing file or when the file is not valid TOML.
    pub fn load_from_file() -> KResult<Self> {
        match std::env::var(WARDEN_CONF_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(WardenError::ConfigurationError(format!(
                        "the configuration file {} set by {WARDEN_CONF_ENV} does not exist",
                        path.display()
                    )))
                }
                Self::from_toml_file(&path)
            }
            Err(_) => {
                let default_path = PathBuf::from(DEFAULT_WARDEN_CONF);
                if default_path.exists() {
                    Self::from_toml_file(&default_path)
                } else {
                    Ok(Self::parse())
                }
            }
        }
    }

    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> KResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WardenError::ConfigurationError(format!("unable to read {}: {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

impl fmt::Debug for ClapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut x = f.debug_struct("");
        let x = x.field("http", &self.http);
        let x = x.field("signing key", &self.keys.signing_key);
        let x = if self.keys.validating_keys.is_empty() {
            x
        } else {
            x.field("validating keys", &self.keys.validating_keys)
        };
        let x = x.field("PAT secret file", &self.keys.pat_secret_file);
        let x = x.field("PAT use signing key", &self.keys.pat_use_signing_key);
        let x = x.field("session", &self.session);
        let x = x.field("logging", &self.logging);
        x.finish()
    }
}
