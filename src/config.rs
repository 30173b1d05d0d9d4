//! Config module.
//!
//! The TOML configuration is optional: every setting has either a
//! default value or can be given through the environment or an
//! interactive prompt.

use anyhow::{anyhow, Context, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use shellexpand_utils::{canonicalize, expand};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{prompt, template::DEFAULT_TEMPLATE_PATH};

pub const CLIENT_ID_ENV: &str = "GSEND_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "GSEND_CLIENT_SECRET";

pub const DEFAULT_REDIRECT_PORT: u16 = 8080;

/// Represents the user config file.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_path: Option<PathBuf>,
    pub redirect_port: Option<u16>,
    pub template: Option<PathBuf>,
}

impl Config {
    fn project_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")))
            .ok_or_else(|| anyhow!("cannot find user config directory"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::project_dir()?.join("config.toml"))
    }

    /// Read and parse the TOML configuration at the given path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file at {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("cannot parse config file at {}", path.display()))?;
        trace!("config: {config:#?}");

        Ok(config)
    }

    /// Read and parse the TOML configuration at the optional given
    /// path.
    ///
    /// An explicit path must point to a readable file. Otherwise the
    /// default path is used if it exists, and the default config if
    /// it does not.
    pub fn from_path_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                let path = Self::default_path()?;
                if path.is_file() {
                    Self::from_path(&path)
                } else {
                    debug!("no config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Override client credentials with the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|val: &String| !val.trim().is_empty());

        if let Some(id) = lookup(CLIENT_ID_ENV) {
            self.client_id = Some(id);
        }

        if let Some(secret) = lookup(CLIENT_SECRET_ENV) {
            self.client_secret = Some(secret);
        }

        self
    }

    /// Return the OAuth client id and secret, prompting for the
    /// missing ones.
    pub fn client_credentials(&self) -> Result<(String, String)> {
        let client_id = match self.client_id.clone() {
            Some(id) => id,
            None => prompt::text("OAuth client ID").context("cannot prompt for client id")?,
        };

        let client_secret = match self.client_secret.clone() {
            Some(secret) => secret,
            None => prompt::secret("OAuth client secret")
                .context("cannot prompt for client secret")?,
        };

        Ok((client_id, client_secret))
    }

    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_path {
            Some(path) => Ok(expand_path(path)),
            None => Ok(Self::project_dir()?.join("token.json")),
        }
    }

    pub fn redirect_port(&self) -> u16 {
        self.redirect_port.unwrap_or(DEFAULT_REDIRECT_PORT)
    }

    pub fn template_path(&self) -> PathBuf {
        match &self.template {
            Some(path) => expand_path(path),
            None => PathBuf::from(DEFAULT_TEMPLATE_PATH),
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    path.to_str()
        .and_then(|path| expand::try_path(path).ok())
        .unwrap_or_else(|| path.to_owned())
}

/// Parse a path given on the command line as [`PathBuf`].
///
/// The path is shell-expanded then canonicalized (if applicable).
pub fn path_parser(path: &str) -> Result<PathBuf, String> {
    expand::try_path(path)
        .map(canonicalize::path)
        .map_err(|err| err.to_string())
}
