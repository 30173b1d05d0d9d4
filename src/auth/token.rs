use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use super::{Error, Result};

/// Access tokens are considered expired this many seconds before
/// their actual expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth 2.0 token material proving authorization to call the send
/// API on behalf of a user.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl ToString) -> Self {
        Self {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expires_at,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// tokens never end up in logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Successful response of the token endpoint, for both the
/// authorization code and the refresh token grants.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(Error::ParseTokenResponse)
    }

    /// Build a credential out of the response.
    ///
    /// Refresh responses usually omit the refresh token, in which
    /// case the previous one is kept. An out of range lifetime leaves
    /// the expiry unknown.
    pub(crate) fn into_credential(
        self,
        previous_refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: self
                .expires_in
                .and_then(Duration::try_seconds)
                .and_then(|ttl| now.checked_add_signed(ttl)),
        }
    }
}

/// File-backed credential cache.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached credential, if any.
    ///
    /// A file that cannot be parsed is reported then ignored, so that
    /// a new authorization can replace it.
    pub fn load(&self) -> Result<Option<Credential>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no credential cached at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => return Err(Error::ReadTokenFile(err, self.path.clone())),
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(err) => {
                warn!("ignoring invalid credential file {}: {err}", self.path.display());
                Ok(None)
            }
        }
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        let content = serde_json::to_string_pretty(credential).map_err(Error::SerializeToken)?;
        let write_err = |err: io::Error| Error::WriteTokenFile(err, self.path.clone());

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        let mut file = opts.open(&self.path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;

        debug!("credential saved at {}", self.path.display());
        Ok(())
    }
}
