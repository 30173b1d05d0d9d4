use std::{io, path::PathBuf, result};
use thiserror::Error;

/// OAuth authentication errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot build authorization url")]
    BuildAuthUrl(#[source] url::ParseError),
    #[error("cannot listen for authorization callback on port {1}")]
    BindListener(#[source] io::Error, u16),
    #[error("cannot receive authorization callback")]
    ReceiveCallback(#[source] io::Error),
    #[error("authorization timeout (5 minutes exceeded)")]
    CallbackTimeout,
    #[error("callback state mismatch, possible CSRF attack detected")]
    InvalidCallbackState,
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("cannot reach token endpoint")]
    TokenRequest(#[source] reqwest::Error),
    #[error("token endpoint returned HTTP {0}: {1}")]
    TokenEndpoint(u16, String),
    #[error("cannot parse token endpoint response")]
    ParseTokenResponse(#[source] serde_json::Error),
    #[error("cannot refresh credential without refresh token")]
    MissingRefreshToken,

    #[error("cannot read credential file {1}")]
    ReadTokenFile(#[source] io::Error, PathBuf),
    #[error("cannot write credential file {1}")]
    WriteTokenFile(#[source] io::Error, PathBuf),
    #[error("cannot serialize credential")]
    SerializeToken(#[source] serde_json::Error),
}

pub type Result<T> = result::Result<T, Error>;
