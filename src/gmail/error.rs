use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot build http client")]
    BuildClient(#[source] reqwest::Error),
    #[error("cannot build Gmail API url")]
    BuildUrl(#[source] url::ParseError),
    #[error("cannot reach Gmail API")]
    Http(#[source] reqwest::Error),
    #[error("credential rejected by Gmail API")]
    Unauthorized,
    #[error("access to Gmail API denied: {0}")]
    Forbidden(String),
    #[error("Gmail API rate limit exceeded")]
    RateLimited,
    #[error("Gmail API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("cannot parse Gmail API response")]
    InvalidResponse(#[source] serde_json::Error),
}

pub type Result<T> = result::Result<T, Error>;
