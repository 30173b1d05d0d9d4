//! Gmail module.
//!
//! This module contains the client submitting raw messages to the
//! Gmail `users.messages.send` endpoint.

mod error;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use url::Url;

pub use self::error::{Error, Result};
use crate::auth::Credential;

pub const GMAIL_API_URL: &str = "https://gmail.googleapis.com";

const SEND_PATH: &str = "gmail/v1/users/me/messages/send";

/// Message accepted by the provider.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct SentMessage {
    pub id: String,
    #[serde(
        rename = "threadId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thread_id: Option<String>,
}

impl fmt::Display for SentMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Message successfully sent (id: {})", self.id)
    }
}

/// Capability of submitting an encoded message.
#[async_trait]
pub trait MessageSender {
    /// Send the given base64url-encoded raw message.
    async fn send_raw(&self, credential: &Credential, raw: &str) -> Result<SentMessage>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

pub struct GmailClient {
    http: Client,
    api_url: Url,
}

impl GmailClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::BuildClient)?;

        let api_url = Url::parse(GMAIL_API_URL).map_err(Error::BuildUrl)?;

        Ok(Self::with_http_client(http, api_url))
    }

    pub fn with_http_client(http: Client, api_url: Url) -> Self {
        Self { http, api_url }
    }

    fn send_url(&self) -> Result<Url> {
        self.api_url.join(SEND_PATH).map_err(Error::BuildUrl)
    }
}

#[async_trait]
impl MessageSender for GmailClient {
    async fn send_raw(&self, credential: &Credential, raw: &str) -> Result<SentMessage> {
        let url = self.send_url()?;
        debug!("sending message to {url}");

        let res = self
            .http
            .post(url)
            .bearer_auth(&credential.access_token)
            .json(&SendRequest { raw })
            .send()
            .await
            .map_err(Error::Http)?;

        let status = res.status();
        let body = res.text().await.map_err(Error::Http)?;

        match status {
            StatusCode::UNAUTHORIZED => return Err(Error::Unauthorized),
            StatusCode::FORBIDDEN => return Err(Error::Forbidden(body)),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimited),
            status if !status.is_success() => {
                return Err(Error::Api {
                    status: status.as_u16(),
                    body,
                })
            }
            _ => (),
        }

        serde_json::from_str(&body).map_err(Error::InvalidResponse)
    }
}
