//! Send module.
//!
//! Glue between the credential provider, the template parser, the
//! message encoder and the message sender. Any failure aborts the
//! whole operation: nothing is retried and nothing is partially sent.

use log::{debug, info};
use std::{path::Path, result};
use thiserror::Error;

use crate::{
    auth::{self, CredentialProvider},
    gmail::{self, MessageSender, SentMessage},
    template::{self, Template},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed")]
    Authentication(#[source] auth::Error),
    #[error(transparent)]
    Template(#[from] template::Error),
    #[error("cannot send message without recipient")]
    MissingRecipient,
    #[error("cannot send message")]
    Send(#[source] gmail::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Send the template at the given path.
///
/// The credential is obtained first, then the template is parsed,
/// encoded and handed to the sender.
pub async fn send_template<C, S>(credentials: &C, sender: &S, path: &Path) -> Result<SentMessage>
where
    C: CredentialProvider + ?Sized,
    S: MessageSender + ?Sized,
{
    let credential = credentials
        .obtain_credential()
        .await
        .map_err(Error::Authentication)?;

    let tpl = Template::from_path(path)?;

    // already enforced by the parser
    let to = tpl
        .headers
        .get_non_empty("To")
        .ok_or(Error::MissingRecipient)?;
    info!("sending template {} to {to}", path.display());

    let raw = tpl.encode();
    debug!("encoded message is {} bytes long", raw.len());

    let msg = sender
        .send_raw(&credential, &raw)
        .await
        .map_err(Error::Send)?;
    info!("message sent with id {}", msg.id);

    Ok(msg)
}
