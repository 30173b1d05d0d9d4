use std::{io, path::PathBuf, result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot find or read template file {0}")]
    FileNotFound(PathBuf, #[source] io::Error),
    #[error("cannot find blank line separating headers from body")]
    MissingSeparator,
    #[error("missing required header(s): {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),
}

pub type Result<T> = result::Result<T, Error>;
