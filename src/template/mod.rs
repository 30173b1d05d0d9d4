//! Template module.
//!
//! A template is a plain text file made of `Key: Value` header lines,
//! one blank line, then the body of the message:
//!
//! ```text
//! From: alice@localhost
//! To: bob@localhost
//! Subject: Hello
//!
//! Hello, world!
//! ```

mod error;
mod headers;

use log::{debug, trace};
use std::{fs, path::Path};

pub use self::error::{Error, Result};
pub use self::headers::Headers;

/// Headers that must be present and non-empty in every template.
pub const REQUIRED_HEADERS: [&str; 3] = ["From", "To", "Subject"];

/// Template file name used when none is given.
pub const DEFAULT_TEMPLATE_PATH: &str = "email_template.txt";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Template {
    pub headers: Headers,
    pub body: String,
}

impl Template {
    /// Read then parse the template at the given path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading template at {}", path.display());

        let content =
            fs::read_to_string(path).map_err(|err| Error::FileNotFound(path.to_owned(), err))?;

        Self::parse(&content)
    }

    /// Parse a raw template.
    ///
    /// The first line that is blank once trimmed separates headers
    /// from body. Header lines are split on their first colon, lines
    /// without colon are skipped. The body is kept verbatim, line
    /// separators included.
    pub fn parse(content: &str) -> Result<Self> {
        let mut headers = Headers::new();
        let mut body = None;
        let mut offset = 0;

        for line in content.split_inclusive('\n') {
            offset += line.len();

            if line.trim().is_empty() {
                body = Some(&content[offset..]);
                break;
            }

            match line.split_once(':') {
                Some((key, val)) if !key.trim().is_empty() => {
                    headers.insert(key.trim(), val.trim());
                }
                _ => trace!("skipping header line {line:?}"),
            }
        }

        let body = body.ok_or(Error::MissingSeparator)?;

        let missing: Vec<String> = REQUIRED_HEADERS
            .iter()
            .filter(|key| headers.get_non_empty(key).is_none())
            .map(ToString::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingRequiredField(missing));
        }

        let tpl = Template {
            headers,
            body: body.to_owned(),
        };
        trace!("template: {tpl:#?}");

        Ok(tpl)
    }
}
