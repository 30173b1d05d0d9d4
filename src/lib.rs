//! # gsend
//!
//! Send a plain text email template through the Gmail API.
//!
//! A run goes through the following steps:
//!
//! - obtain a valid OAuth credential ([`auth`])
//! - read and parse the template ([`template`])
//! - serialize and encode the message ([`message`])
//! - submit it to the send endpoint ([`gmail`])
//!
//! The [`send`] module glues these steps together.

pub mod auth;
pub mod cli;
pub mod config;
pub mod gmail;
pub mod message;
pub mod output;
pub mod printer;
mod prompt;
pub mod send;
pub mod template;
