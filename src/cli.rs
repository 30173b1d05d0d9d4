use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use crate::{
    auth::{
        flow::OAuthFlow, provider::AuthProvider, OAuthCredentialProvider, TokenStore,
    },
    config::{self, Config},
    gmail::GmailClient,
    output::OutputFmt,
    printer::Printer,
    send::send_template,
};

/// Send an email template through the Gmail API.
///
/// The template is a plain text file made of `Key: Value` headers,
/// one blank line, then the body. The headers From, To and Subject
/// are required. On first run, a browser window is opened to
/// authorize the application; tokens are then cached for the
/// following runs.
#[derive(Parser, Debug)]
#[command(name = "gsend", author, version, about)]
pub struct Cli {
    /// Path to the template to send
    ///
    /// Defaults to the template path of the configuration file, then
    /// to email_template.txt in the current directory.
    #[arg(value_name = "TEMPLATE", value_parser = config::path_parser)]
    pub template: Option<PathBuf>,

    /// Override the default configuration file path
    ///
    /// The given path is shell-expanded then canonicalized (if
    /// applicable).
    #[arg(long, short)]
    #[arg(value_name = "PATH", value_parser = config::path_parser)]
    pub config: Option<PathBuf>,

    /// Customize the output format
    ///
    /// The possible values are:
    ///
    ///  - json: output will be in a form of a JSON-compatible object
    ///
    ///  - plain: output will be in a form of a plain text
    #[arg(long, short)]
    #[arg(value_name = "FORMAT", value_enum, default_value_t = Default::default())]
    pub output: OutputFmt,
}

impl Cli {
    pub async fn execute(self, printer: &mut impl Printer) -> Result<()> {
        info!("executing send template command");

        let config = Config::from_path_or_default(self.config.as_deref())?.with_env_overrides();

        let tpl_path = self.template.unwrap_or_else(|| config.template_path());
        debug!("template path: {}", tpl_path.display());

        let (client_id, client_secret) = config.client_credentials()?;
        let flow = OAuthFlow::new(AuthProvider::Gmail, client_id, client_secret)
            .with_redirect_port(config.redirect_port());
        let store = TokenStore::new(config.token_path()?);
        let credentials = OAuthCredentialProvider::new(flow, store);

        let client = GmailClient::new().context("cannot build Gmail client")?;

        let msg = send_template(&credentials, &client, &tpl_path)
            .await
            .with_context(|| format!("cannot send template {}", tpl_path.display()))?;

        printer.out(msg)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::path::PathBuf;

    use super::Cli;
    use crate::output::OutputFmt;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["gsend"]).unwrap();
        assert_eq!(cli.template, None);
        assert_eq!(cli.config, None);
        assert_eq!(cli.output, OutputFmt::Plain);
    }

    #[test]
    fn test_parse_args() {
        let cli =
            Cli::try_parse_from(["gsend", "-o", "json", "-c", "/tmp/gsend.toml", "/tmp/tpl.txt"])
                .unwrap();
        assert_eq!(cli.template, Some(PathBuf::from("/tmp/tpl.txt")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gsend.toml")));
        assert_eq!(cli.output, OutputFmt::Json);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
