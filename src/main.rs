use clap::Parser;
use log::{debug, error};
use std::process;

use gsend::{cli::Cli, printer::StdoutPrinter};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let default_env_filter = env_logger::DEFAULT_FILTER_ENV;
    env_logger::init_from_env(env_logger::Env::default().filter_or(default_env_filter, "warn"));

    let cli = Cli::parse();
    debug!("output format: {}", cli.output);

    let mut printer = StdoutPrinter::new(cli.output);

    if let Err(errs) = cli.execute(&mut printer).await {
        let mut errs = errs.chain();
        if let Some(err) = errs.next() {
            error!("{err}");
            errs.for_each(|err| error!(" ↳ {err}"));
        }
        process::exit(1);
    }
}
