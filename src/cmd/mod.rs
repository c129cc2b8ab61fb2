//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`health`]. Each handler lives in its
//! own submodule.

pub mod health;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::RelayError;

pub async fn dispatch(cli: Cli) -> Result<(), RelayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  urlrelay v{version} \u{2014} minimal HTTP forwarding proxy\n\n  \
         No command provided. To get started:\n\n    \
         urlrelay run                      Start the proxy on 0.0.0.0:3000\n    \
         urlrelay run -p 8080 --pretty     Local dev mode\n    \
         urlrelay health                   Probe a running instance\n    \
         urlrelay --help                   See all commands and options\n"
    );
}
