// src/lib.rs
pub mod application;
pub mod cli;
pub mod constants;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod util;

use crate::cli::args::{Args, Command};
use crate::cli::commands::{handle_challenges, handle_folders, handle_notes, handle_tools};
use anyhow::Result;
use infrastructure::{ApiClient, Config};
use tracing::debug;

pub fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting ctfdesk with arguments");

    let config = Config::resolve(args.config.as_deref())?.with_api_url(args.api_url.as_deref());
    debug!(?config, "Resolved configuration");

    let client = ApiClient::new(&config.api.base_url, config.timeout())?;
    let mut stdout = std::io::stdout().lock();

    match args.command {
        Command::Tools(command) => handle_tools(client, command, &mut stdout),
        Command::Challenges(command) => handle_challenges(client, command, &mut stdout),
        Command::Notes(command) => {
            handle_notes(client, command, config.autosave_quiet(), &mut stdout)
        }
        Command::Folders(command) => handle_folders(client, command, &mut stdout),
    }
}
