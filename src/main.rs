// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use ctfdesk::cli::args::Args;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let directive = format!("ctfdesk={}", filter)
        .parse()
        .context("Invalid log directive")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = ctfdesk::run(args) {
        match e.downcast_ref::<ctfdesk::domain::DomainError>() {
            Some(domain) => eprintln!("Error: {}", domain.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}
