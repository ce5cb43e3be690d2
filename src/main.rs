mod account;
mod app;
mod config;
mod constants;
mod input;
mod mail;
mod notification;
mod ui;

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::account::AccountManager;
use crate::app::App;
use crate::config::Config;

fn default_filter() -> &'static str {
    if env::var_os("INBOX_DEBUG").is_some() {
        "info,inbox=debug"
    } else {
        "warn,inbox=info"
    }
}

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir.join("inbox.log")))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"inbox - Unified multi-account terminal inbox

Usage: inbox [command]

Commands:
    (none)      Start the inbox
    help        Show this help message

Configuration file: ~/.config/inbox/config.toml
Access tokens:      ~/.config/inbox/tokens/<email>.json

Set INBOX_DEBUG=1 for verbose logs in ~/.config/inbox/inbox.log
"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
        None => {
            setup_logging();

            let config = Config::load()?;
            config.ensure_dirs()?;

            let accounts = AccountManager::new(&config)
                .context("Failed to set up accounts. Run 'inbox help' for token locations.")?;

            let mut app = App::new(&config, accounts);
            app.run().await
        }
    }
}
