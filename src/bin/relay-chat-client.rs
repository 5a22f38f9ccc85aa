//! Terminal client for relay-chat.
//!
//! Reads lines from stdin and sends each as a chat message; everything the
//! server relays is printed to stdout. Logs go to stderr.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use relay_chat::client::{ClientSession, TerminalRenderer};
use relay_chat::datetime::now_millis;
use relay_chat::Config;

#[derive(Debug, Parser)]
#[command(name = "relay-chat-client", about = "Join a relay-chat server from the terminal")]
struct Args {
    /// Server URL (http://, https://, ws:// or wss://).
    #[arg(short, long)]
    url: Option<String>,

    /// Display name.
    #[arg(short, long)]
    name: Option<String>,

    /// Configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    relay_chat::logging::init_stderr(&args.log_level);

    let config = Config::load(&args.config).unwrap_or_default();
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let url = args.url.unwrap_or(config.client.server_url);
    let name = args
        .name
        .unwrap_or_else(|| format!("User{}", now_millis().rem_euclid(1000)));

    let (session, handle) = match ClientSession::new(&url, name, TerminalRenderer) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let session =
        session.with_reconnect_delay(Duration::from_secs(config.client.reconnect_delay_secs));
    tracing::info!(url = %session.url(), name = %session.name(), "Starting client session");

    let task = tokio::spawn(session.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !handle.send_message(line) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    handle.shutdown();
    drop(handle);
    if let Err(e) = task.await {
        eprintln!("Client session failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
