use std::process::ExitCode;

use tracing::{error, info};

use relay_chat::{Config, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = relay_chat::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        relay_chat::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("relay-chat starting");
    info!(
        "Server configured on {}:{} (static files from {})",
        config.server.host, config.server.port, config.server.static_path
    );

    let server = match WebServer::new(&config.server, &config.chat) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server stopped: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
