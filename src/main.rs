//! ngk-buddy — Japanese language tutor chat.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the provider and the chat service
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run comms channels until shutdown or until they all exit

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use ngk_buddy::chat::ChatService;
use ngk_buddy::llm::providers;
use ngk_buddy::{comms, config, error, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present; errors ignored (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if let Some(http) = args.http_bind {
        config.comms.http.enabled = true;
        config.comms.http.bind = http;
    }
    if args.no_console {
        config.comms.pty.enabled = false;
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        app_name = %config.app_name,
        provider = %config.llm.provider,
        model = %config.llm.gemini.model,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let provider = providers::build(&config.llm)?;
    let chat = Arc::new(ChatService::new(provider));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, shutting down");
                shutdown.cancel();
            }
        });
    }

    let channels = comms::start(&config, chat.clone(), shutdown.clone());
    let result = channels.join().await;

    info!(exchanges = chat.history_len().await, "session ended");
    result
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    http_bind: Option<String>,
    no_console: bool,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut http_bind = None;
    let mut no_console = false;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: ngk-buddy [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("      --http <ADDR>          Enable the HTTP channel on ADDR");
                println!("      --no-console           Disable the interactive console");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "--http" => match iter.next() {
                Some(addr) => http_bind = Some(addr),
                None => {
                    eprintln!("error: --http requires an address argument");
                    std::process::exit(1);
                }
            },
            "--no-console" => no_console = true,
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // -v warn, -vv info, -vvv debug, -vvvv+ trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path, http_bind, no_console }
}
