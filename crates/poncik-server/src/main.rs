use std::sync::Arc;

use clap::{Parser, Subcommand};
use poncik_core::{Config, Database};
use poncik_server::{app, AppState, ConnectionRegistry};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poncik-server", version, about = "PoncikFocus backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Apply database migrations and exit
    Migrate,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-path key (e.g. "server.bind", "chat.free_group_limit")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-path key
        key: String,
        /// New value
        value: String,
    },
    /// Print the whole configuration
    Show,
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("poncik=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn migrate() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?.with_env_overrides();
    let db = Database::open(&config)?;
    println!("schema version {}", db.schema_version());
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn serve(bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?.with_env_overrides();
    let db = Database::open(&config)?;
    let bind_addr = bind.unwrap_or_else(|| config.server.bind.clone());

    let registry = Arc::new(ConnectionRegistry::new());
    let state = AppState::new(db, config, registry.clone());
    let router = app(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("poncik-server listening on {bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            tracing::info!("shutting down, closing websockets");
            registry.close_all().await;
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let result = match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Migrate => migrate(),
        Commands::Config { action } => run_config(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
