use std::path::{Path, PathBuf};

use clap::Parser;
use erp_insights::{
    AppState, build_app,
    config::{AppConfig, DEFAULT_CONFIG_TEMPLATE},
    db::Database,
    observability,
};

const DEFAULT_CONFIG_PATH: &str = "erp-insights.toml";

/// CLI arguments for the reporting server
#[derive(Parser, Debug)]
#[command(version, about = "ERP reporting backend", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./erp-insights.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Initialize a new configuration file
    Init {
        /// Path to create the config file (defaults to ./erp-insights.toml)
        #[arg(short, long)]
        output: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration and probe the database, then exit
    Check,
    /// Show enabled compile-time features
    Features,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Init { output, force }) => {
            let path = output.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
            if let Err(e) = run_init(Path::new(&path), force) {
                eprintln!("{e}");
                std::process::exit(1);
            }
            println!("Created config file: {path}");
            println!();
            println!("To start the server, run:");
            println!("  erp-insights --config {path} serve");
        }
        Some(Command::Check) => {
            let ok = run_check(&config_path(args.config.as_deref())).await;
            if !ok {
                std::process::exit(1);
            }
        }
        Some(Command::Features) => {
            run_features();
        }
        Some(Command::Serve) | None => {
            run_server(&config_path(args.config.as_deref())).await;
        }
    }
}

fn config_path(explicit: Option<&str>) -> PathBuf {
    PathBuf::from(explicit.unwrap_or(DEFAULT_CONFIG_PATH))
}

fn load_config(path: &Path) -> AppConfig {
    match AppConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Write the default configuration to `output_path`.
fn run_init(output_path: &Path, force: bool) -> Result<(), String> {
    if output_path.exists() && !force {
        return Err(format!(
            "Config file already exists: {}\nUse --force to overwrite.",
            output_path.display()
        ));
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create directory {}: {}", parent.display(), e))?;
    }

    std::fs::write(output_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| format!("Failed to write config file: {e}"))
}

/// Load the configuration and run the health probe once.
async fn run_check(path: &Path) -> bool {
    let config = load_config(path);
    println!("Configuration OK: {}", path.display());

    let db = match Database::from_config(&config.database) {
        Ok(db) => db,
        Err(e) => {
            println!("Database: failed to initialize ({e})");
            return false;
        }
    };

    match db.health_check().await {
        Ok(()) => {
            println!("Database ({}): reachable", db.backend());
            true
        }
        Err(e) => {
            println!("Database ({}): unreachable ({e})", db.backend());
            false
        }
    }
}

fn run_features() {
    let version = env!("CARGO_PKG_VERSION");
    let features: &[(&str, bool)] = &[
        ("database-sqlite", cfg!(feature = "database-sqlite")),
        ("database-postgres", cfg!(feature = "database-postgres")),
    ];

    println!("erp-insights v{version}");
    println!();
    println!("Databases:");
    for (name, enabled) in features {
        let mark = if *enabled { "+" } else { "-" };
        println!("  {mark} {name}");
    }
}

async fn run_server(config_path: &Path) {
    let config = load_config(config_path);

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    tracing::info!(config_file = %config_path.display(), "Starting reporting server");

    let db = match Database::from_config(&config.database) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize database executor");
            std::process::exit(1);
        }
    };

    let state = AppState::new(config.clone(), db);
    let app = build_app(&config, state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(address = %bind_addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
