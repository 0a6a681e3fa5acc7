//! gifview - caching backend for the GIF browsing frontend
//!
//! Main entry point for the gifview CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gifview::cache::CacheStore;
use gifview::config::{validate_config_result, ServerConfig};
use gifview::server::GifviewServer;
use gifview::sweeper;
use std::path::{Path, PathBuf};
use std::process;
use tokio::sync::watch;

/// gifview - TTL-cached RedGifs API backend
#[derive(Parser, Debug)]
#[command(name = "gifview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gifview/config.yaml)
    #[arg(short, long, env = "GIFVIEW_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000
        #[arg(short, long, env = "GIFVIEW_BIND")]
        bind: Option<String>,

        /// Path to the cache database
        #[arg(long, env = "GIFVIEW_DB")]
        db: Option<PathBuf>,

        /// Directory of frontend files to serve at /
        #[arg(long, env = "GIFVIEW_STATIC_DIR")]
        static_dir: Option<PathBuf>,
    },

    /// Remove expired cache entries once and exit
    Sweep,

    /// Show cache statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every cache entry
    ClearCache,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = gifview::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(ServerConfig::default_path);

    let command = cli.command.unwrap_or(Commands::Serve {
        bind: None,
        db: None,
        static_dir: None,
    });

    match command {
        Commands::Init { force } => handle_init_command(&config_path, force),
        Commands::Serve {
            bind,
            db,
            static_dir,
        } => {
            let mut config = load_config(&config_path)?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(db) = db {
                config.cache.path = db;
            }
            if static_dir.is_some() {
                config.static_dir = static_dir;
            }
            validate_config_result(&config)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(serve(config))
        }
        Commands::Sweep => {
            let store = open_store(&load_config(&config_path)?)?;
            let removed = store.sweep_expired()?;
            println!("Removed {} expired entries", removed);
            Ok(())
        }
        Commands::Stats { json } => {
            let store = open_store(&load_config(&config_path)?)?;
            let stats = store.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Cache: {}", store.path().display());
                println!("  Entries:  {}", stats.total_entries);
                println!("  Live:     {}", stats.live_entries);
                println!("  Expired:  {}", stats.expired_entries);
                if let Some(oldest) = stats.oldest_created_at {
                    println!("  Oldest:   {}", oldest.to_rfc3339());
                }
            }
            Ok(())
        }
        Commands::ClearCache => {
            let store = open_store(&load_config(&config_path)?)?;
            let removed = store.clear()?;
            println!("Removed {} entries", removed);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
    ServerConfig::load_or_default(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn open_store(config: &ServerConfig) -> anyhow::Result<CacheStore> {
    CacheStore::new(config.cache.store_config())
        .with_context(|| format!("Failed to open cache at {}", config.cache.path.display()))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = GifviewServer::from_config(&config)?;
    let cache = server.state().cache.clone();

    sweeper::run_startup_sweep(&cache).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = sweeper::spawn(cache, config.cache.sweep_interval(), shutdown_rx);

    let result = server.run(&config.bind, shutdown_signal()).await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_task.await {
        tracing::warn!(error = %e, "Sweeper task did not stop cleanly");
    }

    result.map_err(Into::into)
}

/// Resolves on SIGINT, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to set up SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

fn handle_init_command(config_file: &Path, force: bool) -> anyhow::Result<()> {
    if config_file.exists() && !force {
        println!("Configuration already exists at {}", config_file.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    let config = ServerConfig::new();
    config
        .save(config_file)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    println!("✓ Created configuration at {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust TTLs, bind address or static_dir in the file");
    println!("  2. Start the server:");
    println!("     gifview serve");
    Ok(())
}
