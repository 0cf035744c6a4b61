use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use forkful::app::{App, AppEvent};
use forkful::config::Config;
use forkful::content::resolve_api_key;
use forkful::storage::{Store, StoreError};
use forkful::ui;

/// Get the config directory path (~/.config/forkful/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("forkful");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "forkful", about = "A terminal recipe feed")]
struct Args {
    /// Clear all authored posts (maintenance reset; the feed keeps its seed recipes)
    #[arg(long)]
    clear_posts: bool,

    /// Reset the store entirely (delete and recreate)
    #[arg(long)]
    reset_store: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // Keep recipes, comments, and the API key private to this user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = config_dir.join("config.toml");
    let store_path = config_dir.join("recipes.db");

    // Handle --reset-store flag
    if args.reset_store && store_path.exists() {
        std::fs::remove_file(&store_path).context("Failed to delete store")?;
        println!("Store reset.");
    }

    let config = Config::load(&config_path).context("Failed to load configuration")?;
    let api_key = resolve_api_key(&config);
    if api_key.is_none() {
        tracing::info!("No completion API key configured; recipe generation will return empty results");
    }

    // Open the store
    let store_path_str = store_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in store path"))?;
    let store = match Store::open(store_path_str).await {
        Ok(store) => store,
        Err(StoreError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of forkful appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open store: {}", e));
        }
    };

    // Handle --clear-posts flag: the only path to the authored-list reset
    if args.clear_posts {
        store
            .clear_authored_posts()
            .await
            .context("Failed to clear authored posts")?;
        println!("Authored posts cleared.");
        return Ok(());
    }

    // Create app state and load the feed for first render
    let mut app = App::new(store, config, api_key).context("Failed to create application")?;
    app.reload_feed().await;

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
