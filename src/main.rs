//! Notification Feed CLI - watch a live push channel from the terminal.
//!
//! This is the main binary entry point. See the `notification_feed`
//! library for the core functionality.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use notification_feed::desktop::{DesktopNotifier, Unsupported};
use notification_feed::env::Environment;
use notification_feed::{
    Config, ConnectionState, FeedBuilder, MemoryNotifier, NotificationFeed, Permission,
    ReconnectPolicy,
};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "notification-feed")]
#[command(version)]
#[command(about = "Watch a live notification feed over WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the push channel and print notifications as they arrive
    Watch {
        /// Push endpoint (overrides config and FEED_WS_URL)
        #[arg(long)]
        url: Option<String>,
        /// Reconnect with exponential backoff after the connection drops
        #[arg(long)]
        reconnect: bool,
        /// Ask for desktop notification permission and grant it
        #[arg(long)]
        grant_desktop: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn init_logging() -> Result<()> {
    let filter = Environment::current().default_log_filter();
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));
    builder.format_timestamp_secs();

    if let Ok(path) = std::env::var("FEED_LOG_FILE") {
        let log_file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file at {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    Ok(())
}

/// Print what changed since the last event.
fn report(feed: &NotificationFeed, last_state: &mut ConnectionState, newest: &mut Option<String>) {
    if feed.connection_state() != last_state {
        println!("-- {}", feed.connection_state());
        *last_state = feed.connection_state().clone();
    }

    let now = chrono::Utc::now();
    let fresh: Vec<_> = feed
        .notifications()
        .iter()
        .take_while(|n| Some(&n.id) != newest.as_ref())
        .collect();
    for record in fresh.iter().rev() {
        println!(
            "[{}] {} | {}: {} ({})",
            record.priority,
            record.category,
            record.title,
            record.message,
            record.age_label(now)
        );
    }
    if let Some(first) = fresh.first() {
        *newest = Some(first.id.clone());
        println!("   {} unread", feed.unread_count());
    }
}

async fn watch(url: Option<String>, reconnect: bool, grant_desktop: bool) -> Result<()> {
    let mut config = Config::load()?;
    if reconnect && config.reconnect == ReconnectPolicy::Never {
        config.reconnect = ReconnectPolicy::backoff();
    }

    let notifier: Arc<dyn DesktopNotifier> = if grant_desktop {
        Arc::new(MemoryNotifier::new(Permission::Default))
    } else {
        Arc::new(Unsupported)
    };

    let mut builder = FeedBuilder::from_config(&config).notifier(notifier);
    if let Some(url) = url {
        builder = builder.endpoint(url);
    }
    let mut session = builder.connect()?;
    println!("Watching {}", session.endpoint());

    if grant_desktop {
        let permission = session.request_push_permission().await;
        println!("Desktop notifications: {permission}");
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Ctrl-C handler failed: {e}");
        }
        println!("Shutting down...");
    };

    let mut last_state = session.feed().connection_state().clone();
    let mut newest = None;
    session
        .run_until(shutdown, |feed| report(feed, &mut last_state, &mut newest))
        .await;

    let feed = session.feed();
    println!("{} notifications, {} unread", feed.len(), feed.unread_count());
    session.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            url,
            reconnect,
            grant_desktop,
        } => watch(url, reconnect, grant_desktop).await?,
        Commands::Config { save } => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save()?;
                println!("Saved to {}", Config::config_dir()?.join("config.json").display());
            }
        }
    }

    Ok(())
}
