//! TinyVerse: stardust collection agent for TonVerse.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the game client and notifier, and runs the tick loop until
//! Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use tinyverse::api::TonverseClient;
use tinyverse::config::{self, AppConfig};
use tinyverse::engine::{Agent, AgentSettings, SessionFanOut};
use tinyverse::notify::{LogNotifier, Notifier, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("TINYVERSE_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&config_path).context("Failed to load configuration")?;
    let accounts = cfg.accounts.resolve()?;

    // -- Initialise components -------------------------------------------

    let api = TonverseClient::new(&cfg.api.base_url, &cfg.api.headers)
        .context("Failed to initialize game API client")?;

    let (notifier, chat_id): (Arc<dyn Notifier>, i64) = if cfg.alerts.send_to_telegram {
        let creds = cfg.alerts.telegram_credentials()?;
        let telegram = TelegramNotifier::connect(creds.token, &cfg.alerts.telegram_api_url)
            .await
            .context("Failed to initialize Telegram notifier")?;
        (Arc::new(telegram), creds.chat_id)
    } else {
        info!("Telegram delivery disabled, notifications go to the log");
        (Arc::new(LogNotifier), 0)
    };

    let settings = AgentSettings::from_config(&cfg, chat_id)?;

    info!(
        sessions = accounts.sessions.len(),
        galaxies = accounts.galaxy_ids.len(),
        tolerance_from_secs = settings.tolerance.from_secs(),
        tolerance_to_secs = settings.tolerance.to_secs(),
        stats_per_request = settings.stats_per_request,
        auto_buy = settings.auto_buy,
        stars_count = settings.stars_count,
        notifier = notifier.name(),
        "TinyVerse starting up"
    );

    let fanout = SessionFanOut::new(Arc::new(api), accounts.sessions);
    let mut agent = Agent::new(fanout, notifier, accounts.galaxy_ids, settings);

    // -- Main loop -------------------------------------------------------

    tokio::select! {
        _ = agent.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    info!(ticks = agent.state().tick_count, "TinyVerse stopped.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tinyverse=info"));

    let json_logging = std::env::var("TINYVERSE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
