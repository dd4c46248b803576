// src/main.rs
use stockfighter::config::Config;
use stockfighter::domain::errors::{AppError, AppResult, TradingError};
use stockfighter::domain::models::StartedLevel;
use stockfighter::exchange::dispatcher::Reply;
use stockfighter::exchange::{GamemasterClient, HttpTransport, StockFighterClient};
use stockfighter::trading::{level_for, CancellationToken, Outcome};

fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting stockfighter v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Trading API at {}", config.exchange.api_url);

    let cancel = CancellationToken::new();
    cancel
        .cancel_on_interrupt()
        .map_err(|e| AppError::Config(format!("Failed to install Ctrl-C handler: {}", e)))?;
    let level = level_for(&config.trading.level, config.level_settings(cancel))
        .ok_or_else(|| AppError::Config(format!("Unsupported level: {}", config.trading.level)))?;

    // Create clients
    let api = StockFighterClient::new(
        &config.exchange.api_url,
        &config.exchange.api_key,
        Box::new(HttpTransport::new(config.request_timeout())?),
    );
    let gm = GamemasterClient::new(
        &config.exchange.gm_url,
        &config.exchange.api_key,
        Box::new(HttpTransport::new(config.request_timeout())?),
    );

    if !api.heartbeat()? {
        return Err(AppError::Unavailable(config.exchange.api_url.clone()));
    }
    log::info!("Trading API is up");

    let started = start(&gm, level.name())?;
    if let Some((venue, symbol)) = started.primary_market() {
        if !api.venue_heartbeat(venue)? {
            log::warn!("Venue {} is not answering heartbeats", venue);
        }
        log::info!("Trading {} on {} as {}", symbol, venue, started.account);
    }
    for (title, text) in &started.instructions {
        log::debug!("{}: {}", title, text);
    }

    let result = level.solve(&api, &started);

    // Stop the instance whatever happened
    match gm.stop_level(started.instance_id) {
        Ok(Reply::Success(_)) => log::info!("Instance {} stopped", started.instance_id),
        Ok(Reply::Rejected(message)) => {
            log::warn!("Instance {} not stopped: {}", started.instance_id, message)
        }
        Ok(Reply::Absent) => log::warn!("No reply stopping instance {}", started.instance_id),
        Err(e) => log::error!("Failed to stop instance {}: {}", started.instance_id, e),
    }

    report(&result?);
    Ok(())
}

fn start(gm: &GamemasterClient, level: &str) -> AppResult<StartedLevel> {
    log::info!("Starting level {}...", level);
    match gm.start_level(level)? {
        Reply::Success(started) => Ok(started),
        Reply::Rejected(message) => Err(TradingError::LevelStart(message).into()),
        Reply::Absent => Err(TradingError::LevelStart(format!("no reply starting {}", level)).into()),
    }
}

fn report(outcome: &Outcome) {
    if outcome.is_filled() {
        log::info!("=== Level complete ===");
    } else {
        log::warn!("=== Level incomplete ===");
    }
    log::info!("{}", outcome);
}
