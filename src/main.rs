use anyhow::Result;
use tokio::sync::watch;

use price_mover_watch::alert::AlertPolicy;
use price_mover_watch::config::{Config, LogFormat, LoggingConfig, SourceKind};
use price_mover_watch::health;
use price_mover_watch::notify::{AnyNotifier, LogNotifier, TelegramNotifier};
use price_mover_watch::poll_loop::PollLoop;
use price_mover_watch::source::{
    build_http_client, AnySource, BinanceFuturesSource, BybitLinearSource, PriceSource,
};
use price_mover_watch::tracker::SlidingWindowTracker;

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging);

    let http = build_http_client(config.source.http_timeout())?;
    let source = match config.source.kind {
        SourceKind::Binance => AnySource::Binance(BinanceFuturesSource::new(
            http.clone(),
            &config.source.binance_url,
            &config.source.quote_asset,
        )),
        SourceKind::Bybit => AnySource::Bybit(BybitLinearSource::new(
            http.clone(),
            &config.source.bybit_url,
            &config.source.quote_asset,
        )),
    };
    let notifier = match &config.telegram {
        Some(tg) => AnyNotifier::Telegram(TelegramNotifier::new(
            http.clone(),
            &tg.api_url,
            &tg.bot_token,
            &tg.chat_id,
        )),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set, alerts go to the log only");
            AnyNotifier::Log(LogNotifier)
        }
    };

    let monitor = &config.monitor;
    tracing::info!(
        source = source.name(),
        notifier = notifier.kind(),
        threshold_pct = monitor.threshold_pct,
        window_secs = monitor.window_secs,
        poll_secs = monitor.poll_secs,
        history_capacity = monitor.history_capacity,
        watchlist = ?monitor.watchlist.as_ref().map(|w| w.iter().collect::<Vec<_>>()),
        quote_asset = %config.source.quote_asset,
        "Starting price mover watch"
    );

    let _health = config.health.port.map(health::spawn);

    let policy = AlertPolicy::new(monitor.threshold_pct, monitor.window());
    let startup_text = policy.startup_message(source.name(), monitor.poll_interval());
    let tracker = SlidingWindowTracker::new(policy, monitor.history_capacity);
    let mut poll_loop = PollLoop::new(
        source,
        notifier,
        tracker,
        monitor.watchlist.clone(),
        monitor.poll_interval(),
    );

    if monitor.startup_message {
        poll_loop.announce(&startup_text).await;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    });

    poll_loop.run(shutdown_rx).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
