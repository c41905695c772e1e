use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};

use metarmap::display::{Classifier, DisplayEngine};
use metarmap::render::{JsonLinesSink, LogSink, RenderSink};
use metarmap::scheduler::{RefreshScheduler, SchedulerSettings};
use metarmap::telemetry::init_tracing;
use metarmap::weather::{AviationWeatherClient, MetarXmlParser};
use metarmap::{MetarMapConfig, MetarMapError};

async fn run_with_sink<S: RenderSink>(config: &MetarMapConfig, engine: DisplayEngine, sink: S) -> Result<()> {
    let client = AviationWeatherClient::new(&config.feed)?;
    let settings = SchedulerSettings {
        refresh_interval: config.refresh_interval(),
        tick_interval: config.blink_interval(),
        fetch_timeout: config.fetch_timeout(),
    };
    let scheduler = RefreshScheduler::new(
        client,
        MetarXmlParser,
        sink,
        engine,
        config.brightness_schedule()?,
        settings,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = MetarMapConfig::load_from_path(config_path).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!("Running metarmap {}", metarmap::VERSION);
    info!(
        wind_animation = config.animation.wind_animation,
        lightning_animation = config.animation.lightning_animation,
        dimming = config.dimming.enabled,
        sunrise_sunset = config.dimming.use_sunrise_sunset,
        "Display settings"
    );

    let airports = config.load_airports()?;
    let engine = DisplayEngine::new(
        Classifier::new(config.thresholds()),
        airports,
        config.legend_spec(),
        config.strip(),
        config.strip.clear_placeholders,
    );
    if let Err(e) = engine.layout() {
        error!("{}", e.user_message());
        return Err(e.into());
    }

    match config.output.sink.as_str() {
        "json" => run_with_sink(&config, engine, JsonLinesSink::stdout()).await,
        "log" => run_with_sink(&config, engine, LogSink).await,
        other => Err(MetarMapError::config(format!("Unknown output sink '{other}'")).into()),
    }
}
