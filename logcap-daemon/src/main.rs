use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use logcap_capture::{CaptureEngine, CaptureSettings};
use logcap_core::config::LogcapConfig;
use logcap_daemon::cli::DaemonCli;
use logcap_daemon::scheduler::{Scheduler, ShutdownSignals, spawn_signal_forwarder};
use logcap_daemon::{logging, metrics_server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = LogcapConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config '{}': {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    logging::init_tracing(&config.general)?;

    let settings = CaptureSettings::from_core(&config.capture);
    let mut engine = CaptureEngine::new(settings)
        .await
        .map_err(|e| anyhow::anyhow!("failed to build capture engine: {}", e))?;

    if cli.validate {
        let report = serde_json::to_string_pretty(&engine.status())?;
        println!("{report}");
        engine
            .shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop capture engine: {}", e))?;
        return Ok(());
    }

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
        tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "logcap-daemon starting"
    );

    let shutdown = ShutdownSignals::install()?;
    let tick_interval = Duration::from_millis(config.general.tick_interval_ms);
    let (mut scheduler, control_tx) = Scheduler::new(engine, &cli.config, tick_interval);
    let forwarder = spawn_signal_forwarder(control_tx)?;

    let result = scheduler.run(shutdown.recv()).await;
    forwarder.abort();

    match &result {
        Ok(()) => tracing::info!("logcap-daemon shut down"),
        Err(e) => tracing::error!(error = %e, "logcap-daemon shut down with errors"),
    }
    result
}
