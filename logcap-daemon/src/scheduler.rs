//! Fixed-interval tick scheduling and signal-driven control.
//!
//! The [`Scheduler`] owns the [`CaptureEngine`] and is the only caller of
//! `tick()`, so ticks never overlap. Control requests (reload, status)
//! arrive over an mpsc channel; shutdown is an arbitrary future so the loop
//! can be driven by Unix signals in production and by a oneshot in tests.
//!
//! # Signals
//!
//! - `SIGHUP`: reload the configuration file and call `configure()`
//! - `SIGUSR1`: log the status report
//! - `SIGTERM` / `SIGINT`: leave the loop, final flush, bounded notify wait

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use logcap_capture::{CaptureEngine, CaptureSettings, StatusReport};
use logcap_core::config::LogcapConfig;

const CONTROL_CHANNEL_CAPACITY: usize = 8;

/// Out-of-band request handled between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Re-read the configuration file and reconfigure the engine.
    Reload,
    /// Log the current status report.
    Status,
}

/// Drives a [`CaptureEngine`] on a fixed period.
pub struct Scheduler {
    engine: CaptureEngine,
    config_path: PathBuf,
    tick_interval: Duration,
    control_rx: mpsc::Receiver<Control>,
    reloads: u64,
}

impl Scheduler {
    /// Create a scheduler and the sender used to submit [`Control`] requests.
    ///
    /// `config_path` is the file re-read on [`Control::Reload`].
    pub fn new(
        engine: CaptureEngine,
        config_path: impl Into<PathBuf>,
        tick_interval: Duration,
    ) -> (Self, mpsc::Sender<Control>) {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let scheduler = Self {
            engine,
            config_path: config_path.into(),
            tick_interval,
            control_rx,
            reloads: 0,
        };
        (scheduler, control_tx)
    }

    /// Run ticks until `shutdown` resolves, then shut the engine down.
    ///
    /// The output of `shutdown` is logged as the stop reason. A closed
    /// control channel is not a stop condition.
    ///
    /// # Errors
    ///
    /// Returns an error only when the final flush during shutdown fails.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future,
        F::Output: std::fmt::Display,
    {
        tokio::pin!(shutdown);
        let mut interval = build_interval(self.tick_interval);
        let mut control_open = true;

        tracing::info!(
            tick_interval_ms = self.tick_interval.as_millis() as u64,
            config = %self.config_path.display(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                reason = &mut shutdown => {
                    tracing::info!(reason = %reason, "shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.engine.tick().await;
                    if report.lines_read > 0 || report.flushed > 0 {
                        tracing::debug!(
                            lines_read = report.lines_read,
                            events = report.events,
                            flushed = report.flushed,
                            queued = report.queued,
                            "tick completed"
                        );
                    }
                }
                control = self.control_rx.recv(), if control_open => {
                    match control {
                        Some(Control::Reload) => {
                            if let Err(e) = self.reload().await {
                                tracing::warn!(error = %e, "reload failed, keeping previous configuration");
                            }
                            if interval.period() != self.tick_interval {
                                interval = build_interval(self.tick_interval);
                            }
                        }
                        Some(Control::Status) => log_status(&self.engine.status()),
                        None => {
                            tracing::debug!("control channel closed");
                            control_open = false;
                        }
                    }
                }
            }
        }

        let flushed = self
            .engine
            .shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("final flush failed: {}", e))?;
        tracing::info!(flushed = flushed, "scheduler stopped");
        Ok(())
    }

    /// Re-read the configuration file and apply it to the engine.
    ///
    /// Only the `[capture]` section and `tick_interval_ms` take effect;
    /// logging and metrics are fixed for the life of the process.
    pub async fn reload(&mut self) -> Result<()> {
        let config = LogcapConfig::load(&self.config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        self.engine
            .configure(CaptureSettings::from_core(&config.capture))
            .await
            .map_err(|e| anyhow::anyhow!("failed to apply config: {}", e))?;
        self.tick_interval = Duration::from_millis(config.general.tick_interval_ms);
        self.reloads += 1;
        tracing::info!(
            config = %self.config_path.display(),
            rules = self.engine.status().rules.len(),
            tick_interval_ms = config.general.tick_interval_ms,
            "configuration reloaded"
        );
        Ok(())
    }

    /// The engine driven by this scheduler.
    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    /// Current tick period.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of successful reloads.
    pub fn reloads(&self) -> u64 {
        self.reloads
    }

    /// Path re-read on reload.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

fn build_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn log_status(report: &StatusReport) {
    tracing::info!(
        rules = report.rules.len(),
        output_file = %report.output_file,
        output_size_bytes = report.output_size_bytes,
        queued_lines = report.queued_lines,
        pending_captures = report.pending_captures,
        ticks = report.ticks,
        "status report\n{}",
        report
    );
}

/// Forward `SIGHUP` and `SIGUSR1` to the scheduler's control channel.
///
/// The task ends when the scheduler drops its receiver.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub fn spawn_signal_forwarder(control_tx: mpsc::Sender<Control>) -> Result<JoinHandle<()>> {
    let mut sighup = signal(SignalKind::hangup())
        .map_err(|e| anyhow::anyhow!("failed to install SIGHUP handler: {}", e))?;
    let mut sigusr1 = signal(SignalKind::user_defined1())
        .map_err(|e| anyhow::anyhow!("failed to install SIGUSR1 handler: {}", e))?;

    Ok(tokio::spawn(async move {
        loop {
            let control = tokio::select! {
                _ = sighup.recv() => Control::Reload,
                _ = sigusr1.recv() => Control::Status,
            };
            tracing::debug!(control = ?control, "control signal received");
            if control_tx.send(control).await.is_err() {
                break;
            }
        }
    }))
}

/// Installed `SIGTERM` and `SIGINT` handlers.
pub struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignals {
    /// Install the shutdown signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if signal handlers cannot be installed.
    pub fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the first shutdown signal and return its name.
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}
