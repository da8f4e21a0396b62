//! Poll service: the fetch → diff → notify loop and the operations the
//! command surface drives (start/stop/status/set target/clear/force check).
//!
//! - At most one loop task exists at a time (`control` serializes start/stop
//!   and is held until a stopped loop has fully unwound).
//! - Passes are single-flight: a forced check and a scheduled pass never
//!   overlap (`pass_lock`).
//! - Cancellation interrupts both the inter-pass sleep and an in-flight pass.
//! - A failed pass (error or panic) is logged and followed by the recovery
//!   delay instead of the normal interval; only `stop` ends the loop.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    catalog::CatalogSource,
    config::Config,
    dedup::DedupStore,
    differ::diff,
    domain::SinkRef,
    errors::Error,
    notify::{notify, port::NotificationSink},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct PollSettings {
    pub interval: Duration,
    pub recovery_delay: Duration,
    pub detailed_entry_limit: usize,
    pub synopsis_max_chars: usize,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            recovery_delay: Duration::from_secs(600),
            detailed_entry_limit: 5,
            synopsis_max_chars: 200,
        }
    }
}

impl From<&Config> for PollSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.poll_interval,
            recovery_delay: cfg.recovery_delay,
            detailed_entry_limit: cfg.detailed_entry_limit,
            synopsis_max_chars: cfg.synopsis_max_chars,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub state: PollState,
    pub target: Option<SinkRef>,
    pub tracked: usize,
    pub interval: Duration,
}

/// Outcome of one fetch → diff → notify pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub fetched: usize,
    pub new_entries: usize,
    pub delivered: bool,
}

#[derive(Clone)]
pub struct PollService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    settings: PollSettings,
    source: Arc<dyn CatalogSource>,
    sink: Arc<dyn NotificationSink>,
    control: Mutex<Option<LoopHandle>>,
    state: Mutex<SharedState>,
    pass_lock: Mutex<()>,
}

#[derive(Default)]
struct SharedState {
    dedup: DedupStore,
    target: Option<SinkRef>,
}

struct LoopHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LoopHandle {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl PollService {
    pub fn new(
        settings: PollSettings,
        source: Arc<dyn CatalogSource>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                settings,
                source,
                sink,
                control: Mutex::new(None),
                state: Mutex::new(SharedState::default()),
                pass_lock: Mutex::new(()),
            }),
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.inner.settings
    }

    /// Start the loop, recording `target` as the notification target.
    ///
    /// No-op while a loop is already running.
    pub async fn start(&self, target: Option<SinkRef>) -> StartOutcome {
        let mut control = self.inner.control.lock().await;
        if control.as_ref().is_some_and(LoopHandle::is_alive) {
            return StartOutcome::AlreadyRunning;
        }

        if let Some(target) = target {
            self.inner.state.lock().await.target = Some(target);
        }

        let cancel = CancellationToken::new();
        let service = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            service.run_loop(token).await;
        });

        *control = Some(LoopHandle { cancel, handle });
        StartOutcome::Started
    }

    /// Cancel the loop and wait until its task has exited.
    pub async fn stop(&self) -> StopOutcome {
        let mut control = self.inner.control.lock().await;
        let Some(running) = control.take() else {
            return StopOutcome::NotRunning;
        };
        if !running.is_alive() {
            return StopOutcome::NotRunning;
        }

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            if !e.is_cancelled() {
                error!("poll loop ended abnormally: {e}");
            }
        }
        StopOutcome::Stopped
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .control
            .lock()
            .await
            .as_ref()
            .is_some_and(LoopHandle::is_alive)
    }

    pub async fn status(&self) -> StatusReport {
        let state = if self.is_running().await {
            PollState::Running
        } else {
            PollState::Idle
        };
        let st = self.inner.state.lock().await;
        StatusReport {
            state,
            target: st.target.clone(),
            tracked: st.dedup.len(),
            interval: self.inner.settings.interval,
        }
    }

    /// Replace the notification target; returns the previous one.
    pub async fn set_target(&self, target: SinkRef) -> Option<SinkRef> {
        let mut st = self.inner.state.lock().await;
        info!(chat = %target.label, "notification target updated");
        st.target.replace(target)
    }

    /// Forget every seen identity; returns how many were tracked.
    pub async fn clear_cache(&self) -> usize {
        let cleared = self.inner.state.lock().await.dedup.clear();
        info!(cleared, "dedup cache cleared");
        cleared
    }

    pub async fn tracked(&self) -> usize {
        self.inner.state.lock().await.dedup.len()
    }

    /// Run one pass now, outside the schedule.
    pub async fn force_check(&self) -> Result<PassReport> {
        info!("manual check requested");
        self.run_pass().await
    }

    async fn run_pass(&self) -> Result<PassReport> {
        let _flight = self.inner.pass_lock.lock().await;
        let settings = self.inner.settings;

        let batch = self.inner.source.fetch().await?;

        let (fresh, target) = {
            let mut st = self.inner.state.lock().await;
            let fresh = diff(&batch, &mut st.dedup, settings.synopsis_max_chars);
            (fresh, st.target.clone())
        };

        let delivered = notify(
            &fresh,
            self.inner.sink.as_ref(),
            target.as_ref(),
            settings.detailed_entry_limit,
        )
        .await;

        Ok(PassReport {
            fetched: batch.len(),
            new_entries: fresh.len(),
            delivered,
        })
    }

    async fn run_loop(self, cancel: CancellationToken) {
        let settings = self.inner.settings;
        info!(
            interval_secs = settings.interval.as_secs(),
            "anime release checker started"
        );

        loop {
            // The tokio locks held by a pass are released on unwind, so a
            // panicking pass leaves the service usable.
            let pass = AssertUnwindSafe(self.run_pass()).catch_unwind();
            let outcome = tokio::select! {
              _ = cancel.cancelled() => break,
              res = pass => res.unwrap_or_else(|panic| {
                  Err(Error::External(format!("check pass panicked: {}", panic_message(&*panic))))
              }),
            };

            let wait = match outcome {
                Ok(report) => {
                    info!(
                        fetched = report.fetched,
                        new = report.new_entries,
                        delivered = report.delivered,
                        "check pass finished"
                    );
                    settings.interval
                }
                Err(e) => {
                    error!(
                        retry_secs = settings.recovery_delay.as_secs(),
                        "check pass failed: {e}"
                    );
                    settings.recovery_delay
                }
            };

            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = sleep(wait) => {}
            }
        }

        info!("anime release checker stopped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
