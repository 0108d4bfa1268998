//! Repeating-fetch lifecycle bound to one target (a report id, or the whole
//! roster). One controller owns one timer task; ticks are strictly
//! sequential, teardown is synchronous, and a fetch that completes after
//! teardown or retarget is discarded by a generation guard.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::client::{ApiError, SharedApi};
use crate::logging::{json_log, log_fetch_error, log_tick, obj, v_str, Domain};
use crate::model::Report;

/// What a controller instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    AllReports,
    Report(i64),
}

impl PollTarget {
    pub fn describe(&self) -> String {
        match self {
            PollTarget::AllReports => "all-reports".to_string(),
            PollTarget::Report(id) => format!("report-{}", id),
        }
    }
}

/// Latest successfully fetched state for the bound target.
#[derive(Debug, Clone)]
pub enum PollSnapshot {
    Roster(Vec<Report>),
    Single(Report),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Stopped,
}

struct SharedState {
    generation: u64,
    phase: PollPhase,
    snapshot: Option<PollSnapshot>,
    ticks: u64,
}

struct Shared {
    state: Mutex<SharedState>,
    refresh: Notify,
}

pub struct PollingController {
    api: SharedApi,
    interval: Duration,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
    errors: Option<mpsc::UnboundedSender<ApiError>>,
}

impl PollingController {
    pub fn new(api: SharedApi, interval: Duration) -> Self {
        Self {
            api,
            interval,
            shared: Arc::new(Shared {
                state: Mutex::new(SharedState {
                    generation: 0,
                    phase: PollPhase::Idle,
                    snapshot: None,
                    ticks: 0,
                }),
                refresh: Notify::new(),
            }),
            task: None,
            errors: None,
        }
    }

    /// Tick errors are forwarded here in addition to being logged; the
    /// channel is optional and a full/closed receiver is ignored.
    pub fn on_error(mut self, tx: mpsc::UnboundedSender<ApiError>) -> Self {
        self.errors = Some(tx);
        self
    }

    /// Begin polling the target: one immediate fetch, then one fetch per
    /// interval. Calling while already polling retargets: the previous
    /// subscription is invalidated before the new one starts, so at most one
    /// timer task is ever live per controller.
    pub fn start(&mut self, target: PollTarget) {
        let generation = {
            let mut st = match self.shared.state.lock() {
                Ok(st) => st,
                Err(_) => return,
            };
            if st.phase == PollPhase::Stopped {
                json_log(
                    Domain::Poll,
                    "start_ignored",
                    obj(&[("target", v_str(&target.describe())), ("reason", v_str("stopped"))]),
                );
                return;
            }
            st.generation += 1;
            st.phase = PollPhase::Polling;
            st.snapshot = None;
            st.generation
        };

        if let Some(task) = self.task.take() {
            task.abort();
        }

        json_log(Domain::Poll, "start", obj(&[("target", v_str(&target.describe()))]));

        let api = self.api.clone();
        let shared = self.shared.clone();
        let interval = self.interval;
        let errors = self.errors.clone();
        self.task = Some(tokio::spawn(async move {
            run_loop(api, shared, generation, target, interval, errors).await;
        }));
    }

    /// Cancel the pending timer synchronously. An in-flight fetch may still
    /// complete but its result is discarded by the generation guard; nothing
    /// observable mutates after this returns.
    pub fn stop(&mut self) {
        if let Ok(mut st) = self.shared.state.lock() {
            if st.phase == PollPhase::Stopped {
                return;
            }
            st.generation += 1;
            st.phase = PollPhase::Stopped;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        json_log(Domain::Poll, "stop", obj(&[]));
    }

    /// Wake the polling task so the next fetch happens now instead of at the
    /// next interval boundary. Still sequential: if a fetch is mid-flight the
    /// wakeup is consumed right after it is applied.
    pub fn refresh_now(&self) {
        self.shared.refresh.notify_one();
    }

    pub fn latest(&self) -> Option<PollSnapshot> {
        self.shared.state.lock().ok().and_then(|st| st.snapshot.clone())
    }

    pub fn phase(&self) -> PollPhase {
        self.shared.state.lock().map(|st| st.phase).unwrap_or(PollPhase::Stopped)
    }

    /// Completed tick count (successful or failed), for change detection.
    pub fn ticks(&self) -> u64 {
        self.shared.state.lock().map(|st| st.ticks).unwrap_or(0)
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    api: SharedApi,
    shared: Arc<Shared>,
    generation: u64,
    target: PollTarget,
    interval: Duration,
    errors: Option<mpsc::UnboundedSender<ApiError>>,
) {
    let desc = target.describe();
    loop {
        let started = Instant::now();
        let result = match target {
            PollTarget::AllReports => api.list_reports().await.map(PollSnapshot::Roster),
            PollTarget::Report(id) => api.get_report(id).await.map(PollSnapshot::Single),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        {
            let mut st = match shared.state.lock() {
                Ok(st) => st,
                Err(_) => return,
            };
            // A stale generation means stop() or a retarget superseded this
            // task while the fetch was outstanding: drop the result unseen.
            if st.generation != generation {
                return;
            }
            st.ticks += 1;
            match result {
                Ok(snapshot) => {
                    st.snapshot = Some(snapshot);
                    log_tick(&desc, "ok", elapsed_ms);
                }
                Err(err) => {
                    // A failed tick never stops polling; the next tick is the retry.
                    log_fetch_error(&desc, &err.to_string());
                    if let Some(tx) = &errors {
                        let _ = tx.send(err);
                    }
                }
            }
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = shared.refresh.notified() => {}
        }

        let stale = shared.state.lock().map(|st| st.generation != generation).unwrap_or(true);
        if stale {
            return;
        }
    }
}
