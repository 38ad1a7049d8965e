//! Timer-driven poll cycles.
//!
//! At most one cycle runs at a time. The in-flight flag is an atomic
//! compare-and-swap released by a drop guard, so it holds on tokio's
//! multi-threaded runtime and is released even if a cycle panics. A tick
//! that finds a cycle in flight is skipped, never queued.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::RwsClient;
use crate::config::MonitorConfig;
use crate::cycle::{interpret, CycleReading};
use crate::errors::{ErrorKind, IssueSubject, MonitorError, PollIssue, StoreError};
use crate::history::{History, HistoryEntry, PositionHistoryEntry};
use crate::models::{Measurement, Readout, Sample};
use crate::store::MeasurementStore;

/// Everything a dashboard shows.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub readout: Readout,
    pub gripper_history: History<HistoryEntry>,
    pub speed_history: History<HistoryEntry>,
    pub position_history: History<PositionHistoryEntry>,
    /// Most recent persisted rows, newest first.
    pub latest_measurements: Vec<Measurement>,
    pub last_update: Option<DateTime<Local>>,
    /// Last persistence or cycle failure; cleared by a cycle without one.
    pub status: Option<String>,
    pub cycles: u64,
}

impl MonitorState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            readout: Readout::default(),
            gripper_history: History::new(history_capacity),
            speed_history: History::new(history_capacity),
            position_history: History::new(history_capacity),
            latest_measurements: Vec::new(),
            last_update: None,
            status: None,
            cycles: 0,
        }
    }

    /// `Päivitetty: 12:34:56` once a cycle has completed.
    pub fn last_update_text(&self) -> Option<String> {
        self.last_update
            .map(|t| format!("Päivitetty: {}", t.format("%H:%M:%S")))
    }

    fn apply(&mut self, reading: &CycleReading) {
        self.readout = reading.readout.clone();
        if let Some(entry) = &reading.gripper_entry {
            self.gripper_history.push(entry.clone());
        }
        if let Some(entry) = &reading.speed_entry {
            self.speed_history.push(entry.clone());
        }
        if let Some(entry) = &reading.position_entry {
            self.position_history.push(entry.clone());
        }
    }
}

/// Outcome of one completed cycle, published to subscribers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PollReport {
    pub sample: Sample,
    pub readout: Readout,
    pub issues: Vec<PollIssue>,
    /// Row id of the persisted measurement, if the write succeeded.
    pub stored_id: Option<i64>,
}

impl PollReport {
    pub fn issues_of(&self, kind: ErrorKind) -> impl Iterator<Item = &PollIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}

/// Clears the in-flight flag when dropped.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Poller {
    client: RwsClient,
    store: MeasurementStore,
    latest_rows: usize,
    state: Arc<Mutex<MonitorState>>,
    in_flight: AtomicBool,
    reports: broadcast::Sender<PollReport>,
}

impl Poller {
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let client = RwsClient::new(config.client.clone())?;
        let store = MeasurementStore::open(&config.db_path)?;
        info!("Measurements stored in {}", store.path().display());
        Ok(Self::with_parts(client, store, config.history_capacity, config.latest_rows))
    }

    pub fn with_parts(
        client: RwsClient,
        store: MeasurementStore,
        history_capacity: usize,
        latest_rows: usize,
    ) -> Self {
        let (reports, _) = broadcast::channel(64);
        Self {
            client,
            store,
            latest_rows,
            state: Arc::new(Mutex::new(MonitorState::new(history_capacity))),
            in_flight: AtomicBool::new(false),
            reports,
        }
    }

    /// Shared dashboard state. Only a running cycle writes to it.
    pub fn state(&self) -> Arc<Mutex<MonitorState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> MonitorState {
        self.state.lock().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollReport> {
        self.reports.subscribe()
    }

    /// True while a cycle is running; a manual refresh is unavailable then.
    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one cycle now, or returns `None` if one is already in flight.
    pub async fn poll_once(&self) -> Option<PollReport> {
        let Some(_guard) = CycleGuard::acquire(&self.in_flight) else {
            debug!("Poll cycle already in flight, skipping");
            return None;
        };
        Some(self.run_cycle().await)
    }

    /// Reloads the latest persisted rows without polling, e.g. at start-up.
    pub async fn refresh_latest(&self) -> Result<(), StoreError> {
        let limit = self.latest_rows;
        let rows = self.with_store(move |store| store.latest(limit)).await?;
        self.state.lock().await.latest_measurements = rows;
        Ok(())
    }

    /// Starts the timer. Every tick spawns a cycle unless one is in flight.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if poller.is_polling() {
                    debug!("Previous cycle still running, tick skipped");
                    continue;
                }
                tokio::spawn(Arc::clone(&poller).run_supervised());
            }
        })
    }

    /// Manual "refresh now". Returns false if a cycle is already in flight.
    pub fn trigger(self: &Arc<Self>) -> bool {
        if self.is_polling() {
            return false;
        }
        tokio::spawn(Arc::clone(self).run_supervised());
        true
    }

    /// Runs a cycle in its own task so that a panic inside it becomes a
    /// status message instead of taking the timer down.
    async fn run_supervised(self: Arc<Self>) {
        let poller = Arc::clone(&self);
        self.supervise(async move { poller.poll_once().await }).await;
    }

    /// Awaits `cycle` on its own task. Returns the issue recorded if it
    /// panicked or was cancelled.
    async fn supervise<F>(&self, cycle: F) -> Option<PollIssue>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let e = tokio::spawn(cycle).await.err()?;
        let issue = PollIssue::new(
            ErrorKind::Cycle,
            IssueSubject::Poller,
            format!("Poll cycle aborted: {}", e),
        );
        error!("{}", issue);
        self.state.lock().await.status = Some(issue.message.clone());
        Some(issue)
    }

    async fn run_cycle(&self) -> PollReport {
        let responses = self.client.fetch_all().await;
        let reading = interpret(&responses, Local::now());
        for issue in &reading.issues {
            debug!("{}", issue);
        }

        self.state.lock().await.apply(&reading);

        let CycleReading {
            sample,
            readout,
            mut issues,
            ..
        } = reading;
        let mut status = None;

        let measurement = sample.to_new_measurement();
        let stored_id = match self.with_store(move |store| store.insert(&measurement)).await {
            Ok(id) => Some(id),
            Err(e) => {
                let message = format!("DB-virhe: {}", e);
                error!("Failed to store measurement: {}", e);
                issues.push(PollIssue::new(ErrorKind::Persistence, IssueSubject::StoreWrite, message.clone()));
                status = Some(message);
                None
            }
        };

        // Read back even if the write failed.
        let limit = self.latest_rows;
        let latest = match self.with_store(move |store| store.latest(limit)).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                let message = format!("DB-lukuvirhe: {}", e);
                error!("Failed to read latest measurements: {}", e);
                issues.push(PollIssue::new(ErrorKind::Persistence, IssueSubject::StoreRead, message.clone()));
                status = Some(message);
                None
            }
        };

        {
            let mut state = self.state.lock().await;
            if let Some(rows) = latest {
                state.latest_measurements = rows;
            }
            state.status = status;
            state.last_update = Some(Local::now());
            state.cycles += 1;
        }

        let report = PollReport {
            sample,
            readout,
            issues,
            stored_id,
        };
        if report.issues.iter().any(|i| i.kind == ErrorKind::Network) {
            warn!(
                "Cycle finished with {} unavailable endpoint(s)",
                report.issues_of(ErrorKind::Network).count()
            );
        }
        // No subscribers is fine.
        let _ = self.reports.send(report.clone());
        report
    }

    async fn with_store<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&MeasurementStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }
}
