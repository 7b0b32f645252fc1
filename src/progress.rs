// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Progress tracking for probes and suites
//!
//! Every tracked unit of work (a single probe run or a whole suite) gets a
//! [`ProgressRecord`] that moves `running -> completed | failed | cancelled`
//! exactly once. All state lives behind one mutex; observers are notified
//! after the state lock is released, in operation order.
//!
//! Finished records are retained up to a cap; past it the oldest are dropped.
//!
//! @copyright 2026 Bountyy Oy
//! @license Proprietary

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::errors::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ProgressStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: String,
    pub display_name: String,
    pub status: ProgressStatus,
    pub percent: f64,
    pub current_step: String,
    pub total_steps: u32,
    pub completed_steps: u32,
    pub findings_count: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ProgressRecord {
    fn new(id: &str, display_name: &str, total_steps: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            status: ProgressStatus::Pending,
            percent: 0.0,
            current_step: String::new(),
            total_steps,
            completed_steps: 0,
            findings_count: 0,
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }
}

/// Partial update; only the fields that are set are applied
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub percent: Option<f64>,
    pub current_step: Option<String>,
    pub completed_steps: Option<u32>,
    pub findings_count: Option<usize>,
}

impl ProgressUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(mut self, percent: f64) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn completed_steps(mut self, steps: u32) -> Self {
        self.completed_steps = Some(steps);
        self
    }

    pub fn findings(mut self, count: usize) -> Self {
        self.findings_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub active_count: usize,
    pub completed_count: usize,
    pub total_findings: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub cancelled_count: usize,
}

/// Receives a snapshot of a record after every start, update, completion
/// and cancellation.
///
/// Errors are logged and do not affect the tracker or other observers.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, record: &ProgressRecord) -> anyhow::Result<()>;
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressRecord) -> anyhow::Result<()> + Send + Sync,
{
    fn on_progress(&self, record: &ProgressRecord) -> anyhow::Result<()> {
        self(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Finished records kept by default
pub const DEFAULT_COMPLETED_RETENTION: usize = 10_000;

#[derive(Default)]
struct TrackerState {
    active: HashMap<String, ProgressRecord>,
    completed: HashMap<String, ProgressRecord>,
    /// Completed ids, oldest first
    completion_order: VecDeque<String>,
}

impl TrackerState {
    fn retire(&mut self, record: ProgressRecord, max_completed: usize) {
        let id = record.id.clone();
        if self.completed.insert(id.clone(), record).is_some() {
            self.completion_order.retain(|existing| *existing != id);
        }
        self.completion_order.push_back(id);

        while self.completed.len() > max_completed {
            let Some(oldest) = self.completion_order.pop_front() else {
                break;
            };
            self.completed.remove(&oldest);
        }
    }
}

pub struct ProgressTracker {
    state: Mutex<TrackerState>,
    max_completed: usize,
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn ProgressObserver>)>>,
    /// Serialises mutation plus fan-out. Taken before `state`; re-entrant so an
    /// observer may call back into the tracker.
    dispatch: ReentrantMutex<()>,
    next_subscription: AtomicU64,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_COMPLETED_RETENTION)
    }

    /// Tracker keeping at most `max_completed` finished records
    pub fn with_retention(max_completed: usize) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            max_completed,
            observers: RwLock::new(Vec::new()),
            dispatch: ReentrantMutex::new(()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn start(
        &self,
        id: &str,
        display_name: &str,
        total_steps: u32,
    ) -> Result<ProgressRecord, TrackerError> {
        let _dispatch = self.dispatch.lock();
        let mut state = self.state.lock();
        if state.active.contains_key(id) {
            return Err(TrackerError::DuplicateId { id: id.to_string() });
        }

        let mut record = ProgressRecord::new(id, display_name, total_steps);
        record.status = ProgressStatus::Running;
        state.active.insert(id.to_string(), record.clone());
        drop(state);

        debug!("Progress started: {} ({} steps)", id, total_steps);
        self.notify(&record);
        Ok(record)
    }

    /// Returns `None` when `id` is not active.
    ///
    /// `completed_steps` recomputes percent against `total_steps` and wins over
    /// an explicit percent in the same update. Percent never decreases.
    pub fn update(&self, id: &str, update: ProgressUpdate) -> Option<ProgressRecord> {
        let _dispatch = self.dispatch.lock();
        let mut state = self.state.lock();
        let record = state.active.get_mut(id)?;

        let mut candidate = update
            .percent
            .filter(|p| !p.is_nan())
            .map(|p| p.clamp(0.0, 100.0));

        if let Some(step) = update.current_step {
            record.current_step = step;
        }
        if let Some(steps) = update.completed_steps {
            record.completed_steps = steps;
            if record.total_steps > 0 {
                let derived = f64::from(steps) / f64::from(record.total_steps) * 100.0;
                candidate = Some(derived.clamp(0.0, 100.0));
            }
        }
        if let Some(count) = update.findings_count {
            record.findings_count = count;
        }
        if let Some(percent) = candidate {
            if percent > record.percent {
                record.percent = percent;
            }
        }

        let snapshot = record.clone();
        drop(state);

        self.notify(&snapshot);
        Some(snapshot)
    }

    /// Moves the record to the completed set; `failed` when `error` is given.
    /// Returns `None` when `id` is not active.
    pub fn complete(
        &self,
        id: &str,
        findings_count: usize,
        error: Option<String>,
    ) -> Option<ProgressRecord> {
        let status = if error.is_some() {
            ProgressStatus::Failed
        } else {
            ProgressStatus::Completed
        };
        self.finish(id, status, Some(findings_count), error)
    }

    /// Terminal `cancelled` state. Percent is left where it was.
    pub fn cancel(&self, id: &str, reason: impl Into<String>) -> Option<ProgressRecord> {
        self.finish(id, ProgressStatus::Cancelled, None, Some(reason.into()))
    }

    fn finish(
        &self,
        id: &str,
        status: ProgressStatus,
        findings_count: Option<usize>,
        error: Option<String>,
    ) -> Option<ProgressRecord> {
        let _dispatch = self.dispatch.lock();
        let mut state = self.state.lock();
        let mut record = state.active.remove(id)?;

        record.status = status;
        record.end_time = Some(Utc::now());
        record.error = error;
        if let Some(count) = findings_count {
            record.findings_count = count;
        }
        if status != ProgressStatus::Cancelled {
            record.percent = 100.0;
        }
        state.retire(record.clone(), self.max_completed);
        drop(state);

        debug!("Progress {}: {:?}", id, status);
        self.notify(&record);
        Some(record)
    }

    /// Active or completed record
    pub fn get(&self, id: &str) -> Option<ProgressRecord> {
        let state = self.state.lock();
        state
            .active
            .get(id)
            .or_else(|| state.completed.get(id))
            .cloned()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.state.lock().active.contains_key(id)
    }

    pub fn active(&self) -> HashMap<String, ProgressRecord> {
        self.state.lock().active.clone()
    }

    pub fn completed(&self) -> HashMap<String, ProgressRecord> {
        self.state.lock().completed.clone()
    }

    pub fn summary(&self) -> TrackerSummary {
        let state = self.state.lock();
        let mut summary = TrackerSummary {
            active_count: state.active.len(),
            completed_count: state.completed.len(),
            ..Default::default()
        };

        for record in state.active.values().chain(state.completed.values()) {
            summary.total_findings += record.findings_count;
        }
        for record in state.completed.values() {
            match record.status {
                ProgressStatus::Completed => summary.success_count += 1,
                ProgressStatus::Failed => summary.failure_count += 1,
                ProgressStatus::Cancelled => summary.cancelled_count += 1,
                ProgressStatus::Pending | ProgressStatus::Running => {}
            }
        }
        summary
    }

    pub fn subscribe(&self, observer: impl ProgressObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    fn notify(&self, record: &ProgressRecord) {
        let observers: Vec<_> = self.observers.read().iter().map(|(_, o)| o.clone()).collect();

        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_progress(record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Progress observer failed for {}: {:#}", record.id, e),
                Err(_) => error!("Progress observer panicked for {}", record.id),
            }
        }
    }
}
