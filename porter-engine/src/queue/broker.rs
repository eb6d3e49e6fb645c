//! In-memory job broker
//!
//! Two named queues backed by process memory. Workers pull with an async
//! pop; producers (the scheduler, the CLI, external enqueuers) push
//! envelopes with their retry budget attached. Completed-job records are
//! kept until their TTL lapses, and a worker registry tracks heartbeats so
//! liveness is observable.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::debug;

use super::job::{JobEnvelope, JobKind, AUTO_COMPLETE_QUEUE, RESOURCE_QUEUE};
use crate::error::{EngineError, EngineResult};

/// Workers missing heartbeats for this long drop out of the registry.
pub const WORKER_TTL: Duration = Duration::from_secs(420);

/// One queued unit of work.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: u64,
    pub queue: String,
    pub envelope: JobEnvelope,
    pub attempt: u32,
    pub max_attempts: u32,
    pub result_ttl: Duration,
    pub enqueued_at: DateTime<Utc>,
}

/// Terminal record of one job execution.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: u64,
    pub name: String,
    pub success: bool,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, VecDeque<QueuedJob>>,
    results: Vec<JobRecord>,
    workers: HashMap<String, DateTime<Utc>>,
    next_id: u64,
}

/// Shared in-memory broker.
pub struct Broker {
    state: Mutex<BrokerState>,
    notify: Notify,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    pub fn new() -> Self {
        let mut state = BrokerState::default();
        state.queues.insert(RESOURCE_QUEUE.to_string(), VecDeque::new());
        state
            .queues
            .insert(AUTO_COMPLETE_QUEUE.to_string(), VecDeque::new());
        Self {
            state: Mutex::new(state),
            notify: Notify::new(),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, BrokerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Enqueue a typed job on its queue with its retry budget.
    pub fn enqueue(&self, kind: &JobKind) -> EngineResult<u64> {
        self.enqueue_envelope(
            kind.queue(),
            kind.envelope(),
            kind.max_attempts(),
            kind.result_ttl(),
        )
    }

    /// Enqueue a raw envelope (external producers).
    pub fn enqueue_envelope(
        &self,
        queue: &str,
        envelope: JobEnvelope,
        max_attempts: u32,
        result_ttl: Duration,
    ) -> EngineResult<u64> {
        let mut state = self.locked();
        state.next_id += 1;
        let id = state.next_id;
        let job = QueuedJob {
            id,
            queue: queue.to_string(),
            envelope,
            attempt: 1,
            max_attempts,
            result_ttl,
            enqueued_at: Utc::now(),
        };
        let Some(jobs) = state.queues.get_mut(queue) else {
            return Err(EngineError::Queue(format!("unknown queue '{queue}'")));
        };
        jobs.push_back(job);
        drop(state);
        self.notify.notify_waiters();
        Ok(id)
    }

    /// Put a failed job back for another attempt.
    pub fn requeue(&self, mut job: QueuedJob) {
        job.attempt += 1;
        let mut state = self.locked();
        if let Some(jobs) = state.queues.get_mut(&job.queue) {
            debug!(job = job.id, attempt = job.attempt, "requeueing job");
            jobs.push_back(job);
        }
        drop(state);
        self.notify.notify_waiters();
    }

    fn try_pop(&self, queues: &[&str]) -> Option<QueuedJob> {
        let mut state = self.locked();
        for queue in queues {
            if let Some(jobs) = state.queues.get_mut(*queue) {
                if let Some(job) = jobs.pop_front() {
                    return Some(job);
                }
            }
        }
        None
    }

    /// Wait for the next job on any of the given queues, in priority order.
    pub async fn pop(&self, queues: &[&str]) -> QueuedJob {
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.try_pop(queues) {
                return job;
            }
            notified.await;
        }
    }

    /// Current depth of one queue.
    pub fn depth(&self, queue: &str) -> usize {
        self.locked().queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Record a finished job and prune expired records.
    pub fn record_result(&self, job: &QueuedJob, success: bool, error: Option<String>) {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(job.result_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(300));
        let mut state = self.locked();
        state.results.retain(|r| r.expires_at > now);
        state.results.push(JobRecord {
            job_id: job.id,
            name: job.envelope.name.clone(),
            success,
            error,
            finished_at: now,
            expires_at: now + ttl,
        });
    }

    /// Unexpired job records.
    pub fn recent_results(&self) -> Vec<JobRecord> {
        let now = Utc::now();
        self.locked()
            .results
            .iter()
            .filter(|r| r.expires_at > now)
            .cloned()
            .collect()
    }

    /// Record a worker heartbeat.
    pub fn heartbeat(&self, worker_id: &str) {
        self.locked()
            .workers
            .insert(worker_id.to_string(), Utc::now());
    }

    /// Workers with a heartbeat inside the TTL.
    pub fn live_workers(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(WORKER_TTL).unwrap_or_else(|_| chrono::Duration::seconds(420));
        let mut state = self.locked();
        state.workers.retain(|_, seen| *seen > cutoff);
        state.workers.len()
    }
}
