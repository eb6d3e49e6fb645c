//! Scheduler, broker, and the queue-to-handler bridge.

mod broker;
mod job;
mod scheduler;
mod worker;

pub use broker::{Broker, JobRecord, QueuedJob, WORKER_TTL};
pub use job::{JobEnvelope, JobKind, AUTO_COMPLETE_QUEUE, RESOURCE_QUEUE};
pub use scheduler::{Scheduler, ASSIGN_STAGGER, DAILY_INTERVAL, PIPELINE_INTERVAL};
pub use worker::{JobRouter, Worker, JOB_TIMEOUT};
