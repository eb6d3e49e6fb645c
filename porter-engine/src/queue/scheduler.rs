//! Periodic job scheduler
//!
//! Ticks independently of worker load and only ever enqueues: the populate
//! pass every ten minutes, the assigner two minutes behind it, and the two
//! daily cleanups. Enqueue failures are logged and the tick is otherwise
//! dropped; the next interval retries naturally.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::broker::Broker;
use super::job::JobKind;

/// Interval for the errand pipeline jobs.
pub const PIPELINE_INTERVAL: Duration = Duration::from_secs(600);

/// Stagger between populate and assign so fresh entries exist.
pub const ASSIGN_STAGGER: Duration = Duration::from_secs(120);

/// Interval for the daily cleanup jobs.
pub const DAILY_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Enqueues the periodic jobs.
pub struct Scheduler {
    broker: Arc<Broker>,
}

impl Scheduler {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    fn enqueue(&self, kind: JobKind) {
        match self.broker.enqueue(&kind) {
            Ok(id) => info!(job = id, name = kind.name(), "scheduled job enqueued"),
            Err(err) => error!(name = kind.name(), %err, "failed to enqueue scheduled job"),
        }
    }

    /// Run the tick loop until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now();
        let mut populate = interval_at(start + PIPELINE_INTERVAL, PIPELINE_INTERVAL);
        let mut assign = interval_at(start + PIPELINE_INTERVAL + ASSIGN_STAGGER, PIPELINE_INTERVAL);
        let mut cleanup = interval_at(start + DAILY_INTERVAL, DAILY_INTERVAL);
        let mut auto_complete = interval_at(start + DAILY_INTERVAL, DAILY_INTERVAL);
        for ticker in [&mut populate, &mut assign, &mut cleanup, &mut auto_complete] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        info!("scheduler started");
        loop {
            tokio::select! {
                _ = populate.tick() => self.enqueue(JobKind::PopulatePotentialMatches),
                _ = assign.tick() => self.enqueue(JobKind::AssignErrand),
                _ = cleanup.tick() => self.enqueue(JobKind::CleanupTimedOutMatches),
                _ = auto_complete.tick() => self.enqueue(JobKind::AutoCompleteMatch),
                _ = shutdown.changed() => break,
            }
        }
        info!("scheduler stopped");
    }
}
