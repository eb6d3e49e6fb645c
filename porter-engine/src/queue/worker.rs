//! Job routing and the worker loop
//!
//! [`JobRouter`] owns every handler and is the only place a typed job
//! turns into engine work. [`Worker`] pulls from the broker, enforces the
//! per-job timeout, and spends the job's retry budget on failures.

use std::sync::Arc;
use std::time::Duration;

use porter_nlp::{Classifier, EmbeddingProvider, CLASSIFICATION_ERROR};
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::broker::{Broker, QueuedJob};
use super::job::{JobKind, AUTO_COMPLETE_QUEUE, RESOURCE_QUEUE};
use crate::assignment::{ErrandAssigner, PotentialMatchPopulator};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::lifecycle::{AutoCompleter, TimeoutCleaner};
use crate::matching::MatchEngine;
use crate::model::ObjectId;
use crate::notify::Notifier;
use crate::store::Store;

/// Hard per-job execution timeout.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(300);

/// Translates queued jobs into handler calls.
pub struct JobRouter {
    store: Arc<Store>,
    classifier: Classifier,
    match_engine: MatchEngine,
    populator: PotentialMatchPopulator,
    assigner: ErrandAssigner,
    cleaner: TimeoutCleaner,
    completer: AutoCompleter,
}

impl JobRouter {
    pub fn new(
        store: Arc<Store>,
        provider: Arc<dyn EmbeddingProvider>,
        notifier: Arc<dyn Notifier>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            classifier: Classifier::new(provider.clone()),
            match_engine: MatchEngine::new(store.clone(), provider, config),
            populator: PotentialMatchPopulator::new(store.clone(), config),
            assigner: ErrandAssigner::new(store.clone(), notifier.clone(), config),
            cleaner: TimeoutCleaner::new(store.clone(), notifier, config),
            completer: AutoCompleter::new(store.clone(), config),
            store,
        }
    }

    /// Execute one typed job to completion.
    pub async fn dispatch(&self, kind: &JobKind) -> EngineResult<()> {
        match kind {
            JobKind::ClassifyResource { resource_id } => self.classify_resource(*resource_id),
            JobKind::PopulatePotentialMatches => {
                let summary = self.populator.run()?;
                info!(?summary, "populatePotentialMatches finished");
                Ok(())
            }
            JobKind::MatchResources => {
                let summary = self.match_engine.run_match_pass()?;
                info!(?summary, "matchResources finished");
                Ok(())
            }
            JobKind::AssignErrand => {
                let summary = self.assigner.run().await?;
                info!(?summary, "assignErrand finished");
                Ok(())
            }
            JobKind::CleanupTimedOutMatches => {
                let summary = self.cleaner.run().await?;
                info!(?summary, "cleanupTimedOutMatches finished");
                Ok(())
            }
            JobKind::AutoCompleteMatch => {
                let summary = self.completer.run()?;
                info!(?summary, "auto_complete_match_job finished");
                Ok(())
            }
        }
    }

    /// Classify one resource and open it for matching.
    fn classify_resource(&self, resource_id: ObjectId) -> EngineResult<()> {
        let Some(resource) = self.store.get_resource(resource_id)? else {
            warn!(%resource_id, "resource not found for classification");
            return Ok(());
        };

        let classification = self.classifier.classify(
            &resource.name,
            &resource.description,
            &resource.specifications,
        );
        if classification.category == CLASSIFICATION_ERROR {
            self.store
                .mark_classification_failed(resource_id, "text classification failed")?;
            return Err(EngineError::Classification(format!(
                "resource {resource_id} could not be classified"
            )));
        }

        info!(
            %resource_id,
            category = %classification.category,
            "classified resource, opening for matching"
        );
        self.store.apply_classification(
            resource_id,
            &classification.category,
            classification.specifications,
        )?;
        Ok(())
    }
}

/// One queue worker.
pub struct Worker {
    id: String,
    broker: Arc<Broker>,
    router: Arc<JobRouter>,
}

impl Worker {
    pub fn new(id: impl Into<String>, broker: Arc<Broker>, router: Arc<JobRouter>) -> Self {
        Self {
            id: id.into(),
            broker,
            router,
        }
    }

    /// Pull and process jobs until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = %self.id, "worker started");
        loop {
            self.broker.heartbeat(&self.id);
            let job = tokio::select! {
                job = self.broker.pop(&[RESOURCE_QUEUE, AUTO_COMPLETE_QUEUE]) => job,
                _ = shutdown.changed() => break,
            };
            self.process(job).await;
        }
        info!(worker = %self.id, "worker stopped");
    }

    /// Run one job with the timeout and retry budget applied.
    pub async fn process(&self, job: QueuedJob) {
        let kind = match JobKind::parse(&job.envelope) {
            Ok(kind) => kind,
            Err(err) => {
                // Malformed envelopes fail the item, never the queue.
                warn!(job = job.id, %err, "dropping unparseable job");
                self.broker.record_result(&job, false, Some(err.to_string()));
                return;
            }
        };

        info!(
            worker = %self.id,
            job = job.id,
            name = kind.name(),
            attempt = job.attempt,
            "processing job"
        );
        let outcome = match tokio::time::timeout(JOB_TIMEOUT, self.router.dispatch(&kind)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout),
        };

        match outcome {
            Ok(()) => self.broker.record_result(&job, true, None),
            Err(err) => {
                if job.attempt < job.max_attempts {
                    warn!(job = job.id, %err, "job failed, retrying");
                    self.broker.requeue(job);
                } else {
                    error!(job = job.id, %err, "job failed, retry budget exhausted");
                    self.broker.record_result(&job, false, Some(err.to_string()));
                }
            }
        }
    }
}
