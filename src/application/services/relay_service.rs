//! Hit planning and concurrent target dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::domain::attribution::AttributionRecord;
use crate::domain::dispatch::{DispatchJob, DispatchOutcome, DispatchSummary, Forwarder};
use crate::domain::referer::RefererConfig;
use crate::domain::targets::TargetList;
use crate::error::RelayError;

/// Everything derived from one inbound hit before any network activity.
#[derive(Debug, Clone)]
pub struct RelayPlan {
    pub record: AttributionRecord,
    pub jobs: Vec<DispatchJob>,
}

/// Orchestrates the relay pipeline for inbound hits.
///
/// Planning is synchronous and pure; dispatch runs as a background batch so
/// the HTTP response never waits on a target. Each attempt gets its own
/// deadline, and one slow or failing target never holds up its siblings.
pub struct RelayService<F: Forwarder> {
    forwarder: Arc<F>,
    targets: TargetList,
    referers: RefererConfig,
    timeout: Duration,
}

impl<F: Forwarder + 'static> RelayService<F> {
    pub fn new(
        forwarder: Arc<F>,
        targets: TargetList,
        referers: RefererConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            forwarder,
            targets,
            referers,
            timeout,
        }
    }

    /// Plans the dispatch batch for one hit.
    ///
    /// Collects attribution from the query string, merges it into every
    /// configured target, and picks the Referer value per target.
    /// `browser_referer` is the visitor's own Referer header, used where
    /// the policy falls back to it.
    pub fn plan(&self, query: &str, browser_referer: Option<&str>) -> RelayPlan {
        let record = AttributionRecord::from_query(query);
        let pairs = record.pairs();

        let jobs = self
            .targets
            .resolve(&pairs)
            .into_iter()
            .map(|target| {
                let referer = self.referers.pick(&target.url, target.index, browser_referer);
                DispatchJob {
                    target_index: target.index,
                    url: target.url,
                    referer,
                }
            })
            .collect();

        RelayPlan { record, jobs }
    }

    /// Fires a planned batch in the background and returns immediately.
    ///
    /// The batch is spawned onto `tracker` so graceful shutdown can wait
    /// for in-flight dispatches to settle.
    pub fn fire(self: &Arc<Self>, jobs: Vec<DispatchJob>, tracker: &TaskTracker) {
        if jobs.is_empty() {
            debug!("no dispatchable targets, skipping batch");
            return;
        }

        let service = Arc::clone(self);
        tracker.spawn(async move {
            let outcomes = service.dispatch_all(jobs).await;
            let summary = DispatchSummary::from_outcomes(&outcomes);
            info!(
                attempted = summary.attempted,
                delivered = summary.delivered,
                failed = summary.failed,
                "dispatch batch settled"
            );
        });
    }

    /// Dispatches every job concurrently and waits for all outcomes.
    ///
    /// Each attempt runs under its own deadline. Timeouts, transport
    /// failures, and upstream error statuses are recorded per target and
    /// never propagate past this method.
    pub async fn dispatch_all(&self, jobs: Vec<DispatchJob>) -> Vec<DispatchOutcome> {
        let mut join_set = JoinSet::new();

        for job in jobs {
            let forwarder = Arc::clone(&self.forwarder);
            let timeout = self.timeout;

            join_set.spawn(async move {
                let target = job.url.to_string();
                let result = match tokio::time::timeout(timeout, forwarder.forward(job)).await {
                    Ok(result) => result,
                    Err(_) => Err(RelayError::Timeout {
                        target: target.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                DispatchOutcome { target, result }
            });
        }

        let mut outcomes = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    match &outcome.result {
                        Ok(status) => {
                            debug!(target = %outcome.target, status, "target hit delivered");
                            metrics::counter!("relay_dispatch_total", "outcome" => "delivered")
                                .increment(1);
                        }
                        Err(err) => {
                            warn!(
                                target = %outcome.target,
                                error = %err,
                                "target hit failed"
                            );
                            metrics::counter!("relay_dispatch_total", "outcome" => err.kind())
                                .increment(1);
                        }
                    }
                    outcomes.push(outcome);
                }
                Err(join_err) => {
                    error!(error = %join_err, "dispatch task panicked");
                }
            }
        }
        outcomes
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
