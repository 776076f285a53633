use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use taskmap_core::config::CoordinatorConfig;
use taskmap_core::error::Result;
use taskmap_core::models::{FetchMode, SearchCriteria, WorkItem};
use taskmap_store::ports::TaskSearchBackend;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregator::{Aggregate, ClusterAggregator, RawFetchResult};
use crate::debounce::Debouncer;
use crate::models::{ClusteredTasks, FetchOutcome, FetchRequest};
use crate::planner::{BoundedQueryPlanner, QueryDecision};

/// What changed in the host's search criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefetchTrigger {
    BoundingBox,
    Zoom,
    Filters,
    Scope,
    DisplayMode,
    SearchQuery,
}

impl RefetchTrigger {
    /// Free-text search is typed character by character, so it is coalesced
    pub fn is_debounced(self) -> bool {
        matches!(self, RefetchTrigger::SearchQuery)
    }
}

/// Issues sequenced fetches and publishes only the newest result.
///
/// Every fetch takes a sequence id from a monotonic counter. A response is committed
/// only while its sequence id is still the latest issued, so responses arriving out of
/// order never overwrite newer state. The counter bump and the commit both happen
/// under the state channel's lock.
pub struct FetchCoordinator {
    backend: Arc<dyn TaskSearchBackend>,
    planner: BoundedQueryPlanner,
    persist_results: bool,
    latest: AtomicU64,
    prefer_clusters: AtomicBool,
    state: watch::Sender<ClusteredTasks>,
    persisted: RwLock<Vec<WorkItem>>,
    debouncer: Debouncer,
}

impl FetchCoordinator {
    /// Create a coordinator over the given backend
    pub fn new(backend: Arc<dyn TaskSearchBackend>, config: CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(ClusteredTasks::default());

        Self {
            backend,
            planner: BoundedQueryPlanner::from_config(&config),
            persist_results: config.persist_results,
            latest: AtomicU64::new(0),
            prefer_clusters: AtomicBool::new(false),
            state,
            persisted: RwLock::new(Vec::new()),
            debouncer: Debouncer::new(config.search_debounce),
        }
    }

    pub fn planner(&self) -> &BoundedQueryPlanner {
        &self.planner
    }

    /// Snapshot of the currently published state
    pub fn state(&self) -> ClusteredTasks {
        self.state.borrow().clone()
    }

    /// Observe every published state change
    pub fn subscribe(&self) -> watch::Receiver<ClusteredTasks> {
        self.state.subscribe()
    }

    pub fn set_prefer_clusters(&self, prefer: bool) {
        self.prefer_clusters.store(prefer, Ordering::SeqCst);
    }

    pub fn prefer_clusters(&self) -> bool {
        self.prefer_clusters.load(Ordering::SeqCst)
    }

    /// Highest sequence id issued so far
    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Tasks retained from committed individual fetches when `persist_results` is set
    pub fn persisted_items(&self) -> Vec<WorkItem> {
        self.persisted.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Fetch for the given criteria and commit the result if still current
    pub async fn fetch(&self, criteria: &SearchCriteria) -> FetchOutcome {
        let sequence = self.issue();
        self.execute(sequence, criteria).await
    }

    /// React to a criteria change.
    ///
    /// Search text changes are debounced and return `None`; the fetch runs once the
    /// debounce window passes without a newer search. Every other trigger cancels a
    /// pending debounced fetch and starts one immediately.
    pub fn request(
        self: &Arc<Self>,
        trigger: RefetchTrigger,
        criteria: SearchCriteria,
    ) -> Option<JoinHandle<FetchOutcome>> {
        let coordinator = Arc::clone(self);

        if trigger.is_debounced() {
            tracing::trace!(delay_ms = self.debouncer.delay().as_millis() as u64, "Debouncing search refetch");
            self.debouncer.schedule(async move {
                coordinator.fetch(&criteria).await;
            });
            return None;
        }

        if self.debouncer.cancel() {
            tracing::debug!(trigger = ?trigger, "Cancelled pending search refetch");
        }

        // Take the sequence id now so requests keep the order they were made in
        let sequence = self.issue();
        Some(tokio::spawn(async move { coordinator.execute(sequence, &criteria).await }))
    }

    /// Allocate the next sequence id and mark the state as loading
    fn issue(&self) -> u64 {
        let mut sequence = 0;
        self.state.send_modify(|state| {
            sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
        });
        sequence
    }

    async fn execute(&self, sequence: u64, criteria: &SearchCriteria) -> FetchOutcome {
        let previous_count = self.state.borrow().total_count;

        let mode = match self.planner.decide(criteria, previous_count, self.prefer_clusters()) {
            QueryDecision::Refuse(reason) => {
                tracing::debug!(sequence, reason = %reason, "Refusing unbounded task query");
                if self.commit(sequence, ClusteredTasks::empty(sequence)) {
                    return FetchOutcome::Refused { sequence, reason };
                }
                return FetchOutcome::Superseded { sequence, latest: self.latest_sequence() };
            }
            QueryDecision::Fetch(mode) => mode,
        };

        let request = FetchRequest { sequence_id: sequence, criteria: criteria.clone(), mode };
        tracing::debug!(
            sequence,
            mode = %request.mode,
            zoom = criteria.zoom,
            previous_count,
            "Fetching tasks"
        );

        let result = match request.mode {
            FetchMode::Individual => self.fetch_individual(&request).await,
            FetchMode::Clustered => self
                .fetch_clustered(&request.criteria)
                .await
                .map(|aggregate| (aggregate, FetchMode::Clustered, false)),
        };

        match result {
            Ok((aggregate, mode, escalated)) => {
                let total_count = aggregate.total_count;
                let snapshot = ClusteredTasks::committed(aggregate, mode, sequence);

                if self.commit(sequence, snapshot) {
                    FetchOutcome::Committed { sequence, mode, total_count, escalated }
                } else {
                    let latest = self.latest_sequence();
                    tracing::trace!(sequence, latest, "Discarding superseded fetch result");
                    FetchOutcome::Superseded { sequence, latest }
                }
            }
            Err(e) => {
                tracing::warn!(sequence, error = %e, "Task fetch failed, showing empty result");
                let committed = self.commit(sequence, ClusteredTasks::empty(sequence));
                FetchOutcome::Failed { sequence, error: e.to_string(), committed }
            }
        }
    }

    /// Individual fetch, escalated to clusters when the viewport holds too many tasks
    async fn fetch_individual(&self, request: &FetchRequest) -> Result<(Aggregate, FetchMode, bool)> {
        let criteria = &request.criteria;
        let page = self.backend.fetch_tasks(criteria, self.planner.individual_fetch_limit()).await?;

        if self.planner.should_escalate(page.tasks.len(), criteria.zoom) {
            tracing::debug!(
                sequence = request.sequence_id,
                returned = page.tasks.len(),
                threshold = self.planner.uncluster_threshold(),
                "Too many tasks for markers, escalating to clusters"
            );
            let aggregate = self.fetch_clustered(criteria).await?;
            return Ok((aggregate, FetchMode::Clustered, true));
        }

        Ok((ClusterAggregator::aggregate(RawFetchResult::Tasks(page)), FetchMode::Individual, false))
    }

    async fn fetch_clustered(&self, criteria: &SearchCriteria) -> Result<Aggregate> {
        let clusters = self.backend.fetch_clusters(criteria).await?;
        Ok(ClusterAggregator::aggregate(RawFetchResult::Clusters(clusters)))
    }

    /// Publish `snapshot` if `sequence` is still the latest issued
    fn commit(&self, sequence: u64, snapshot: ClusteredTasks) -> bool {
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != sequence {
                return false;
            }

            if self.persist_results && snapshot.mode == Some(FetchMode::Individual) {
                let mut persisted = self.persisted.write().unwrap_or_else(PoisonError::into_inner);
                *persisted = snapshot.items.tasks().to_vec();
            }

            *state = snapshot;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_search_text_is_debounced() {
        assert!(RefetchTrigger::SearchQuery.is_debounced());
        for trigger in [
            RefetchTrigger::BoundingBox,
            RefetchTrigger::Zoom,
            RefetchTrigger::Filters,
            RefetchTrigger::Scope,
            RefetchTrigger::DisplayMode,
        ] {
            assert!(!trigger.is_debounced());
        }
    }
}
