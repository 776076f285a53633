use serde::Serialize;
use taskmap_core::models::{Cluster, FetchMode, SearchCriteria, WorkItem};

use crate::aggregator::Aggregate;
use crate::planner::RefusalReason;

/// A fetch the coordinator has decided to issue
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Issuance order; only the highest issued sequence may commit
    pub sequence_id: u64,
    pub criteria: SearchCriteria,
    pub mode: FetchMode,
}

/// Retrieved map content, either aggregated or individual
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum MapItems {
    Clusters(Vec<Cluster>),
    Tasks(Vec<WorkItem>),
}

impl Default for MapItems {
    fn default() -> Self {
        MapItems::Tasks(Vec::new())
    }
}

impl MapItems {
    pub fn len(&self) -> usize {
        match self {
            MapItems::Clusters(clusters) => clusters.len(),
            MapItems::Tasks(tasks) => tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clusters, or an empty slice when holding tasks
    pub fn clusters(&self) -> &[Cluster] {
        match self {
            MapItems::Clusters(clusters) => clusters,
            MapItems::Tasks(_) => &[],
        }
    }

    /// Tasks, or an empty slice when holding clusters
    pub fn tasks(&self) -> &[WorkItem] {
        match self {
            MapItems::Clusters(_) => &[],
            MapItems::Tasks(tasks) => tasks,
        }
    }

    /// Everything that can be shown as an individual task.
    ///
    /// For cluster results this is the single-item clusters, declustered.
    pub fn declustered_tasks(&self) -> Vec<WorkItem> {
        match self {
            MapItems::Clusters(clusters) => {
                clusters.iter().filter_map(Cluster::declustered).collect()
            }
            MapItems::Tasks(tasks) => tasks.clone(),
        }
    }
}

/// State published to the host after each commit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteredTasks {
    pub items: MapItems,

    /// Number of tasks represented by `items`; feeds the next planning decision
    pub total_count: u64,

    pub loading: bool,

    /// How `items` were fetched; `None` for empty results
    pub mode: Option<FetchMode>,

    /// Sequence id of the fetch that produced this state
    pub generation: u64,
}

impl ClusteredTasks {
    /// Empty, settled result
    pub fn empty(generation: u64) -> Self {
        Self { generation, ..Self::default() }
    }

    /// Settled result built from a normalized fetch
    pub fn committed(aggregate: Aggregate, mode: FetchMode, generation: u64) -> Self {
        Self {
            items: aggregate.items,
            total_count: aggregate.total_count,
            loading: false,
            mode: Some(mode),
            generation,
        }
    }
}

/// What happened to a single `fetch` call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The result became the visible state
    Committed { sequence: u64, mode: FetchMode, total_count: u64, escalated: bool },

    /// The query was unbounded; an empty result was committed without fetching.
    ///
    /// A refusal overtaken by a newer request reports `Superseded` instead.
    Refused { sequence: u64, reason: RefusalReason },

    /// A newer request was issued before this one finished; the result was dropped
    Superseded { sequence: u64, latest: u64 },

    /// The backend failed; `committed` tells whether the empty result was shown
    Failed { sequence: u64, error: String, committed: bool },
}

impl FetchOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            FetchOutcome::Committed { sequence, .. }
            | FetchOutcome::Refused { sequence, .. }
            | FetchOutcome::Superseded { sequence, .. }
            | FetchOutcome::Failed { sequence, .. } => *sequence,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, FetchOutcome::Committed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskmap_core::models::{LatLng, ScopeId, TaskId, TaskStatus};

    #[test]
    fn test_map_items_serialize_with_kind_tag() {
        let items = MapItems::Clusters(vec![Cluster::new(4, 12, LatLng::new(1.0, 2.0))]);
        let json = serde_json::to_value(&items).unwrap();

        assert_eq!(json["kind"], "clusters");
        assert_eq!(json["items"][0]["numberOfPoints"], 12);
    }

    #[test]
    fn test_clustered_tasks_wire_shape() {
        let state = ClusteredTasks {
            items: MapItems::Tasks(vec![WorkItem::new(TaskId(9), ScopeId(1), TaskStatus::Created)]),
            total_count: 1,
            loading: false,
            mode: Some(FetchMode::Individual),
            generation: 3,
        };
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["items"]["kind"], "tasks");
        assert_eq!(json["items"]["items"][0]["id"], 9);
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["mode"], "individual");
        assert_eq!(json["generation"], 3);
    }

    #[test]
    fn test_declustered_tasks_skips_multi_point_clusters() {
        let task = WorkItem::new(TaskId(5), ScopeId(1), TaskStatus::Created)
            .with_position(LatLng::new(1.0, 1.0));
        let single = Cluster::single_item(1, &task).unwrap();
        let items = MapItems::Clusters(vec![single, Cluster::new(2, 30, LatLng::new(2.0, 2.0))]);

        let tasks = items.declustered_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId(5));
        assert!(items.tasks().is_empty());
    }
}
