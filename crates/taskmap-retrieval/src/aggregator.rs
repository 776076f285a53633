use taskmap_core::models::{Cluster, TaskPage};

use crate::models::MapItems;

/// Raw response from one of the two search endpoints
#[derive(Debug, Clone, PartialEq)]
pub enum RawFetchResult {
    Clusters(Vec<Cluster>),
    Tasks(TaskPage),
}

/// Fetch result in uniform shape, with the density statistic for the next plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub items: MapItems,
    pub total_count: u64,
}

/// Normalizes cluster and task responses into one collection shape
pub struct ClusterAggregator;

impl ClusterAggregator {
    /// Normalize a raw response.
    ///
    /// Cluster totals are the sum of `number_of_points`; task totals are the number
    /// of tasks actually returned, not the backend's overall match count.
    pub fn aggregate(raw: RawFetchResult) -> Aggregate {
        match raw {
            RawFetchResult::Clusters(clusters) => {
                let total_count = Self::cluster_total(&clusters);
                Aggregate { items: MapItems::Clusters(clusters), total_count }
            }
            RawFetchResult::Tasks(page) => {
                let total_count = page.tasks.len() as u64;
                Aggregate { items: MapItems::Tasks(page.tasks), total_count }
            }
        }
    }

    pub fn empty() -> Aggregate {
        Aggregate::default()
    }

    /// Number of tasks represented by a set of clusters
    pub fn cluster_total(clusters: &[Cluster]) -> u64 {
        clusters.iter().map(|c| c.number_of_points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskmap_core::models::{LatLng, ScopeId, TaskId, TaskStatus, WorkItem};

    #[test]
    fn test_cluster_total_sums_points() {
        let clusters = vec![
            Cluster::new(1, 40, LatLng::new(0.0, 0.0)),
            Cluster::new(2, 2, LatLng::new(1.0, 1.0)),
        ];

        let aggregate = ClusterAggregator::aggregate(RawFetchResult::Clusters(clusters));
        assert_eq!(aggregate.total_count, 42);
        assert_eq!(aggregate.items.len(), 2);
        assert!(aggregate.items.tasks().is_empty());
    }

    #[test]
    fn test_task_total_is_returned_count() {
        let tasks = vec![
            WorkItem::new(TaskId(1), ScopeId(1), TaskStatus::Created),
            WorkItem::new(TaskId(2), ScopeId(1), TaskStatus::Fixed),
        ];

        let aggregate = ClusterAggregator::aggregate(RawFetchResult::Tasks(TaskPage::new(tasks, 500)));
        assert_eq!(aggregate.total_count, 2);
        assert_eq!(aggregate.items.tasks().len(), 2);
    }

    #[test]
    fn test_empty() {
        let aggregate = ClusterAggregator::empty();
        assert_eq!(aggregate.total_count, 0);
        assert!(aggregate.items.is_empty());
    }

    #[test]
    fn test_declustered_tasks_from_single_item_clusters() {
        let task = WorkItem::new(TaskId(5), ScopeId(2), TaskStatus::Skipped)
            .with_position(LatLng::new(3.0, 4.0));
        let clusters = vec![
            Cluster::single_item(1, &task).unwrap(),
            Cluster::new(2, 9, LatLng::new(0.0, 0.0)),
        ];

        let aggregate = ClusterAggregator::aggregate(RawFetchResult::Clusters(clusters));
        let tasks = aggregate.items.declustered_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId(5));
        assert_eq!(aggregate.total_count, 10);
    }
}
