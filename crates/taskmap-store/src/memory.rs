//! In-memory task search backend for development and testing.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning only
//! occurs when another thread panicked while holding the lock, which is an
//! unrecoverable state. For real workloads, point the coordinator at the task
//! service through [`crate::http::HttpTaskBackend`].

use async_trait::async_trait;
use geo::{Centroid, MultiPoint, Point};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use taskmap_core::error::Result;
use taskmap_core::models::{
    BoundingBox, Cluster, LatLng, SearchCriteria, TaskId, TaskPage, WorkItem,
};

use crate::ports::TaskSearchBackend;

/// Grid cells per tile width when aggregating clusters
const CELLS_PER_TILE: f64 = 4.0;

/// Task position indexed as `[lng, lat]`
type IndexedTask = GeomWithData<[f64; 2], TaskId>;

/// In-memory implementation of TaskSearchBackend
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskBackend {
    tasks: Arc<RwLock<HashMap<TaskId, WorkItem>>>,
    index: Arc<RwLock<RTree<IndexedTask>>>,
}

impl MemoryTaskBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend holding the given tasks
    pub fn with_tasks(tasks: impl IntoIterator<Item = WorkItem>) -> Self {
        let backend = Self::new();
        backend.store_tasks(tasks);
        backend
    }

    /// Insert or replace tasks
    pub fn store_tasks(&self, tasks: impl IntoIterator<Item = WorkItem>) {
        let mut store = self.tasks.write().unwrap();
        let mut index = self.index.write().unwrap();

        for task in tasks {
            if let Some(previous) = store.remove(&task.id) {
                if let Some(position) = previous.position {
                    index.remove(&IndexedTask::new([position.lng, position.lat], previous.id));
                }
            }

            if let Some(position) = task.position {
                index.insert(IndexedTask::new([position.lng, position.lat], task.id));
            }
            store.insert(task.id, task);
        }
    }

    /// Number of stored tasks
    pub fn len(&self) -> usize {
        self.tasks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tasks matching the criteria, ordered by id.
    ///
    /// Structured `filters` are meant for the task service and are not interpreted here.
    fn matching(&self, criteria: &SearchCriteria) -> Vec<WorkItem> {
        let tasks = self.tasks.read().unwrap();

        let mut matches: Vec<WorkItem> = match &criteria.bounding_box {
            Some(bbox) => {
                let index = self.index.read().unwrap();
                let envelope = AABB::from_corners(
                    [bbox.min_lng(), bbox.min_lat()],
                    [bbox.max_lng(), bbox.max_lat()],
                );
                index
                    .locate_in_envelope(&envelope)
                    .filter_map(|entry| tasks.get(&entry.data).cloned())
                    .collect()
            }
            None => tasks.values().cloned().collect(),
        };

        let needle = criteria.search_query.as_ref().map(|q| q.trim().to_lowercase());

        matches.retain(|task| {
            if let Some(scope) = criteria.scope_id {
                if task.parent_id != scope {
                    return false;
                }
            }

            match &needle {
                Some(needle) => task
                    .name
                    .as_ref()
                    .map(|name| name.to_lowercase().contains(needle.as_str()))
                    .unwrap_or(false),
                None => true,
            }
        });

        matches.sort_by_key(|task| task.id);
        matches
    }
}

#[async_trait]
impl TaskSearchBackend for MemoryTaskBackend {
    async fn fetch_clusters(&self, criteria: &SearchCriteria) -> Result<Vec<Cluster>> {
        let matches = self.matching(criteria);
        Ok(aggregate_grid(&matches, criteria.zoom))
    }

    async fn fetch_tasks(&self, criteria: &SearchCriteria, limit: usize) -> Result<TaskPage> {
        let mut matches = self.matching(criteria);
        let total_count = matches.len() as u64;
        matches.truncate(limit);
        Ok(TaskPage::new(matches, total_count))
    }
}

/// Group positioned tasks into grid cells whose size halves with every zoom level
fn aggregate_grid(tasks: &[WorkItem], zoom: u8) -> Vec<Cluster> {
    let cell_size = 360.0 / (2f64.powi(i32::from(zoom)) * CELLS_PER_TILE);

    let mut cells: BTreeMap<(i64, i64), Vec<&WorkItem>> = BTreeMap::new();
    for task in tasks {
        let Some(position) = task.position else {
            continue;
        };
        let key = (
            (position.lng / cell_size).floor() as i64,
            (position.lat / cell_size).floor() as i64,
        );
        cells.entry(key).or_default().push(task);
    }

    cells
        .into_values()
        .enumerate()
        .filter_map(|(idx, members)| {
            let cluster_id = idx as u64 + 1;
            match members.as_slice() {
                [single] => Cluster::single_item(cluster_id, single),
                _ => Some(aggregate_cell(cluster_id, &members)),
            }
        })
        .collect()
}

fn aggregate_cell(cluster_id: u64, members: &[&WorkItem]) -> Cluster {
    let positions: Vec<LatLng> = members.iter().filter_map(|task| task.position).collect();

    let points: MultiPoint<f64> =
        positions.iter().map(|p| Point::new(p.lng, p.lat)).collect::<Vec<_>>().into();
    let centroid = points
        .centroid()
        .map(|c| LatLng::new(c.y(), c.x()))
        .unwrap_or_else(|| positions[0]);

    let bounds = positions[1..]
        .iter()
        .fold(BoundingBox::from_corners(positions[0], positions[0]), |bbox, p| {
            BoundingBox::from_corners(
                LatLng::new(bbox.min_lat().min(p.lat), bbox.min_lng().min(p.lng)),
                LatLng::new(bbox.max_lat().max(p.lat), bbox.max_lng().max(p.lng)),
            )
        });

    Cluster::new(cluster_id, positions.len() as u64, centroid).with_bounds(bounds)
}
