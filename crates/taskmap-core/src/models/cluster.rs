use serde::{Deserialize, Serialize};

use super::{BoundingBox, LatLng, Priority, ScopeId, TaskId, TaskStatus, WorkItem};

/// Server-computed spatial aggregate of one or more nearby tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub cluster_id: u64,

    /// Number of tasks represented by this cluster
    pub number_of_points: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,

    pub point: LatLng,

    /// True when the cluster stands for exactly one task
    #[serde(default)]
    pub is_single_item: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ScopeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_status: Option<TaskStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_priority: Option<Priority>,
}

impl Cluster {
    /// Create a multi-task cluster around a centroid
    pub fn new(cluster_id: u64, number_of_points: u64, point: LatLng) -> Self {
        Self {
            cluster_id,
            number_of_points,
            bounds: None,
            point,
            is_single_item: false,
            task_id: None,
            parent_id: None,
            task_status: None,
            task_priority: None,
        }
    }

    /// Create a cluster that represents a single task.
    ///
    /// Returns `None` when the task has no position to place the cluster at.
    pub fn single_item(cluster_id: u64, task: &WorkItem) -> Option<Self> {
        let point = task.position?;
        Some(Self {
            cluster_id,
            number_of_points: 1,
            bounds: Some(BoundingBox::from_corners(point, point)),
            point,
            is_single_item: true,
            task_id: Some(task.id),
            parent_id: Some(task.parent_id),
            task_status: Some(task.status),
            task_priority: Some(task.priority),
        })
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Present a single-task cluster as the task itself.
    ///
    /// Only clusters of exactly one point that carry the task id and parent can be
    /// declustered; lock and review data are not part of a cluster and stay unset.
    pub fn declustered(&self) -> Option<WorkItem> {
        if self.number_of_points != 1 || !self.is_single_item {
            return None;
        }

        let mut task = WorkItem::new(
            self.task_id?,
            self.parent_id?,
            self.task_status.unwrap_or(TaskStatus::Created),
        )
        .with_position(self.point);
        if let Some(priority) = self.task_priority {
            task = task.with_priority(priority);
        }
        Some(task)
    }
}
