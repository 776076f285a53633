use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;
use taskmap_core::models::{Cluster, WorkItem};
use taskmap_retrieval::{FetchOutcome, MapItems};

/// Output for plan command
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub decision: String,
    pub mode: Option<String>,
    pub reason: Option<String>,
    pub degree_span: Option<f64>,
    pub individual_fetch_limit: usize,
}

/// Output for browse command
#[derive(Debug, Serialize)]
pub struct BrowseOutput {
    pub fetch: FetchSummary,
    pub mode: Option<String>,
    pub total_count: u64,
    pub filtering: bool,
    pub visible_count: usize,
    pub items: MapItems,
}

/// What happened to the coordinated fetch
#[derive(Debug, Serialize)]
pub struct FetchSummary {
    pub sequence: u64,
    pub outcome: String,
    pub escalated: bool,
    pub detail: Option<String>,
}

impl From<&FetchOutcome> for FetchSummary {
    fn from(outcome: &FetchOutcome) -> Self {
        let (name, escalated, detail) = match outcome {
            FetchOutcome::Committed { escalated, .. } => ("committed", *escalated, None),
            FetchOutcome::Refused { reason, .. } => ("refused", false, Some(reason.to_string())),
            FetchOutcome::Superseded { latest, .. } => {
                ("superseded", false, Some(format!("newer fetch {} was issued", latest)))
            }
            FetchOutcome::Failed { error, .. } => ("failed", false, Some(error.clone())),
        };

        Self { sequence: outcome.sequence(), outcome: name.to_string(), escalated, detail }
    }
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct InspectConfigOutput {
    pub values: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}

#[derive(Tabled)]
pub struct TaskRow {
    #[tabled(rename = "ID")]
    pub id: u64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Priority")]
    pub priority: String,
    #[tabled(rename = "Review")]
    pub review: String,
    #[tabled(rename = "Locked By")]
    pub locked_by: String,
    #[tabled(rename = "Position")]
    pub position: String,
}

impl From<&WorkItem> for TaskRow {
    fn from(task: &WorkItem) -> Self {
        Self {
            id: task.id.0,
            name: task.name.clone().unwrap_or_else(|| "-".to_string()),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            review: task.review_status.map(|r| r.as_str().to_string()).unwrap_or_else(|| "-".to_string()),
            locked_by: task.locked_by.as_ref().map(|u| u.to_string()).unwrap_or_else(|| "-".to_string()),
            position: task
                .position
                .map(|p| format!("{:.5}, {:.5}", p.lat, p.lng))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
pub struct ClusterRow {
    #[tabled(rename = "Cluster")]
    pub id: u64,
    #[tabled(rename = "Tasks")]
    pub points: u64,
    #[tabled(rename = "Center")]
    pub center: String,
    #[tabled(rename = "Single Task")]
    pub task: String,
}

impl From<&Cluster> for ClusterRow {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.cluster_id,
            points: cluster.number_of_points,
            center: format!("{:.5}, {:.5}", cluster.point.lat, cluster.point.lng),
            task: cluster.task_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
