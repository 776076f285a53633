use async_trait::async_trait;
use serde::Deserialize;
use taskmap_core::error::{Result, TaskmapError};
use taskmap_core::models::{Cluster, SearchCriteria, TaskPage};

use crate::ports::TaskSearchBackend;

/// Number of clusters requested from the service by default
const DEFAULT_CLUSTER_POINTS: usize = 25;

/// Task service client speaking the bounded-search JSON API
pub struct HttpTaskBackend {
    /// Base URL for the task API (e.g., "https://maproulette.org/api/v2")
    base_url: String,

    /// Target number of clusters per request
    cluster_points: usize,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpTaskBackend {
    /// Create a new backend for the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cluster_points: DEFAULT_CLUSTER_POINTS,
            client: reqwest::Client::new(),
        }
    }

    /// Set how many clusters the service should aim for
    pub fn with_cluster_points(mut self, points: usize) -> Self {
        self.cluster_points = points.max(1);
        self
    }

    fn clusters_url(&self) -> String {
        format!("{}/taskCluster?points={}", self.base_url, self.cluster_points)
    }

    /// Scope-only searches carry no viewport, so they span the whole world
    fn tasks_url(&self, criteria: &SearchCriteria, limit: usize) -> String {
        let [west, south, east, north] = criteria
            .bounding_box
            .map(|bbox| bbox.to_wsen())
            .unwrap_or([-180.0, -90.0, 180.0, 90.0]);

        format!(
            "{}/tasks/box/{}/{}/{}/{}?limit={}&page={}",
            self.base_url, west, south, east, north, limit, criteria.page
        )
    }

    async fn put_json<T>(&self, url: String, criteria: &SearchCriteria) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        tracing::debug!(url = %url, zoom = criteria.zoom, "Querying task service");

        let response = self.client.put(&url).json(criteria).send().await.map_err(|e| {
            TaskmapError::Transport {
                reason: format!("Failed to reach task service at {}: {}", self.base_url, e),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(TaskmapError::Backend { status: status.as_u16(), message });
        }

        response.json::<T>().await.map_err(|e| {
            TaskmapError::Serialization(format!("Failed to parse task service response: {}", e))
        })
    }
}

#[async_trait]
impl TaskSearchBackend for HttpTaskBackend {
    async fn fetch_clusters(&self, criteria: &SearchCriteria) -> Result<Vec<Cluster>> {
        let response: ClusterResponse = self.put_json(self.clusters_url(), criteria).await?;
        Ok(response.clusters)
    }

    async fn fetch_tasks(&self, criteria: &SearchCriteria, limit: usize) -> Result<TaskPage> {
        self.put_json(self.tasks_url(criteria, limit), criteria).await
    }
}

/// Response body of the cluster endpoint
#[derive(Debug, Deserialize)]
struct ClusterResponse {
    clusters: Vec<Cluster>,
}
