use async_trait::async_trait;
use taskmap_core::error::Result;
use taskmap_core::models::{Cluster, SearchCriteria, TaskPage};

/// Port for the bounded task search service
#[async_trait]
pub trait TaskSearchBackend: Send + Sync {
    /// Fetch aggregated clusters of the tasks matching the criteria
    async fn fetch_clusters(&self, criteria: &SearchCriteria) -> Result<Vec<Cluster>>;

    /// Fetch up to `limit` individual tasks matching the criteria
    ///
    /// The scope id, when present, restricts results to that collection.
    async fn fetch_tasks(&self, criteria: &SearchCriteria, limit: usize) -> Result<TaskPage>;
}
