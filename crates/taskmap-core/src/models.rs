pub mod cluster;
pub mod criteria;
pub mod geometry;
pub mod task;

pub use cluster::Cluster;
pub use criteria::{FetchMode, SearchCriteria, TaskPage};
pub use geometry::{BoundingBox, LatLng};
pub use task::{Priority, ReviewStatus, ScopeId, TaskId, TaskStatus, UserId, WorkItem};
