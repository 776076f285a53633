//! TaskMap Retrieval - Viewport-driven task fetching and filtering
//!
//! This crate decides whether a viewport should be fetched as clusters or as
//! individual tasks, sequences the resulting fetches so stale responses are never
//! shown, and filters and tracks selections over the retrieved tasks.

pub mod aggregator;
pub mod coordinator;
pub mod debounce;
pub mod filter;
pub mod models;
pub mod planner;
pub mod selection;

pub use aggregator::{Aggregate, ClusterAggregator, RawFetchResult};
pub use coordinator::{FetchCoordinator, RefetchTrigger};
pub use debounce::Debouncer;
pub use filter::{FilterDimension, FilterEngine, FilterKey, FilterObserver, FilterState, ReviewStatusKey};
pub use models::{ClusteredTasks, FetchOutcome, FetchRequest, MapItems};
pub use planner::{BoundedQueryPlanner, QueryDecision, RefusalReason};
pub use selection::SelectionTracker;
