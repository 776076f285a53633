use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{BoundingBox, ScopeId, WorkItem};

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Search criteria describing what the host is currently looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Current map viewport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Current map zoom level
    pub zoom: u8,

    /// Collection bounding the query independently of geography
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<ScopeId>,

    /// Structured filters forwarded to the backend as-is
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,

    /// Free-text search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,

    #[serde(default)]
    pub page: u32,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SearchCriteria {
    /// Create criteria for a zoom level with nothing else set
    pub fn new(zoom: u8) -> Self {
        Self {
            bounding_box: None,
            zoom,
            scope_id: None,
            filters: BTreeMap::new(),
            search_query: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_scope(mut self, scope_id: ScopeId) -> Self {
        self.scope_id = Some(scope_id);
        self
    }

    /// Set the free-text search; blank text clears it
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.search_query = if query.trim().is_empty() { None } else { Some(query) };
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

/// How a fetch retrieves its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Aggregated spatial clusters
    Clustered,
    /// Individual tasks
    Individual,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Clustered => f.write_str("clustered"),
            FetchMode::Individual => f.write_str("individual"),
        }
    }
}

/// Page of tasks returned by a bounded task search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<WorkItem>,

    /// Number of matching tasks known to the backend
    pub total_count: u64,
}

impl TaskPage {
    pub fn new(tasks: Vec<WorkItem>, total_count: u64) -> Self {
        Self { tasks, total_count }
    }
}
