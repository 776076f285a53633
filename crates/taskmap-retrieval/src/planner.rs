//! Cluster-versus-individual fetch planning.
//!
//! The planner is a pure function of the criteria and a few tunables. It refuses
//! unbounded queries (no scope and no usable viewport) and otherwise picks clusters
//! whenever individual markers would be too dense to be useful.

use std::fmt;
use taskmap_core::config::CoordinatorConfig;
use taskmap_core::models::{FetchMode, SearchCriteria};

/// Why a query was refused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefusalReason {
    /// No scope id and no viewport
    MissingBoundingBox,
    /// No scope id and a viewport wider than allowed
    BoundingBoxTooLarge { span: f64, max: f64 },
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefusalReason::MissingBoundingBox => {
                f.write_str("no bounding box and no scope to bound the query")
            }
            RefusalReason::BoundingBoxTooLarge { span, max } => {
                write!(f, "bounding box spans {:.2}° which exceeds the {:.2}° limit", span, max)
            }
        }
    }
}

/// Outcome of planning a fetch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryDecision {
    Refuse(RefusalReason),
    Fetch(FetchMode),
}

impl QueryDecision {
    pub fn mode(&self) -> Option<FetchMode> {
        match self {
            QueryDecision::Refuse(_) => None,
            QueryDecision::Fetch(mode) => Some(*mode),
        }
    }
}

/// Decides how, and whether, a viewport is fetched
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedQueryPlanner {
    max_zoom: u8,
    uncluster_threshold: usize,
    max_allowed_degrees: f64,
}

impl Default for BoundedQueryPlanner {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

impl BoundedQueryPlanner {
    pub fn new(max_zoom: u8, uncluster_threshold: usize, max_allowed_degrees: f64) -> Self {
        Self { max_zoom, uncluster_threshold, max_allowed_degrees }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(config.max_zoom, config.uncluster_threshold, config.max_allowed_degrees)
    }

    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    pub fn uncluster_threshold(&self) -> usize {
        self.uncluster_threshold
    }

    pub fn max_allowed_degrees(&self) -> f64 {
        self.max_allowed_degrees
    }

    /// Plan the next fetch.
    ///
    /// `previous_count` is the task total of the last committed result and
    /// `prefer_clusters` is the host's display preference.
    pub fn decide(
        &self,
        criteria: &SearchCriteria,
        previous_count: u64,
        prefer_clusters: bool,
    ) -> QueryDecision {
        if criteria.scope_id.is_none() {
            match &criteria.bounding_box {
                None => return QueryDecision::Refuse(RefusalReason::MissingBoundingBox),
                Some(bbox) if bbox.degree_span() > self.max_allowed_degrees => {
                    return QueryDecision::Refuse(RefusalReason::BoundingBoxTooLarge {
                        span: bbox.degree_span(),
                        max: self.max_allowed_degrees,
                    });
                }
                Some(_) => {}
            }
        }

        let dense = previous_count > self.uncluster_threshold as u64;
        let can_zoom_further = criteria.zoom < self.max_zoom;

        if criteria.bounding_box.is_none() || (can_zoom_further && (prefer_clusters || dense)) {
            QueryDecision::Fetch(FetchMode::Clustered)
        } else {
            QueryDecision::Fetch(FetchMode::Individual)
        }
    }

    /// Cap on an individual fetch: one past the threshold, so overflow is detectable
    pub fn individual_fetch_limit(&self) -> usize {
        self.uncluster_threshold.saturating_add(1)
    }

    /// Whether an individual fetch returned too many tasks to show as markers
    pub fn should_escalate(&self, returned: usize, zoom: u8) -> bool {
        returned > self.uncluster_threshold && zoom < self.max_zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskmap_core::models::{BoundingBox, ScopeId};

    fn planner() -> BoundedQueryPlanner {
        BoundedQueryPlanner::new(18, 1000, 70.0)
    }

    fn viewport(span: f64) -> SearchCriteria {
        SearchCriteria::new(12).with_bounding_box(BoundingBox::new(0.0, 0.0, span, span).unwrap())
    }

    #[test]
    fn test_refuses_without_scope_or_bounding_box() {
        let decision = planner().decide(&SearchCriteria::new(12), 0, false);
        assert_eq!(decision, QueryDecision::Refuse(RefusalReason::MissingBoundingBox));
    }

    #[test]
    fn test_refuses_oversized_viewport_without_scope() {
        let criteria = SearchCriteria::new(2)
            .with_bounding_box(BoundingBox::new(-80.0, -100.0, 80.0, 100.0).unwrap());

        match planner().decide(&criteria, 0, false) {
            QueryDecision::Refuse(RefusalReason::BoundingBoxTooLarge { span, max }) => {
                assert_eq!(span, 200.0);
                assert_eq!(max, 70.0);
            }
            other => panic!("expected refusal, got {:?}", other),
        }
    }

    #[test]
    fn test_span_at_limit_is_allowed() {
        let decision = planner().decide(&viewport(70.0), 0, false);
        assert_eq!(decision, QueryDecision::Fetch(FetchMode::Individual));
    }

    #[test]
    fn test_scope_permits_oversized_or_missing_viewport() {
        let oversized = viewport(150.0).with_scope(ScopeId(1));
        assert_eq!(
            planner().decide(&oversized, 0, false),
            QueryDecision::Fetch(FetchMode::Individual)
        );

        let no_viewport = SearchCriteria::new(12).with_scope(ScopeId(1));
        assert_eq!(
            planner().decide(&no_viewport, 0, false),
            QueryDecision::Fetch(FetchMode::Clustered)
        );
    }

    #[test]
    fn test_scope_without_viewport_clusters_even_at_max_zoom() {
        let criteria = SearchCriteria::new(18).with_scope(ScopeId(1));
        assert_eq!(planner().decide(&criteria, 0, false).mode(), Some(FetchMode::Clustered));
    }

    #[test]
    fn test_prefer_clusters_below_max_zoom() {
        assert_eq!(planner().decide(&viewport(1.0), 0, true).mode(), Some(FetchMode::Clustered));

        let at_max = viewport(1.0).with_zoom(18);
        assert_eq!(planner().decide(&at_max, 0, true).mode(), Some(FetchMode::Individual));
    }

    #[test]
    fn test_dense_previous_result_clusters() {
        assert_eq!(planner().decide(&viewport(1.0), 1001, false).mode(), Some(FetchMode::Clustered));
        assert_eq!(
            planner().decide(&viewport(1.0), 1000, false).mode(),
            Some(FetchMode::Individual)
        );
    }

    #[test]
    fn test_escalation_rule() {
        let planner = planner();
        assert_eq!(planner.individual_fetch_limit(), 1001);
        assert!(planner.should_escalate(1001, 17));
        assert!(!planner.should_escalate(1000, 17));
        assert!(!planner.should_escalate(1001, 18));
    }

    #[test]
    fn test_refusal_reason_display() {
        let reason = RefusalReason::BoundingBoxTooLarge { span: 200.0, max: 70.0 };
        assert_eq!(reason.to_string(), "bounding box spans 200.00° which exceeds the 70.00° limit");
    }
}
