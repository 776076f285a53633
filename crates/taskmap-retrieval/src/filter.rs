//! Client-side inclusion filters over retrieved tasks.
//!
//! Filters never trigger a refetch. They are re-applied to whatever collection the
//! engine currently holds, and every mutation notifies a [`FilterObserver`] so that
//! dependent state (usually the selection) can drop tasks that no longer pass.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use taskmap_core::error::TaskmapError;
use taskmap_core::models::{Priority, ReviewStatus, TaskId, TaskStatus, UserId, WorkItem};

use crate::models::ClusteredTasks;
use crate::selection::SelectionTracker;

/// Review status filter key, with a sentinel for tasks that were never reviewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewStatusKey {
    Status(ReviewStatus),
    NotSet,
}

impl ReviewStatusKey {
    pub const ALL: [ReviewStatusKey; 7] = [
        ReviewStatusKey::Status(ReviewStatus::Requested),
        ReviewStatusKey::Status(ReviewStatus::Approved),
        ReviewStatusKey::Status(ReviewStatus::Rejected),
        ReviewStatusKey::Status(ReviewStatus::AssistedApproved),
        ReviewStatusKey::Status(ReviewStatus::Disputed),
        ReviewStatusKey::Status(ReviewStatus::Unnecessary),
        ReviewStatusKey::NotSet,
    ];
}

impl From<Option<ReviewStatus>> for ReviewStatusKey {
    fn from(status: Option<ReviewStatus>) -> Self {
        status.map(ReviewStatusKey::Status).unwrap_or(ReviewStatusKey::NotSet)
    }
}

impl fmt::Display for ReviewStatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatusKey::Status(status) => f.write_str(status.as_str()),
            ReviewStatusKey::NotSet => f.write_str("not_set"),
        }
    }
}

impl FromStr for ReviewStatusKey {
    type Err = TaskmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "not_set" | "none" => Ok(ReviewStatusKey::NotSet),
            _ => s.parse::<ReviewStatus>().map(ReviewStatusKey::Status),
        }
    }
}

/// A filterable property of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Status,
    ReviewStatus,
    Priority,
    Locked,
}

/// One value within a filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Status(TaskStatus),
    ReviewStatus(ReviewStatusKey),
    Priority(Priority),
    /// Tasks locked by another user
    Locked,
}

impl FilterKey {
    pub fn dimension(&self) -> FilterDimension {
        match self {
            FilterKey::Status(_) => FilterDimension::Status,
            FilterKey::ReviewStatus(_) => FilterDimension::ReviewStatus,
            FilterKey::Priority(_) => FilterDimension::Priority,
            FilterKey::Locked => FilterDimension::Locked,
        }
    }
}

/// Inclusion flags for every value of every dimension.
///
/// The maps always hold an entry for each value in their domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    include_status: BTreeMap<TaskStatus, bool>,
    include_review_status: BTreeMap<ReviewStatusKey, bool>,
    include_priority: BTreeMap<Priority, bool>,
    include_locked: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            include_status: TaskStatus::ALL.iter().map(|s| (*s, true)).collect(),
            include_review_status: ReviewStatusKey::ALL.iter().map(|s| (*s, true)).collect(),
            include_priority: Priority::ALL.iter().map(|p| (*p, true)).collect(),
            include_locked: true,
        }
    }
}

impl FilterState {
    pub fn includes(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Status(status) => self.include_status.get(&status).copied().unwrap_or(true),
            FilterKey::ReviewStatus(review) => {
                self.include_review_status.get(&review).copied().unwrap_or(true)
            }
            FilterKey::Priority(priority) => {
                self.include_priority.get(&priority).copied().unwrap_or(true)
            }
            FilterKey::Locked => self.include_locked,
        }
    }

    pub fn set(&mut self, key: FilterKey, included: bool) {
        match key {
            FilterKey::Status(status) => {
                self.include_status.insert(status, included);
            }
            FilterKey::ReviewStatus(review) => {
                self.include_review_status.insert(review, included);
            }
            FilterKey::Priority(priority) => {
                self.include_priority.insert(priority, included);
            }
            FilterKey::Locked => self.include_locked = included,
        }
    }

    /// Flip `key`, or with `exclusive` include only `key` within its dimension
    pub fn toggle(&mut self, key: FilterKey, exclusive: bool) {
        if !exclusive {
            let included = self.includes(key);
            self.set(key, !included);
            return;
        }

        match key {
            FilterKey::Status(selected) => {
                for (status, included) in self.include_status.iter_mut() {
                    *included = *status == selected;
                }
            }
            FilterKey::ReviewStatus(selected) => {
                for (review, included) in self.include_review_status.iter_mut() {
                    *included = *review == selected;
                }
            }
            FilterKey::Priority(selected) => {
                for (priority, included) in self.include_priority.iter_mut() {
                    *included = *priority == selected;
                }
            }
            FilterKey::Locked => self.include_locked = true,
        }
    }

    /// Include every value of a dimension
    pub fn include_all(&mut self, dimension: FilterDimension) {
        match dimension {
            FilterDimension::Status => self.include_status.values_mut().for_each(|v| *v = true),
            FilterDimension::ReviewStatus => {
                self.include_review_status.values_mut().for_each(|v| *v = true)
            }
            FilterDimension::Priority => self.include_priority.values_mut().for_each(|v| *v = true),
            FilterDimension::Locked => self.include_locked = true,
        }
    }

    /// Whether every value is included
    pub fn is_default(&self) -> bool {
        self.include_locked
            && self.include_status.values().all(|v| *v)
            && self.include_review_status.values().all(|v| *v)
            && self.include_priority.values().all(|v| *v)
    }

    /// Whether `item` passes every dimension for the given user
    pub fn admits(&self, item: &WorkItem, current_user: Option<&UserId>) -> bool {
        self.includes(FilterKey::Status(item.status))
            && self.includes(FilterKey::Priority(item.priority))
            && self.includes(FilterKey::ReviewStatus(item.review_status.into()))
            && (self.include_locked || !item.is_locked_by_other(current_user))
    }
}

/// Receives filter changes from a [`FilterEngine`]
pub trait FilterObserver {
    /// Called after every filter mutation with a predicate matching tasks that are
    /// now filtered out
    fn filters_changed(&mut self, excluded: &dyn Fn(&WorkItem) -> bool);

    /// Called when the engine is reset
    fn selection_reset(&mut self) {}
}

impl FilterObserver for () {
    fn filters_changed(&mut self, _excluded: &dyn Fn(&WorkItem) -> bool) {}
}

/// Holds the current task collection and its filtered view
#[derive(Debug, Clone, Default)]
pub struct FilterEngine<O: FilterObserver = ()> {
    state: FilterState,
    current_user: Option<UserId>,
    source: Vec<WorkItem>,
    generation: Option<u64>,
    filtered: Vec<WorkItem>,
    observer: O,
}

impl FilterEngine<()> {
    /// Engine with no observer
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: FilterObserver> FilterEngine<O> {
    pub fn with_observer(observer: O) -> Self {
        Self {
            state: FilterState::default(),
            current_user: None,
            source: Vec::new(),
            generation: None,
            filtered: Vec::new(),
            observer,
        }
    }

    pub fn with_current_user(mut self, user: impl Into<UserId>) -> Self {
        self.current_user = Some(user.into());
        self
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.current_user.as_ref()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Collection the filters are applied to
    pub fn source(&self) -> &[WorkItem] {
        &self.source
    }

    /// Tasks in the source collection that pass the filters
    pub fn filtered(&self) -> &[WorkItem] {
        &self.filtered
    }

    /// Whether any value is currently excluded
    pub fn is_filtering(&self) -> bool {
        !self.state.is_default()
    }

    pub fn passes(&self, item: &WorkItem) -> bool {
        self.state.admits(item, self.current_user.as_ref())
    }

    /// Subset of `items` passing the filters, in their original order
    pub fn filter(&self, items: &[WorkItem]) -> Vec<WorkItem> {
        items.iter().filter(|item| self.passes(item)).cloned().collect()
    }

    pub fn toggle_included(&mut self, key: FilterKey, exclusive: bool) {
        self.state.toggle(key, exclusive);
        self.changed();
    }

    pub fn set_included(&mut self, key: FilterKey, included: bool) {
        self.state.set(key, included);
        self.changed();
    }

    pub fn include_all(&mut self, dimension: FilterDimension) {
        self.state.include_all(dimension);
        self.changed();
    }

    /// Restore the default state that admits everything
    pub fn clear_all(&mut self) {
        self.state = FilterState::default();
        self.changed();
    }

    /// Change whose locks count as the user's own
    pub fn set_current_user(&mut self, user: Option<UserId>) {
        self.current_user = user;
        self.changed();
    }

    /// Re-apply the filters to the current collection
    pub fn refresh(&mut self) {
        self.filtered = self.filter(&self.source);
    }

    /// Replace the source collection if `generation` differs from the last one seen.
    ///
    /// Returns whether the collection was replaced.
    pub fn sync(&mut self, items: Vec<WorkItem>, generation: u64) -> bool {
        if self.generation == Some(generation) {
            return false;
        }

        tracing::trace!(generation, count = items.len(), "Filtering new task collection");
        self.source = items;
        self.generation = Some(generation);
        self.refresh();
        true
    }

    /// Sync to a published coordinator state
    pub fn sync_tasks(&mut self, tasks: &ClusteredTasks) -> bool {
        if self.generation == Some(tasks.generation) {
            return false;
        }
        self.sync(tasks.items.declustered_tasks(), tasks.generation)
    }

    /// Defaults, no collection, and a reset of the observer's selection
    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.source.clear();
        self.filtered.clear();
        self.generation = None;
        self.observer.selection_reset();
    }

    fn changed(&mut self) {
        self.refresh();

        let state = &self.state;
        let user = self.current_user.as_ref();
        self.observer.filters_changed(&|item: &WorkItem| !state.admits(item, user));
    }
}

impl FilterEngine<SelectionTracker> {
    pub fn selection(&self) -> &SelectionTracker {
        &self.observer
    }

    /// Select every task in the filtered view
    pub fn select_all_filtered(&mut self) {
        self.observer.select_all(&self.filtered);
    }

    /// Toggle selection of a task in the filtered view.
    ///
    /// Returns the new selection state, or `None` when the task is not visible.
    pub fn toggle_selection(&mut self, id: TaskId) -> Option<bool> {
        let item = self.filtered.iter().find(|item| item.id == id)?;
        Some(self.observer.toggle(item))
    }
}
