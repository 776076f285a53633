use std::collections::BTreeMap;
use taskmap_core::models::{TaskId, WorkItem};

use crate::filter::FilterObserver;

/// Selected tasks, kept with the snapshot taken when they were selected so they
/// can be re-checked against later filter changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionTracker {
    selected: BTreeMap<TaskId, WorkItem>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the task was newly selected
    pub fn select(&mut self, item: &WorkItem) -> bool {
        self.selected.insert(item.id, item.clone()).is_none()
    }

    pub fn deselect(&mut self, id: TaskId) -> bool {
        self.selected.remove(&id).is_some()
    }

    /// Flip the task's selection and return whether it is now selected
    pub fn toggle(&mut self, item: &WorkItem) -> bool {
        if self.deselect(item.id) {
            false
        } else {
            self.select(item)
        }
    }

    pub fn select_all(&mut self, items: &[WorkItem]) {
        for item in items {
            self.select(item);
        }
    }

    /// Select every item matching `predicate`; returns how many were newly selected
    pub fn select_matching<F>(&mut self, items: &[WorkItem], predicate: F) -> usize
    where
        F: Fn(&WorkItem) -> bool,
    {
        items.iter().filter(|item| predicate(item)).filter(|item| self.select(item)).count()
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.selected.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in ascending order
    pub fn selected_ids(&self) -> Vec<TaskId> {
        self.selected.keys().copied().collect()
    }

    pub fn selected(&self) -> impl Iterator<Item = &WorkItem> {
        self.selected.values()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Whether `items` is non-empty and every one of them is selected
    pub fn all_selected(&self, items: &[WorkItem]) -> bool {
        !items.is_empty() && items.iter().all(|item| self.is_selected(item.id))
    }

    /// Whether some, but not all, of `items` are selected
    pub fn some_selected(&self, items: &[WorkItem]) -> bool {
        items.iter().any(|item| self.is_selected(item.id)) && !self.all_selected(items)
    }

    /// Drop every selected task matching `excluded`; returns how many were dropped
    pub fn prune(&mut self, excluded: &dyn Fn(&WorkItem) -> bool) -> usize {
        let before = self.selected.len();
        self.selected.retain(|_, item| !excluded(item));
        before - self.selected.len()
    }
}

impl FilterObserver for SelectionTracker {
    fn filters_changed(&mut self, excluded: &dyn Fn(&WorkItem) -> bool) {
        let pruned = self.prune(excluded);
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.len(), "Dropped filtered-out tasks from selection");
        }
    }

    fn selection_reset(&mut self) {
        self.clear();
    }
}
