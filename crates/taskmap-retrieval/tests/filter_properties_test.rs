use proptest::prelude::*;
use taskmap_core::models::{Priority, ReviewStatus, ScopeId, TaskId, TaskStatus, WorkItem};
use taskmap_retrieval::{FilterEngine, FilterKey, ReviewStatusKey, SelectionTracker};

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn arb_review() -> impl Strategy<Value = Option<ReviewStatus>> {
    prop::option::of(prop::sample::select(ReviewStatus::ALL.to_vec()))
}

fn arb_lock() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(vec!["u1", "u2", "u3"]))
}

fn arb_items() -> impl Strategy<Value = Vec<WorkItem>> {
    prop::collection::vec((arb_status(), arb_priority(), arb_review(), arb_lock()), 0..40).prop_map(
        |fields| {
            fields
                .into_iter()
                .enumerate()
                .map(|(i, (status, priority, review, lock))| {
                    let mut item = WorkItem::new(TaskId(i as u64), ScopeId(1), status)
                        .with_priority(priority);
                    item.review_status = review;
                    if let Some(owner) = lock {
                        item = item.locked_by(owner);
                    }
                    item
                })
                .collect()
        },
    )
}

fn arb_key() -> impl Strategy<Value = FilterKey> {
    prop_oneof![
        arb_status().prop_map(FilterKey::Status),
        arb_priority().prop_map(FilterKey::Priority),
        prop::sample::select(ReviewStatusKey::ALL.to_vec()).prop_map(FilterKey::ReviewStatus),
        Just(FilterKey::Locked),
    ]
}

/// A filter mutation as a host would issue it
#[derive(Debug, Clone)]
enum Mutation {
    Toggle(FilterKey, bool),
    Set(FilterKey, bool),
    ClearAll,
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        4 => (arb_key(), any::<bool>()).prop_map(|(key, exclusive)| Mutation::Toggle(key, exclusive)),
        3 => (arb_key(), any::<bool>()).prop_map(|(key, included)| Mutation::Set(key, included)),
        1 => Just(Mutation::ClearAll),
    ]
}

fn apply<O: taskmap_retrieval::FilterObserver>(engine: &mut FilterEngine<O>, mutation: &Mutation) {
    match mutation {
        Mutation::Toggle(key, exclusive) => engine.toggle_included(*key, *exclusive),
        Mutation::Set(key, included) => engine.set_included(*key, *included),
        Mutation::ClearAll => engine.clear_all(),
    }
}

proptest! {
    #[test]
    fn prop_filter_is_idempotent(
        items in arb_items(),
        mutations in prop::collection::vec(arb_mutation(), 0..10),
    ) {
        let mut engine = FilterEngine::new().with_current_user("u1");
        for mutation in &mutations {
            apply(&mut engine, mutation);
        }

        let once = engine.filter(&items);
        let twice = engine.filter(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_clear_all_admits_everything(
        items in arb_items(),
        mutations in prop::collection::vec(arb_mutation(), 0..10),
    ) {
        let mut engine = FilterEngine::new();
        for mutation in &mutations {
            apply(&mut engine, mutation);
        }
        engine.clear_all();

        prop_assert_eq!(engine.filter(&items), items);
        prop_assert!(!engine.is_filtering());
    }

    #[test]
    fn prop_exclusive_toggle_keeps_only_that_value(key in arb_key(), mutations in prop::collection::vec(arb_mutation(), 0..10)) {
        let mut engine = FilterEngine::new();
        for mutation in &mutations {
            apply(&mut engine, mutation);
        }
        engine.toggle_included(key, true);

        let state = engine.state();
        prop_assert!(state.includes(key));
        match key {
            FilterKey::Status(selected) => {
                for status in TaskStatus::ALL.into_iter().filter(|s| *s != selected) {
                    prop_assert!(!state.includes(FilterKey::Status(status)));
                }
            }
            FilterKey::Priority(selected) => {
                for priority in Priority::ALL.into_iter().filter(|p| *p != selected) {
                    prop_assert!(!state.includes(FilterKey::Priority(priority)));
                }
            }
            FilterKey::ReviewStatus(selected) => {
                for review in ReviewStatusKey::ALL.into_iter().filter(|r| *r != selected) {
                    prop_assert!(!state.includes(FilterKey::ReviewStatus(review)));
                }
            }
            FilterKey::Locked => {}
        }
    }

    #[test]
    fn prop_selection_never_holds_filtered_out_tasks(
        items in arb_items(),
        mutations in prop::collection::vec(arb_mutation(), 1..12),
    ) {
        let mut engine = FilterEngine::with_observer(SelectionTracker::new()).with_current_user("u1");
        engine.sync(items, 1);
        engine.select_all_filtered();

        for mutation in &mutations {
            apply(&mut engine, mutation);
            for selected in engine.selection().selected() {
                prop_assert!(engine.passes(selected));
            }
        }
    }
}

#[test]
fn test_lock_visibility_depends_on_current_user() {
    let mut engine = FilterEngine::new().with_current_user("u1");
    engine.set_included(FilterKey::Locked, false);

    let foreign = WorkItem::new(TaskId(1), ScopeId(1), TaskStatus::Created).locked_by("u2");
    let own = WorkItem::new(TaskId(2), ScopeId(1), TaskStatus::Created).locked_by("u1");

    assert!(!engine.passes(&foreign));
    assert!(engine.passes(&own));

    engine.set_included(FilterKey::Locked, true);
    assert!(engine.passes(&foreign));
}

#[test]
fn test_changing_user_prunes_selection() {
    let items = vec![
        WorkItem::new(TaskId(1), ScopeId(1), TaskStatus::Created).locked_by("u1"),
        WorkItem::new(TaskId(2), ScopeId(1), TaskStatus::Created),
    ];

    let mut engine = FilterEngine::with_observer(SelectionTracker::new()).with_current_user("u1");
    engine.set_included(FilterKey::Locked, false);
    engine.sync(items, 1);
    engine.select_all_filtered();
    assert_eq!(engine.selection().len(), 2);

    engine.set_current_user(Some("u2".into()));
    assert_eq!(engine.selection().selected_ids(), vec![TaskId(2)]);
    assert_eq!(engine.filtered().len(), 1);
}
