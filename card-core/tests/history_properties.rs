//! Property tests for the store's undo/redo history.

use std::sync::Arc;

use card_core::{
    DesignElement, ElementPatch, ElementStore, ElementType, RecordingNotifier,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Mutation {
    Add(ElementType),
    Move(usize, f32, f32),
    Delete(usize),
    Duplicate(usize),
}

fn arb_element_type() -> impl Strategy<Value = ElementType> {
    prop_oneof![
        Just(ElementType::Text),
        Just(ElementType::Image),
        Just(ElementType::Shape),
        Just(ElementType::Background),
        Just(ElementType::Logo),
        Just(ElementType::Border),
    ]
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        arb_element_type().prop_map(Mutation::Add),
        (any::<usize>(), 0.0f32..800.0, 0.0f32..1000.0)
            .prop_map(|(i, x, y)| Mutation::Move(i, x, y)),
        any::<usize>().prop_map(Mutation::Delete),
        any::<usize>().prop_map(Mutation::Duplicate),
    ]
}

fn new_store() -> ElementStore {
    ElementStore::new(Arc::new(RecordingNotifier::new()))
}

/// Apply a mutation, always recording exactly one history entry.
fn apply(store: &mut ElementStore, mutation: &Mutation) {
    let len = store.elements().len();
    if len == 0 {
        store.add_element(ElementType::Shape);
        return;
    }
    match mutation {
        Mutation::Add(ty) => {
            store.add_element(*ty);
        }
        Mutation::Move(i, x, y) => {
            let id = store.elements()[i % len].id.clone();
            assert!(store.update_element(&id, ElementPatch::position(*x, *y)));
        }
        Mutation::Delete(i) => {
            let id = store.elements()[i % len].id.clone();
            assert!(store.delete_element(&id));
        }
        Mutation::Duplicate(i) => {
            let id = store.elements()[i % len].id.clone();
            assert!(store.duplicate_element(&id).is_some());
        }
    }
}

fn snapshot(store: &ElementStore) -> Vec<DesignElement> {
    store.elements().to_vec()
}

proptest! {
    #[test]
    fn prop_undo_all_then_redo_all_restores_state(
        mutations in prop::collection::vec(arb_mutation(), 1..50)
    ) {
        let mut store = new_store();
        for m in &mutations {
            apply(&mut store, m);
        }
        let after = snapshot(&store);
        let n = mutations.len();

        for _ in 0..n {
            prop_assert!(store.undo());
        }
        prop_assert!(store.elements().is_empty());
        prop_assert!(!store.undo());

        for _ in 0..n {
            prop_assert!(store.redo());
        }
        prop_assert_eq!(snapshot(&store), after);
        prop_assert!(!store.redo());
    }

    #[test]
    fn prop_each_undo_restores_previous_state(
        mutations in prop::collection::vec(arb_mutation(), 1..30)
    ) {
        let mut store = new_store();
        let mut states = vec![snapshot(&store)];
        for m in &mutations {
            apply(&mut store, m);
            states.push(snapshot(&store));
        }

        for expected in states.iter().rev().skip(1) {
            prop_assert!(store.undo());
            prop_assert_eq!(&snapshot(&store), expected);
        }
    }

    #[test]
    fn prop_mutation_after_undo_clears_redo(
        first in arb_mutation(),
        second in arb_mutation()
    ) {
        let mut store = new_store();
        store.add_element(ElementType::Text);
        apply(&mut store, &first);
        prop_assert!(store.undo());
        apply(&mut store, &second);

        let before = snapshot(&store);
        prop_assert!(!store.redo());
        prop_assert_eq!(snapshot(&store), before);
    }
}

#[test]
fn test_history_capacity_keeps_fifty_most_recent() {
    let mut store = new_store();
    let mut states = vec![snapshot(&store)];
    for i in 0..60 {
        store.add_element(if i % 2 == 0 {
            ElementType::Text
        } else {
            ElementType::Shape
        });
        states.push(snapshot(&store));
    }
    assert_eq!(store.history().undo_len(), 50);

    for step in 1..=50 {
        assert!(store.undo(), "undo {step} should succeed");
        assert_eq!(snapshot(&store), states[60 - step]);
    }
    assert_eq!(store.elements().len(), 10);
    assert!(!store.undo());
    assert_eq!(store.elements().len(), 10);
}
