mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use bt_kernel::builder::{action, sequence};
use bt_kernel::{BehaviorTree, NodeResult, TickContext, TreeError, abort, ambient, tick};
use common::{ctx, probe};

use NodeResult::{Failed, Running, Succeeded};

#[test]
fn was_running_tracks_last_result() {
    common::init_tracing();
    let (mut node, handle) = probe(Running);

    tick(node.as_mut(), &ctx(1, 0)).unwrap();
    assert!(node.was_running());

    handle.set(Succeeded);
    tick(node.as_mut(), &ctx(2, 0)).unwrap();
    assert!(!node.was_running());

    handle.set(Running);
    tick(node.as_mut(), &ctx(3, 0)).unwrap();
    abort(node.as_mut(), &ctx(3, 0));
    assert!(!node.was_running());
}

#[test]
fn enter_and_resume_partition_ticks() {
    let (mut node, handle) = probe(Running);

    tick(node.as_mut(), &ctx(1, 0)).unwrap();
    tick(node.as_mut(), &ctx(2, 0)).unwrap();
    handle.set(Failed);
    tick(node.as_mut(), &ctx(3, 0)).unwrap();
    tick(node.as_mut(), &ctx(4, 0)).unwrap();

    assert_eq!(
        handle.take_log(),
        ["enter", "tick", "resume", "tick", "resume", "tick", "reset", "enter", "tick"]
    );
}

#[test]
fn reset_fires_once_per_transition_out_of_running() {
    let (mut node, handle) = probe(Succeeded);

    // Terminal to terminal: no reset.
    tick(node.as_mut(), &ctx(1, 0)).unwrap();
    tick(node.as_mut(), &ctx(2, 0)).unwrap();
    assert_eq!(handle.resets(), 0);

    // Abort of a non-running node: nothing at all.
    abort(node.as_mut(), &ctx(2, 0));
    assert_eq!(handle.aborts(), 0);
    assert_eq!(handle.resets(), 0);

    // Running, then abort: abort then reset, once.
    handle.set(Running);
    tick(node.as_mut(), &ctx(3, 0)).unwrap();
    tick(node.as_mut(), &ctx(4, 0)).unwrap();
    handle.take_log();
    abort(node.as_mut(), &ctx(4, 0));
    abort(node.as_mut(), &ctx(4, 0));
    assert_eq!(handle.take_log(), ["abort", "reset"]);
    assert_eq!(handle.resets(), 1);
}

#[test]
fn leaf_fault_propagates_and_leaves_tree_usable() {
    let (child, handle) = probe(Running);
    let root = sequence(vec![action(|_| Succeeded), child]).unwrap();
    let mut tree = BehaviorTree::new(root);

    assert_eq!(tree.tick(0).unwrap(), Running);

    handle.fault("sensor offline");
    let err = tree.tick(10).unwrap_err();
    assert!(matches!(err, TreeError::Leaf { .. }));
    assert_eq!(ambient::depth(), 0);
    // The faulted tick did not complete, so the bookkeeping is untouched.
    assert!(tree.root().was_running());

    handle.heal();
    handle.set(Succeeded);
    assert_eq!(tree.tick(20).unwrap(), Succeeded);
    assert_eq!(tree.last_result(), Some(Succeeded));
}

#[test]
fn panicking_leaf_unwinds_ambient_stack() {
    let mut root = sequence(vec![action(|_| panic!("leaf bug"))]).unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| tick(root.as_mut(), &ctx(1, 0))));
    assert!(outcome.is_err());
    assert_eq!(ambient::depth(), 0);
}

#[test]
fn ambient_context_visible_inside_leaf() {
    let mut root = sequence(vec![action(|ctx| {
        let frame = ambient::current().expect("inside a tick");
        assert_eq!(frame.ctx.tick_id, ctx.tick_id);
        assert_eq!(ambient::depth(), 2);
        Succeeded
    })])
    .unwrap();

    assert_eq!(tick(root.as_mut(), &ctx(9, 0)).unwrap(), Succeeded);
    assert!(ambient::current().is_none());
}

#[test]
fn exhausted_tick_ids_are_rejected_not_wrapped() {
    let (child, handle) = probe(Succeeded);
    let mut tree = BehaviorTree::new(sequence(vec![child]).unwrap());

    assert_eq!(tree.tick_with(&TickContext::new(u64::MAX, 1)).unwrap(), Succeeded);
    let err = tree.tick(2).unwrap_err();
    assert!(matches!(
        err,
        TreeError::NonMonotonicTick { previous: u64::MAX, .. }
    ));
    assert_eq!(handle.ticks(), 1);
    assert_eq!(tree.last_tick_id(), Some(u64::MAX));
}
