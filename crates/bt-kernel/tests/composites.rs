mod common;

use std::sync::Arc;

use bt_kernel::builder::{memory_sequence, parallel, scored, sequence, utility_selector};
use bt_kernel::composite::{Fallback, ParallelPolicy, Sequence};
use bt_kernel::{BehaviorTree, Node, NodeResult, TraceBuffer, TreeConfig, TreeError, abort, tick};
use common::{ctx, probe, probes};
use parking_lot::Mutex;

use NodeResult::{Failed, Running, Succeeded};

#[test]
fn sequence_short_circuits_without_aborting_idle_children() {
    let (children, handles) = probes(&[Succeeded, Failed, Succeeded]);
    let mut seq = Sequence::new(children).unwrap();

    assert_eq!(tick(&mut seq, &ctx(1, 0)).unwrap(), Failed);
    assert_eq!(handles[2].ticks(), 0);
    assert_eq!(handles[2].aborts(), 0);
}

#[test]
fn fallback_aborts_preempted_runner_once() {
    let (children, handles) = probes(&[Failed, Running]);
    let mut fallback = Fallback::new(children).unwrap();

    assert_eq!(tick(&mut fallback, &ctx(1, 0)).unwrap(), Running);
    handles[0].set(Succeeded);
    assert_eq!(tick(&mut fallback, &ctx(2, 0)).unwrap(), Succeeded);
    assert_eq!(tick(&mut fallback, &ctx(3, 0)).unwrap(), Succeeded);
    assert_eq!(handles[1].aborts(), 1);
    assert_eq!(handles[1].resets(), 1);
}

#[test]
fn parallel_success_threshold() {
    let (children, _) = probes(&[Succeeded, Running, Failed]);
    let mut node = parallel(children, ParallelPolicy::SuccessThreshold(2)).unwrap();
    assert_eq!(tick(node.as_mut(), &ctx(1, 0)).unwrap(), Running);

    let (children, _) = probes(&[Failed, Failed, Succeeded]);
    let mut node = parallel(children, ParallelPolicy::SuccessThreshold(2)).unwrap();
    assert_eq!(tick(node.as_mut(), &ctx(1, 0)).unwrap(), Failed);
}

#[test]
fn parallel_failure_aborts_running_sibling() {
    let (children, handles) = probes(&[Running, Running, Succeeded]);
    let mut node = parallel(children, ParallelPolicy::SuccessThreshold(2)).unwrap();
    assert_eq!(tick(node.as_mut(), &ctx(1, 0)).unwrap(), Running);

    handles[0].set(Failed);
    assert_eq!(tick(node.as_mut(), &ctx(2, 0)).unwrap(), Running);
    handles[2].set(Failed);
    assert_eq!(tick(node.as_mut(), &ctx(3, 0)).unwrap(), Failed);
    assert_eq!(handles[1].aborts(), 1);
    assert_eq!(handles[0].aborts(), 0);
}

#[test]
fn utility_selector_preempts_lower_ranked_runner() {
    let scores = Arc::new(Mutex::new((50.0, 10.0)));
    let (first, first_probe) = probe(Running);
    let (second, second_probe) = probe(Running);
    let (a, b) = (scores.clone(), scores.clone());
    let mut node = utility_selector(vec![
        scored(first, move |_| a.lock().0),
        scored(second, move |_| b.lock().1),
    ])
    .unwrap();

    assert_eq!(tick(node.as_mut(), &ctx(1, 0)).unwrap(), Running);
    assert_eq!(first_probe.ticks(), 1);
    assert_eq!(second_probe.ticks(), 0);

    *scores.lock() = (0.0, 20.0);
    assert_eq!(tick(node.as_mut(), &ctx(2, 0)).unwrap(), Running);
    assert_eq!(second_probe.ticks(), 1);
    assert_eq!(first_probe.aborts(), 1);
    assert_eq!(first_probe.ticks(), 1);
}

#[test]
fn memory_sequence_resumes_after_earlier_child_changes() {
    let (children, handles) = probes(&[Succeeded, Running]);
    let mut node = memory_sequence(children).unwrap();

    tick(node.as_mut(), &ctx(1, 0)).unwrap();
    handles[0].set(Failed);
    assert_eq!(tick(node.as_mut(), &ctx(2, 0)).unwrap(), Running);
    assert_eq!(handles[0].ticks(), 1);

    abort(node.as_mut(), &ctx(2, 0));
    assert_eq!(handles[1].aborts(), 1);
    assert_eq!(tick(node.as_mut(), &ctx(3, 0)).unwrap(), Failed);
    assert_eq!(handles[0].ticks(), 2);
}

#[test]
fn attaching_a_child_twice_is_rejected() {
    let (mut child, _) = probe(Succeeded);
    let first_parent = Sequence::new(Vec::new()).unwrap();
    child.core_mut().attach(first_parent.id()).unwrap();

    let err = Sequence::new(vec![child]).err().unwrap();
    assert!(matches!(
        err,
        TreeError::AlreadyAttached { parent, .. } if parent == first_parent.id()
    ));
    assert!(err.is_configuration());
}

#[test]
fn empty_composite_fails_when_ticked() {
    let mut empty = sequence(Vec::new()).unwrap();
    let err = tick(empty.as_mut(), &ctx(1, 0)).unwrap_err();
    assert!(matches!(err, TreeError::EmptyComposite { .. }));
}

#[test]
fn trace_events_are_innermost_first() {
    let buffer = TraceBuffer::new();
    let (children, _) = probes(&[Succeeded, Running]);
    let root = sequence(children).unwrap();
    let root_id = root.id();
    let mut tree = BehaviorTree::new(root)
        .with_config(TreeConfig::new().with_trace(true).with_capture_state(true))
        .with_trace_sink(buffer.clone());

    tree.tick(0).unwrap();
    let events = buffer.drain();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].node, root_id);
    assert_eq!(events[2].result, Running);
    assert!(events.iter().all(|event| event.started_at.is_none()));
}
