mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bt_kernel::builder::sequence;
use bt_kernel::leaf::{AsyncAction, AsyncPhase, CancelSignal, OperationFuture, cancel_pair};
use bt_kernel::{BehaviorTree, BoxError, NodeExt, NodeResult, TickContext};
use parking_lot::Mutex;
use tokio::sync::oneshot;

type Outcome = bt_kernel::leaf::AsyncOutcome;
type Senders = Arc<Mutex<Vec<oneshot::Sender<Outcome>>>>;

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let bump = count.clone();
    (count, move || {
        bump.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn cancel_is_idempotent_and_late_listeners_fire_immediately() {
    let (handle, signal) = cancel_pair();
    let (early, listener) = counter();
    signal.on_cancel(listener);

    handle.cancel();
    handle.cancel();
    assert_eq!(early.load(Ordering::SeqCst), 1);
    assert!(signal.is_cancelled());

    let (late, listener) = counter();
    signal.on_cancel(listener);
    assert_eq!(late.load(Ordering::SeqCst), 1);
}

/// Operation that waits for the test to settle it and counts cancellations.
fn channel_operation(
    senders: Senders,
    cancellations: Arc<AtomicUsize>,
) -> impl FnMut(&TickContext, CancelSignal) -> Result<OperationFuture, BoxError> + Send + 'static {
    move |_ctx: &TickContext, signal: CancelSignal| {
        let (tx, rx) = oneshot::channel();
        senders.lock().push(tx);
        let cancelled = cancellations.clone();
        signal.on_cancel(move || {
            cancelled.fetch_add(1, Ordering::SeqCst);
        });
        Ok(Box::pin(async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(err) => Err(err.into()),
            }
        }) as OperationFuture)
    }
}

#[test]
fn aborted_run_is_cancelled_and_superseded() {
    common::init_tracing();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let senders: Senders = Default::default();
    let cancellations = Arc::new(AtomicUsize::new(0));
    let leaf = AsyncAction::on_runtime(
        runtime.handle().clone(),
        channel_operation(senders.clone(), cancellations.clone()),
    );
    let mut tree = BehaviorTree::new(sequence(vec![leaf.boxed()]).unwrap());

    assert_eq!(tree.tick(0).unwrap(), NodeResult::Running);
    tree.abort(5);
    assert_eq!(cancellations.load(Ordering::SeqCst), 1);

    assert_eq!(tree.tick(10).unwrap(), NodeResult::Running);
    assert_eq!(senders.lock().len(), 2);

    // The first run's receiver may already be gone; either way its
    // outcome must never surface.
    let stale = senders.lock().remove(0);
    let _ = stale.send(Ok(Some(NodeResult::Failed)));
    let fresh = senders.lock().remove(0);
    let _ = fresh.send(Ok(None));

    let mut result = NodeResult::Running;
    for now in 11..200 {
        runtime.block_on(tokio::task::yield_now());
        result = tree.tick(now).unwrap();
        if result.is_terminal() {
            break;
        }
    }
    assert_eq!(result, NodeResult::Succeeded);
    assert_eq!(cancellations.load(Ordering::SeqCst), 1);
}

#[test]
fn inline_operation_reports_phase() {
    let senders: Senders = Default::default();
    let mut leaf = AsyncAction::new(channel_operation(senders.clone(), Arc::default()));
    let ctx = |tick_id| TickContext::new(tick_id, tick_id);

    assert_eq!(bt_kernel::tick(&mut leaf, &ctx(1)).unwrap(), NodeResult::Running);
    assert_eq!(leaf.phase(), AsyncPhase::Pending);

    let _ = senders.lock().remove(0).send(Err("planner unreachable".into()));
    assert_eq!(bt_kernel::tick(&mut leaf, &ctx(2)).unwrap(), NodeResult::Failed);
    assert_eq!(leaf.phase(), AsyncPhase::Rejected);
    assert!(leaf.last_error().is_some());
}
