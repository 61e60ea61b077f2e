//! Cancellation primitive handed to asynchronous operations.
//!
//! [`cancel_pair`] returns a [`CancelHandle`] kept by the node and a
//! [`CancelSignal`] given to the operation. The pair wraps a
//! [`CancellationToken`], so operations can await cancellation, while
//! synchronous listeners are notified exactly once, including listeners
//! registered after the fact.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

type Listener = Box<dyn FnOnce() + Send>;

struct Shared {
    token: CancellationToken,
    listeners: Mutex<Vec<Listener>>,
}

/// Creates a connected handle/signal pair. The signal starts not cancelled.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let shared = Arc::new(Shared {
        token: CancellationToken::new(),
        listeners: Mutex::new(Vec::new()),
    });
    (
        CancelHandle {
            shared: shared.clone(),
        },
        CancelSignal { shared },
    )
}

/// Owner side: triggers cancellation.
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Cancels the token and runs every registered listener. Later calls
    /// are no-ops.
    pub fn cancel(&self) {
        let listeners = {
            let mut listeners = self.shared.listeners.lock();
            if self.shared.token.is_cancelled() {
                return;
            }
            self.shared.token.cancel();
            std::mem::take(&mut *listeners)
        };
        // Run outside the lock so listeners may register further listeners.
        for listener in listeners {
            listener();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Returns another signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            shared: self.shared.clone(),
        }
    }
}

/// Operation side: observes cancellation, either synchronously through
/// [`CancelSignal::on_cancel`] or by awaiting [`CancelSignal::cancelled`].
#[derive(Clone)]
pub struct CancelSignal {
    shared: Arc<Shared>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Completes once the paired handle cancels. Intended for `select!`
    /// against the operation's own work.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shared.token.cancelled()
    }

    /// Token cancelled together with this signal, for tasks that need an
    /// owned value. Cancelling the child does not cancel the signal.
    pub fn child_token(&self) -> CancellationToken {
        self.shared.token.child_token()
    }

    /// Registers `listener` to run on cancellation. If the signal is already
    /// cancelled, the listener runs immediately.
    pub fn on_cancel<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut listeners = self.shared.listeners.lock();
        if self.shared.token.is_cancelled() {
            drop(listeners);
            listener();
            return;
        }
        listeners.push(Box::new(listener));
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
