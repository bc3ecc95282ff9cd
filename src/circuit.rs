//! Per-context event queue and its single consumer ("the pump").
//!
//! # ORDERING INVARIANT
//! Every circuit owns exactly one pump task draining one queue. A single
//! producer's emissions are processed in submission order end to end;
//! cross-producer interleaving follows queue arrival order, nothing
//! stronger. Single consumption is also what lets flow-operator state stay
//! lock-free (see `flow`).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::conduit::Conduit;
use crate::error::CloseError;
use crate::name::Name;
use crate::pipe::Channel;
use crate::scope::Closeable;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Queue handle shared between producers, the pump, and bound pipes.
pub(crate) struct CircuitShared {
    name: Name,
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    pending: AtomicUsize,
    idle: Notify,
    closed: AtomicBool,
}

impl CircuitShared {
    /// Enqueues a job. Returns false when the circuit no longer accepts
    /// work; the item is dropped, never blocked on.
    pub(crate) fn submit(&self, job: Job) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let guard = lock(&self.tx);
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(job).is_err() {
            self.complete();
            return false;
        }
        true
    }

    fn complete(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn name(&self) -> &Name {
        &self.name
    }
}

struct CircuitInner {
    shared: Arc<CircuitShared>,
    conduits: Mutex<Vec<Arc<dyn Closeable>>>,
}

/// An asynchronous per-context event queue with a dedicated consumer.
///
/// Created through `Cortex::circuit()`; requires a running tokio runtime,
/// since the pump is spawned at construction.
#[derive(Clone)]
pub struct Circuit {
    inner: Arc<CircuitInner>,
}

impl Circuit {
    pub(crate) fn spawn(name: Name) -> Circuit {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let shared = Arc::new(CircuitShared {
            name,
            tx: Mutex::new(Some(tx)),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
            closed: AtomicBool::new(false),
        });

        let pump = shared.clone();
        tokio::spawn(async move {
            info!(circuit = %pump.name, "circuit pump started");
            while let Some(job) = rx.recv().await {
                // ISOLATION: one bad emission must not halt the circuit.
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!(circuit = %pump.name, "emission handler panicked; item isolated");
                }
                pump.complete();
            }
            debug!(circuit = %pump.name, "circuit pump stopped");
        });

        Circuit {
            inner: Arc::new(CircuitInner {
                shared,
                conduits: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &Name {
        self.inner.shared.name()
    }

    /// Registers a conduit owned by this circuit. The composer builds one
    /// instrument per subject name on first `percept` access.
    pub fn conduit<P, E>(
        &self,
        composer: impl Fn(Channel<E>) -> P + Send + Sync + 'static,
    ) -> Conduit<P, E>
    where
        P: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let conduit = Conduit::new(self.inner.shared.clone(), composer);
        lock(&self.inner.conduits).push(Arc::new(conduit.clone()));
        debug!(circuit = %self.inner.shared.name, "conduit registered");
        conduit
    }

    /// Quiescence barrier: returns once the queue — including work enqueued
    /// while waiting — is fully drained. No timeout.
    pub async fn quiesce(&self) {
        let shared = &self.inner.shared;
        loop {
            let notified = shared.idle.notified();
            tokio::pin!(notified);
            // Register the waiter BEFORE checking, or a drain landing
            // between the check and the await would be a lost wakeup.
            notified.as_mut().enable();
            if shared.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Closeable for Circuit {
    /// Stops accepting emissions, lets already-queued work drain, and
    /// releases owned conduits. Safe to call repeatedly.
    fn close(&self) -> Result<(), CloseError> {
        let shared = &self.inner.shared;
        if shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Dropping the sender ends the pump once the queue empties.
        lock(&shared.tx).take();
        let conduits = std::mem::take(&mut *lock(&self.inner.conduits));
        let mut failures = Vec::new();
        for conduit in conduits {
            if let Err(e) = conduit.close() {
                failures.push(e);
            }
        }
        info!(circuit = %shared.name, "circuit closed");
        CloseError::aggregate(failures)
    }
}
