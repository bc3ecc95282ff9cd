//! Test-facing capture of conduit emissions.
//!
//! A reservoir records every `(subject, emission)` pair flowing through any
//! percept of the conduit it subscribes to, in arrival order. It is the
//! substrate's verification surface: tests quiesce the circuit, then drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::error::CloseError;
use crate::name::Name;
use crate::scope::Closeable;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// One recorded emission: which subject emitted, and what.
#[derive(Debug, Clone, Serialize)]
pub struct Capture<E> {
    subject: Name,
    emission: E,
}

impl<E> Capture<E> {
    pub(crate) fn new(subject: Name, emission: E) -> Self {
        Self { subject, emission }
    }

    /// The name of the instrument that emitted.
    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn emission(&self) -> &E {
        &self.emission
    }
}

struct ReservoirInner<E> {
    buffer: Mutex<Vec<Capture<E>>>,
    detached: AtomicBool,
}

/// The per-conduit fan-out list the pump delivers into.
pub(crate) struct Subscribers<E> {
    list: RwLock<Vec<Arc<ReservoirInner<E>>>>,
}

impl<E: Clone> Subscribers<E> {
    pub(crate) fn new() -> Self {
        Self {
            list: RwLock::new(Vec::new()),
        }
    }

    /// Pump-side delivery to every live reservoir.
    pub(crate) fn deliver(&self, subject: &Name, emission: E) {
        let list = self.list.read().unwrap_or_else(|e| e.into_inner());
        for subscriber in list.iter() {
            if subscriber.detached.load(Ordering::Acquire) {
                continue;
            }
            lock(&subscriber.buffer).push(Capture::new(subject.clone(), emission.clone()));
        }
    }

    fn attach(&self, inner: Arc<ReservoirInner<E>>) {
        self.list
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(inner);
    }

    fn detach(&self, inner: &Arc<ReservoirInner<E>>) {
        self.list
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|existing| !Arc::ptr_eq(existing, inner));
    }
}

/// A capture buffer subscribed to a conduit.
pub struct Reservoir<E> {
    inner: Arc<ReservoirInner<E>>,
    subscribers: Arc<Subscribers<E>>,
}

impl<E: Clone> Reservoir<E> {
    pub(crate) fn subscribe(subscribers: Arc<Subscribers<E>>) -> Self {
        let inner = Arc::new(ReservoirInner {
            buffer: Mutex::new(Vec::new()),
            detached: AtomicBool::new(false),
        });
        subscribers.attach(inner.clone());
        debug!("reservoir attached");
        Reservoir { inner, subscribers }
    }

    /// Atomically returns-and-empties the buffer. Each capture is observed
    /// exactly once across drains; an immediate second call yields nothing
    /// until new emissions arrive.
    pub fn drain(&self) -> Vec<Capture<E>> {
        std::mem::take(&mut *lock(&self.inner.buffer))
    }

    /// Detaches the subscription. Captures already buffered are preserved
    /// and stay drainable; only future emissions stop arriving.
    pub fn close(&self) {
        if self.inner.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscribers.detach(&self.inner);
        debug!("reservoir detached");
    }
}

impl<E: Clone + Send + Sync> Closeable for Reservoir<E> {
    fn close(&self) -> Result<(), CloseError> {
        Reservoir::close(self);
        Ok(())
    }
}
