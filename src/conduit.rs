//! Subject registry: one memoized instrument per name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::circuit::CircuitShared;
use crate::error::{CloseError, ConduitError};
use crate::name::Name;
use crate::pipe::Channel;
use crate::reservoir::{Reservoir, Subscribers};
use crate::scope::Closeable;

type Composer<P, E> = Box<dyn Fn(Channel<E>) -> P + Send + Sync>;

struct ConduitInner<P, E> {
    circuit: Arc<CircuitShared>,
    composer: Composer<P, E>,
    percepts: Mutex<HashMap<Name, P>>,
    subscribers: Arc<Subscribers<E>>,
    closed: AtomicBool,
}

/// Maps a subject [`Name`] to exactly one memoized instrument, built once
/// per name via the registered composer.
pub struct Conduit<P, E> {
    inner: Arc<ConduitInner<P, E>>,
}

impl<P, E> Clone for Conduit<P, E> {
    fn clone(&self) -> Self {
        Conduit {
            inner: self.inner.clone(),
        }
    }
}

impl<P, E> Conduit<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        circuit: Arc<CircuitShared>,
        composer: impl Fn(Channel<E>) -> P + Send + Sync + 'static,
    ) -> Self {
        Conduit {
            inner: Arc::new(ConduitInner {
                circuit,
                composer: Box::new(composer),
                percepts: Mutex::new(HashMap::new()),
                subscribers: Arc::new(Subscribers::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the instrument for `name`, constructing it on first access.
    ///
    /// # MEMOIZATION INVARIANT
    /// The composer runs at most once per (conduit, name): construction
    /// happens under the registry lock, so concurrent first access from any
    /// number of threads converges on one instance. Composers must be pure
    /// wiring (build an instrument around `channel.pipe()`) and must not
    /// call back into the same conduit.
    pub fn percept(&self, name: &Name) -> Result<P, ConduitError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ConduitError::Closed);
        }
        let mut percepts = self
            .inner
            .percepts
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = percepts.get(name) {
            return Ok(existing.clone());
        }
        let channel = Channel::new(
            self.inner.circuit.clone(),
            name.clone(),
            self.inner.subscribers.clone(),
        );
        let instrument = (self.inner.composer)(channel);
        percepts.insert(name.clone(), instrument.clone());
        Ok(instrument)
    }

    /// Attaches a capture buffer observing every percept of this conduit.
    pub fn reservoir(&self) -> Reservoir<E> {
        Reservoir::subscribe(self.inner.subscribers.clone())
    }
}

impl<P, E> Closeable for Conduit<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Marks the conduit closed and releases its instruments. Idempotent.
    fn close(&self) -> Result<(), CloseError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner
            .percepts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}
