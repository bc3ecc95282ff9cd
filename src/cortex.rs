//! Substrate entry point.
//!
//! A `Cortex` owns one name-interning trie and hands out circuits, scopes,
//! pipes, and states bound to it. Names and canonical signals live for the
//! cortex's lifetime; circuits, conduits, reservoirs, and scopes are created
//! and explicitly closed by callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::circuit::Circuit;
use crate::conduit::Conduit;
use crate::error::NameError;
use crate::name::{Name, NameSpace};
use crate::pipe::Pipe;
use crate::reservoir::Reservoir;
use crate::scope::Scope;
use crate::state::{Slot, SlotValue, State};

const CIRCUIT_ROOT: &str = "cortex.circuit";

struct CortexInner {
    names: NameSpace,
    circuit_seq: AtomicU64,
}

/// The substrate context. Cloning shares the same interning trie.
#[derive(Clone)]
pub struct Cortex {
    inner: Arc<CortexInner>,
}

impl Cortex {
    pub fn new() -> Self {
        Cortex {
            inner: Arc::new(CortexInner {
                names: NameSpace::new(),
                circuit_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Interns a dotted path. Fails fast on empty paths/segments.
    pub fn name(&self, path: &str) -> Result<Name, NameError> {
        self.inner.names.name(path)
    }

    /// Creates a circuit with an auto-generated name
    /// (`cortex.circuit.<n>`). Requires a running tokio runtime.
    pub fn circuit(&self) -> Circuit {
        let seq = self.inner.circuit_seq.fetch_add(1, Ordering::Relaxed);
        let name = self
            .inner
            .names
            .name(CIRCUIT_ROOT)
            .and_then(|root| root.name(&seq.to_string()))
            .expect("generated circuit path is a valid name");
        Circuit::spawn(name)
    }

    /// Creates a circuit under the given name.
    pub fn circuit_named(&self, name: Name) -> Circuit {
        Circuit::spawn(name)
    }

    /// Creates an anonymous root scope.
    pub fn scope(&self) -> Scope {
        Scope::root(None)
    }

    /// Creates a named root scope.
    pub fn scope_named(&self, name: Name) -> Scope {
        Scope::root(Some(name))
    }

    /// A standalone discarding pipe.
    pub fn pipe<E: Clone + Send + Sync + 'static>(&self) -> Pipe<E> {
        Pipe::discard()
    }

    pub fn slot(&self, name: Name, value: impl Into<SlotValue>) -> Slot {
        Slot::new(name, value)
    }

    /// The empty state.
    pub fn state(&self) -> State {
        State::new()
    }

    /// Attaches a capture buffer to a conduit.
    pub fn reservoir<P, E>(&self, conduit: &Conduit<P, E>) -> Reservoir<E>
    where
        P: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        conduit.reservoir()
    }
}

impl Default for Cortex {
    fn default() -> Self {
        Self::new()
    }
}
