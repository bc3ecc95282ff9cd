//! Emission sinks.
//!
//! A pipe is write-only: instruments hold one and call `emit`. Direct pipes
//! (discard / observer / transform / fan-out) run synchronously at the call
//! site; circuit-bound pipes enqueue onto their circuit and return without
//! blocking, leaving all processing to the pump.

use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::circuit::CircuitShared;
use crate::flow::{Flow, LimitGate};
use crate::name::Name;
use crate::reservoir::Subscribers;

enum PipeKind<E> {
    Discard,
    Observer(Arc<dyn Fn(E) + Send + Sync>),
    Bound(Arc<BoundPipe<E>>),
}

impl<E> Clone for PipeKind<E> {
    fn clone(&self) -> Self {
        match self {
            PipeKind::Discard => PipeKind::Discard,
            PipeKind::Observer(f) => PipeKind::Observer(f.clone()),
            PipeKind::Bound(b) => PipeKind::Bound(b.clone()),
        }
    }
}

/// A write-only emission sink.
pub struct Pipe<E> {
    kind: PipeKind<E>,
}

impl<E> Clone for Pipe<E> {
    fn clone(&self) -> Self {
        Pipe {
            kind: self.kind.clone(),
        }
    }
}

impl<E: Clone + Send + Sync + 'static> Pipe<E> {
    /// A pipe that swallows everything.
    pub fn discard() -> Self {
        Pipe {
            kind: PipeKind::Discard,
        }
    }

    /// A pipe invoking a side-effecting callback for every emission.
    pub fn observer(callback: impl Fn(E) + Send + Sync + 'static) -> Self {
        Pipe {
            kind: PipeKind::Observer(Arc::new(callback)),
        }
    }

    /// A pipe that maps each value and forwards the result into `self`.
    pub fn transform<I>(&self, map: impl Fn(I) -> E + Send + Sync + 'static) -> Pipe<I>
    where
        I: Clone + Send + Sync + 'static,
    {
        let target = self.clone();
        Pipe::observer(move |value: I| target.emit(map(value)))
    }

    /// A pipe forwarding every value into each of `targets`.
    pub fn fanout(targets: Vec<Pipe<E>>) -> Self {
        Pipe::observer(move |value: E| {
            for target in &targets {
                target.emit(value.clone());
            }
        })
    }

    pub(crate) fn bound(pipe: Arc<BoundPipe<E>>) -> Self {
        Pipe {
            kind: PipeKind::Bound(pipe),
        }
    }

    /// Emits a value. Never blocks: direct pipes run synchronously,
    /// circuit-bound pipes enqueue and return.
    pub fn emit(&self, value: E) {
        match &self.kind {
            PipeKind::Discard => {}
            PipeKind::Observer(callback) => callback(value),
            PipeKind::Bound(bound) => BoundPipe::emit(bound, value),
        }
    }
}

/// The circuit-bound sink behind a subject's pipe.
pub(crate) struct BoundPipe<E> {
    circuit: Arc<CircuitShared>,
    subject: Name,
    subscribers: Arc<Subscribers<E>>,
    // Pump-only once items are enqueued; the mutex is uncontended.
    flow: Mutex<Flow<E>>,
    limit: Option<LimitGate>,
}

impl<E: Clone + Send + Sync + 'static> BoundPipe<E> {
    pub(crate) fn new(
        circuit: Arc<CircuitShared>,
        subject: Name,
        subscribers: Arc<Subscribers<E>>,
        mut flow: Flow<E>,
    ) -> Arc<Self> {
        let limit = flow.take_limit();
        Arc::new(Self {
            circuit,
            subject,
            subscribers,
            flow: Mutex::new(flow),
            limit,
        })
    }

    fn emit(this: &Arc<Self>, value: E) {
        if let Some(gate) = &this.limit {
            if !gate.try_acquire() {
                trace!(subject = %this.subject, "emission shed by limit");
                return;
            }
        }
        let pipe = this.clone();
        let accepted = this
            .circuit
            .submit(Box::new(move || pipe.process(value)));
        if !accepted {
            if let Some(gate) = &this.limit {
                gate.release();
            }
        }
    }

    /// Pump-side: free the limit slot, run the flow, deliver survivors.
    fn process(&self, value: E) {
        if let Some(gate) = &self.limit {
            gate.release();
        }
        let forwarded = self
            .flow
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(value);
        if let Some(value) = forwarded {
            self.subscribers.deliver(&self.subject, value);
        }
    }
}

/// The capability handed to a composer: everything an instrument needs to
/// emit into its conduit under its own subject name.
pub struct Channel<E> {
    circuit: Arc<CircuitShared>,
    subject: Name,
    subscribers: Arc<Subscribers<E>>,
}

impl<E: Clone + Send + Sync + 'static> Channel<E> {
    pub(crate) fn new(
        circuit: Arc<CircuitShared>,
        subject: Name,
        subscribers: Arc<Subscribers<E>>,
    ) -> Self {
        Self {
            circuit,
            subject,
            subscribers,
        }
    }

    /// The subject this channel is bound to.
    pub fn subject(&self) -> &Name {
        &self.subject
    }

    /// The circuit-bound pipe the new instrument must hold.
    pub fn pipe(&self) -> Pipe<E> {
        self.pipe_with(Flow::new())
    }

    /// Same, with an operator pipeline attached.
    pub fn pipe_with(&self, flow: Flow<E>) -> Pipe<E> {
        Pipe::bound(BoundPipe::new(
            self.circuit.clone(),
            self.subject.clone(),
            self.subscribers.clone(),
            flow,
        ))
    }
}
