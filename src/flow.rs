//! Composable stream operators for circuit-bound pipes.
//!
//! # CONCURRENCY INVARIANT
//! Operator state (diff's last value, sample's counter) is only ever touched
//! by the owning circuit's single pump, so none of it needs its own locking.
//! The one exception is `limit`, whose in-flight count must be visible to
//! producers at the emit site; it lives in an atomic gate instead.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;
type Equality<E> = Arc<dyn Fn(&E, &E) -> bool + Send + Sync>;

enum FlowOp<E> {
    /// Suppress a value equal to its immediate predecessor.
    Diff { last: Option<E>, eq: Equality<E> },
    /// Forward iff the predicate holds.
    Guard { pred: Predicate<E> },
    /// Forward iff the comparator places the value in [low, high].
    Sift {
        cmp: Comparator<E>,
        low: E,
        high: E,
    },
    /// Forward the 1st and every n-th subsequent value.
    Sample { interval: usize, count: usize },
}

/// An ordered operator pipeline, built once and attached when a
/// circuit-bound pipe is constructed (see `Channel::pipe_with`).
pub struct Flow<E> {
    ops: Vec<FlowOp<E>>,
    limit: Option<usize>,
}

impl<E> Flow<E> {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            limit: None,
        }
    }

    /// Suppresses values equal to the immediately preceding one.
    /// The first value always passes.
    pub fn diff(mut self) -> Self
    where
        E: PartialEq,
    {
        self.ops.push(FlowOp::Diff {
            last: None,
            eq: Arc::new(|a: &E, b: &E| a == b),
        });
        self
    }

    /// Drops values failing the predicate.
    pub fn guard(mut self, pred: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.ops.push(FlowOp::Guard {
            pred: Arc::new(pred),
        });
        self
    }

    /// Keeps values the comparator places within the inclusive range
    /// `[low, high]`.
    pub fn sift(
        mut self,
        cmp: impl Fn(&E, &E) -> Ordering + Send + Sync + 'static,
        low: E,
        high: E,
    ) -> Self {
        self.ops.push(FlowOp::Sift {
            cmp: Arc::new(cmp),
            low,
            high,
        });
        self
    }

    /// Forwards the 1st and every n-th subsequent value, so `sample(10)`
    /// passes the 1st, 11th, 21st, ... values.
    ///
    /// # Panics
    /// A zero interval is a programming error and fails fast.
    pub fn sample(mut self, interval: usize) -> Self {
        assert!(interval > 0, "sample interval must be positive");
        self.ops.push(FlowOp::Sample { interval, count: 0 });
        self
    }

    /// Bounds the number of in-flight (enqueued, unprocessed) values.
    /// Emissions beyond `capacity` are shed at the emit site without
    /// blocking the producer; a slot frees once the pump processes the item.
    pub fn limit(mut self, capacity: usize) -> Self {
        self.limit = Some(capacity);
        self
    }

    pub(crate) fn take_limit(&mut self) -> Option<LimitGate> {
        self.limit.take().map(LimitGate::new)
    }

    /// Runs the value through every operator in order. `None` means the
    /// value was suppressed. Pump-only.
    pub(crate) fn apply(&mut self, value: E) -> Option<E>
    where
        E: Clone,
    {
        let mut current = value;
        for op in &mut self.ops {
            match op {
                FlowOp::Diff { last, eq } => {
                    if last.as_ref().is_some_and(|prev| eq(prev, &current)) {
                        return None;
                    }
                    *last = Some(current.clone());
                }
                FlowOp::Guard { pred } => {
                    if !pred(&current) {
                        return None;
                    }
                }
                FlowOp::Sift { cmp, low, high } => {
                    if cmp(&current, low) == Ordering::Less
                        || cmp(&current, high) == Ordering::Greater
                    {
                        return None;
                    }
                }
                FlowOp::Sample { interval, count } => {
                    let pass = *count % *interval == 0;
                    *count += 1;
                    if !pass {
                        return None;
                    }
                }
            }
        }
        Some(current)
    }
}

impl<E> Default for Flow<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer-side admission gate backing [`Flow::limit`].
pub(crate) struct LimitGate {
    capacity: usize,
    in_flight: AtomicUsize,
}

impl LimitGate {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Claims a slot, or reports the emission must be shed.
    pub(crate) fn try_acquire(&self) -> bool {
        self.in_flight
            .fetch_update(
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
                |current| (current < self.capacity).then_some(current + 1),
            )
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}
