//! Canonical (sign, dimension) composites for dual-perspective vocabularies.
//!
//! Vocabulary enums are closed and known up front, so the cache is a fixed
//! |S| x |D| arena indexed by dense ordinals — no reflection, no dynamic
//! dispatch. Repeated lookups of the same pair return the *same* allocation,
//! which is what makes high-frequency emission of composites allocation-free
//! and identity-comparable.

use std::sync::{Arc, OnceLock};

/// A closed vocabulary with a dense ordinal encoding.
///
/// `ordinal()` must return a stable value in `0..COUNT`.
pub trait Enumerated: Copy + Send + Sync + 'static {
    const COUNT: usize;

    fn ordinal(self) -> usize;
}

/// A canonicalized (sign, dimension) pair. Obtained only through a
/// [`SignalCache`], so equal pairs are pointer-identical.
#[derive(Debug)]
pub struct Signal<S, D> {
    sign: S,
    dimension: D,
}

impl<S: Copy, D: Copy> Signal<S, D> {
    pub fn sign(&self) -> S {
        self.sign
    }

    pub fn dimension(&self) -> D {
        self.dimension
    }
}

/// Arena of canonical signal instances, one cell per (sign, dimension).
pub struct SignalCache<S: Enumerated, D: Enumerated> {
    cells: Box<[OnceLock<Arc<Signal<S, D>>>]>,
}

impl<S: Enumerated, D: Enumerated> SignalCache<S, D> {
    pub fn new() -> Self {
        Self {
            cells: (0..S::COUNT * D::COUNT).map(|_| OnceLock::new()).collect(),
        }
    }

    /// The canonical, reference-stable instance for this pair. First access
    /// initializes the cell; every later access returns the same `Arc`.
    pub fn get(&self, sign: S, dimension: D) -> Arc<Signal<S, D>> {
        debug_assert!(sign.ordinal() < S::COUNT && dimension.ordinal() < D::COUNT);
        let index = sign.ordinal() * D::COUNT + dimension.ordinal();
        self.cells[index]
            .get_or_init(|| Arc::new(Signal { sign, dimension }))
            .clone()
    }
}

impl<S: Enumerated, D: Enumerated> Default for SignalCache<S, D> {
    fn default() -> Self {
        Self::new()
    }
}
