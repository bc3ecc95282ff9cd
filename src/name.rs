//! Interned, hierarchical, dot-structured identifiers.
//!
//! # IDENTITY INVARIANT
//! Names are interned per [`NameSpace`]: two constructions of the same full
//! path resolve to the **same** allocation. Equality and hashing go through
//! the pointer, which is what lets a `Name` act as a cheap registry key
//! (see `Conduit`). Interning makes pointer identity and structural
//! equality the same relation within one namespace.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use serde::{Serialize, Serializer};

use crate::error::NameError;

/// Segment separator in a dotted path.
pub const SEPARATOR: char = '.';

struct NameInner {
    parent: Option<Name>,
    segment: String,
    depth: usize,
    // Interning trie edge: get-or-create children keyed by segment.
    children: RwLock<HashMap<String, Name>>,
}

/// An interned, immutable, hierarchical identifier.
///
/// Cloning is cheap (one `Arc` bump). A child keeps its whole ancestor
/// chain alive, so structural sharing falls out of the trie for free.
#[derive(Clone)]
pub struct Name(Arc<NameInner>);

/// The interning root for a family of [`Name`]s.
///
/// Owned by `Cortex`; every name constructed through one namespace shares
/// one trie, which is what the identity invariant rests on.
pub struct NameSpace {
    roots: RwLock<HashMap<String, Name>>,
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn split_path(path: &str) -> Result<Vec<&str>, NameError> {
    if path.is_empty() {
        return Err(NameError::EmptyPath);
    }
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(NameError::EmptySegment(path.to_string()));
    }
    Ok(segments)
}

impl NameSpace {
    pub fn new() -> Self {
        Self {
            roots: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves a dotted path to its interned `Name`, creating trie nodes
    /// on first use. Fails fast on an empty path or empty segment.
    pub fn name(&self, path: &str) -> Result<Name, NameError> {
        let segments = split_path(path)?;
        let mut current = self.root(segments[0]);
        for segment in &segments[1..] {
            current = current.child(segment);
        }
        Ok(current)
    }

    fn root(&self, segment: &str) -> Name {
        if let Some(existing) = read(&self.roots).get(segment) {
            return existing.clone();
        }
        write(&self.roots)
            .entry(segment.to_string())
            .or_insert_with(|| Name::node(None, segment, 1))
            .clone()
    }
}

impl Default for NameSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Name {
    fn node(parent: Option<Name>, segment: &str, depth: usize) -> Name {
        Name(Arc::new(NameInner {
            parent,
            segment: segment.to_string(),
            depth,
            children: RwLock::new(HashMap::new()),
        }))
    }

    // Get-or-create: double-checked so the hot path is a read lock.
    fn child(&self, segment: &str) -> Name {
        if let Some(existing) = read(&self.0.children).get(segment) {
            return existing.clone();
        }
        let parent = self.clone();
        let depth = self.0.depth + 1;
        write(&self.0.children)
            .entry(segment.to_string())
            .or_insert_with(|| Name::node(Some(parent), segment, depth))
            .clone()
    }

    /// Extends this name with a child path (which may itself be dotted),
    /// so `a.name("b.c")` is the same instance as parsing `"a.b.c"`.
    pub fn name(&self, path: &str) -> Result<Name, NameError> {
        let segments = split_path(path)?;
        let mut current = self.clone();
        for segment in segments {
            current = current.child(segment);
        }
        Ok(current)
    }

    /// The last segment of this name.
    pub fn segment(&self) -> &str {
        &self.0.segment
    }

    /// The enclosing (parent) name, `None` for roots.
    pub fn enclosure(&self) -> Option<Name> {
        self.0.parent.clone()
    }

    /// Number of segments in the full path.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Full segment sequence, root first.
    pub fn segments(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.0.depth);
        let mut current: &NameInner = &self.0;
        loop {
            out.push(current.segment.as_str());
            match &current.parent {
                Some(parent) => current = &parent.0,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Dot-joined full path.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments().iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(segment);
        }
        out
    }

    /// Walks rootward: this name first, then each enclosure.
    pub fn ancestry(&self) -> impl Iterator<Item = Name> {
        let mut next = Some(self.clone());
        std::iter::from_fn(move || {
            let current = next.take()?;
            next = current.enclosure();
            Some(current)
        })
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Ord for Name {
    /// Lexicographic over the segment sequence; a prefix path sorts
    /// before its extensions. Consistent with `Eq` because of interning.
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.segments().cmp(&other.segments())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.path())
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}
