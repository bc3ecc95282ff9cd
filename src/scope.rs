//! Hierarchical resource lifecycle.
//!
//! # LIFECYCLE INVARIANT
//! `close()` cascades depth-first (children before directly owned
//! resources) and closes each registered resource exactly once. A second
//! close is a no-op. Registration racing a close resolves deterministically:
//! a resource that arrives after the scope closed is itself closed
//! immediately and the registration is rejected — nothing can leak past a
//! completed close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::error::{CloseError, ScopeError};
use crate::name::Name;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Anything with an idempotent close.
pub trait Closeable: Send + Sync {
    fn close(&self) -> Result<(), CloseError>;
}

struct ScopeInner {
    name: Option<Name>,
    closed: AtomicBool,
    children: Mutex<Vec<Scope>>,
    resources: Mutex<Vec<Arc<dyn Closeable>>>,
}

/// A tree of registered closeables.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub(crate) fn root(name: Option<Name>) -> Scope {
        Scope {
            inner: Arc::new(ScopeInner {
                name,
                closed: AtomicBool::new(false),
                children: Mutex::new(Vec::new()),
                resources: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> Option<&Name> {
        self.inner.name.as_ref()
    }

    /// Creates an anonymous child scope, closed when this scope closes.
    pub fn scope(&self) -> Scope {
        self.attach_child(None)
    }

    /// Creates a named child scope.
    pub fn scope_named(&self, name: Name) -> Scope {
        self.attach_child(Some(name))
    }

    fn attach_child(&self, name: Option<Name>) -> Scope {
        let child = Scope::root(name);
        if self.inner.closed.load(Ordering::Acquire) {
            // Parent already closed: the child is born closed.
            child.inner.closed.store(true, Ordering::SeqCst);
            return child;
        }
        let mut children = lock(&self.inner.children);
        if self.inner.closed.load(Ordering::Acquire) {
            child.inner.closed.store(true, Ordering::SeqCst);
            return child;
        }
        children.push(child.clone());
        child
    }

    /// Registers a closeable owned by this scope.
    ///
    /// Registering against a closed scope closes the resource immediately
    /// and reports [`ScopeError::Closed`].
    pub fn register(&self, resource: Arc<dyn Closeable>) -> Result<(), ScopeError> {
        if self.inner.closed.load(Ordering::Acquire) {
            Self::close_rejected(&resource);
            return Err(ScopeError::Closed);
        }
        let mut resources = lock(&self.inner.resources);
        // Re-check under the lock; close() drains under the same lock.
        if self.inner.closed.load(Ordering::Acquire) {
            drop(resources);
            Self::close_rejected(&resource);
            return Err(ScopeError::Closed);
        }
        resources.push(resource);
        Ok(())
    }

    fn close_rejected(resource: &Arc<dyn Closeable>) {
        if let Err(e) = resource.close() {
            error!(error = %e, "resource rejected by closed scope failed to close");
        }
    }

    /// Wraps a resource in a guard that closes it on drop, on every exit
    /// path. The resource is not registered with the scope; the guard owns
    /// its release.
    pub fn closure(&self, resource: Arc<dyn Closeable>) -> Closure {
        Closure {
            resource: Some(resource),
        }
    }

    /// Closes children depth-first, then directly owned resources, each
    /// exactly once. One resource failing does not stop its siblings;
    /// failures are collected and returned together. Repeat calls are
    /// no-ops.
    pub fn close(&self) -> Result<(), CloseError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut failures = Vec::new();
        let children = std::mem::take(&mut *lock(&self.inner.children));
        for child in children {
            if let Err(e) = child.close() {
                failures.push(e);
            }
        }
        let resources = std::mem::take(&mut *lock(&self.inner.resources));
        for resource in resources {
            if let Err(e) = resource.close() {
                failures.push(e);
            }
        }
        CloseError::aggregate(failures)
    }
}

impl Closeable for Scope {
    fn close(&self) -> Result<(), CloseError> {
        Scope::close(self)
    }
}

/// Deferred-release wrapper: closes its resource when dropped, or earlier
/// via [`Closure::release`].
pub struct Closure {
    resource: Option<Arc<dyn Closeable>>,
}

impl Closure {
    /// Closes the resource now, surfacing the result.
    pub fn release(mut self) -> Result<(), CloseError> {
        match self.resource.take() {
            Some(resource) => resource.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Closure {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            if let Err(e) = resource.close() {
                error!(error = %e, "deferred release failed");
            }
        }
    }
}
