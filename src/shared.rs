//! Shared access
//!
//! A `LogStore` has no internal locking. When several threads need the same
//! log, wrap it here: every call runs with the store locked, which gives the
//! external serialization the store expects.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::codec::JsonLineCodec;
use crate::storage::FsStorage;
use crate::store::LogStore;

/// Cloneable, thread-safe handle to one store
pub struct SharedLogStore<C = JsonLineCodec, S = FsStorage> {
    inner: Arc<Mutex<LogStore<C, S>>>,
}

impl<C, S> SharedLogStore<C, S> {
    pub fn new(store: LogStore<C, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, LogStore<C, S>> {
        self.inner.lock()
    }

    /// Run one closure with the store locked
    pub fn with<R>(&self, f: impl FnOnce(&mut LogStore<C, S>) -> R) -> R {
        let mut store = self.inner.lock();
        f(&mut *store)
    }
}

impl<C, S> Clone for SharedLogStore<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
