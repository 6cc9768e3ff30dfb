use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::error::Result;

/// Values that can tell whether they hold anything.
///
/// An empty value is not treated as cached: the next read fetches again.
pub trait Vacancy {
    fn is_vacant(&self) -> bool;
}

impl<T> Vacancy for Vec<T> {
    fn is_vacant(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Vacancy for HashMap<K, V> {
    fn is_vacant(&self) -> bool {
        self.is_empty()
    }
}

/// A fetch-once value with an explicit refresh.
///
/// The lock is held across the fetch, so concurrent readers of an empty cache
/// wait for a single request instead of each issuing their own.
pub struct Cached<T> {
    label: &'static str,
    slot: Mutex<Option<T>>,
}

impl<T: Clone + Vacancy> Cached<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached value, fetching it first when the cache is empty or
    /// `force` is set. A failed fetch leaves the previous value in place.
    pub fn get_or_fetch<F>(&self, force: bool, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut slot = self.lock();
        if !force {
            if let Some(value) = slot.as_ref().filter(|value| !value.is_vacant()) {
                debug!("[cache] {} hit", self.label);
                return Ok(value.clone());
            }
        }

        debug!(
            "[cache] {} {}",
            self.label,
            if force { "forced refresh" } else { "miss" }
        );
        let value = fetch()?;
        *slot = Some(value.clone());
        Ok(value)
    }

    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    pub fn is_populated(&self) -> bool {
        self.lock().as_ref().is_some_and(|value| !value.is_vacant())
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
