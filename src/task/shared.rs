//! Lists shared by reference between task nodes.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Serialize, Serializer};

/// A list whose clones all see the same storage.
///
/// Siblings hold the same idea list and every node holds the run-wide comment
/// list, so an append through any handle is visible through all of them.
#[derive(Debug)]
pub struct SharedList<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for SharedList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedList<T> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(items)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock leaves the Vec itself intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.lock().extend(items);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether both handles point at the same list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SharedList<T> {
    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }
}

impl<T: Serialize> Serialize for SharedList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lock().serialize(serializer)
    }
}
