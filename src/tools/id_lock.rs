use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

/// Advisory locks keyed by string id, created on demand and dropped as soon as
/// the holder releases them.
///
/// Used to make the multi-step register sequence exactly-once per content id,
/// and to serialize read-modify-write cycles on one video's cue sheet.
#[derive(Debug, Default)]
pub struct IdLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Releases its id when dropped.
#[derive(Debug)]
pub struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: String,
}

impl IdLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other guard holds `id`, then takes it.
    pub fn acquire(&self, id: &str) -> IdGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(id) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(id.to_string());

        IdGuard {
            locks: self,
            id: id.to_string(),
        }
    }
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.id);
        self.locks.released.notify_all();
    }
}
