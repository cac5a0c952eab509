use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::workflows::allocation::repository::{PersistenceError, PersistenceGateway};
use crate::workflows::allocation::snapshot::Snapshot;

/// Gateway holding the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    snapshot: Mutex<Snapshot>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryGateway {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Number of successful saves since construction.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail with `PersistenceError::Unavailable`.
    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Result<Snapshot, PersistenceError> {
        self.load()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self) -> Result<Snapshot, PersistenceError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store rejecting writes".to_string(),
            ));
        }
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store poisoned".to_string()))?;
        *guard = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
