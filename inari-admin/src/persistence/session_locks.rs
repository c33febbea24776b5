use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use inari_common::SessionId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>;

/// One async lock per session id.
///
/// Every read-modify-write of a session happens while holding its guard, so
/// two requests on the same session can't overwrite each other's changes.
/// Entries are dropped again once nobody holds or waits for them.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    locks: LockMap,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a session.
    pub async fn lock(&self, id: &SessionId) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id.clone()).or_default().clone()
        };

        SessionGuard {
            guard: Some(lock.lock_owned().await),
            id: id.clone(),
            locks: self.locks.clone(),
        }
    }

    /// Number of sessions currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one session, released on drop.
#[derive(Debug)]
pub struct SessionGuard {
    guard: Option<OwnedMutexGuard<()>>,
    id: SessionId,
    locks: LockMap,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Release first, then remove the entry unless another task holds a clone.
        drop(self.guard.take());
        if let Some(lock) = locks.get(&self.id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.id);
            }
        }
    }
}
