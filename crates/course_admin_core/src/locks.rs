//! crates/course_admin_core/src/locks.rs
//!
//! Serializes writers of the same course inside one process, so a concurrent
//! pruning pass cannot delete a module another pass has just created.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct CourseLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CourseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `course_id`. The lock is released
    /// when the guard drops.
    pub async fn acquire(&self, course_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            // Entries nobody holds or waits on can go.
            locks.retain(|id, lock| id == course_id || Arc::strong_count(lock) > 1);
            locks.entry(course_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
