use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) type CollectionLock = Arc<RwLock<()>>;

/// One reader/writer lock per collection name, created on first use.
///
/// Entries are never removed: collections are never deleted, and the set of
/// names a process touches is small.
#[derive(Default)]
pub(crate) struct LockRegistry {
    locks: Mutex<HashMap<String, CollectionLock>>,
}

impl LockRegistry {
    pub(crate) fn handle(&self, name: &str) -> CollectionLock {
        let mut locks = self.locks.lock();
        if let Some(lock) = locks.get(name) {
            return Arc::clone(lock);
        }
        let lock = CollectionLock::default();
        locks.insert(name.to_string(), Arc::clone(&lock));
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_shares_a_lock() {
        let registry = LockRegistry::default();
        let a = registry.handle("rebels-ranking");
        let b = registry.handle("rebels-ranking");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_names_do_not_block_each_other() {
        let registry = LockRegistry::default();
        let a = registry.handle("rebels-ranking");
        let b = registry.handle("notifications");
        let _held = a.write();
        assert!(b.try_write().is_some());
    }
}
