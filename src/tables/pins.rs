//! Bounded pid -> CPU pin table

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::domain::{CpuId, Pid};

use super::TableError;

/// Hard task-to-CPU bindings.
///
/// A pin is an explicit override: the CPU selector honors it before the
/// isolation policy and the default placement heuristic. Same capacity bound
/// as the priority table. A stored negative CPU means "unpinned", mirroring
/// the admin convention for clearing a pin without removing the entry.
#[derive(Debug)]
pub struct PinTable {
    entries: RwLock<HashMap<Pid, CpuId>>,
    capacity: usize,
}

impl PinTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
        }
    }

    /// Pin a task to a CPU (upsert).
    pub fn pin(&self, pid: Pid, cpu: CpuId) -> Result<(), TableError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&pid) && entries.len() >= self.capacity {
            return Err(TableError::CapacityExceeded { limit: self.capacity });
        }
        entries.insert(pid, cpu);
        debug!(pid, cpu, "pinned task");
        Ok(())
    }

    /// The CPU a task is pinned to, if any.
    ///
    /// Negative stored values read as unpinned.
    pub fn pinned_cpu(&self, pid: Pid) -> Option<CpuId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pid)
            .copied()
            .filter(|&cpu| cpu >= 0)
    }

    /// Remove a pin entry. Returns whether one existed.
    pub fn remove(&self, pid: Pid) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_and_lookup() {
        let pins = PinTable::new(8);
        pins.pin(100, 5).unwrap();

        assert_eq!(pins.pinned_cpu(100), Some(5));
        assert_eq!(pins.pinned_cpu(200), None);
    }

    #[test]
    fn test_negative_cpu_reads_unpinned() {
        let pins = PinTable::new(8);
        pins.pin(100, -1).unwrap();
        assert_eq!(pins.pinned_cpu(100), None);
    }

    #[test]
    fn test_pin_is_upsert() {
        let pins = PinTable::new(8);
        pins.pin(100, 2).unwrap();
        pins.pin(100, 7).unwrap();

        assert_eq!(pins.pinned_cpu(100), Some(7));
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn test_capacity_rejection() {
        let pins = PinTable::new(1);
        pins.pin(1, 0).unwrap();

        let err = pins.pin(2, 0).unwrap_err();
        assert_eq!(err, TableError::CapacityExceeded { limit: 1 });
        assert_eq!(pins.len(), 1);
    }

    #[test]
    fn test_remove() {
        let pins = PinTable::new(8);
        pins.pin(100, 3).unwrap();

        assert!(pins.remove(100));
        assert!(!pins.remove(100));
        assert_eq!(pins.pinned_cpu(100), None);
    }
}
