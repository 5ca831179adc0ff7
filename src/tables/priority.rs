//! Bounded pid -> priority class table

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::domain::{Pid, PriorityClass};

use super::TableError;

/// Registered game tasks and their priority classes.
///
/// Bounded at a fixed capacity so worst-case decision latency stays
/// predictable. Insert is an upsert: re-registering a pid overwrites its
/// class and never duplicates. Unregistered pids classify as
/// [`PriorityClass::Normal`].
#[derive(Debug)]
pub struct PriorityTable {
    entries: RwLock<HashMap<Pid, PriorityClass>>,
    capacity: usize,
}

impl PriorityTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
            capacity,
        }
    }

    /// Register or re-register a task.
    ///
    /// Fails with [`TableError::CapacityExceeded`] when the table is full
    /// and `pid` is not already present; existing entries are untouched.
    pub fn insert(&self, pid: Pid, class: PriorityClass) -> Result<(), TableError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&pid) && entries.len() >= self.capacity {
            return Err(TableError::CapacityExceeded { limit: self.capacity });
        }
        entries.insert(pid, class);
        debug!(pid, %class, "registered task priority");
        Ok(())
    }

    /// Effective priority for a task: the stored class, or `Normal` when the
    /// task was never registered. Absence is a valid, common case.
    pub fn get(&self, pid: Pid) -> PriorityClass {
        self.lookup(pid).unwrap_or_default()
    }

    /// The stored class, without the `Normal` default.
    pub fn lookup(&self, pid: Pid) -> Option<PriorityClass> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pid)
            .copied()
    }

    /// Remove a registration. Returns whether an entry existed.
    pub fn remove(&self, pid: Pid) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid)
            .is_some();
        if removed {
            debug!(pid, "removed task priority");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registrations, sorted by pid for stable status output.
    pub fn entries(&self) -> Vec<(Pid, PriorityClass)> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(&pid, &class)| (pid, class))
            .collect();
        all.sort_by_key(|&(pid, _)| pid);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_defaults_to_normal() {
        let table = PriorityTable::new(8);
        assert_eq!(table.get(123), PriorityClass::Normal);
        assert_eq!(table.lookup(123), None);
    }

    #[test]
    fn test_insert_is_upsert() {
        let table = PriorityTable::new(8);
        table.insert(100, PriorityClass::GameOther).unwrap();
        table.insert(100, PriorityClass::Render).unwrap();

        assert_eq!(table.get(100), PriorityClass::Render);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_capacity_rejection_leaves_table_untouched() {
        let table = PriorityTable::new(2);
        table.insert(1, PriorityClass::Render).unwrap();
        table.insert(2, PriorityClass::GameOther).unwrap();

        let err = table.insert(3, PriorityClass::Render).unwrap_err();
        assert_eq!(err, TableError::CapacityExceeded { limit: 2 });
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(3), PriorityClass::Normal);

        // Re-registering an existing pid still works at capacity
        table.insert(1, PriorityClass::GameOther).unwrap();
        assert_eq!(table.get(1), PriorityClass::GameOther);
    }

    #[test]
    fn test_remove_then_classify_normal() {
        let table = PriorityTable::new(8);
        table.insert(7, PriorityClass::Render).unwrap();

        assert!(table.remove(7));
        assert_eq!(table.get(7), PriorityClass::Normal);

        // Removing again is a no-op
        assert!(!table.remove(7));
    }

    #[test]
    fn test_entries_sorted_by_pid() {
        let table = PriorityTable::new(8);
        table.insert(30, PriorityClass::GameOther).unwrap();
        table.insert(10, PriorityClass::Render).unwrap();
        table.insert(20, PriorityClass::Render).unwrap();

        let pids: Vec<_> = table.entries().iter().map(|&(pid, _)| pid).collect();
        assert_eq!(pids, vec![10, 20, 30]);
    }
}
