//! Per-priority FIFO ready queues

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::domain::{Pid, PriorityClass};

/// One FIFO ready queue per priority class.
///
/// Insertion order within a level is the sole tie-break among same-priority
/// tasks. Each level sits behind its own mutex so enqueue and consume from
/// different execution units can proceed concurrently without ever handing
/// the same task to two units.
#[derive(Debug)]
pub struct DispatchQueues {
    levels: [Mutex<VecDeque<Pid>>; PriorityClass::LEVELS.len()],
}

impl Default for DispatchQueues {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchQueues {
    pub fn new() -> Self {
        Self {
            levels: std::array::from_fn(|_| Mutex::new(VecDeque::new())),
        }
    }

    /// Append a task to the tail of its class's queue.
    pub fn push(&self, class: PriorityClass, pid: Pid) {
        self.levels[class.level()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(pid);
    }

    /// Pop the head of the highest-priority non-empty queue.
    ///
    /// Walks the fixed set of levels render-first and stops at the first
    /// hit; strict priority with no aging across levels.
    pub fn pop_first(&self) -> Option<(PriorityClass, Pid)> {
        for class in PriorityClass::LEVELS {
            if let Some(pid) = self.levels[class.level()]
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
            {
                return Some((class, pid));
            }
        }
        None
    }

    /// Queued task count at one level.
    pub fn len(&self, class: PriorityClass) -> usize {
        self.levels[class.level()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Queued task count across all levels.
    pub fn total_len(&self) -> usize {
        PriorityClass::LEVELS.iter().map(|&class| self.len(class)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}
