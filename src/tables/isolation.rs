//! CPU isolation flags

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::domain::{CpuId, MAX_CPUS};

/// Which CPUs are isolated for game threads.
///
/// A fixed array of flags covering the full execution-unit domain, gated by
/// an enable flag fixed at scheduler start. When isolation is disabled the
/// stored flags are inert and no CPU is treated as isolated. Out-of-domain
/// CPU ids read as "not isolated" (fail-open): failing closed could stall a
/// task indefinitely.
#[derive(Debug)]
pub struct IsolationSet {
    enabled: bool,
    flags: Vec<AtomicBool>,
}

impl IsolationSet {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            flags: (0..MAX_CPUS).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Whether isolation enforcement is active at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `cpu` is isolated.
    ///
    /// False when isolation is globally disabled or `cpu` falls outside the
    /// valid domain.
    pub fn is_isolated(&self, cpu: CpuId) -> bool {
        if !self.enabled || cpu < 0 {
            return false;
        }
        self.flags
            .get(cpu as usize)
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Mark an explicit list of CPUs isolated.
    ///
    /// Out-of-domain ids are skipped. Returns how many flags were set.
    pub fn set(&self, cpus: &[CpuId]) -> usize {
        let mut applied = 0;
        for &cpu in cpus {
            if cpu < 0 {
                continue;
            }
            if let Some(flag) = self.flags.get(cpu as usize) {
                flag.store(true, Ordering::Relaxed);
                applied += 1;
            }
        }
        debug!(applied, "updated isolated cpus");
        applied
    }

    /// Clear every isolation flag.
    pub fn clear(&self) {
        for flag in &self.flags {
            flag.store(false, Ordering::Relaxed);
        }
        debug!("cleared cpu isolation");
    }

    /// CPUs with the isolation flag set, regardless of the enable gate.
    ///
    /// The status surface reports stored flags even while isolation is
    /// disabled, matching what the admin interface wrote.
    pub fn isolated_cpus(&self) -> Vec<CpuId> {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| flag.load(Ordering::Relaxed))
            .map(|(cpu, _)| cpu as CpuId)
            .collect()
    }
}
