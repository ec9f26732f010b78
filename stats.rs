//! Process-lifetime diagnostics counters. Not a metrics/observability layer
//! (no export path, no labels, no histograms) — just enough for an offline
//! consumer to sanity-check "did the agent actually run" after the fact,
//! the same way the teacher crate favors a plain atomic counter over a
//! dependency whenever the job is a running total.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AgentStats {
    hooks_installed: AtomicU64,
    native_hooks_installed: AtomicU64,
    hits_dispatched: AtomicU64,
    invariant_violations: AtomicU64,
}

/// Point-in-time read of [`AgentStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStatsSnapshot {
    pub hooks_installed: u64,
    pub native_hooks_installed: u64,
    pub hits_dispatched: u64,
    pub invariant_violations: u64,
}

impl AgentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hook_installed(&self) {
        self.hooks_installed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_native_hook_installed(&self) {
        self.native_hooks_installed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit_dispatched(&self) {
        self.hits_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AgentStatsSnapshot {
        AgentStatsSnapshot {
            hooks_installed: self.hooks_installed.load(Ordering::Relaxed),
            native_hooks_installed: self.native_hooks_installed.load(Ordering::Relaxed),
            hits_dispatched: self.hits_dispatched.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let stats = AgentStats::new();
        stats.record_hook_installed();
        stats.record_hook_installed();
        stats.record_hit_dispatched();
        let snap = stats.snapshot();
        assert_eq!(snap.hooks_installed, 2);
        assert_eq!(snap.hits_dispatched, 1);
        assert_eq!(snap.native_hooks_installed, 0);
    }
}
