//! Trace Hooks
//!
//! Control points an adaptive compiler can attach to. The interpreter
//! reports every re-entry into the dispatch loop (a merge point) and every
//! taken `JUMP_IF` (a loop back-edge). Observers only watch: nothing they do
//! can change what the program computes.

use std::collections::HashMap;

use tracing::debug;

use crate::bytecode::BytecodeId;

/// Program point key: a pc within one particular bytecode sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeKey {
    pub code: BytecodeId,
    pub pc: usize,
}

impl MergeKey {
    pub fn new(code: BytecodeId, pc: usize) -> Self {
        MergeKey { code, pc }
    }
}

/// Receives trace events from the dispatch loop.
pub trait TraceObserver {
    /// Called before each instruction fetch.
    fn merge_point(&mut self, _key: MergeKey) {}

    /// Called after a taken `JUMP_IF`, keyed by the jump target.
    fn loop_back(&mut self, _key: MergeKey) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {}

impl<T: TraceObserver + ?Sized> TraceObserver for &mut T {
    fn merge_point(&mut self, key: MergeKey) {
        (**self).merge_point(key)
    }

    fn loop_back(&mut self, key: MergeKey) {
        (**self).loop_back(key)
    }
}

/// Counts merge-point visits and back-edges per program point and flags
/// loop headers whose back-edge count reaches `threshold`.
#[derive(Debug, Clone)]
pub struct HotLoopCounter {
    threshold: u64,
    visits: HashMap<MergeKey, u64>,
    back_edges: HashMap<MergeKey, u64>,
}

impl HotLoopCounter {
    /// A threshold of 0 is treated as 1: a header is hot once it is taken.
    pub fn new(threshold: u64) -> Self {
        HotLoopCounter {
            threshold: threshold.max(1),
            visits: HashMap::new(),
            back_edges: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn visits(&self, key: MergeKey) -> u64 {
        self.visits.get(&key).copied().unwrap_or(0)
    }

    pub fn back_edges(&self, key: MergeKey) -> u64 {
        self.back_edges.get(&key).copied().unwrap_or(0)
    }

    /// Loop headers at or above the threshold, ordered by key
    pub fn hot_loops(&self) -> Vec<(MergeKey, u64)> {
        let mut hot: Vec<_> = self
            .back_edges
            .iter()
            .filter(|&(_, &count)| count >= self.threshold)
            .map(|(&key, &count)| (key, count))
            .collect();
        hot.sort();
        hot
    }
}

impl TraceObserver for HotLoopCounter {
    fn merge_point(&mut self, key: MergeKey) {
        *self.visits.entry(key).or_insert(0) += 1;
    }

    fn loop_back(&mut self, key: MergeKey) {
        let count = self.back_edges.entry(key).or_insert(0);
        *count += 1;
        if *count == self.threshold {
            debug!(pc = key.pc, code = %key.code, count = *count, "loop header became hot");
        }
    }
}
