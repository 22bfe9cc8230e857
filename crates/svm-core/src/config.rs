//! SVM Configuration
//!
//! Runtime limits for a single `run`. Configuration specifies constraints
//! only; enforcement is handled by the interpreter.

/// Operand stack capacity used when none is configured.
pub const DEFAULT_STACK_CAPACITY: usize = 8;

/// VM Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvmConfig {
    /// Number of operand stack slots in each frame
    pub stack_capacity: usize,

    /// Maximum number of dispatched instructions, or `None` for no limit
    pub step_budget: Option<u64>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        SvmConfig {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            step_budget: None,
        }
    }
}

impl SvmConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = Some(budget);
        self
    }
}
