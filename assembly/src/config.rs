/// Default bound on the number of executed instructions.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;
/// Default number of data memory words.
pub const DEFAULT_MEMORY_SIZE: u32 = 1024;
/// Default stack capacity, in values.
pub const DEFAULT_STACK_SIZE: usize = 256;

/// Limits applied to one program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of instructions a run may execute. A run that would go
    /// past it fails with `StepLimitExceeded` instead of looping forever.
    pub step_limit: usize,
    /// Number of addressable data memory words.
    pub memory_size: u32,
    /// Maximum number of values on the stack.
    pub stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}
