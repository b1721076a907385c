//! Runtime state representation for the engine.

use std::time::Duration;

/// Resulting state of a single executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteState {
    /// Execution should proceed normally.
    Proceed,
    /// The machine halted (`HLT` or the EXIT syscall); further steps are
    /// no-ops.
    Halt,
}

impl ExecuteState {
    /// Whether the engine should keep stepping.
    pub const fn should_continue(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

impl Default for ExecuteState {
    fn default() -> Self {
        Self::Proceed
    }
}

/// Why [`run`](crate::interpreter::Interpreter::run) returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// The machine halted.
    Halted,
    /// The pacing budget was exhausted with the machine still runnable.
    Yielded,
    /// The cancel signal was observed at a yield boundary. The in-flight
    /// instruction completed first.
    Cancelled,
}

/// Host-provided pacing policy for [`run`](crate::interpreter::Interpreter::run):
/// how much work to do between yields back to the host loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Instructions per yield slice.
    pub instructions_per_yield: u32,
    /// Optional wall-clock bound per yield slice.
    pub deadline: Option<Duration>,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            instructions_per_yield: 10_000,
            deadline: None,
        }
    }
}
