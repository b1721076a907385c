//! X366 virtual machine implementation.
//!
//! The engine is strictly single-threaded and cooperative: [`Interpreter::step`]
//! executes exactly one instruction, [`Interpreter::run`] schedules repeated
//! steps under a host-provided pacing policy. Hosts plug in through the
//! [`host::Host`] trait (output sink, input provider, filesystem, display);
//! state is observable between steps and the last 100 steps can be rolled
//! back through the undo journal.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod consts;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod memory;
pub mod params;
pub mod registers;
pub mod state;
pub mod util;

/// Working-set re-exports.
pub mod prelude {
    pub use x366_asm::{Instruction, Opcode, Reg, Syscall, Word};
    pub use x366_bin::{Binary, DebugInfo, MemorySize, Symbol, SymbolKind};

    pub use crate::error::{ExecutionError, LoadError};
    pub use crate::host::{BlobStore, Display, Host, NullHost};
    pub use crate::interpreter::{Interpreter, LoadReport};
    pub use crate::memory::Memory;
    pub use crate::params::VmParams;
    pub use crate::registers::{Flags, RegisterFile, Width};
    pub use crate::state::{ExecuteState, Pacing, RunState};
    pub use crate::util::BufferedHost;
}
