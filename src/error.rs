//! Runtime and loader error types.

use thiserror::Error;
use x366_bin::BinError;

/// Fatal execution errors. Any of these halts the engine; the host may
/// still inspect registers and memory afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A read or write landed outside memory and outside the framebuffer
    /// window.
    #[error("memory access out of bounds: 0x{0:04X}")]
    MemoryOutOfBounds(u16),
    /// `DIV` with a zero divisor.
    #[error("division by zero at PC 0x{pc:04X}")]
    DivisionByZero {
        /// Address of the offending instruction.
        pc: u16,
    },
    /// The byte at `PC` is not a known opcode.
    #[error("unknown opcode 0x{opcode:02X} at PC 0x{pc:04X}")]
    UnknownOpcode {
        /// The unrecognized byte.
        opcode: u8,
        /// Address it was fetched from.
        pc: u16,
    },
    /// `POP` or `RET` with the stack pointer at or above memory size.
    #[error("stack underflow at PC 0x{pc:04X}")]
    StackUnderflow {
        /// Address of the offending instruction.
        pc: u16,
    },
    /// `resize` cannot shrink below the break pointer.
    #[error("cannot resize memory to {new_size} bytes with break at 0x{bk:04X}")]
    ResizeBelowBreak {
        /// Requested size.
        new_size: usize,
        /// Current break pointer.
        bk: u16,
    },
}

/// Failures while loading a binary into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The container itself is malformed.
    #[error(transparent)]
    Container(#[from] BinError),
    /// The code/data image (or the appended command line) does not fit
    /// the declared memory, or code runs past `size - 2`.
    #[error("image of {0} bytes does not fit the declared memory size")]
    ImageOverrun(usize),
}
