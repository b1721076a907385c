//! The X366 binary container.
//!
//! A self-describing byte string produced by the assembler and consumed
//! by the loader: a fixed 32-byte header, the contiguous code and data
//! image, and an optional trailing area of TLV sections (debug info
//! among them).

#![warn(missing_docs)]

mod container;
mod debug;
mod error;

pub use container::{
    Binary, MemorySize, Section, HEADER_LEN, SECTION_DEBUG, SECTION_END, SIGNATURE,
};
pub use debug::{DebugInfo, Symbol, SymbolKind};
pub use error::BinError;
