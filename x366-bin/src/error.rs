use thiserror::Error;

/// Failures while reading or writing the binary container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BinError {
    /// The first eight bytes are not the `Go Cats!` signature.
    #[error("bad signature: not an X366 binary")]
    BadSignature,
    /// The byte string ends inside the fixed header.
    #[error("truncated header: {0} bytes")]
    TruncatedHeader(usize),
    /// The declared memory size is not one of the supported sizes.
    #[error("unsupported memory size: {0}")]
    UnsupportedMemorySize(u16),
    /// A section offset or length points past the end of the buffer.
    #[error("section record overruns the binary")]
    SectionOverrun,
    /// The debug section payload is malformed.
    #[error("malformed debug section")]
    MalformedDebugInfo,
}
