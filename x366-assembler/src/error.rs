use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmErrorKind {
    /// The first word of the line is not a known mnemonic or directive.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// The operands do not match any encoding of the mnemonic.
    #[error("invalid operands for `{mnemonic}` ({got})")]
    InvalidOperand {
        /// The mnemonic as written.
        mnemonic: String,
        /// Human-readable shape of the operands that were found.
        got: String,
    },
    /// A label was referenced but never defined.
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    /// The value does not fit the field this encoding gives it.
    #[error("immediate {0} out of range for this encoding")]
    OutOfRangeImmediate(i64),
    /// `MOV [addr], imm` only carries a byte immediate.
    #[error(
        "immediate {0} does not fit in a byte; use `MOV reg, {0}` followed by `MOV [addr], reg`"
    )]
    DirectImmediateTooWide(i64),
    /// A numeric literal could not be parsed.
    #[error("bad numeric literal `{0}`")]
    BadNumericLiteral(String),
    /// A character literal is malformed or uses an unknown escape.
    #[error("bad character literal")]
    BadCharLiteral,
    /// A string literal is unterminated or uses an unknown escape.
    #[error("bad string literal")]
    BadStringLiteral,
    /// `.MEMORY` takes one of 1K, 2K, 4K, 8K, 16K.
    #[error("invalid memory size `{0}` (expected 1K, 2K, 4K, 8K or 16K)")]
    InvalidMemorySize(String),
    /// The same label resolved to two different addresses.
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),
    /// Code and data do not fit the declared memory size.
    #[error("program needs more than the declared {declared} bytes of memory")]
    ProgramTooLarge {
        /// Memory size the binary declares.
        declared: usize,
    },
    /// A line could not be tokenized or classified.
    #[error("malformed line: {0}")]
    MalformedLine(String),
}

/// An assembler error, pinned to its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct AssembleError {
    /// 1-based line in the source text.
    pub line: u32,
    /// The failure itself.
    pub kind: AsmErrorKind,
}

impl AssembleError {
    pub(crate) fn new(line: u32, kind: AsmErrorKind) -> Self {
        Self { line, kind }
    }
}
