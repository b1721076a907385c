//! Canonical textual rendering of decoded instructions.
//!
//! This is the form the memory visualizer shows when rendering bytes as
//! instructions: upper-case mnemonic, comma-separated operands, memory
//! operands in brackets, addresses as 4-digit upper-case hex, immediates
//! as upper-case hex, offsets in signed decimal.

use core::fmt;

use crate::instruction::Instruction;
use crate::reg::Reg;
use crate::syscall::Syscall;

/// A `[base]` / `[base+k]` / `[base-k]` operand.
struct Rel(Reg, i8);

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rel(base, offset) = *self;
        match offset {
            0 => write!(f, "[{base}]"),
            k if k < 0 => write!(f, "[{base}{k}]"),
            k => write!(f, "[{base}+{k}]"),
        }
    }
}

/// Low-byte alias spelling, falling back to the word name for the two
/// registers without one.
struct ByteReg(Reg);

impl fmt::Display for ByteReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.byte_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction as I;

        match *self {
            I::NOP => f.write_str("NOP"),
            I::HLT => f.write_str("HLT"),
            I::RET => f.write_str("RET"),

            I::MOV_RR { dst, src } => write!(f, "MOV {dst}, {src}"),
            I::MOV_RI { dst, imm } => write!(f, "MOV {dst}, {imm:X}"),
            I::LOAD { dst, addr } => write!(f, "MOV {dst}, [{addr:04X}]"),
            I::LOADB { dst, addr } => write!(f, "MOV {}, [{addr:04X}]", ByteReg(dst)),
            I::STORE { src, addr } => write!(f, "MOV [{addr:04X}], {src}"),
            I::STOREB { src, addr } => write!(f, "MOV [{addr:04X}], {}", ByteReg(src)),
            I::LOADR { dst, base, offset } => write!(f, "MOV {dst}, {}", Rel(base, offset)),
            I::LOADBR { dst, base, offset } => {
                write!(f, "MOV {}, {}", ByteReg(dst), Rel(base, offset))
            }
            I::STORER { src, base, offset } => write!(f, "MOV {}, {src}", Rel(base, offset)),
            I::STOREBR { src, base, offset } => {
                write!(f, "MOV {}, {}", Rel(base, offset), ByteReg(src))
            }
            I::LEA { dst, base, offset } => write!(f, "LEA {dst}, {}", Rel(base, offset)),
            I::STOREI { base, imm } => write!(f, "MOV [{base}], {imm:X}"),
            I::STOREI_DIRECT { addr, imm } => write!(f, "MOV [{addr:04X}], {imm:X}"),
            I::LOADX { dst, base, index } => write!(f, "MOV {dst}, [{base}+{index}]"),
            I::STOREX { src, base, index } => write!(f, "MOV [{base}+{index}], {src}"),

            I::INC_MEM { addr } => write!(f, "INC [{addr:04X}]"),
            I::DEC_MEM { addr } => write!(f, "DEC [{addr:04X}]"),
            I::INC_MEMR { base, offset } => write!(f, "INC {}", Rel(base, offset)),
            I::DEC_MEMR { base, offset } => write!(f, "DEC {}", Rel(base, offset)),
            I::INC_REG { reg } => write!(f, "INC {reg}"),
            I::DEC_REG { reg } => write!(f, "DEC {reg}"),

            I::ADD_RR { dst, src } => write!(f, "ADD {dst}, {src}"),
            I::ADD_RI { dst, imm } => write!(f, "ADD {dst}, {imm:X}"),
            I::ADD_MEM { dst, addr } => write!(f, "ADD {dst}, [{addr:04X}]"),
            I::ADD_MEMR { dst, base, offset } => write!(f, "ADD {dst}, {}", Rel(base, offset)),
            I::SUB_RR { dst, src } => write!(f, "SUB {dst}, {src}"),
            I::SUB_RI { dst, imm } => write!(f, "SUB {dst}, {imm:X}"),
            I::SUB_MEM { dst, addr } => write!(f, "SUB {dst}, [{addr:04X}]"),
            I::SUB_MEMR { dst, base, offset } => write!(f, "SUB {dst}, {}", Rel(base, offset)),
            I::MUL { src } => write!(f, "MUL {src}"),
            I::DIV { src } => write!(f, "DIV {src}"),

            I::AND_RR { dst, src } => write!(f, "AND {dst}, {src}"),
            I::AND_RI { dst, imm } => write!(f, "AND {dst}, {imm:X}"),
            I::OR_RR { dst, src } => write!(f, "OR {dst}, {src}"),
            I::OR_RI { dst, imm } => write!(f, "OR {dst}, {imm:X}"),
            I::XOR_RR { dst, src } => write!(f, "XOR {dst}, {src}"),
            I::XOR_RI { dst, imm } => write!(f, "XOR {dst}, {imm:X}"),
            I::NOT { reg } => write!(f, "NOT {reg}"),
            I::SHL { dst, imm } => write!(f, "SHL {dst}, {imm:X}"),
            I::SHR { dst, imm } => write!(f, "SHR {dst}, {imm:X}"),

            I::CMP_RR { lhs, rhs } => write!(f, "CMP {lhs}, {rhs}"),
            I::CMP_RI { lhs, imm } => write!(f, "CMP {lhs}, {imm:X}"),
            I::CMP_MEM { lhs, addr } => write!(f, "CMP {lhs}, [{addr:04X}]"),
            I::CMP_MEMR { lhs, base, offset } => write!(f, "CMP {lhs}, {}", Rel(base, offset)),

            I::JMP { addr } => write!(f, "JMP {addr:04X}"),
            I::JE { addr } => write!(f, "JE {addr:04X}"),
            I::JNE { addr } => write!(f, "JNE {addr:04X}"),
            I::JL { addr } => write!(f, "JL {addr:04X}"),
            I::JG { addr } => write!(f, "JG {addr:04X}"),
            I::JLE { addr } => write!(f, "JLE {addr:04X}"),
            I::JGE { addr } => write!(f, "JGE {addr:04X}"),
            I::LOOP { addr } => write!(f, "LOOP {addr:04X}"),
            I::CALL { addr } => write!(f, "CALL {addr:04X}"),

            I::PUSH { reg } => write!(f, "PUSH {reg}"),
            I::POP { reg } => write!(f, "POP {reg}"),

            I::SYSCALL { code } => match Syscall::from_code(code) {
                Some(call) => write!(f, "SYSCALL {call}"),
                None => write!(f, "SYSCALL {code:X}"),
            },
        }
    }
}
