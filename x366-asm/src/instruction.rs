use crate::opcode::{InvalidOpcode, Opcode};
use crate::reg::Reg;
use crate::{Addr, Word};

/// A fully decoded instruction.
///
/// One variant per opcode, with every operand field resolved to its
/// semantic type. The execution engine pattern-matches exhaustively over
/// this; unknown opcode bytes surface as [`InvalidOpcode`] at decode time
/// rather than as a default-branch surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types, missing_docs)]
pub enum Instruction {
    NOP,
    HLT,

    MOV_RR { dst: Reg, src: Reg },
    MOV_RI { dst: Reg, imm: Word },
    LOAD { dst: Reg, addr: Addr },
    LOADB { dst: Reg, addr: Addr },
    STORE { src: Reg, addr: Addr },
    STOREB { src: Reg, addr: Addr },
    LOADR { dst: Reg, base: Reg, offset: i8 },
    LOADBR { dst: Reg, base: Reg, offset: i8 },
    STORER { src: Reg, base: Reg, offset: i8 },
    STOREBR { src: Reg, base: Reg, offset: i8 },
    LEA { dst: Reg, base: Reg, offset: i8 },
    STOREI { base: Reg, imm: Word },
    STOREI_DIRECT { addr: Addr, imm: u8 },

    INC_MEM { addr: Addr },
    DEC_MEM { addr: Addr },
    INC_MEMR { base: Reg, offset: i8 },
    DEC_MEMR { base: Reg, offset: i8 },

    ADD_RR { dst: Reg, src: Reg },
    ADD_RI { dst: Reg, imm: Word },
    ADD_MEM { dst: Reg, addr: Addr },
    ADD_MEMR { dst: Reg, base: Reg, offset: i8 },
    SUB_RR { dst: Reg, src: Reg },
    SUB_RI { dst: Reg, imm: Word },
    SUB_MEM { dst: Reg, addr: Addr },
    SUB_MEMR { dst: Reg, base: Reg, offset: i8 },
    MUL { src: Reg },
    DIV { src: Reg },
    INC_REG { reg: Reg },
    DEC_REG { reg: Reg },
    LOADX { dst: Reg, base: Reg, index: Reg },
    STOREX { src: Reg, base: Reg, index: Reg },

    AND_RR { dst: Reg, src: Reg },
    AND_RI { dst: Reg, imm: Word },
    OR_RR { dst: Reg, src: Reg },
    OR_RI { dst: Reg, imm: Word },
    XOR_RR { dst: Reg, src: Reg },
    XOR_RI { dst: Reg, imm: Word },
    NOT { reg: Reg },
    SHL { dst: Reg, imm: Word },
    SHR { dst: Reg, imm: Word },

    CMP_RR { lhs: Reg, rhs: Reg },
    CMP_RI { lhs: Reg, imm: Word },
    CMP_MEM { lhs: Reg, addr: Addr },
    CMP_MEMR { lhs: Reg, base: Reg, offset: i8 },

    JMP { addr: Addr },
    JE { addr: Addr },
    JNE { addr: Addr },
    JL { addr: Addr },
    JG { addr: Addr },
    JLE { addr: Addr },
    JGE { addr: Addr },
    LOOP { addr: Addr },

    PUSH { reg: Reg },
    POP { reg: Reg },
    CALL { addr: Addr },
    RET,

    SYSCALL { code: u8 },
}

// The address-byte ordering of 4-byte instructions is a compatibility
// quirk: load-family addresses and 16-bit immediates travel
// high-byte-first, while store-family and jump/call targets travel
// low-byte-first. These two helper pairs are the only conversion sites;
// every decode/encode arm below picks exactly one of them.

/// High-byte-first field: loads and 16-bit immediates.
const fn word_be(hi: u8, lo: u8) -> Word {
    u16::from_be_bytes([hi, lo])
}

const fn word_be_bytes(w: Word) -> [u8; 2] {
    w.to_be_bytes()
}

/// Low-byte-first field: store addresses and jump/call targets.
const fn word_le(lo: u8, hi: u8) -> Word {
    u16::from_le_bytes([lo, hi])
}

const fn word_le_bytes(w: Word) -> [u8; 2] {
    w.to_le_bytes()
}

impl Instruction {
    /// Decode an instruction from four bytes.
    ///
    /// Only the first two bytes are read for 2-byte forms; callers may
    /// pad the tail with anything when fetching near the top of memory.
    pub fn decode(bytes: [u8; 4]) -> Result<Self, InvalidOpcode> {
        use Instruction as I;

        let op = Opcode::try_from(bytes[0])?;
        let [_, b1, b2, b3] = bytes;
        let reg = Reg::from_wire(b1);

        let inst = match op {
            Opcode::NOP => I::NOP,
            Opcode::HLT => I::HLT,
            Opcode::RET => I::RET,

            Opcode::PUSH => I::PUSH { reg },
            Opcode::POP => I::POP { reg },
            Opcode::MUL => I::MUL { src: reg },
            Opcode::DIV => I::DIV { src: reg },
            Opcode::INC_REG => I::INC_REG { reg },
            Opcode::DEC_REG => I::DEC_REG { reg },
            Opcode::NOT => I::NOT { reg },
            Opcode::SYSCALL => I::SYSCALL { code: b1 },

            Opcode::MOV_RR => I::MOV_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::ADD_RR => I::ADD_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::SUB_RR => I::SUB_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::AND_RR => I::AND_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::OR_RR => I::OR_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::XOR_RR => I::XOR_RR { dst: reg, src: Reg::from_wire(b2) },
            Opcode::CMP_RR => I::CMP_RR { lhs: reg, rhs: Reg::from_wire(b2) },

            Opcode::MOV_RI => I::MOV_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::ADD_RI => I::ADD_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::SUB_RI => I::SUB_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::AND_RI => I::AND_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::OR_RI => I::OR_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::XOR_RI => I::XOR_RI { dst: reg, imm: word_be(b2, b3) },
            Opcode::SHL => I::SHL { dst: reg, imm: word_be(b2, b3) },
            Opcode::SHR => I::SHR { dst: reg, imm: word_be(b2, b3) },
            Opcode::CMP_RI => I::CMP_RI { lhs: reg, imm: word_be(b2, b3) },
            Opcode::STOREI => I::STOREI { base: reg, imm: word_be(b2, b3) },

            Opcode::LOAD => I::LOAD { dst: reg, addr: word_be(b2, b3) },
            Opcode::LOADB => I::LOADB { dst: reg, addr: word_be(b2, b3) },
            Opcode::ADD_MEM => I::ADD_MEM { dst: reg, addr: word_be(b2, b3) },
            Opcode::SUB_MEM => I::SUB_MEM { dst: reg, addr: word_be(b2, b3) },
            Opcode::CMP_MEM => I::CMP_MEM { lhs: reg, addr: word_be(b2, b3) },
            Opcode::INC_MEM => I::INC_MEM { addr: word_be(b2, b3) },
            Opcode::DEC_MEM => I::DEC_MEM { addr: word_be(b2, b3) },

            Opcode::STORE => I::STORE { src: reg, addr: word_le(b2, b3) },
            Opcode::STOREB => I::STOREB { src: reg, addr: word_le(b2, b3) },
            Opcode::STOREI_DIRECT => I::STOREI_DIRECT { addr: word_le(b1, b2), imm: b3 },

            Opcode::LOADR => I::LOADR { dst: reg, base: Reg::from_wire(b2), offset: b3 as i8 },
            Opcode::LOADBR => I::LOADBR { dst: reg, base: Reg::from_wire(b2), offset: b3 as i8 },
            Opcode::STORER => I::STORER { src: reg, base: Reg::from_wire(b2), offset: b3 as i8 },
            Opcode::STOREBR => {
                I::STOREBR { src: reg, base: Reg::from_wire(b2), offset: b3 as i8 }
            }
            Opcode::LEA => I::LEA { dst: reg, base: Reg::from_wire(b2), offset: b3 as i8 },
            Opcode::ADD_MEMR => {
                I::ADD_MEMR { dst: reg, base: Reg::from_wire(b2), offset: b3 as i8 }
            }
            Opcode::SUB_MEMR => {
                I::SUB_MEMR { dst: reg, base: Reg::from_wire(b2), offset: b3 as i8 }
            }
            Opcode::CMP_MEMR => {
                I::CMP_MEMR { lhs: reg, base: Reg::from_wire(b2), offset: b3 as i8 }
            }
            Opcode::INC_MEMR => I::INC_MEMR { base: Reg::from_wire(b2), offset: b3 as i8 },
            Opcode::DEC_MEMR => I::DEC_MEMR { base: Reg::from_wire(b2), offset: b3 as i8 },

            Opcode::LOADX => I::LOADX {
                dst: reg,
                base: Reg::from_wire(b2),
                index: Reg::from_wire(b3),
            },
            Opcode::STOREX => I::STOREX {
                src: reg,
                base: Reg::from_wire(b2),
                index: Reg::from_wire(b3),
            },

            Opcode::JMP => I::JMP { addr: word_le(b2, b3) },
            Opcode::JE => I::JE { addr: word_le(b2, b3) },
            Opcode::JNE => I::JNE { addr: word_le(b2, b3) },
            Opcode::JL => I::JL { addr: word_le(b2, b3) },
            Opcode::JG => I::JG { addr: word_le(b2, b3) },
            Opcode::JLE => I::JLE { addr: word_le(b2, b3) },
            Opcode::JGE => I::JGE { addr: word_le(b2, b3) },
            Opcode::LOOP => I::LOOP { addr: word_le(b2, b3) },
            Opcode::CALL => I::CALL { addr: word_le(b2, b3) },
        };

        Ok(inst)
    }

    /// The opcode byte family this instruction encodes to.
    pub const fn opcode(&self) -> Opcode {
        use Instruction as I;
        match self {
            I::NOP => Opcode::NOP,
            I::HLT => Opcode::HLT,
            I::MOV_RR { .. } => Opcode::MOV_RR,
            I::MOV_RI { .. } => Opcode::MOV_RI,
            I::LOAD { .. } => Opcode::LOAD,
            I::LOADB { .. } => Opcode::LOADB,
            I::STORE { .. } => Opcode::STORE,
            I::STOREB { .. } => Opcode::STOREB,
            I::LOADR { .. } => Opcode::LOADR,
            I::LOADBR { .. } => Opcode::LOADBR,
            I::STORER { .. } => Opcode::STORER,
            I::STOREBR { .. } => Opcode::STOREBR,
            I::LEA { .. } => Opcode::LEA,
            I::STOREI { .. } => Opcode::STOREI,
            I::STOREI_DIRECT { .. } => Opcode::STOREI_DIRECT,
            I::INC_MEM { .. } => Opcode::INC_MEM,
            I::DEC_MEM { .. } => Opcode::DEC_MEM,
            I::INC_MEMR { .. } => Opcode::INC_MEMR,
            I::DEC_MEMR { .. } => Opcode::DEC_MEMR,
            I::ADD_RR { .. } => Opcode::ADD_RR,
            I::ADD_RI { .. } => Opcode::ADD_RI,
            I::ADD_MEM { .. } => Opcode::ADD_MEM,
            I::ADD_MEMR { .. } => Opcode::ADD_MEMR,
            I::SUB_RR { .. } => Opcode::SUB_RR,
            I::SUB_RI { .. } => Opcode::SUB_RI,
            I::SUB_MEM { .. } => Opcode::SUB_MEM,
            I::SUB_MEMR { .. } => Opcode::SUB_MEMR,
            I::MUL { .. } => Opcode::MUL,
            I::DIV { .. } => Opcode::DIV,
            I::INC_REG { .. } => Opcode::INC_REG,
            I::DEC_REG { .. } => Opcode::DEC_REG,
            I::LOADX { .. } => Opcode::LOADX,
            I::STOREX { .. } => Opcode::STOREX,
            I::AND_RR { .. } => Opcode::AND_RR,
            I::AND_RI { .. } => Opcode::AND_RI,
            I::OR_RR { .. } => Opcode::OR_RR,
            I::OR_RI { .. } => Opcode::OR_RI,
            I::XOR_RR { .. } => Opcode::XOR_RR,
            I::XOR_RI { .. } => Opcode::XOR_RI,
            I::NOT { .. } => Opcode::NOT,
            I::SHL { .. } => Opcode::SHL,
            I::SHR { .. } => Opcode::SHR,
            I::CMP_RR { .. } => Opcode::CMP_RR,
            I::CMP_RI { .. } => Opcode::CMP_RI,
            I::CMP_MEM { .. } => Opcode::CMP_MEM,
            I::CMP_MEMR { .. } => Opcode::CMP_MEMR,
            I::JMP { .. } => Opcode::JMP,
            I::JE { .. } => Opcode::JE,
            I::JNE { .. } => Opcode::JNE,
            I::JL { .. } => Opcode::JL,
            I::JG { .. } => Opcode::JG,
            I::JLE { .. } => Opcode::JLE,
            I::JGE { .. } => Opcode::JGE,
            I::LOOP { .. } => Opcode::LOOP,
            I::PUSH { .. } => Opcode::PUSH,
            I::POP { .. } => Opcode::POP,
            I::CALL { .. } => Opcode::CALL,
            I::RET => Opcode::RET,
            I::SYSCALL { .. } => Opcode::SYSCALL,
        }
    }

    /// Encoded width in bytes (2 or 4).
    pub const fn size(&self) -> u16 {
        self.opcode().size()
    }

    /// Encode to wire bytes. Only the first [`Instruction::size`] bytes
    /// of the returned array are meaningful.
    pub fn to_bytes(&self) -> [u8; 4] {
        use Instruction as I;

        let op = self.opcode() as u8;
        match *self {
            I::NOP | I::HLT | I::RET => [op, 0, 0, 0],

            I::PUSH { reg }
            | I::POP { reg }
            | I::INC_REG { reg }
            | I::DEC_REG { reg }
            | I::NOT { reg } => [op, reg.code(), 0, 0],
            I::MUL { src } | I::DIV { src } => [op, src.code(), 0, 0],
            I::SYSCALL { code } => [op, code, 0, 0],

            I::MOV_RR { dst, src }
            | I::ADD_RR { dst, src }
            | I::SUB_RR { dst, src }
            | I::AND_RR { dst, src }
            | I::OR_RR { dst, src }
            | I::XOR_RR { dst, src } => [op, dst.code(), src.code(), 0],
            I::CMP_RR { lhs, rhs } => [op, lhs.code(), rhs.code(), 0],

            I::MOV_RI { dst, imm }
            | I::ADD_RI { dst, imm }
            | I::SUB_RI { dst, imm }
            | I::AND_RI { dst, imm }
            | I::OR_RI { dst, imm }
            | I::XOR_RI { dst, imm }
            | I::SHL { dst, imm }
            | I::SHR { dst, imm }
            | I::STOREI { base: dst, imm } => {
                let [hi, lo] = word_be_bytes(imm);
                [op, dst.code(), hi, lo]
            }
            I::CMP_RI { lhs, imm } => {
                let [hi, lo] = word_be_bytes(imm);
                [op, lhs.code(), hi, lo]
            }

            I::LOAD { dst, addr }
            | I::LOADB { dst, addr }
            | I::ADD_MEM { dst, addr }
            | I::SUB_MEM { dst, addr } => {
                let [hi, lo] = word_be_bytes(addr);
                [op, dst.code(), hi, lo]
            }
            I::CMP_MEM { lhs, addr } => {
                let [hi, lo] = word_be_bytes(addr);
                [op, lhs.code(), hi, lo]
            }
            I::INC_MEM { addr } | I::DEC_MEM { addr } => {
                let [hi, lo] = word_be_bytes(addr);
                [op, 0, hi, lo]
            }

            I::STORE { src, addr } | I::STOREB { src, addr } => {
                let [lo, hi] = word_le_bytes(addr);
                [op, src.code(), lo, hi]
            }
            I::STOREI_DIRECT { addr, imm } => {
                let [lo, hi] = word_le_bytes(addr);
                [op, lo, hi, imm]
            }

            I::LOADR { dst, base, offset }
            | I::LOADBR { dst, base, offset }
            | I::LEA { dst, base, offset }
            | I::ADD_MEMR { dst, base, offset }
            | I::SUB_MEMR { dst, base, offset } => [op, dst.code(), base.code(), offset as u8],
            I::CMP_MEMR { lhs, base, offset } => [op, lhs.code(), base.code(), offset as u8],
            I::STORER { src, base, offset } | I::STOREBR { src, base, offset } => {
                [op, src.code(), base.code(), offset as u8]
            }
            I::INC_MEMR { base, offset } | I::DEC_MEMR { base, offset } => {
                [op, 0, base.code(), offset as u8]
            }

            I::LOADX { dst, base, index } => [op, dst.code(), base.code(), index.code()],
            I::STOREX { src, base, index } => [op, src.code(), base.code(), index.code()],

            I::JMP { addr }
            | I::JE { addr }
            | I::JNE { addr }
            | I::JL { addr }
            | I::JG { addr }
            | I::JLE { addr }
            | I::JGE { addr }
            | I::LOOP { addr }
            | I::CALL { addr } => {
                let [lo, hi] = word_le_bytes(addr);
                [op, 0, lo, hi]
            }
        }
    }

    /// Append the encoded bytes to a byte buffer.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let bytes = self.to_bytes();
        out.extend_from_slice(&bytes[..self.size() as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn immediates_travel_high_byte_first() {
        let mov = Instruction::MOV_RI { dst: Reg::AX, imm: 0x1234 };
        assert_eq!(mov.to_bytes(), [0x11, 0x00, 0x12, 0x34]);
    }

    #[test]
    fn load_addresses_travel_high_byte_first() {
        let load = Instruction::LOAD { dst: Reg::BX, addr: 0x1234 };
        assert_eq!(load.to_bytes(), [0x12, 0x01, 0x12, 0x34]);
    }

    #[test]
    fn store_addresses_travel_low_byte_first() {
        let store = Instruction::STORE { src: Reg::BX, addr: 0x1234 };
        assert_eq!(store.to_bytes(), [0x14, 0x01, 0x34, 0x12]);
    }

    #[test]
    fn jump_targets_travel_low_byte_first() {
        let jmp = Instruction::JMP { addr: 0x0020 };
        assert_eq!(jmp.to_bytes(), [0x50, 0x00, 0x20, 0x00]);

        let call = Instruction::CALL { addr: 0x1234 };
        assert_eq!(call.to_bytes(), [0x70, 0x00, 0x34, 0x12]);
    }

    #[test]
    fn direct_immediate_store_layout() {
        let st = Instruction::STOREI_DIRECT { addr: 0x0234, imm: 0x7f };
        assert_eq!(st.to_bytes(), [0x1c, 0x34, 0x02, 0x7f]);
    }

    #[test]
    fn negative_offset_encodes_as_0x80() {
        let store = Instruction::STORER { src: Reg::AX, base: Reg::FP, offset: -128 };
        assert_eq!(store.to_bytes(), [0x18, 0x00, 0x07, 0x80]);
    }

    #[rstest]
    #[case(Instruction::NOP)]
    #[case(Instruction::HLT)]
    #[case(Instruction::RET)]
    #[case(Instruction::PUSH { reg: Reg::FP })]
    #[case(Instruction::POP { reg: Reg::SP })]
    #[case(Instruction::MUL { src: Reg::CX })]
    #[case(Instruction::DIV { src: Reg::DX })]
    #[case(Instruction::INC_REG { reg: Reg::EX })]
    #[case(Instruction::DEC_REG { reg: Reg::FX })]
    #[case(Instruction::NOT { reg: Reg::AX })]
    #[case(Instruction::SYSCALL { code: 7 })]
    #[case(Instruction::MOV_RR { dst: Reg::AX, src: Reg::BX })]
    #[case(Instruction::MOV_RI { dst: Reg::CX, imm: 0xbeef })]
    #[case(Instruction::LOAD { dst: Reg::AX, addr: 0x0123 })]
    #[case(Instruction::LOADB { dst: Reg::BX, addr: 0x3fff })]
    #[case(Instruction::STORE { src: Reg::CX, addr: 0x0040 })]
    #[case(Instruction::STOREB { src: Reg::DX, addr: 0x0041 })]
    #[case(Instruction::LOADR { dst: Reg::AX, base: Reg::FP, offset: -2 })]
    #[case(Instruction::LOADBR { dst: Reg::BX, base: Reg::SP, offset: 4 })]
    #[case(Instruction::STORER { src: Reg::CX, base: Reg::FP, offset: -6 })]
    #[case(Instruction::STOREBR { src: Reg::DX, base: Reg::BX, offset: 127 })]
    #[case(Instruction::LEA { dst: Reg::AX, base: Reg::FP, offset: -8 })]
    #[case(Instruction::STOREI { base: Reg::BX, imm: 0x00ff })]
    #[case(Instruction::STOREI_DIRECT { addr: 0x0200, imm: 0xab })]
    #[case(Instruction::INC_MEM { addr: 0x0100 })]
    #[case(Instruction::DEC_MEM { addr: 0x0102 })]
    #[case(Instruction::INC_MEMR { base: Reg::BX, offset: 3 })]
    #[case(Instruction::DEC_MEMR { base: Reg::CX, offset: -3 })]
    #[case(Instruction::ADD_RR { dst: Reg::AX, src: Reg::BX })]
    #[case(Instruction::ADD_RI { dst: Reg::AX, imm: 1 })]
    #[case(Instruction::ADD_MEM { dst: Reg::AX, addr: 0x0050 })]
    #[case(Instruction::ADD_MEMR { dst: Reg::AX, base: Reg::BX, offset: 2 })]
    #[case(Instruction::SUB_RR { dst: Reg::AX, src: Reg::BX })]
    #[case(Instruction::SUB_RI { dst: Reg::AX, imm: 0x8000 })]
    #[case(Instruction::SUB_MEM { dst: Reg::AX, addr: 0x0052 })]
    #[case(Instruction::SUB_MEMR { dst: Reg::AX, base: Reg::BX, offset: -2 })]
    #[case(Instruction::LOADX { dst: Reg::AX, base: Reg::BX, index: Reg::CX })]
    #[case(Instruction::STOREX { src: Reg::AX, base: Reg::BX, index: Reg::CX })]
    #[case(Instruction::AND_RR { dst: Reg::AX, src: Reg::BX })]
    #[case(Instruction::AND_RI { dst: Reg::AX, imm: 0x00f0 })]
    #[case(Instruction::OR_RR { dst: Reg::AX, src: Reg::BX })]
    #[case(Instruction::OR_RI { dst: Reg::AX, imm: 0x0f00 })]
    #[case(Instruction::XOR_RR { dst: Reg::AX, src: Reg::AX })]
    #[case(Instruction::XOR_RI { dst: Reg::AX, imm: 0xffff })]
    #[case(Instruction::SHL { dst: Reg::AX, imm: 4 })]
    #[case(Instruction::SHR { dst: Reg::AX, imm: 15 })]
    #[case(Instruction::CMP_RR { lhs: Reg::AX, rhs: Reg::BX })]
    #[case(Instruction::CMP_RI { lhs: Reg::CX, imm: 0 })]
    #[case(Instruction::CMP_MEM { lhs: Reg::AX, addr: 0x0060 })]
    #[case(Instruction::CMP_MEMR { lhs: Reg::AX, base: Reg::FP, offset: -4 })]
    #[case(Instruction::JMP { addr: 0x0020 })]
    #[case(Instruction::JE { addr: 0x0024 })]
    #[case(Instruction::JNE { addr: 0x0028 })]
    #[case(Instruction::JL { addr: 0x002c })]
    #[case(Instruction::JG { addr: 0x0030 })]
    #[case(Instruction::JLE { addr: 0x0034 })]
    #[case(Instruction::JGE { addr: 0x0038 })]
    #[case(Instruction::LOOP { addr: 0x003c })]
    #[case(Instruction::CALL { addr: 0x0100 })]
    fn wire_round_trip(#[case] inst: Instruction) {
        let decoded = Instruction::decode(inst.to_bytes()).expect("decode");
        assert_eq!(decoded, inst);
    }

    #[test]
    fn decode_rejects_unknown_opcodes() {
        assert_eq!(
            Instruction::decode([0xee, 0, 0, 0]),
            Err(InvalidOpcode(0xee))
        );
    }

    #[test]
    fn two_byte_forms_ignore_the_tail() {
        let with_garbage = Instruction::decode([0x01, 0x00, 0xde, 0xad]).expect("decode");
        assert_eq!(with_garbage, Instruction::HLT);
    }
}
