use itertools::Itertools;
use x366_asm::{Instruction, Syscall};

use crate::error::AsmErrorKind;
use crate::operand::Operand;

/// Pick the opcode variant for a mnemonic from the shapes of its
/// operands. Label operands must already be resolved (see
/// [`resolve_labels`]); `SYSCALL` is the one mnemonic that takes a bare
/// name instead.
pub fn encode(mnemonic: &str, operands: &[Operand]) -> Result<Instruction, AsmErrorKind> {
    use Instruction as I;
    use Operand as O;

    let upper = mnemonic.to_ascii_uppercase();

    if upper == "SYSCALL" {
        return syscall(mnemonic, operands);
    }

    let invalid = || invalid_operands(mnemonic, operands);

    let inst = match (upper.as_str(), operands) {
        ("NOP", []) => I::NOP,
        ("HLT", []) => I::HLT,
        ("RET", []) => I::RET,

        ("PUSH", [O::Reg(reg)]) => I::PUSH { reg: *reg },
        ("POP", [O::Reg(reg)]) => I::POP { reg: *reg },
        ("MUL", [O::Reg(src)]) => I::MUL { src: *src },
        ("DIV", [O::Reg(src)]) => I::DIV { src: *src },
        ("NOT", [O::Reg(reg)]) => I::NOT { reg: *reg },

        ("MOV", [O::Reg(dst), O::Reg(src)]) => I::MOV_RR { dst: *dst, src: *src },
        ("MOV", [O::Reg(dst), O::Imm(v)]) => I::MOV_RI { dst: *dst, imm: imm16(*v)? },
        ("MOV", [O::Reg(dst), O::MemDirect(addr)]) => I::LOAD { dst: *dst, addr: *addr },
        ("MOV", [O::ByteReg(dst), O::MemDirect(addr)]) => I::LOADB { dst: *dst, addr: *addr },
        ("MOV", [O::MemDirect(addr), O::Reg(src)]) => I::STORE { src: *src, addr: *addr },
        ("MOV", [O::MemDirect(addr), O::ByteReg(src)]) => {
            I::STOREB { src: *src, addr: *addr }
        }
        ("MOV", [O::Reg(dst), O::MemIndirect(base)]) => {
            I::LOADR { dst: *dst, base: *base, offset: 0 }
        }
        ("MOV", [O::Reg(dst), O::MemRelative { base, offset }]) => {
            I::LOADR { dst: *dst, base: *base, offset: *offset }
        }
        ("MOV", [O::ByteReg(dst), O::MemIndirect(base)]) => {
            I::LOADBR { dst: *dst, base: *base, offset: 0 }
        }
        ("MOV", [O::ByteReg(dst), O::MemRelative { base, offset }]) => {
            I::LOADBR { dst: *dst, base: *base, offset: *offset }
        }
        ("MOV", [O::MemIndirect(base), O::Reg(src)]) => {
            I::STORER { src: *src, base: *base, offset: 0 }
        }
        ("MOV", [O::MemRelative { base, offset }, O::Reg(src)]) => {
            I::STORER { src: *src, base: *base, offset: *offset }
        }
        ("MOV", [O::MemIndirect(base), O::ByteReg(src)]) => {
            I::STOREBR { src: *src, base: *base, offset: 0 }
        }
        ("MOV", [O::MemRelative { base, offset }, O::ByteReg(src)]) => {
            I::STOREBR { src: *src, base: *base, offset: *offset }
        }
        ("MOV", [O::Reg(dst), O::MemIndexed { base, index }]) => {
            I::LOADX { dst: *dst, base: *base, index: *index }
        }
        ("MOV", [O::MemIndexed { base, index }, O::Reg(src)]) => {
            I::STOREX { src: *src, base: *base, index: *index }
        }
        ("MOV", [O::MemIndirect(base), O::Imm(v)]) => {
            I::STOREI { base: *base, imm: imm16(*v)? }
        }
        ("MOV", [O::MemDirect(addr), O::Imm(v)]) => {
            let imm =
                u8::try_from(*v).map_err(|_| AsmErrorKind::DirectImmediateTooWide(*v))?;
            I::STOREI_DIRECT { addr: *addr, imm }
        }

        ("LEA", [O::Reg(dst), O::MemIndirect(base)]) => {
            I::LEA { dst: *dst, base: *base, offset: 0 }
        }
        ("LEA", [O::Reg(dst), O::MemRelative { base, offset }]) => {
            I::LEA { dst: *dst, base: *base, offset: *offset }
        }

        ("ADD", [O::Reg(dst), O::Reg(src)]) => I::ADD_RR { dst: *dst, src: *src },
        ("ADD", [O::Reg(dst), O::Imm(v)]) => I::ADD_RI { dst: *dst, imm: imm16(*v)? },
        ("ADD", [O::Reg(dst), O::MemDirect(addr)]) => I::ADD_MEM { dst: *dst, addr: *addr },
        ("ADD", [O::Reg(dst), O::MemIndirect(base)]) => {
            I::ADD_MEMR { dst: *dst, base: *base, offset: 0 }
        }
        ("ADD", [O::Reg(dst), O::MemRelative { base, offset }]) => {
            I::ADD_MEMR { dst: *dst, base: *base, offset: *offset }
        }
        ("SUB", [O::Reg(dst), O::Reg(src)]) => I::SUB_RR { dst: *dst, src: *src },
        ("SUB", [O::Reg(dst), O::Imm(v)]) => I::SUB_RI { dst: *dst, imm: imm16(*v)? },
        ("SUB", [O::Reg(dst), O::MemDirect(addr)]) => I::SUB_MEM { dst: *dst, addr: *addr },
        ("SUB", [O::Reg(dst), O::MemIndirect(base)]) => {
            I::SUB_MEMR { dst: *dst, base: *base, offset: 0 }
        }
        ("SUB", [O::Reg(dst), O::MemRelative { base, offset }]) => {
            I::SUB_MEMR { dst: *dst, base: *base, offset: *offset }
        }
        ("CMP", [O::Reg(lhs), O::Reg(rhs)]) => I::CMP_RR { lhs: *lhs, rhs: *rhs },
        ("CMP", [O::Reg(lhs), O::Imm(v)]) => I::CMP_RI { lhs: *lhs, imm: imm16(*v)? },
        ("CMP", [O::Reg(lhs), O::MemDirect(addr)]) => I::CMP_MEM { lhs: *lhs, addr: *addr },
        ("CMP", [O::Reg(lhs), O::MemIndirect(base)]) => {
            I::CMP_MEMR { lhs: *lhs, base: *base, offset: 0 }
        }
        ("CMP", [O::Reg(lhs), O::MemRelative { base, offset }]) => {
            I::CMP_MEMR { lhs: *lhs, base: *base, offset: *offset }
        }

        ("INC", [O::Reg(reg)]) => I::INC_REG { reg: *reg },
        ("INC", [O::MemDirect(addr)]) => I::INC_MEM { addr: *addr },
        ("INC", [O::MemIndirect(base)]) => I::INC_MEMR { base: *base, offset: 0 },
        ("INC", [O::MemRelative { base, offset }]) => {
            I::INC_MEMR { base: *base, offset: *offset }
        }
        ("DEC", [O::Reg(reg)]) => I::DEC_REG { reg: *reg },
        ("DEC", [O::MemDirect(addr)]) => I::DEC_MEM { addr: *addr },
        ("DEC", [O::MemIndirect(base)]) => I::DEC_MEMR { base: *base, offset: 0 },
        ("DEC", [O::MemRelative { base, offset }]) => {
            I::DEC_MEMR { base: *base, offset: *offset }
        }

        ("AND", [O::Reg(dst), O::Reg(src)]) => I::AND_RR { dst: *dst, src: *src },
        ("AND", [O::Reg(dst), O::Imm(v)]) => I::AND_RI { dst: *dst, imm: imm16(*v)? },
        ("OR", [O::Reg(dst), O::Reg(src)]) => I::OR_RR { dst: *dst, src: *src },
        ("OR", [O::Reg(dst), O::Imm(v)]) => I::OR_RI { dst: *dst, imm: imm16(*v)? },
        ("XOR", [O::Reg(dst), O::Reg(src)]) => I::XOR_RR { dst: *dst, src: *src },
        ("XOR", [O::Reg(dst), O::Imm(v)]) => I::XOR_RI { dst: *dst, imm: imm16(*v)? },

        // Shift count defaults to 1 when omitted.
        ("SHL", [O::Reg(dst)]) => I::SHL { dst: *dst, imm: 1 },
        ("SHL", [O::Reg(dst), O::Imm(v)]) => I::SHL { dst: *dst, imm: imm16(*v)? },
        ("SHR", [O::Reg(dst)]) => I::SHR { dst: *dst, imm: 1 },
        ("SHR", [O::Reg(dst), O::Imm(v)]) => I::SHR { dst: *dst, imm: imm16(*v)? },

        ("JMP", [O::Imm(v)]) => I::JMP { addr: target(*v)? },
        ("JE" | "JZ", [O::Imm(v)]) => I::JE { addr: target(*v)? },
        ("JNE" | "JNZ", [O::Imm(v)]) => I::JNE { addr: target(*v)? },
        ("JL", [O::Imm(v)]) => I::JL { addr: target(*v)? },
        ("JG", [O::Imm(v)]) => I::JG { addr: target(*v)? },
        ("JLE", [O::Imm(v)]) => I::JLE { addr: target(*v)? },
        ("JGE", [O::Imm(v)]) => I::JGE { addr: target(*v)? },
        ("LOOP", [O::Imm(v)]) => I::LOOP { addr: target(*v)? },
        ("CALL", [O::Imm(v)]) => I::CALL { addr: target(*v)? },

        (
            "NOP" | "HLT" | "RET" | "PUSH" | "POP" | "MUL" | "DIV" | "NOT" | "MOV" | "LEA"
            | "ADD" | "SUB" | "CMP" | "INC" | "DEC" | "AND" | "OR" | "XOR" | "SHL" | "SHR"
            | "JMP" | "JE" | "JZ" | "JNE" | "JNZ" | "JL" | "JG" | "JLE" | "JGE" | "LOOP"
            | "CALL",
            _,
        ) => return Err(invalid()),

        _ => return Err(AsmErrorKind::UnknownMnemonic(mnemonic.to_string())),
    };

    Ok(inst)
}

/// Replace label operands by their resolved addresses.
pub fn resolve_labels(
    operands: Vec<Operand>,
    resolve: &dyn Fn(&str) -> Option<u16>,
) -> Result<Vec<Operand>, AsmErrorKind> {
    operands
        .into_iter()
        .map(|operand| match operand {
            Operand::Label(name) => resolve(&name)
                .map(|addr| Operand::Imm(addr as i64))
                .ok_or(AsmErrorKind::UndefinedLabel(name)),
            Operand::MemLabel(name) => resolve(&name)
                .map(Operand::MemDirect)
                .ok_or(AsmErrorKind::UndefinedLabel(name)),
            other => Ok(other),
        })
        .collect()
}

fn syscall(mnemonic: &str, operands: &[Operand]) -> Result<Instruction, AsmErrorKind> {
    match operands {
        [Operand::Imm(v)] => {
            let code =
                u8::try_from(*v).map_err(|_| AsmErrorKind::OutOfRangeImmediate(*v))?;
            Ok(Instruction::SYSCALL { code })
        }
        [Operand::Label(name)] => match Syscall::from_name(name) {
            Some(call) => Ok(Instruction::SYSCALL { code: call.code() }),
            None => Err(invalid_operands(mnemonic, operands)),
        },
        _ => Err(invalid_operands(mnemonic, operands)),
    }
}

fn invalid_operands(mnemonic: &str, operands: &[Operand]) -> AsmErrorKind {
    AsmErrorKind::InvalidOperand {
        mnemonic: mnemonic.to_string(),
        got: operands.iter().map(Operand::shape).join(", "),
    }
}

fn imm16(v: i64) -> Result<u16, AsmErrorKind> {
    if (-0x8000..=0xffff).contains(&v) {
        Ok(v as u16)
    } else {
        Err(AsmErrorKind::OutOfRangeImmediate(v))
    }
}

fn target(v: i64) -> Result<u16, AsmErrorKind> {
    u16::try_from(v).map_err(|_| AsmErrorKind::OutOfRangeImmediate(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use x366_asm::Reg;

    fn enc(mnemonic: &str, ops: &[Operand]) -> Instruction {
        encode(mnemonic, ops).expect("encode")
    }

    #[test]
    fn mov_variants_follow_operand_shapes() {
        use Operand as O;

        assert_eq!(
            enc("MOV", &[O::Reg(Reg::AX), O::Reg(Reg::BX)]),
            Instruction::MOV_RR { dst: Reg::AX, src: Reg::BX }
        );
        assert_eq!(
            enc("mov", &[O::Reg(Reg::AX), O::Imm(-1)]),
            Instruction::MOV_RI { dst: Reg::AX, imm: 0xffff }
        );
        assert_eq!(
            enc("MOV", &[O::ByteReg(Reg::CX), O::MemDirect(0x40)]),
            Instruction::LOADB { dst: Reg::CX, addr: 0x40 }
        );
        assert_eq!(
            enc("MOV", &[O::MemIndirect(Reg::BX), O::Reg(Reg::AX)]),
            Instruction::STORER { src: Reg::AX, base: Reg::BX, offset: 0 }
        );
        assert_eq!(
            enc("MOV", &[O::MemIndirect(Reg::BX), O::Imm(0x1234)]),
            Instruction::STOREI { base: Reg::BX, imm: 0x1234 }
        );
        assert_eq!(
            enc("MOV", &[O::Reg(Reg::AX), O::MemIndexed { base: Reg::BX, index: Reg::CX }]),
            Instruction::LOADX { dst: Reg::AX, base: Reg::BX, index: Reg::CX }
        );
    }

    #[test]
    fn direct_store_of_wide_immediate_suggests_the_workaround() {
        let err = encode("MOV", &[Operand::MemDirect(0x100), Operand::Imm(300)])
            .expect_err("should reject");
        assert_eq!(err, AsmErrorKind::DirectImmediateTooWide(300));
        assert!(err.to_string().contains("MOV reg, 300"));
    }

    #[test]
    fn shift_count_defaults_to_one() {
        assert_eq!(
            enc("SHL", &[Operand::Reg(Reg::AX)]),
            Instruction::SHL { dst: Reg::AX, imm: 1 }
        );
    }

    #[rstest]
    #[case("JZ")]
    #[case("je")]
    fn jump_aliases(#[case] name: &str) {
        assert_eq!(
            enc(name, &[Operand::Imm(0x20)]),
            Instruction::JE { addr: 0x20 }
        );
    }

    #[test]
    fn syscall_by_name_and_number() {
        assert_eq!(
            enc("SYSCALL", &[Operand::Label("print_int".into())]),
            Instruction::SYSCALL { code: 3 }
        );
        assert_eq!(enc("SYSCALL", &[Operand::Imm(8)]), Instruction::SYSCALL { code: 8 });
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(
            encode("FROB", &[]),
            Err(AsmErrorKind::UnknownMnemonic("FROB".into()))
        );
    }

    #[test]
    fn lea_requires_a_register_relative_operand() {
        assert!(encode("LEA", &[Operand::Reg(Reg::AX), Operand::MemDirect(4)]).is_err());
        assert_eq!(
            enc("LEA", &[Operand::Reg(Reg::AX), Operand::MemRelative { base: Reg::FP, offset: -4 }]),
            Instruction::LEA { dst: Reg::AX, base: Reg::FP, offset: -4 }
        );
    }

    #[test]
    fn byte_register_in_word_position_is_rejected() {
        assert!(encode("ADD", &[Operand::ByteReg(Reg::AX), Operand::Imm(1)]).is_err());
        assert!(encode("MOV", &[Operand::ByteReg(Reg::AX), Operand::Reg(Reg::BX)]).is_err());
    }

    #[test]
    fn label_resolution() {
        let table = |name: &str| (name == "start").then_some(0x20u16);
        let ops = resolve_labels(
            vec![Operand::Label("start".into()), Operand::MemLabel("start".into())],
            &table,
        )
        .expect("resolve");
        assert_eq!(ops, vec![Operand::Imm(0x20), Operand::MemDirect(0x20)]);

        let missing = resolve_labels(vec![Operand::Label("nope".into())], &table);
        assert_eq!(missing, Err(AsmErrorKind::UndefinedLabel("nope".into())));
    }
}
