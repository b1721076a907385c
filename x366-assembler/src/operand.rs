use x366_asm::Reg;

use crate::error::AsmErrorKind;
use crate::lexer::Token;

/// A parsed operand, before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A word register.
    Reg(Reg),
    /// A byte alias (`AL..FL`); selects byte opcode variants.
    ByteReg(Reg),
    /// A numeric immediate.
    Imm(i64),
    /// A bare identifier, resolved against the label table.
    Label(String),
    /// `[imm]`
    MemDirect(u16),
    /// `[reg]`
    MemIndirect(Reg),
    /// `[reg+k]` / `[reg-k]`
    MemRelative {
        /// Base register.
        base: Reg,
        /// Signed byte offset.
        offset: i8,
    },
    /// `[regA+regB]`
    MemIndexed {
        /// Base register.
        base: Reg,
        /// Index register.
        index: Reg,
    },
    /// `[label]`
    MemLabel(String),
}

impl Operand {
    /// Short shape name used in "invalid operands" messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Operand::Reg(_) => "reg",
            Operand::ByteReg(_) => "byte-reg",
            Operand::Imm(_) => "imm",
            Operand::Label(_) => "label",
            Operand::MemDirect(_) => "[addr]",
            Operand::MemIndirect(_) => "[reg]",
            Operand::MemRelative { .. } => "[reg+off]",
            Operand::MemIndexed { .. } => "[reg+reg]",
            Operand::MemLabel(_) => "[label]",
        }
    }
}

/// Parse the operand tokens of one instruction line.
pub fn parse_operands(tokens: &[Token]) -> Result<Vec<Operand>, AsmErrorKind> {
    let mut operands = Vec::new();
    let mut rest = tokens;

    while !rest.is_empty() {
        let (operand, len) = parse_one(rest)?;
        operands.push(operand);
        rest = &rest[len..];
    }

    Ok(operands)
}

/// Parse a single operand at the front of `tokens`, returning it and the
/// number of tokens consumed.
fn parse_one(tokens: &[Token]) -> Result<(Operand, usize), AsmErrorKind> {
    match tokens {
        [Token::Num(n), ..] => Ok((Operand::Imm(*n), 1)),
        [Token::Minus, Token::Num(n), ..] => Ok((Operand::Imm(-n), 2)),

        [Token::Ident(name), ..] => {
            let operand = match Reg::parse(name) {
                Some((reg, false)) => Operand::Reg(reg),
                Some((reg, true)) => Operand::ByteReg(reg),
                None => Operand::Label(name.clone()),
            };
            Ok((operand, 1))
        }

        [Token::LBracket, rest @ ..] => {
            let (operand, inner) = parse_memory(rest)?;
            match rest.get(inner) {
                Some(Token::RBracket) => Ok((operand, inner + 2)),
                _ => Err(malformed(tokens)),
            }
        }

        _ => Err(malformed(tokens)),
    }
}

/// The inside of a bracketed operand, up to (not including) `]`.
fn parse_memory(tokens: &[Token]) -> Result<(Operand, usize), AsmErrorKind> {
    match tokens {
        [Token::Num(n), Token::RBracket, ..] => {
            let addr =
                u16::try_from(*n).map_err(|_| AsmErrorKind::OutOfRangeImmediate(*n))?;
            Ok((Operand::MemDirect(addr), 1))
        }

        [Token::Ident(a), Token::Plus, Token::Ident(b), Token::RBracket, ..] => {
            match (word_reg(a), word_reg(b)) {
                (Some(base), Some(index)) => Ok((Operand::MemIndexed { base, index }, 3)),
                _ => Err(malformed(tokens)),
            }
        }

        [Token::Ident(name), sign @ (Token::Plus | Token::Minus), Token::Num(n), Token::RBracket, ..] =>
        {
            let base = word_reg(name).ok_or_else(|| malformed(tokens))?;
            let signed = if *sign == Token::Minus { -n } else { *n };
            let offset =
                i8::try_from(signed).map_err(|_| AsmErrorKind::OutOfRangeImmediate(signed))?;
            Ok((Operand::MemRelative { base, offset }, 3))
        }

        [Token::Ident(name), Token::RBracket, ..] => {
            let operand = match word_reg(name) {
                Some(reg) => Operand::MemIndirect(reg),
                None => Operand::MemLabel(name.clone()),
            };
            Ok((operand, 1))
        }

        _ => Err(malformed(tokens)),
    }
}

/// Bracketed bases and indexes must be word registers; byte aliases make
/// no sense as addresses.
fn word_reg(name: &str) -> Option<Reg> {
    match Reg::parse(name) {
        Some((reg, false)) => Some(reg),
        _ => None,
    }
}

fn malformed(tokens: &[Token]) -> AsmErrorKind {
    AsmErrorKind::MalformedLine(format!("{tokens:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use rstest::rstest;

    fn operands(text: &str) -> Vec<Operand> {
        let lines = tokenize(text).expect("tokenize");
        parse_operands(&lines[0].tokens).expect("operands")
    }

    #[rstest]
    #[case("AX", Operand::Reg(Reg::AX))]
    #[case("al", Operand::ByteReg(Reg::AX))]
    #[case("42", Operand::Imm(42))]
    #[case("-42", Operand::Imm(-42))]
    #[case("'A'", Operand::Imm(65))]
    #[case("start", Operand::Label("start".into()))]
    #[case("[100]", Operand::MemDirect(100))]
    #[case("[BX]", Operand::MemIndirect(Reg::BX))]
    #[case("[FP-2]", Operand::MemRelative { base: Reg::FP, offset: -2 })]
    #[case("[BX+5]", Operand::MemRelative { base: Reg::BX, offset: 5 })]
    #[case("[BX+CX]", Operand::MemIndexed { base: Reg::BX, index: Reg::CX })]
    #[case("[array]", Operand::MemLabel("array".into()))]
    fn single_operands(#[case] text: &str, #[case] expected: Operand) {
        assert_eq!(operands(text), vec![expected]);
    }

    #[test]
    fn multiple_operands_with_or_without_commas() {
        let with = operands("AX, [BX+2]");
        let without = operands("AX [BX+2]");
        assert_eq!(with, without);
        assert_eq!(with.len(), 2);
    }

    #[test]
    fn relative_offset_must_fit_a_signed_byte() {
        let lines = tokenize("[BX+200]").expect("tokenize");
        assert_eq!(
            parse_operands(&lines[0].tokens),
            Err(AsmErrorKind::OutOfRangeImmediate(200))
        );
    }

    #[test]
    fn byte_alias_cannot_be_a_base() {
        let lines = tokenize("[AL]").expect("tokenize");
        assert!(parse_operands(&lines[0].tokens).is_err());
    }

    #[test]
    fn negative_128_is_a_legal_offset() {
        assert_eq!(
            operands("[FP-128]"),
            vec![Operand::MemRelative { base: Reg::FP, offset: -128 }]
        );
    }
}
