use std::collections::HashMap;

use x366_bin::{
    Binary, DebugInfo, MemorySize, Section, Symbol, SymbolKind, HEADER_LEN, SECTION_DEBUG,
};

use crate::encoder::{encode, resolve_labels};
use crate::error::{AsmErrorKind, AssembleError};
use crate::lexer::{tokenize, Token};
use crate::operand::parse_operands;

/// Address the first instruction is assembled at.
const CODE_BASE: u16 = HEADER_LEN as u16;

/// The result of a successful assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// The binary container, debug section included.
    pub binary: Binary,
    /// The debug info that was embedded, in decoded form.
    pub debug: DebugInfo,
}

/// Assemble X366 source into a binary container.
pub fn assemble(source: &str) -> Result<Binary, AssembleError> {
    assemble_with_debug(source).map(|asm| asm.binary)
}

/// Assemble, also handing back the decoded debug info.
pub fn assemble_with_debug(source: &str) -> Result<Assembly, AssembleError> {
    Pass1::run(source)?.emit()
}

struct PendingInstr {
    addr: u16,
    line: u32,
    mnemonic: String,
    operand_tokens: Vec<Token>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DataWidth {
    Byte,
    Word,
}

enum DataValue {
    Num(i64),
    Str(Vec<u8>),
    LabelRef(String),
    Dup { count: u16, value: i64 },
}

struct DataItem {
    line: u32,
    width: DataWidth,
    values: Vec<DataValue>,
    /// Assigned once the total code size is known.
    addr: u16,
    size: u16,
}

enum LabelTarget {
    Code(u16),
    /// Index into the data item list; resolved after the code walk.
    Data(usize),
    /// Past the last data byte (labels trailing at end of file).
    End,
}

struct LabelDef {
    target: LabelTarget,
    line: u32,
}

struct Pass1 {
    memory_size: Option<MemorySize>,
    instrs: Vec<PendingInstr>,
    data_items: Vec<DataItem>,
    labels: Vec<(String, LabelDef)>,
    code_end: u16,
    data_end: u16,
}

impl Pass1 {
    fn run(source: &str) -> Result<Self, AssembleError> {
        let lines = tokenize(source)?;

        let mut pass = Pass1 {
            memory_size: None,
            instrs: Vec::new(),
            data_items: Vec::new(),
            labels: Vec::new(),
            code_end: CODE_BASE,
            data_end: 0,
        };
        let mut pending: Vec<(String, u32)> = Vec::new();
        let mut code_addr = CODE_BASE;

        for line in &lines {
            let mut tokens = line.tokens.as_slice();

            while let [Token::Label(name), rest @ ..] = tokens {
                pending.push((name.clone(), line.number));
                tokens = rest;
            }

            let err = |kind| AssembleError::new(line.number, kind);

            match tokens {
                [] => {}

                [Token::Directive(name), rest @ ..] => {
                    if !name.eq_ignore_ascii_case("MEMORY") {
                        return Err(err(AsmErrorKind::UnknownMnemonic(format!(".{name}"))));
                    }
                    let size = parse_memory_size(rest).map_err(err)?;
                    // Only the first .MEMORY is honored.
                    if pass.memory_size.is_none() {
                        pass.memory_size = Some(size);
                    }
                }

                [Token::Ident(word), rest @ ..] if is_data_directive(word) => {
                    let width = if word.eq_ignore_ascii_case("DB") {
                        DataWidth::Byte
                    } else {
                        DataWidth::Word
                    };
                    let values = parse_data_values(rest, width).map_err(err)?;
                    let size = data_size(&values, width);
                    let idx = pass.data_items.len();
                    pass.data_items.push(DataItem {
                        line: line.number,
                        width,
                        values,
                        addr: 0,
                        size,
                    });
                    for (name, def_line) in pending.drain(..) {
                        pass.labels.push((
                            name,
                            LabelDef { target: LabelTarget::Data(idx), line: def_line },
                        ));
                    }
                }

                [Token::Ident(mnemonic), rest @ ..] => {
                    let has_bracket = rest.iter().any(|t| *t == Token::LBracket);
                    let size = instr_size(mnemonic, has_bracket).map_err(err)?;
                    for (name, def_line) in pending.drain(..) {
                        pass.labels.push((
                            name,
                            LabelDef { target: LabelTarget::Code(code_addr), line: def_line },
                        ));
                    }
                    pass.instrs.push(PendingInstr {
                        addr: code_addr,
                        line: line.number,
                        mnemonic: mnemonic.clone(),
                        operand_tokens: rest.to_vec(),
                    });
                    code_addr = code_addr.wrapping_add(size);
                }

                _ => {
                    return Err(err(AsmErrorKind::MalformedLine(format!(
                        "{:?}",
                        tokens[0]
                    ))))
                }
            }
        }

        for (name, def_line) in pending.drain(..) {
            pass.labels
                .push((name, LabelDef { target: LabelTarget::End, line: def_line }));
        }

        pass.code_end = code_addr;
        let mut data_addr = code_addr;
        for item in &mut pass.data_items {
            item.addr = data_addr;
            data_addr = data_addr.wrapping_add(item.size);
        }
        pass.data_end = data_addr;

        Ok(pass)
    }

    /// Final label table, duplicate definitions rejected unless they
    /// stack at the same address.
    fn label_table(&self) -> Result<HashMap<String, (u16, SymbolKind)>, AssembleError> {
        let mut table: HashMap<String, (u16, SymbolKind)> = HashMap::new();

        for (name, def) in &self.labels {
            let (addr, kind) = match def.target {
                LabelTarget::Code(addr) => (addr, SymbolKind::Code),
                LabelTarget::Data(idx) => (self.data_items[idx].addr, SymbolKind::Data),
                LabelTarget::End => (self.data_end, SymbolKind::Data),
            };
            if let Some(&(existing, _)) = table.get(name) {
                if existing != addr {
                    return Err(AssembleError::new(
                        def.line,
                        AsmErrorKind::DuplicateLabel(name.clone()),
                    ));
                }
            }
            table.insert(name.clone(), (addr, kind));
        }

        Ok(table)
    }

    fn emit(self) -> Result<Assembly, AssembleError> {
        let memory_size = self.memory_size.unwrap_or_default();
        self.check_fit(memory_size)?;

        let labels = self.label_table()?;
        let resolve = |name: &str| labels.get(name).map(|&(addr, _)| addr);

        let mut image = Vec::with_capacity((self.data_end - CODE_BASE) as usize);
        let mut line_map = Vec::with_capacity(self.instrs.len());

        for instr in &self.instrs {
            let err = |kind| AssembleError::new(instr.line, kind);
            let operands = parse_operands(&instr.operand_tokens).map_err(err)?;
            let operands = resolve_labels(operands, &resolve).map_err(err)?;
            let inst = encode(&instr.mnemonic, &operands).map_err(err)?;
            line_map.push((instr.addr, instr.line as u16));
            inst.encode_into(&mut image);
        }

        for item in &self.data_items {
            emit_data(item, &resolve, &mut image)?;
        }

        let mut symbols: Vec<Symbol> = labels
            .into_iter()
            .map(|(name, (addr, kind))| Symbol { addr, kind, name })
            .collect();
        symbols.sort_by(|a, b| a.addr.cmp(&b.addr).then_with(|| a.name.cmp(&b.name)));

        let debug = DebugInfo { line_map, symbols };
        let binary = Binary {
            memory_size,
            break_ptr: self.data_end,
            code_end: self.code_end,
            image,
            sections: vec![Section { kind: SECTION_DEBUG, payload: debug.encode() }],
        };

        Ok(Assembly { binary, debug })
    }

    fn check_fit(&self, memory_size: MemorySize) -> Result<(), AssembleError> {
        let limit = memory_size.bytes() as u16;
        let too_large = AsmErrorKind::ProgramTooLarge { declared: memory_size.bytes() };

        if let Some(instr) = self
            .instrs
            .iter()
            .find(|i| i.addr >= limit || self.code_end < i.addr)
        {
            return Err(AssembleError::new(instr.line, too_large));
        }
        if let Some(item) = self
            .data_items
            .iter()
            .find(|d| d.addr.checked_add(d.size).map_or(true, |end| end > limit))
        {
            return Err(AssembleError::new(item.line, too_large));
        }
        if self.code_end > limit || self.data_end > limit || self.data_end < CODE_BASE {
            let line = self.instrs.last().map_or(1, |i| i.line);
            return Err(AssembleError::new(line, too_large));
        }

        Ok(())
    }
}

fn is_data_directive(word: &str) -> bool {
    word.eq_ignore_ascii_case("DB") || word.eq_ignore_ascii_case("DW")
}

fn parse_memory_size(tokens: &[Token]) -> Result<MemorySize, AsmErrorKind> {
    match tokens {
        [Token::KiloNum(k)] => MemorySize::try_from(k.saturating_mul(1024))
            .map_err(|_| AsmErrorKind::InvalidMemorySize(format!("{k}K"))),
        [Token::Num(n)] => Err(AsmErrorKind::InvalidMemorySize(n.to_string())),
        _ => Err(AsmErrorKind::InvalidMemorySize(format!("{tokens:?}"))),
    }
}

fn instr_size(mnemonic: &str, has_bracket: bool) -> Result<u16, AsmErrorKind> {
    let size = match mnemonic.to_ascii_uppercase().as_str() {
        "NOP" | "HLT" | "RET" | "PUSH" | "POP" | "MUL" | "DIV" | "NOT" | "SYSCALL" => 2,
        "INC" | "DEC" => {
            if has_bracket {
                4
            } else {
                2
            }
        }
        "MOV" | "LEA" | "ADD" | "SUB" | "CMP" | "AND" | "OR" | "XOR" | "SHL" | "SHR"
        | "JMP" | "JE" | "JZ" | "JNE" | "JNZ" | "JL" | "JG" | "JLE" | "JGE" | "LOOP"
        | "CALL" => 4,
        _ => return Err(AsmErrorKind::UnknownMnemonic(mnemonic.to_string())),
    };

    Ok(size)
}

fn parse_data_values(tokens: &[Token], width: DataWidth) -> Result<Vec<DataValue>, AsmErrorKind> {
    let mut values = Vec::new();
    let mut rest = tokens;

    if rest.is_empty() {
        return Err(AsmErrorKind::MalformedLine("data directive without values".into()));
    }

    while !rest.is_empty() {
        match rest {
            // N DUP(value)
            [Token::Num(count), Token::Ident(dup), Token::LParen, inner @ ..]
                if dup.eq_ignore_ascii_case("DUP") =>
            {
                let count = u16::try_from(*count)
                    .map_err(|_| AsmErrorKind::OutOfRangeImmediate(*count))?;
                let (value, consumed) = match inner {
                    [Token::Question, Token::RParen, ..] => (0, 2),
                    [Token::Num(v), Token::RParen, ..] => (*v, 2),
                    [Token::Minus, Token::Num(v), Token::RParen, ..] => (-v, 3),
                    _ => {
                        return Err(AsmErrorKind::MalformedLine(
                            "expected DUP(value)".into(),
                        ))
                    }
                };
                values.push(DataValue::Dup { count, value });
                rest = &rest[3 + consumed..];
            }

            [Token::Num(v), ..] => {
                values.push(DataValue::Num(*v));
                rest = &rest[1..];
            }
            [Token::Minus, Token::Num(v), ..] => {
                values.push(DataValue::Num(-v));
                rest = &rest[2..];
            }

            [Token::Str(bytes), ..] if width == DataWidth::Byte => {
                values.push(DataValue::Str(bytes.clone()));
                rest = &rest[1..];
            }

            [Token::Ident(name), ..] if width == DataWidth::Word => {
                values.push(DataValue::LabelRef(name.clone()));
                rest = &rest[1..];
            }

            _ => {
                return Err(AsmErrorKind::MalformedLine(format!("{:?}", rest[0])));
            }
        }
    }

    Ok(values)
}

fn data_size(values: &[DataValue], width: DataWidth) -> u16 {
    let unit = match width {
        DataWidth::Byte => 1u16,
        DataWidth::Word => 2,
    };

    values
        .iter()
        .map(|v| match v {
            DataValue::Num(_) | DataValue::LabelRef(_) => unit,
            DataValue::Str(bytes) => bytes.len() as u16,
            DataValue::Dup { count, .. } => unit.wrapping_mul(*count),
        })
        .fold(0u16, u16::wrapping_add)
}

fn emit_data(
    item: &DataItem,
    resolve: &dyn Fn(&str) -> Option<u16>,
    image: &mut Vec<u8>,
) -> Result<(), AssembleError> {
    for value in &item.values {
        match value {
            DataValue::Num(v) => push_value(item, *v, image)?,
            DataValue::Str(bytes) => image.extend_from_slice(bytes),
            DataValue::LabelRef(name) => {
                let addr = resolve(name).ok_or_else(|| {
                    AssembleError::new(item.line, AsmErrorKind::UndefinedLabel(name.clone()))
                })?;
                push_value(item, addr as i64, image)?;
            }
            DataValue::Dup { count, value } => {
                for _ in 0..*count {
                    push_value(item, *value, image)?;
                }
            }
        }
    }

    Ok(())
}

fn push_value(item: &DataItem, value: i64, image: &mut Vec<u8>) -> Result<(), AssembleError> {
    let out_of_range =
        || AssembleError::new(item.line, AsmErrorKind::OutOfRangeImmediate(value));

    match item.width {
        DataWidth::Byte => {
            if !(-0x80..=0xff).contains(&value) {
                return Err(out_of_range());
            }
            image.push(value as u8);
        }
        DataWidth::Word => {
            if !(-0x8000..=0xffff).contains(&value) {
                return Err(out_of_range());
            }
            image.extend_from_slice(&(value as u16).to_be_bytes());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use x366_asm::Instruction;

    fn assemble_ok(source: &str) -> Assembly {
        assemble_with_debug(source).expect("assemble")
    }

    fn decode_at(binary: &Binary, addr: u16) -> Instruction {
        let off = addr as usize - HEADER_LEN;
        let mut bytes = [0u8; 4];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = binary.image.get(off + i).copied().unwrap_or(0);
        }
        Instruction::decode(bytes).expect("decode")
    }

    #[test]
    fn code_starts_at_0x20() {
        let asm = assemble_ok("MOV AX, 5\nHLT\n");
        assert_eq!(asm.binary.code_end, 0x20 + 4 + 2);
        assert_eq!(
            decode_at(&asm.binary, 0x20),
            Instruction::MOV_RI { dst: x366_asm::Reg::AX, imm: 5 }
        );
    }

    #[test]
    fn inc_dec_size_depends_on_operand_shape() {
        let asm = assemble_ok("INC AX\nINC [100]\nDEC CX\nHLT\n");
        // 2 + 4 + 2 + 2 bytes of code
        assert_eq!(asm.binary.code_end, 0x20 + 10);
    }

    #[test]
    fn data_is_placed_after_all_code() {
        let asm = assemble_ok("MOV AX, greeting\ngreeting: DB \"hi\", 0\nMOV BX, 1\nHLT\n");
        // code: 4 + 4 + 2 = 10 bytes, so data begins at 0x2a
        assert_eq!(asm.binary.code_end, 0x2a);
        assert_eq!(asm.binary.break_ptr, 0x2a + 3);
        assert_eq!(
            decode_at(&asm.binary, 0x20),
            Instruction::MOV_RI { dst: x366_asm::Reg::AX, imm: 0x2a }
        );
        let data = &asm.binary.image[10..];
        assert_eq!(data, b"hi\0");
    }

    #[test]
    fn stacked_labels_resolve_to_the_same_address() {
        let asm = assemble_ok("L1:\nL2:\nL3:\nMOV AX, 42\nJMP L1\nJMP L2\nJMP L3\nHLT\n");
        for addr in [0x24u16, 0x28, 0x2c] {
            assert_eq!(decode_at(&asm.binary, addr), Instruction::JMP { addr: 0x20 });
        }
    }

    #[test]
    fn duplicate_labels_at_different_addresses_are_rejected() {
        let err = assemble("x: NOP\nx: HLT\n").expect_err("should fail");
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, AsmErrorKind::DuplicateLabel("x".into()));
    }

    #[test]
    fn dup_emits_n_elements() {
        let asm = assemble_ok("HLT\nbytes: DB 3 DUP('x')\nwords: DW 4 DUP(?)\n");
        let data = &asm.binary.image[2..];
        assert_eq!(&data[..3], b"xxx");
        assert_eq!(&data[3..], &[0u8; 8]);
    }

    #[test]
    fn dw_values_are_big_endian_and_accept_labels() {
        let asm = assemble_ok("HLT\narray: DW 10, 20\nptr: DW array\n");
        let data = &asm.binary.image[2..];
        assert_eq!(data, &[0, 10, 0, 20, 0x00, 0x22]);
    }

    #[test]
    fn memory_directive_first_occurrence_wins() {
        let asm = assemble_ok(".MEMORY 4K\n.MEMORY 8K\nHLT\n");
        assert_eq!(asm.binary.memory_size, MemorySize::K4);
    }

    #[test]
    fn memory_directive_defaults_to_1k() {
        let asm = assemble_ok("HLT\n");
        assert_eq!(asm.binary.memory_size, MemorySize::K1);
    }

    #[test]
    fn invalid_memory_size_is_rejected() {
        let err = assemble(".MEMORY 3K\nHLT\n").expect_err("should fail");
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, AsmErrorKind::InvalidMemorySize("3K".into()));
    }

    #[test]
    fn undefined_label_reports_the_referencing_line() {
        let err = assemble("NOP\nJMP nowhere\n").expect_err("should fail");
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, AsmErrorKind::UndefinedLabel("nowhere".into()));
    }

    #[test]
    fn program_larger_than_memory_is_rejected() {
        let err = assemble("HLT\nbig: DW 600 DUP(1)\n").expect_err("should fail");
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, AsmErrorKind::ProgramTooLarge { declared: 1024 }));
    }

    #[test]
    fn trailing_labels_attach_past_the_data_segment() {
        let asm = assemble_ok("HLT\nbuf: DB 4 DUP(?)\nheap:\n");
        let heap = asm.debug.symbols.iter().find(|s| s.name == "heap").expect("symbol");
        assert_eq!(heap.addr, asm.binary.break_ptr);
    }

    #[test]
    fn line_map_points_instructions_at_source_lines() {
        let asm = assemble_ok("NOP\n\nMOV AX, 1\nHLT\n");
        assert_eq!(asm.debug.line_map, vec![(0x20, 1), (0x22, 3), (0x26, 4)]);
    }

    #[test]
    fn debug_section_round_trips_through_the_container() {
        let asm = assemble_ok("start: MOV AX, 1\ndata: DW 7\nHLT\n");
        let bytes = asm.binary.to_bytes();
        let parsed = Binary::from_bytes(&bytes).expect("parse");
        let debug = parsed.debug_info().expect("section").expect("decode");
        assert_eq!(debug, asm.debug);
        let start = debug.symbols.iter().find(|s| s.name == "start").expect("start");
        assert_eq!(start.kind, SymbolKind::Code);
        let data = debug.symbols.iter().find(|s| s.name == "data").expect("data");
        assert_eq!(data.kind, SymbolKind::Data);
    }
}
