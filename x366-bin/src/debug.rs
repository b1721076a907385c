use crate::error::BinError;

/// What a debug symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SymbolKind {
    /// A label on an instruction address.
    Code = 0,
    /// A label on a data directive.
    Data = 1,
}

impl SymbolKind {
    fn from_byte(b: u8) -> Self {
        match b {
            1 => SymbolKind::Data,
            _ => SymbolKind::Code,
        }
    }
}

/// One named address from the label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Resolved address.
    pub addr: u16,
    /// Code or data.
    pub kind: SymbolKind,
    /// Label name as written in the source.
    pub name: String,
}

/// Source-level metadata carried in the debug section.
///
/// Execution ignores this entirely; it exists for debuggers and
/// visualizers. The payload is a sorted `{pc, line}` pair stream
/// terminated by `{0xFFFF, 0}`, followed by `{addr, kind, NUL-name}`
/// symbol records terminated by `{0xFFFF, 0, 0}`. Some producers prefix
/// the payload with a NUL-terminated source filename; the decoder
/// tolerates both layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugInfo {
    /// Instruction address to 1-based source line, sorted by address.
    pub line_map: Vec<(u16, u16)>,
    /// Every label with its resolved address.
    pub symbols: Vec<Symbol>,
}

const END_MARK: u16 = 0xffff;

impl DebugInfo {
    /// Source line for the instruction at `pc`, if recorded.
    pub fn line_for(&self, pc: u16) -> Option<u16> {
        self.line_map
            .binary_search_by_key(&pc, |&(addr, _)| addr)
            .ok()
            .map(|i| self.line_map[i].1)
    }

    /// Serialize to the debug-section payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut pairs = self.line_map.clone();
        pairs.sort_unstable();

        let mut out = Vec::with_capacity(pairs.len() * 4 + self.symbols.len() * 8 + 8);
        for (pc, line) in pairs {
            out.extend_from_slice(&pc.to_be_bytes());
            out.extend_from_slice(&line.to_be_bytes());
        }
        out.extend_from_slice(&END_MARK.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());

        for symbol in &self.symbols {
            out.extend_from_slice(&symbol.addr.to_be_bytes());
            out.push(symbol.kind as u8);
            out.extend_from_slice(symbol.name.as_bytes());
            out.push(0);
        }
        out.extend_from_slice(&END_MARK.to_be_bytes());
        out.push(0);
        out.push(0);

        out
    }

    /// Parse a debug-section payload, tolerating an optional leading
    /// NUL-terminated filename.
    pub fn decode(payload: &[u8]) -> Result<Self, BinError> {
        match Self::decode_from(payload) {
            Ok(info) => Ok(info),
            Err(e) => {
                // Retry past a filename prefix, if there is one.
                let name_end = payload
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(BinError::MalformedDebugInfo)?;
                if payload[..name_end].iter().all(|b| b.is_ascii_graphic()) {
                    Self::decode_from(&payload[name_end + 1..])
                } else {
                    Err(e)
                }
            }
        }
    }

    fn decode_from(payload: &[u8]) -> Result<Self, BinError> {
        let mut cursor = Cursor { bytes: payload, pos: 0 };
        let mut line_map = Vec::new();

        loop {
            let pc = cursor.word()?;
            let line = cursor.word()?;
            if pc == END_MARK && line == 0 {
                break;
            }
            line_map.push((pc, line));
        }
        if line_map.windows(2).any(|w| w[0].0 > w[1].0) {
            return Err(BinError::MalformedDebugInfo);
        }

        let mut symbols = Vec::new();
        loop {
            let addr = cursor.word()?;
            let kind = cursor.byte()?;
            if addr == END_MARK && kind == 0 && cursor.peek() == Some(0) {
                break;
            }
            let name = cursor.until_nul()?;
            symbols.push(Symbol { addr, kind: SymbolKind::from_byte(kind), name });
        }

        Ok(DebugInfo { line_map, symbols })
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn byte(&mut self) -> Result<u8, BinError> {
        let b = *self.bytes.get(self.pos).ok_or(BinError::MalformedDebugInfo)?;
        self.pos += 1;
        Ok(b)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn word(&mut self) -> Result<u16, BinError> {
        Ok(u16::from_be_bytes([self.byte()?, self.byte()?]))
    }

    fn until_nul(&mut self) -> Result<String, BinError> {
        let start = self.pos;
        while self.byte()? != 0 {}
        String::from_utf8(self.bytes[start..self.pos - 1].to_vec())
            .map_err(|_| BinError::MalformedDebugInfo)
    }
}
