use crate::debug::DebugInfo;
use crate::error::BinError;

/// ASCII signature every X366 binary starts with.
pub const SIGNATURE: [u8; 8] = *b"Go Cats!";

/// Fixed header length; the code image starts here.
pub const HEADER_LEN: usize = 0x20;

const OFF_MEMORY_SIZE: usize = 0x09;
const OFF_SECTIONS: usize = 0x0c;
const OFF_BREAK: usize = 0x10;
const OFF_CODE_END: usize = 0x12;

/// Section type marking the end of the sections area.
pub const SECTION_END: u8 = 0x00;

/// Section type of the debug-info section.
pub const SECTION_DEBUG: u8 = 0x01;

/// The supported main-memory sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MemorySize {
    /// 1 KiB.
    K1 = 1024,
    /// 2 KiB.
    K2 = 2048,
    /// 4 KiB.
    K4 = 4096,
    /// 8 KiB.
    K8 = 8192,
    /// 16 KiB.
    K16 = 16384,
}

impl MemorySize {
    /// Size in bytes.
    pub const fn bytes(self) -> usize {
        self as u16 as usize
    }

    /// Size as the 16-bit word stored in the header.
    pub const fn word(self) -> u16 {
        self as u16
    }
}

impl Default for MemorySize {
    fn default() -> Self {
        MemorySize::K1
    }
}

impl TryFrom<u16> for MemorySize {
    type Error = BinError;

    fn try_from(w: u16) -> Result<Self, Self::Error> {
        match w {
            1024 => Ok(MemorySize::K1),
            2048 => Ok(MemorySize::K2),
            4096 => Ok(MemorySize::K4),
            8192 => Ok(MemorySize::K8),
            16384 => Ok(MemorySize::K16),
            other => Err(BinError::UnsupportedMemorySize(other)),
        }
    }
}

/// One TLV record from the optional sections area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section type byte. `0x01` is debug info; `0x02..=0x7f` are
    /// reserved well-known types, `0x80..` user-defined. Unknown types
    /// are carried opaquely.
    pub kind: u8,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// An in-memory X366 binary: header fields, the code+data image, and any
/// trailing sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    /// Declared main-memory size.
    pub memory_size: MemorySize,
    /// Recommended initial break pointer (end of the data segment).
    pub break_ptr: u16,
    /// Code boundary (end of the code segment).
    pub code_end: u16,
    /// Code bytes followed by data bytes, loaded contiguously at
    /// [`HEADER_LEN`].
    pub image: Vec<u8>,
    /// Trailing sections, in file order, terminator excluded.
    pub sections: Vec<Section>,
}

impl Binary {
    /// Serialize to the container byte string.
    pub fn to_bytes(&self) -> Vec<u8> {
        let sections_len: usize = self
            .sections
            .iter()
            .map(|s| 1 + 4 + s.payload.len())
            .sum::<usize>()
            + 5; // end-of-sections terminator
        let mut out = Vec::with_capacity(HEADER_LEN + self.image.len() + sections_len);

        out.extend_from_slice(&SIGNATURE);
        out.resize(HEADER_LEN, 0);
        out[OFF_MEMORY_SIZE..OFF_MEMORY_SIZE + 2]
            .copy_from_slice(&self.memory_size.word().to_be_bytes());
        if !self.sections.is_empty() {
            let offset = (HEADER_LEN + self.image.len()) as u32;
            out[OFF_SECTIONS..OFF_SECTIONS + 4].copy_from_slice(&offset.to_be_bytes());
        }
        out[OFF_BREAK..OFF_BREAK + 2].copy_from_slice(&self.break_ptr.to_be_bytes());
        out[OFF_CODE_END..OFF_CODE_END + 2].copy_from_slice(&self.code_end.to_be_bytes());

        out.extend_from_slice(&self.image);

        if !self.sections.is_empty() {
            for section in &self.sections {
                out.push(section.kind);
                out.extend_from_slice(&(section.payload.len() as u32).to_be_bytes());
                out.extend_from_slice(&section.payload);
            }
            out.push(SECTION_END);
            out.extend_from_slice(&0u32.to_be_bytes());
        }

        out
    }

    /// Parse a container byte string.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BinError> {
        if bytes.len() < HEADER_LEN {
            return Err(BinError::TruncatedHeader(bytes.len()));
        }
        if bytes[..SIGNATURE.len()] != SIGNATURE {
            return Err(BinError::BadSignature);
        }

        let word = |off: usize| u16::from_be_bytes([bytes[off], bytes[off + 1]]);
        let memory_size = MemorySize::try_from(word(OFF_MEMORY_SIZE))?;
        let break_ptr = word(OFF_BREAK);
        let code_end = word(OFF_CODE_END);
        let sections_offset = u32::from_be_bytes([
            bytes[OFF_SECTIONS],
            bytes[OFF_SECTIONS + 1],
            bytes[OFF_SECTIONS + 2],
            bytes[OFF_SECTIONS + 3],
        ]) as usize;

        let image_end = if sections_offset == 0 {
            bytes.len()
        } else {
            if sections_offset < HEADER_LEN || sections_offset > bytes.len() {
                return Err(BinError::SectionOverrun);
            }
            sections_offset
        };

        let image = bytes[HEADER_LEN..image_end].to_vec();
        let sections = if sections_offset == 0 {
            Vec::new()
        } else {
            parse_sections(&bytes[sections_offset..])?
        };

        Ok(Binary { memory_size, break_ptr, code_end, image, sections })
    }

    /// The first section of the given type, if present.
    pub fn section(&self, kind: u8) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Decode the debug section, if the binary carries one.
    pub fn debug_info(&self) -> Option<Result<DebugInfo, BinError>> {
        self.section(SECTION_DEBUG)
            .map(|s| DebugInfo::decode(&s.payload))
    }
}

fn parse_sections(mut bytes: &[u8]) -> Result<Vec<Section>, BinError> {
    let mut sections = Vec::new();

    while !bytes.is_empty() {
        if bytes.len() < 5 {
            return Err(BinError::SectionOverrun);
        }
        let kind = bytes[0];
        let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
        if kind == SECTION_END && len == 0 {
            break;
        }
        let end = 5usize.checked_add(len).ok_or(BinError::SectionOverrun)?;
        if end > bytes.len() {
            return Err(BinError::SectionOverrun);
        }
        sections.push(Section { kind, payload: bytes[5..end].to_vec() });
        bytes = &bytes[end..];
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample() -> Binary {
        Binary {
            memory_size: MemorySize::K2,
            break_ptr: 0x002c,
            code_end: 0x0028,
            image: vec![0x11, 0x00, 0x00, 0x05, 0x01, 0x00, 0x0a, 0x0b],
            sections: vec![Section { kind: 0x42, payload: vec![1, 2, 3] }],
        }
    }

    #[test]
    fn container_round_trip() {
        let bin = sample();
        let bytes = bin.to_bytes();
        assert_eq!(Binary::from_bytes(&bytes).expect("parse"), bin);
    }

    #[test]
    fn header_layout_is_fixed() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[..8], b"Go Cats!");
        assert_eq!(bytes[0x08], 0);
        assert_eq!(u16::from_be_bytes([bytes[0x09], bytes[0x0a]]), 2048);
        assert_eq!(
            u32::from_be_bytes([bytes[0x0c], bytes[0x0d], bytes[0x0e], bytes[0x0f]]),
            (HEADER_LEN + 8) as u32
        );
        assert_eq!(u16::from_be_bytes([bytes[0x10], bytes[0x11]]), 0x002c);
        assert_eq!(u16::from_be_bytes([bytes[0x12], bytes[0x13]]), 0x0028);
    }

    #[test]
    fn no_sections_means_zero_offset() {
        let mut bin = sample();
        bin.sections.clear();
        let bytes = bin.to_bytes();
        assert_eq!(&bytes[0x0c..0x10], &[0, 0, 0, 0]);
        assert_eq!(Binary::from_bytes(&bytes).expect("parse"), bin);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'N';
        assert_eq!(Binary::from_bytes(&bytes), Err(BinError::BadSignature));
    }

    #[test]
    fn rejects_truncated_header() {
        let bytes = sample().to_bytes();
        assert_eq!(
            Binary::from_bytes(&bytes[..0x10]),
            Err(BinError::TruncatedHeader(0x10))
        );
    }

    #[rstest]
    #[case(0)]
    #[case(512)]
    #[case(3000)]
    #[case(32768)]
    fn rejects_unsupported_memory_sizes(#[case] size: u16) {
        let mut bytes = sample().to_bytes();
        bytes[0x09..0x0b].copy_from_slice(&size.to_be_bytes());
        assert_eq!(
            Binary::from_bytes(&bytes),
            Err(BinError::UnsupportedMemorySize(size))
        );
    }

    #[test]
    fn rejects_section_offset_past_the_end() {
        let mut bytes = sample().to_bytes();
        let bogus = (bytes.len() + 1) as u32;
        bytes[0x0c..0x10].copy_from_slice(&bogus.to_be_bytes());
        assert_eq!(Binary::from_bytes(&bytes), Err(BinError::SectionOverrun));
    }

    #[test]
    fn rejects_section_length_past_the_end() {
        let mut bin = sample();
        bin.sections = vec![Section { kind: 0x42, payload: vec![0; 4] }];
        let mut bytes = bin.to_bytes();
        let sections_at = HEADER_LEN + bin.image.len();
        bytes[sections_at + 1..sections_at + 5].copy_from_slice(&1000u32.to_be_bytes());
        assert_eq!(Binary::from_bytes(&bytes), Err(BinError::SectionOverrun));
    }

    #[test]
    fn unknown_section_types_are_skippable() {
        let mut bin = sample();
        bin.sections = vec![
            Section { kind: 0x90, payload: vec![9; 16] },
            Section { kind: SECTION_DEBUG, payload: crate::DebugInfo::default().encode() },
        ];
        let parsed = Binary::from_bytes(&bin.to_bytes()).expect("parse");
        assert_eq!(parsed.sections.len(), 2);
        assert!(parsed.section(SECTION_DEBUG).is_some());
    }
}
