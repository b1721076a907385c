use core::fmt;

/// Syscall codes recognized by the `SYSCALL` instruction.
///
/// The numeric surface is fixed; hosts dispatch on the 8-bit code carried
/// in the instruction. Codes not listed here are reserved — executing one
/// is reported through the output sink and execution continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum Syscall {
    /// Halt the machine.
    EXIT = 0,
    /// Write the character in the low byte of `AX`.
    PRINT_CHAR = 1,
    /// Write the NUL-terminated string at `AX` (capped at 1000 bytes).
    PRINT_STRING = 2,
    /// Write `AX` as a signed decimal.
    PRINT_INT = 3,
    /// `AX` := next input character, or 0 with no input provider.
    READ_CHAR = 4,
    /// `AX` := next input line parsed as a signed decimal, or 0.
    READ_INT = 5,
    /// Read a line into the buffer at `AX`, at most `BX` bytes;
    /// `AX` := actual length, buffer NUL-terminated.
    READ_STRING = 6,
    /// Parse a signed decimal at `AX`; `AX` := value, `BX` := address
    /// past the last digit.
    ATOI = 7,
    /// `AX` := old break pointer, then `BK := BK + AX`.
    SBRK = 8,
    /// Select the drawing color (`AX`).
    SET_COLOR = 10,
    /// Plot a pixel at (`AX`, `BX`).
    DRAW_PIXEL = 11,
    /// Draw a line from (`AX`, `BX`) to (`CX`, `DX`).
    DRAW_LINE = 12,
    /// Draw a rectangle at (`AX`, `BX`) sized `CX`×`DX`.
    DRAW_RECT = 13,
    /// Draw a circle centered at (`AX`, `BX`) with radius `CX`.
    DRAW_CIRCLE = 14,
    /// Clear the display.
    CLEAR = 15,
    /// Force a display refresh.
    REFRESH = 16,
    /// `AX` := framebuffer pixel at (`AX`, `BX`).
    GET_PIXEL = 17,
    /// Pause execution for `AX` milliseconds.
    SLEEP = 18,
    /// Read the file named at `AX` into the buffer at `BX` (at most `CX`
    /// bytes); `AX` := bytes read, or 0xFFFF on error.
    READ_FILE = 19,
    /// Reserved allocator entry point; always yields 0xFFFF.
    MALLOC = 20,
    /// Reserved allocator entry point; no-op.
    FREE = 21,
}

impl Syscall {
    /// Map a code byte to its syscall, if recognized.
    pub fn from_code(code: u8) -> Option<Self> {
        use Syscall::*;
        let call = match code {
            0 => EXIT,
            1 => PRINT_CHAR,
            2 => PRINT_STRING,
            3 => PRINT_INT,
            4 => READ_CHAR,
            5 => READ_INT,
            6 => READ_STRING,
            7 => ATOI,
            8 => SBRK,
            10 => SET_COLOR,
            11 => DRAW_PIXEL,
            12 => DRAW_LINE,
            13 => DRAW_RECT,
            14 => DRAW_CIRCLE,
            15 => CLEAR,
            16 => REFRESH,
            17 => GET_PIXEL,
            18 => SLEEP,
            19 => READ_FILE,
            20 => MALLOC,
            21 => FREE,
            _ => return None,
        };

        Some(call)
    }

    /// Look a syscall up by name, case-insensitively.
    ///
    /// This is the lookup the assembler uses for `SYSCALL PRINT_INT`
    /// style operands.
    pub fn from_name(name: &str) -> Option<Self> {
        use Syscall::*;
        let call = match name.to_ascii_uppercase().as_str() {
            "EXIT" => EXIT,
            "PRINT_CHAR" => PRINT_CHAR,
            "PRINT_STRING" => PRINT_STRING,
            "PRINT_INT" => PRINT_INT,
            "READ_CHAR" => READ_CHAR,
            "READ_INT" => READ_INT,
            "READ_STRING" => READ_STRING,
            "ATOI" => ATOI,
            "SBRK" => SBRK,
            "SET_COLOR" => SET_COLOR,
            "DRAW_PIXEL" => DRAW_PIXEL,
            "DRAW_LINE" => DRAW_LINE,
            "DRAW_RECT" => DRAW_RECT,
            "DRAW_CIRCLE" => DRAW_CIRCLE,
            "CLEAR" => CLEAR,
            "REFRESH" => REFRESH,
            "GET_PIXEL" => GET_PIXEL,
            "SLEEP" => SLEEP,
            "READ_FILE" => READ_FILE,
            "MALLOC" => MALLOC,
            "FREE" => FREE,
            _ => return None,
        };

        Some(call)
    }

    /// The canonical upper-case name.
    pub const fn name(self) -> &'static str {
        use Syscall::*;
        match self {
            EXIT => "EXIT",
            PRINT_CHAR => "PRINT_CHAR",
            PRINT_STRING => "PRINT_STRING",
            PRINT_INT => "PRINT_INT",
            READ_CHAR => "READ_CHAR",
            READ_INT => "READ_INT",
            READ_STRING => "READ_STRING",
            ATOI => "ATOI",
            SBRK => "SBRK",
            SET_COLOR => "SET_COLOR",
            DRAW_PIXEL => "DRAW_PIXEL",
            DRAW_LINE => "DRAW_LINE",
            DRAW_RECT => "DRAW_RECT",
            DRAW_CIRCLE => "DRAW_CIRCLE",
            CLEAR => "CLEAR",
            REFRESH => "REFRESH",
            GET_PIXEL => "GET_PIXEL",
            SLEEP => "SLEEP",
            READ_FILE => "READ_FILE",
            MALLOC => "MALLOC",
            FREE => "FREE",
        }
    }

    /// The 8-bit wire code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn codes_round_trip() {
        for call in Syscall::iter() {
            assert_eq!(Syscall::from_code(call.code()), Some(call));
        }
    }

    #[test]
    fn names_round_trip() {
        for call in Syscall::iter() {
            assert_eq!(Syscall::from_name(call.name()), Some(call));
            assert_eq!(Syscall::from_name(&call.name().to_lowercase()), Some(call));
        }
    }

    #[test]
    fn reserved_codes_are_unknown() {
        assert_eq!(Syscall::from_code(9), None);
        assert_eq!(Syscall::from_code(22), None);
        assert_eq!(Syscall::from_code(0xff), None);
    }
}
