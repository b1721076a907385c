//! Loading a binary container into the machine.

use x366_asm::Reg;
use x366_bin::{Binary, DebugInfo, HEADER_LEN};

use crate::consts::CODE_BASE;
use crate::error::LoadError;
use crate::host::Host;
use crate::memory::Memory;
use crate::registers::RegName;

use super::Interpreter;

/// What the loader did, for the host's benefit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Where code was loaded (always 0x0020).
    pub code_base: u16,
    /// End of the code segment, from the header.
    pub code_end: u16,
    /// End of the loaded image (code plus data) in memory.
    pub data_end: u16,
    /// Initial break pointer, from the header.
    pub break_ptr: u16,
    /// Address of the NUL-terminated command-line string, 0 if none was
    /// supplied.
    pub command_line_addr: u16,
    /// Decoded debug section, if the binary carried a well-formed one.
    pub debug: Option<DebugInfo>,
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Load a binary: verify and parse the container, size and zero
    /// memory, copy the image, append the optional command-line string,
    /// and seed the register file.
    pub fn load_binary(
        &mut self,
        bytes: &[u8],
        cli_arg: Option<&str>,
    ) -> Result<LoadReport, LoadError> {
        let bin = Binary::from_bytes(bytes)?;
        let size = bin.memory_size.bytes();
        let image_end = HEADER_LEN + bin.image.len();

        if image_end > size {
            return Err(LoadError::ImageOverrun(bin.image.len()));
        }
        // Instructions never straddle the top of memory: the fetcher
        // relies on at least one trailing byte past any code address.
        if bin.code_end as usize > size - 2 {
            return Err(LoadError::ImageOverrun(bin.code_end as usize));
        }

        let debug = match bin.debug_info() {
            Some(Ok(debug)) => Some(debug),
            Some(Err(e)) => {
                tracing::warn!("ignoring malformed debug section: {e}");
                None
            }
            None => None,
        };

        self.memory = Memory::new(size);
        self.memory
            .copy_in(CODE_BASE, &bin.image)
            .map_err(|_| LoadError::ImageOverrun(bin.image.len()))?;

        let data_end = image_end as u16;
        let command_line_addr = match cli_arg {
            Some(arg) => {
                if image_end + arg.len() + 1 > size {
                    return Err(LoadError::ImageOverrun(image_end + arg.len() + 1));
                }
                // Memory past the image is zeroed, so the terminator is
                // already in place.
                self.memory
                    .copy_in(data_end, arg.as_bytes())
                    .map_err(|_| LoadError::ImageOverrun(arg.len()))?;
                data_end
            }
            None => 0,
        };

        self.registers.reset(size);
        self.registers.set_named(RegName::Bk, bin.break_ptr);
        self.registers.set_named(RegName::Cb, bin.code_end);
        self.registers.set(Reg::AX, command_line_addr);

        self.halted = false;
        self.journal.clear();
        self.input_buf.clear();
        self.debug = debug.clone();

        tracing::debug!(
            "loaded {} image bytes, memory {} bytes, code ends 0x{:04X}",
            bin.image.len(),
            size,
            bin.code_end,
        );

        Ok(LoadReport {
            code_base: CODE_BASE,
            code_end: bin.code_end,
            data_end,
            break_ptr: bin.break_ptr,
            command_line_addr,
            debug,
        })
    }
}
