//! Journaled memory accessors and effective-address evaluation.
//!
//! The framebuffer window is a routing decision made here: window
//! accesses go to the attached display's framebuffer (reachable even
//! past main memory), everything else is bounds-checked main memory.
//! Framebuffer bytes belong to the display, so window writes are not
//! journaled.

use x366_asm::Reg;

use crate::consts::{FB_BASE, FB_LEN};
use crate::error::ExecutionError;
use crate::host::Host;

use super::undo::Mutation;
use super::Interpreter;

fn fb_index(addr: u16) -> Option<usize> {
    let offset = addr.checked_sub(FB_BASE)? as usize;
    (offset < FB_LEN).then_some(offset)
}

impl<H> Interpreter<H>
where
    H: Host,
{
    pub(crate) fn mem_read_byte(&mut self, addr: u16) -> Result<u8, ExecutionError> {
        if let Some(idx) = fb_index(addr) {
            if let Some(display) = self.host.display() {
                return Ok(display.framebuffer().get(idx).copied().unwrap_or(0));
            }
        }

        self.memory.read_byte(addr)
    }

    pub(crate) fn mem_write_byte(&mut self, addr: u16, value: u8) -> Result<(), ExecutionError> {
        if let Some(idx) = fb_index(addr) {
            if let Some(display) = self.host.display() {
                if let Some(slot) = display.framebuffer_mut().get_mut(idx) {
                    *slot = value;
                }
                display.mark_dirty();
                return Ok(());
            }
        }

        let prev = self.memory.read_byte(addr)?;
        self.journal.record(Mutation::MemByte { addr, prev });
        self.memory.write_byte(addr, value)
    }

    pub(crate) fn mem_read_word(&mut self, addr: u16) -> Result<u16, ExecutionError> {
        let hi = self.mem_read_byte(addr)?;
        let lo = self.mem_read_byte(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub(crate) fn mem_write_word(&mut self, addr: u16, value: u16) -> Result<(), ExecutionError> {
        let [hi, lo] = value.to_be_bytes();
        self.mem_write_byte(addr, hi)?;
        self.mem_write_byte(addr.wrapping_add(1), lo)
    }

    /// Register-relative effective address: `(base + sign_extend(k)) & 0xFFFF`.
    pub(crate) fn effective(&self, base: Reg, offset: i8) -> u16 {
        self.registers.get(base).wrapping_add(offset as i16 as u16)
    }

    /// Indexed effective address: `(base + index) & 0xFFFF`, no scaling.
    pub(crate) fn indexed(&self, base: Reg, index: Reg) -> u16 {
        self.registers.get(base).wrapping_add(self.registers.get(index))
    }

    /// Change the memory size, preserving data below `BK` and relocating
    /// the stack. Invalidates the undo history.
    pub fn resize_memory(&mut self, new_size: usize) -> Result<(), ExecutionError> {
        let bk = self.registers.bk();
        let sp = self.registers.get(Reg::SP);
        let new_sp = self.memory.resize(new_size, bk, sp)?;
        self.registers.set(Reg::SP, new_sp);
        self.journal.clear();
        Ok(())
    }
}
