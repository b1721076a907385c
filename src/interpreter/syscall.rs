//! The syscall layer: dispatch on the 8-bit code carried by `SYSCALL`.
//!
//! Unknown codes are non-fatal — they are reported through the output
//! sink and execution continues. Reads from the input provider are
//! line-oriented at the host boundary; an internal byte queue adapts
//! them to the character-level reads.

use x366_asm::{Reg, Syscall};

use crate::consts::{FB_HEIGHT, FB_WIDTH};
use crate::error::ExecutionError;
use crate::host::Host;
use crate::registers::RegName;

use super::Interpreter;

/// What the dispatcher tells the execute loop.
pub(crate) enum SyscallOutcome {
    Continue,
    Exit,
}

impl<H> Interpreter<H>
where
    H: Host,
{
    pub(crate) fn syscall(&mut self, code: u8) -> Result<SyscallOutcome, ExecutionError> {
        let Some(call) = Syscall::from_code(code) else {
            tracing::warn!("unknown syscall {code}");
            self.host.output(&format!("unknown syscall {code}\n"));
            return Ok(SyscallOutcome::Continue);
        };

        match call {
            Syscall::EXIT => return Ok(SyscallOutcome::Exit),

            Syscall::PRINT_CHAR => {
                let ch = self.registers.get_byte(Reg::AX) as char;
                self.host.output(&ch.to_string());
            }
            Syscall::PRINT_STRING => self.print_string()?,
            Syscall::PRINT_INT => {
                let value = self.registers.get(Reg::AX) as i16;
                self.host.output(&value.to_string());
            }

            Syscall::READ_CHAR => {
                let ch = self.next_input_byte().unwrap_or(0);
                self.write_reg(Reg::AX, ch as u16);
            }
            Syscall::READ_INT => {
                let value = self.read_int();
                self.write_reg(Reg::AX, value);
            }
            Syscall::READ_STRING => self.read_string()?,
            Syscall::ATOI => self.atoi(),

            Syscall::SBRK => {
                let old = self.registers.bk();
                let delta = self.registers.get(Reg::AX);
                self.write_reg(Reg::AX, old);
                self.write_named(RegName::Bk, old.wrapping_add(delta));
            }

            Syscall::SET_COLOR => {
                let color = self.registers.get_byte(Reg::AX);
                if let Some(display) = self.host.display() {
                    display.set_color(color);
                }
            }
            Syscall::DRAW_PIXEL => {
                let (x, y) = (self.registers.get(Reg::AX), self.registers.get(Reg::BX));
                if let Some(display) = self.host.display() {
                    display.draw_pixel(x, y);
                }
            }
            Syscall::DRAW_LINE => {
                let (x0, y0) = (self.registers.get(Reg::AX), self.registers.get(Reg::BX));
                let (x1, y1) = (self.registers.get(Reg::CX), self.registers.get(Reg::DX));
                if let Some(display) = self.host.display() {
                    display.draw_line(x0, y0, x1, y1);
                }
            }
            Syscall::DRAW_RECT => {
                let (x, y) = (self.registers.get(Reg::AX), self.registers.get(Reg::BX));
                let (w, h) = (self.registers.get(Reg::CX), self.registers.get(Reg::DX));
                if let Some(display) = self.host.display() {
                    display.draw_rect(x, y, w, h);
                }
            }
            Syscall::DRAW_CIRCLE => {
                let (x, y) = (self.registers.get(Reg::AX), self.registers.get(Reg::BX));
                let r = self.registers.get(Reg::CX);
                if let Some(display) = self.host.display() {
                    display.draw_circle(x, y, r);
                }
            }
            Syscall::CLEAR => {
                if let Some(display) = self.host.display() {
                    display.clear();
                }
            }
            Syscall::REFRESH => {
                if let Some(display) = self.host.display() {
                    display.refresh();
                }
            }
            Syscall::GET_PIXEL => {
                let value = self.get_pixel();
                self.write_reg(Reg::AX, value);
            }

            Syscall::SLEEP => {
                let ms = self.registers.get(Reg::AX);
                self.host.sleep(ms);
            }
            Syscall::READ_FILE => self.read_file()?,

            Syscall::MALLOC => self.write_reg(Reg::AX, 0xffff),
            Syscall::FREE => {}
        }

        Ok(SyscallOutcome::Continue)
    }

    fn print_string(&mut self) -> Result<(), ExecutionError> {
        let mut addr = self.registers.get(Reg::AX);
        let mut out = String::new();

        for _ in 0..self.params.print_string_cap {
            let byte = self.mem_read_byte(addr)?;
            if byte == 0 {
                break;
            }
            out.push(byte as char);
            addr = addr.wrapping_add(1);
        }

        self.host.output(&out);
        Ok(())
    }

    /// Next pending input byte, refilling the queue with one host line
    /// (newline appended) when empty.
    fn next_input_byte(&mut self) -> Option<u8> {
        if self.input_buf.is_empty() {
            let line = self.host.input_line()?;
            self.input_buf.extend(line.into_bytes());
            self.input_buf.push_back(b'\n');
        }

        self.input_buf.pop_front()
    }

    /// One full line: drains the pending queue up to a newline, or asks
    /// the host.
    fn read_line(&mut self) -> Option<String> {
        if self.input_buf.is_empty() {
            return self.host.input_line();
        }

        let mut line = Vec::new();
        while let Some(byte) = self.input_buf.pop_front() {
            if byte == b'\n' {
                break;
            }
            line.push(byte);
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn read_int(&mut self) -> u16 {
        self.read_line()
            .and_then(|line| line.trim().parse::<i32>().ok())
            .map(|value| value as u16)
            .unwrap_or(0)
    }

    fn read_string(&mut self) -> Result<(), ExecutionError> {
        let buf = self.registers.get(Reg::AX);
        let max = self.registers.get(Reg::BX);
        if max == 0 {
            self.write_reg(Reg::AX, 0);
            return Ok(());
        }

        let line = self.read_line().unwrap_or_default();
        let bytes = line.as_bytes();
        let len = bytes.len().min(max as usize - 1);
        for (i, byte) in bytes[..len].iter().enumerate() {
            self.mem_write_byte(buf.wrapping_add(i as u16), *byte)?;
        }
        self.mem_write_byte(buf.wrapping_add(len as u16), 0)?;
        self.write_reg(Reg::AX, len as u16);

        Ok(())
    }

    /// Parse a signed decimal at `AX`: skip blanks, accept one sign,
    /// stop at the first non-digit. `AX` gets the truncated 16-bit
    /// value, `BX` the address past the last digit. Running off memory
    /// terminates the scan.
    fn atoi(&mut self) {
        let mut addr = self.registers.get(Reg::AX);
        let peek = |vm: &mut Self, a: u16| vm.mem_read_byte(a).unwrap_or(0);

        while matches!(peek(self, addr), b' ' | b'\t' | b'\n' | b'\r') {
            addr = addr.wrapping_add(1);
        }

        let mut negative = false;
        match peek(self, addr) {
            b'+' => addr = addr.wrapping_add(1),
            b'-' => {
                negative = true;
                addr = addr.wrapping_add(1);
            }
            _ => {}
        }

        let mut value: i32 = 0;
        loop {
            let byte = peek(self, addr);
            if !byte.is_ascii_digit() {
                break;
            }
            value = value.wrapping_mul(10).wrapping_add((byte - b'0') as i32);
            addr = addr.wrapping_add(1);
        }
        if negative {
            value = -value;
        }

        self.write_reg(Reg::AX, value as i16 as u16);
        self.write_reg(Reg::BX, addr);
    }

    fn get_pixel(&mut self) -> u16 {
        let x = self.registers.get(Reg::AX) as usize;
        let y = self.registers.get(Reg::BX) as usize;

        let Some(display) = self.host.display() else { return 0 };
        if x >= FB_WIDTH || y >= FB_HEIGHT {
            return 0;
        }

        // Four pixels per byte, most significant pair first.
        let idx = y * (FB_WIDTH / 4) + x / 4;
        let byte = display.framebuffer().get(idx).copied().unwrap_or(0);
        let shift = 6 - 2 * (x % 4);
        ((byte >> shift) & 0b11) as u16
    }

    fn read_file(&mut self) -> Result<(), ExecutionError> {
        let name_addr = self.registers.get(Reg::AX);
        let buf = self.registers.get(Reg::BX);
        let max = self.registers.get(Reg::CX) as usize;

        let mut name = String::new();
        let mut addr = name_addr;
        loop {
            let byte = self.mem_read_byte(addr)?;
            if byte == 0 {
                break;
            }
            name.push(byte as char);
            addr = addr.wrapping_add(1);
        }

        let data = self.host.blob_store().and_then(|store| store.read(&name));
        match data {
            None => {
                tracing::debug!("READ_FILE failed for {name:?}");
                self.write_reg(Reg::AX, 0xffff);
            }
            Some(bytes) => {
                let len = bytes.len().min(max);
                for (i, byte) in bytes[..len].iter().enumerate() {
                    self.mem_write_byte(buf.wrapping_add(i as u16), *byte)?;
                }
                self.write_reg(Reg::AX, len as u16);
            }
        }

        Ok(())
    }
}
