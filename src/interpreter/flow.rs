//! Stack discipline and branch conditions.

use x366_asm::Reg;

use crate::error::ExecutionError;
use crate::host::Host;
use crate::registers::Flags;

use super::Interpreter;

/// Branch conditions over the flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cond {
    Always,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Push pre-decrements `SP` by 2.
    pub(crate) fn push_word(&mut self, value: u16) -> Result<(), ExecutionError> {
        let sp = self.registers.get(Reg::SP).wrapping_sub(2);
        self.write_reg(Reg::SP, sp);
        self.mem_write_word(sp, value)
    }

    /// Pop post-increments `SP` by 2. Popping with `SP` at or above
    /// memory size is a stack underflow.
    pub(crate) fn pop_word(&mut self) -> Result<u16, ExecutionError> {
        let sp = self.registers.get(Reg::SP);
        if sp as usize >= self.memory.size() {
            return Err(ExecutionError::StackUnderflow { pc: self.registers.pc() });
        }

        let value = self.mem_read_word(sp)?;
        self.write_reg(Reg::SP, sp.wrapping_add(2));
        Ok(value)
    }

    /// Evaluate a branch condition against the current flags. The signed
    /// conditions compare SIGN with OVERFLOW.
    pub(crate) fn taken(&self, cond: Cond) -> bool {
        let flags = self.registers.flags();
        let zf = flags.contains(Flags::ZERO);
        let sf = flags.contains(Flags::SIGN);
        let of = flags.contains(Flags::OVERFLOW);

        match cond {
            Cond::Always => true,
            Cond::Equal => zf,
            Cond::NotEqual => !zf,
            Cond::Less => sf != of,
            Cond::Greater => !zf && sf == of,
            Cond::LessOrEqual => zf || sf != of,
            Cond::GreaterOrEqual => sf == of,
        }
    }
}
