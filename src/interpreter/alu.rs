//! Arithmetic helpers and flag-update rules.

use x366_asm::Reg;

use crate::error::ExecutionError;
use crate::host::Host;
use crate::registers::{Flags, Width};

use super::Interpreter;

fn sub_with_flags(a: u16, b: u16) -> (u16, bool, bool) {
    let result = a.wrapping_sub(b);
    let borrow = b > a;
    let overflow = ((a ^ b) & (a ^ result) & 0x8000) != 0;
    (result, borrow, overflow)
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Replace the whole flag set from an arithmetic result.
    fn write_arith_flags(&mut self, result: u16, carry: bool, overflow: bool) {
        let mut flags = Flags::empty();
        flags.set(Flags::ZERO, result == 0);
        flags.set(Flags::SIGN, result & 0x8000 != 0);
        flags.set(Flags::CARRY, carry);
        flags.set(Flags::OVERFLOW, overflow);
        self.write_flags(flags);
    }

    /// `dst := dst + operand`, CF on unsigned carry, OF on signed
    /// overflow.
    pub(crate) fn alu_add(&mut self, dst: Reg, operand: u16) {
        let a = self.registers.get(dst);
        let (result, carry) = a.overflowing_add(operand);
        let overflow = ((a ^ result) & (operand ^ result) & 0x8000) != 0;
        self.write_reg(dst, result);
        self.write_arith_flags(result, carry, overflow);
    }

    /// `dst := dst - operand`, CF on borrow.
    pub(crate) fn alu_sub(&mut self, dst: Reg, operand: u16) {
        let (result, borrow, overflow) = sub_with_flags(self.registers.get(dst), operand);
        self.write_reg(dst, result);
        self.write_arith_flags(result, borrow, overflow);
    }

    /// `CMP` is subtraction with the result discarded.
    pub(crate) fn alu_cmp(&mut self, lhs: u16, operand: u16) {
        let (result, borrow, overflow) = sub_with_flags(lhs, operand);
        self.write_arith_flags(result, borrow, overflow);
    }

    /// Logical results update ZERO/SIGN only.
    pub(crate) fn alu_logic(&mut self, dst: Reg, result: u16) {
        self.write_reg(dst, result);
        self.write_zs(result, Width::Word);
    }

    /// `AX := (AX * src) & 0xFFFF`.
    pub(crate) fn alu_mul(&mut self, src: Reg) {
        let result = self
            .registers
            .get(Reg::AX)
            .wrapping_mul(self.registers.get(src));
        self.write_reg(Reg::AX, result);
        self.write_zs(result, Width::Word);
    }

    /// `AX := AX / src`, `DX := AX % src`; zero divisor is fatal.
    pub(crate) fn alu_div(&mut self, src: Reg) -> Result<(), ExecutionError> {
        let divisor = self.registers.get(src);
        if divisor == 0 {
            return Err(ExecutionError::DivisionByZero { pc: self.registers.pc() });
        }

        let a = self.registers.get(Reg::AX);
        let quotient = a / divisor;
        self.write_reg(Reg::AX, quotient);
        self.write_reg(Reg::DX, a % divisor);
        self.write_zs(quotient, Width::Word);

        Ok(())
    }

    /// `INC`/`DEC` touch ZERO/SIGN but never CARRY.
    pub(crate) fn inc_dec_value(&mut self, value: u16, delta: i16) -> u16 {
        let result = value.wrapping_add(delta as u16);
        self.write_zs(result, Width::Word);
        result
    }
}
