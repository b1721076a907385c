//! The fetch/decode/execute loop.

use std::time::Instant;

use x366_asm::{Instruction, Opcode, Reg};

use crate::error::ExecutionError;
use crate::host::Host;
use crate::registers::RegName;
use crate::state::{ExecuteState, Pacing, RunState};

use super::flow::Cond;
use super::syscall::SyscallOutcome;
use super::Interpreter;

/// Where the program counter goes after an instruction.
enum Flow {
    Advance,
    Jump(u16),
    Halt,
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Execute exactly one instruction.
    ///
    /// Once halted this is a no-op reporting [`ExecuteState::Halt`]. A
    /// fatal error rolls the partial step back (so observers still see a
    /// consistent pre-instruction snapshot), halts the machine, and
    /// surfaces the error.
    pub fn step(&mut self) -> Result<ExecuteState, ExecutionError> {
        if self.halted {
            return Ok(ExecuteState::Halt);
        }

        self.journal.begin_step();
        match self.step_inner() {
            Ok(state) => {
                self.journal.commit_step(self.params.step_back_limit);
                if !state.should_continue() {
                    self.halted = true;
                    self.host.halted();
                }
                Ok(state)
            }
            Err(e) => {
                self.revert_current();
                self.halted = true;
                Err(e)
            }
        }
    }

    fn step_inner(&mut self) -> Result<ExecuteState, ExecutionError> {
        let pc = self.registers.pc();
        let bytes = self.fetch(pc)?;
        let inst = Instruction::decode(bytes)
            .map_err(|e| ExecutionError::UnknownOpcode { opcode: e.0, pc })?;
        tracing::trace!("0x{pc:04X}: {inst}");

        let next = pc.wrapping_add(inst.size());
        let state = match self.execute(inst, next)? {
            Flow::Advance => {
                self.write_named(RegName::Pc, next);
                ExecuteState::Proceed
            }
            Flow::Jump(target) => {
                self.write_named(RegName::Pc, target);
                ExecuteState::Proceed
            }
            Flow::Halt => {
                self.write_named(RegName::Pc, next);
                ExecuteState::Halt
            }
        };

        self.prefetch();

        Ok(state)
    }

    /// Read an instruction's bytes at `pc`. Only as many bytes as the
    /// opcode's width are fetched, so a 2-byte instruction at the top of
    /// memory does not fault.
    fn fetch(&mut self, pc: u16) -> Result<[u8; 4], ExecutionError> {
        let opcode_byte = self.mem_read_byte(pc)?;
        let size = Opcode::try_from(opcode_byte)
            .map_err(|e| ExecutionError::UnknownOpcode { opcode: e.0, pc })?
            .size();

        let mut bytes = [opcode_byte, 0, 0, 0];
        for (i, slot) in bytes.iter_mut().enumerate().take(size as usize).skip(1) {
            *slot = self.mem_read_byte(pc.wrapping_add(i as u16))?;
        }

        Ok(bytes)
    }

    /// Mirror the word pair at the new `PC` into `IR`/`DR` for
    /// observers.
    fn prefetch(&mut self) {
        let pc = self.registers.pc();
        let mut bytes = [0u8; 4];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = self.mem_read_byte(pc.wrapping_add(i as u16)).unwrap_or(0);
        }

        self.write_named(RegName::Ir, u16::from_be_bytes([bytes[0], bytes[1]]));
        self.write_named(RegName::Dr, u16::from_be_bytes([bytes[2], bytes[3]]));
    }

    fn execute(&mut self, inst: Instruction, next: u16) -> Result<Flow, ExecutionError> {
        use Instruction as I;

        let flow = match inst {
            I::NOP => Flow::Advance,
            I::HLT => Flow::Halt,

            I::MOV_RR { dst, src } => {
                let value = self.registers.get(src);
                self.write_reg(dst, value);
                Flow::Advance
            }
            I::MOV_RI { dst, imm } => {
                self.write_reg(dst, imm);
                Flow::Advance
            }
            I::LOAD { dst, addr } => {
                let value = self.mem_read_word(addr)?;
                self.write_reg(dst, value);
                Flow::Advance
            }
            I::LOADB { dst, addr } => {
                let value = self.mem_read_byte(addr)?;
                self.write_reg_byte(dst, value);
                Flow::Advance
            }
            I::STORE { src, addr } => {
                let value = self.registers.get(src);
                self.mem_write_word(addr, value)?;
                Flow::Advance
            }
            I::STOREB { src, addr } => {
                let value = self.registers.get_byte(src);
                self.mem_write_byte(addr, value)?;
                Flow::Advance
            }
            I::LOADR { dst, base, offset } => {
                let addr = self.effective(base, offset);
                let value = self.mem_read_word(addr)?;
                self.write_reg(dst, value);
                Flow::Advance
            }
            I::LOADBR { dst, base, offset } => {
                let addr = self.effective(base, offset);
                let value = self.mem_read_byte(addr)?;
                self.write_reg_byte(dst, value);
                Flow::Advance
            }
            I::STORER { src, base, offset } => {
                let addr = self.effective(base, offset);
                let value = self.registers.get(src);
                self.mem_write_word(addr, value)?;
                Flow::Advance
            }
            I::STOREBR { src, base, offset } => {
                let addr = self.effective(base, offset);
                let value = self.registers.get_byte(src);
                self.mem_write_byte(addr, value)?;
                Flow::Advance
            }
            I::LEA { dst, base, offset } => {
                let addr = self.effective(base, offset);
                self.write_reg(dst, addr);
                Flow::Advance
            }
            I::STOREI { base, imm } => {
                let addr = self.registers.get(base);
                self.mem_write_word(addr, imm)?;
                Flow::Advance
            }
            I::STOREI_DIRECT { addr, imm } => {
                self.mem_write_word(addr, imm as u16)?;
                Flow::Advance
            }
            I::LOADX { dst, base, index } => {
                let addr = self.indexed(base, index);
                let value = self.mem_read_word(addr)?;
                self.write_reg(dst, value);
                Flow::Advance
            }
            I::STOREX { src, base, index } => {
                let addr = self.indexed(base, index);
                let value = self.registers.get(src);
                self.mem_write_word(addr, value)?;
                Flow::Advance
            }

            I::INC_MEM { addr } => self.inc_dec_mem(addr, 1)?,
            I::DEC_MEM { addr } => self.inc_dec_mem(addr, -1)?,
            I::INC_MEMR { base, offset } => {
                let addr = self.effective(base, offset);
                self.inc_dec_mem(addr, 1)?
            }
            I::DEC_MEMR { base, offset } => {
                let addr = self.effective(base, offset);
                self.inc_dec_mem(addr, -1)?
            }
            I::INC_REG { reg } => {
                let value = self.registers.get(reg);
                let result = self.inc_dec_value(value, 1);
                self.write_reg(reg, result);
                Flow::Advance
            }
            I::DEC_REG { reg } => {
                let value = self.registers.get(reg);
                let result = self.inc_dec_value(value, -1);
                self.write_reg(reg, result);
                Flow::Advance
            }

            I::ADD_RR { dst, src } => {
                let operand = self.registers.get(src);
                self.alu_add(dst, operand);
                Flow::Advance
            }
            I::ADD_RI { dst, imm } => {
                self.alu_add(dst, imm);
                Flow::Advance
            }
            I::ADD_MEM { dst, addr } => {
                let operand = self.mem_read_word(addr)?;
                self.alu_add(dst, operand);
                Flow::Advance
            }
            I::ADD_MEMR { dst, base, offset } => {
                let addr = self.effective(base, offset);
                let operand = self.mem_read_word(addr)?;
                self.alu_add(dst, operand);
                Flow::Advance
            }
            I::SUB_RR { dst, src } => {
                let operand = self.registers.get(src);
                self.alu_sub(dst, operand);
                Flow::Advance
            }
            I::SUB_RI { dst, imm } => {
                self.alu_sub(dst, imm);
                Flow::Advance
            }
            I::SUB_MEM { dst, addr } => {
                let operand = self.mem_read_word(addr)?;
                self.alu_sub(dst, operand);
                Flow::Advance
            }
            I::SUB_MEMR { dst, base, offset } => {
                let addr = self.effective(base, offset);
                let operand = self.mem_read_word(addr)?;
                self.alu_sub(dst, operand);
                Flow::Advance
            }
            I::MUL { src } => {
                self.alu_mul(src);
                Flow::Advance
            }
            I::DIV { src } => {
                self.alu_div(src)?;
                Flow::Advance
            }

            I::AND_RR { dst, src } => {
                let result = self.registers.get(dst) & self.registers.get(src);
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::AND_RI { dst, imm } => {
                let result = self.registers.get(dst) & imm;
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::OR_RR { dst, src } => {
                let result = self.registers.get(dst) | self.registers.get(src);
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::OR_RI { dst, imm } => {
                let result = self.registers.get(dst) | imm;
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::XOR_RR { dst, src } => {
                let result = self.registers.get(dst) ^ self.registers.get(src);
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::XOR_RI { dst, imm } => {
                let result = self.registers.get(dst) ^ imm;
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::NOT { reg } => {
                let result = !self.registers.get(reg);
                self.alu_logic(reg, result);
                Flow::Advance
            }
            // Shift counts are taken mod 16.
            I::SHL { dst, imm } => {
                let result = self.registers.get(dst).wrapping_shl((imm & 0x0f) as u32);
                self.alu_logic(dst, result);
                Flow::Advance
            }
            I::SHR { dst, imm } => {
                let result = self.registers.get(dst).wrapping_shr((imm & 0x0f) as u32);
                self.alu_logic(dst, result);
                Flow::Advance
            }

            I::CMP_RR { lhs, rhs } => {
                let (a, b) = (self.registers.get(lhs), self.registers.get(rhs));
                self.alu_cmp(a, b);
                Flow::Advance
            }
            I::CMP_RI { lhs, imm } => {
                let a = self.registers.get(lhs);
                self.alu_cmp(a, imm);
                Flow::Advance
            }
            I::CMP_MEM { lhs, addr } => {
                let a = self.registers.get(lhs);
                let b = self.mem_read_word(addr)?;
                self.alu_cmp(a, b);
                Flow::Advance
            }
            I::CMP_MEMR { lhs, base, offset } => {
                let addr = self.effective(base, offset);
                let a = self.registers.get(lhs);
                let b = self.mem_read_word(addr)?;
                self.alu_cmp(a, b);
                Flow::Advance
            }

            I::JMP { addr } => self.branch(Cond::Always, addr),
            I::JE { addr } => self.branch(Cond::Equal, addr),
            I::JNE { addr } => self.branch(Cond::NotEqual, addr),
            I::JL { addr } => self.branch(Cond::Less, addr),
            I::JG { addr } => self.branch(Cond::Greater, addr),
            I::JLE { addr } => self.branch(Cond::LessOrEqual, addr),
            I::JGE { addr } => self.branch(Cond::GreaterOrEqual, addr),
            I::LOOP { addr } => {
                let cx = self.registers.get(Reg::CX).wrapping_sub(1);
                self.write_reg(Reg::CX, cx);
                if cx != 0 {
                    Flow::Jump(addr)
                } else {
                    Flow::Advance
                }
            }

            I::PUSH { reg } => {
                let value = self.registers.get(reg);
                self.push_word(value)?;
                Flow::Advance
            }
            I::POP { reg } => {
                let value = self.pop_word()?;
                self.write_reg(reg, value);
                Flow::Advance
            }
            I::CALL { addr } => {
                self.push_word(next)?;
                Flow::Jump(addr)
            }
            I::RET => {
                let target = self.pop_word()?;
                Flow::Jump(target)
            }

            I::SYSCALL { code } => match self.syscall(code)? {
                SyscallOutcome::Continue => Flow::Advance,
                SyscallOutcome::Exit => Flow::Halt,
            },
        };

        Ok(flow)
    }

    fn branch(&self, cond: Cond, addr: u16) -> Flow {
        if self.taken(cond) {
            Flow::Jump(addr)
        } else {
            Flow::Advance
        }
    }

    fn inc_dec_mem(&mut self, addr: u16, delta: i16) -> Result<Flow, ExecutionError> {
        let value = self.mem_read_word(addr)?;
        let result = self.inc_dec_value(value, delta);
        self.mem_write_word(addr, result)?;
        Ok(Flow::Advance)
    }

    /// Step repeatedly under `pacing`, yielding between slices.
    ///
    /// Returns [`RunState::Halted`] when the program halts,
    /// [`RunState::Cancelled`] when `cancel` reads true at a yield
    /// boundary (the in-flight instruction completes first), and
    /// [`RunState::Yielded`] when a wall-clock deadline hands control
    /// back to the host.
    pub fn run(
        &mut self,
        pacing: &Pacing,
        cancel: impl Fn() -> bool,
    ) -> Result<RunState, ExecutionError> {
        loop {
            let slice_start = Instant::now();
            for _ in 0..pacing.instructions_per_yield {
                if !self.step()?.should_continue() {
                    return Ok(RunState::Halted);
                }
                if pacing.deadline.is_some_and(|d| slice_start.elapsed() >= d) {
                    break;
                }
            }

            if cancel() {
                return Ok(RunState::Cancelled);
            }
            if pacing.deadline.is_some() {
                return Ok(RunState::Yielded);
            }
            std::thread::yield_now();
        }
    }

    /// Step until halt or `max_steps`, returning the number of executed
    /// steps.
    pub fn run_to_halt(&mut self, max_steps: usize) -> Result<usize, ExecutionError> {
        for n in 0..max_steps {
            if !self.step()?.should_continue() {
                return Ok(n + 1);
            }
        }

        Ok(max_steps)
    }
}
