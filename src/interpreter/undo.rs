//! The per-step undo journal.
//!
//! Every engine-side write goes through the journaled mutators below,
//! which record the previous value as a reverse mutation. A committed
//! step becomes one record on a bounded history;
//! [`step_back`](Interpreter::step_back) drains a record in reverse.
//! Externally visible syscall effects (console output, file reads,
//! sleeps, display drawing) are not reversible.

use std::collections::VecDeque;

use x366_asm::Reg;

use crate::registers::{Flags, RegName, Width};

use super::Interpreter;

/// One reversible mutation, holding the value it overwrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    /// A register write.
    Reg { name: RegName, prev: u16 },
    /// A flag-set replacement.
    Flags { prev: Flags },
    /// One byte of memory.
    MemByte { addr: u16, prev: u8 },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    current: Vec<Mutation>,
    history: VecDeque<Vec<Mutation>>,
}

impl Journal {
    pub fn begin_step(&mut self) {
        self.current.clear();
    }

    pub fn record(&mut self, mutation: Mutation) {
        self.current.push(mutation);
    }

    pub fn commit_step(&mut self, limit: usize) {
        let record = std::mem::take(&mut self.current);
        self.history.push_back(record);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }

    pub fn take_current(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.current)
    }

    pub fn pop(&mut self) -> Option<Vec<Mutation>> {
        self.history.pop_back()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.history.clear();
    }
}

impl<H> Interpreter<H> {
    /// Journaled user-register write.
    pub(crate) fn write_reg(&mut self, reg: Reg, value: u16) {
        self.journal.record(Mutation::Reg {
            name: RegName::Gp(reg),
            prev: self.registers.get(reg),
        });
        self.registers.set(reg, value);
    }

    /// Journaled low-byte write (high byte kept).
    pub(crate) fn write_reg_byte(&mut self, reg: Reg, value: u8) {
        self.journal.record(Mutation::Reg {
            name: RegName::Gp(reg),
            prev: self.registers.get(reg),
        });
        self.registers.set_byte(reg, value);
    }

    /// Journaled hidden-register write.
    pub(crate) fn write_named(&mut self, name: RegName, value: u16) {
        self.journal.record(Mutation::Reg {
            name,
            prev: self.registers.get_named(name),
        });
        self.registers.set_named(name, value);
    }

    /// Journaled flag-set replacement.
    pub(crate) fn write_flags(&mut self, flags: Flags) {
        self.journal.record(Mutation::Flags { prev: self.registers.flags() });
        self.registers.set_flags(flags);
    }

    /// Journaled ZERO/SIGN update, leaving CARRY/OVERFLOW untouched.
    pub(crate) fn write_zs(&mut self, result: u16, width: Width) {
        let prev = self.registers.flags();
        self.registers.update_flags(result, width);
        let updated = self.registers.flags();
        self.registers.set_flags(prev);
        self.write_flags(updated);
    }

    /// How many steps can currently be rolled back.
    pub fn history_len(&self) -> usize {
        self.journal.len()
    }

    /// Roll the most recent committed step back. Returns `false` with an
    /// empty history.
    pub fn step_back(&mut self) -> bool {
        match self.journal.pop() {
            Some(record) => {
                self.apply_reversed(record);
                // Rolling back past a halt resumes the machine.
                self.halted = false;
                true
            }
            None => false,
        }
    }

    pub(crate) fn revert_current(&mut self) {
        let record = self.journal.take_current();
        self.apply_reversed(record);
    }

    fn apply_reversed(&mut self, record: Vec<Mutation>) {
        for mutation in record.into_iter().rev() {
            match mutation {
                Mutation::Reg { name, prev } => self.registers.set_named(name, prev),
                Mutation::Flags { prev } => self.registers.set_flags(prev),
                Mutation::MemByte { addr, prev } => {
                    // Addresses were in bounds when recorded.
                    let _ = self.memory.write_byte(addr, prev);
                }
            }
        }
    }
}
