use std::collections::VecDeque;

use super::{Interpreter, Journal};
use crate::consts::DEFAULT_MEMORY_SIZE;
use crate::host::NullHost;
use crate::memory::Memory;
use crate::params::VmParams;
use crate::registers::RegisterFile;

impl<H> Interpreter<H> {
    /// A machine with default parameters and a zeroed 1 KiB memory.
    /// Load a binary to size memory properly.
    pub fn new(host: H) -> Self {
        Self::with_params(host, VmParams::default())
    }

    /// A machine with explicit parameters.
    pub fn with_params(host: H, params: VmParams) -> Self {
        let mut registers = RegisterFile::new();
        registers.reset(DEFAULT_MEMORY_SIZE);

        Self {
            memory: Memory::new(DEFAULT_MEMORY_SIZE),
            registers,
            host,
            params,
            halted: false,
            debug: None,
            journal: Journal::default(),
            input_buf: VecDeque::new(),
        }
    }

    /// Tear down, handing the host back.
    pub fn into_host(self) -> H {
        self.host
    }
}

impl Default for Interpreter<NullHost> {
    fn default() -> Self {
        Self::new(NullHost)
    }
}
