#![allow(dead_code)]

use x366_vm::prelude::*;

/// Assemble `source` and load it into a fresh machine with a scripted
/// host.
pub fn boot(source: &str) -> Interpreter<BufferedHost> {
    boot_with(source, BufferedHost::new())
}

pub fn boot_with(source: &str, host: BufferedHost) -> Interpreter<BufferedHost> {
    let binary = x366_assembler::assemble(source).expect("assemble");
    let mut vm = Interpreter::new(host);
    vm.load_binary(&binary.to_bytes(), None).expect("load");
    vm
}

/// Run to completion; programs in these tests always halt.
pub fn run(vm: &mut Interpreter<BufferedHost>) {
    let steps = vm.run_to_halt(100_000).expect("execute");
    assert!(vm.is_halted(), "program did not halt within {steps} steps");
}

pub fn reg(vm: &Interpreter<BufferedHost>, reg: Reg) -> u16 {
    vm.registers().get(reg)
}

pub fn flags(vm: &Interpreter<BufferedHost>) -> Flags {
    vm.registers().flags()
}
