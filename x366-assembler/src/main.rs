//! `x366as` — assemble an X366 source file into a binary container.

use std::process::ExitCode;
use std::{env, fs};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next(), args.next()) {
        (Some(input), Some(output), None) => (input, output),
        _ => {
            eprintln!("usage: x366as <input.asm> <output.bin>");
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(&input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{input}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let binary = match x366_assembler::assemble(&source) {
        Ok(binary) => binary,
        Err(e) => {
            eprintln!("{input}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&output, binary.to_bytes()) {
        eprintln!("{output}: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
