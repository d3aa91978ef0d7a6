//! Core of the SR32 toolchain: the instruction encoding shared by the
//! assembler, disassembler and emulator, plus the interpreter itself.
//!
//! The encoding lives in [`instructions`](instructions/index.html) and is
//! the single source of truth; the disassembler's pattern table and the
//! interpreter's decoder are both derived from it. The interpreter
//! ([`Processor`](processor/struct.Processor.html)) executes against a flat
//! [`Memory`](memory/struct.Memory.html) and an
//! [`IoDevice`](io/trait.IoDevice.html) provided by the embedding program.

pub mod constants;
pub mod disasm;
pub mod instructions;
pub mod io;
pub mod memory;
pub mod processor;

pub use crate::constants::*;
pub use crate::disasm::disassemble;
pub use crate::instructions::*;
pub use crate::io::{IoDevice, IoResult, IoStop, NullDevice};
pub use crate::memory::Memory;
pub use crate::processor::{ExitCode, Processor};
pub use crate::processor::{TRACE_BRANCH, TRACE_FETCH, TRACE_IO, TRACE_REGS};

/// One machine word.
pub type Word = u32;

/// Byte order of words in RAM and in assembled images.
pub type Endian = byteorder::LittleEndian;

#[cfg(test)]
mod test;
