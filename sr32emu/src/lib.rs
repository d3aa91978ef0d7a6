//! Emulator harness for SR32 hex images: image loading, the host IO
//! device with its test-vector ports, and guest stack/argument setup.
//!
//! The interpreter itself lives in the [sr32](../sr32/index.html)
//! crate; this crate owns the host side: which files are read, what
//! the IO ports mean, and how a guest program receives
//! `argc`/`argv`.


use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use sr32::{
    make_store, ExitCode, IoDevice, IoResult, IoStop, Memory, Processor, StoreOp, DEFAULT_ORIGIN,
    PORT_CONSOLE, PORT_DATA, PORT_EXIT,
};

/// Test vector data: words served to the guest through the data port,
/// and the words the guest is expected to write back.
#[derive(Debug, Default, PartialEq)]
pub struct TestData {
    pub input: Vec<u32>,
    pub output: Vec<u32>,
}

/// Extracts test vectors from any text file: `//<` queues input words
/// and `//>` queues expected output words, each followed by a
/// comma-separated list of C-style integers. Vectors usually live in
/// the comments of the assembly source under test.
pub fn parse_test_data(text: &str) -> TestData {
    let mut data = TestData::default();
    for line in text.lines() {
        if let Some(at) = line.find("//>") {
            collect_words(&line[at + 3..], &mut data.output);
        }
        if let Some(at) = line.find("//<") {
            collect_words(&line[at + 3..], &mut data.input);
        }
    }
    data
}

fn collect_words(list: &str, words: &mut Vec<u32>) {
    for item in list.split(',') {
        let token = item.split_whitespace().next().unwrap_or("");
        words.push(parse_c_int(token).unwrap_or(0));
    }
}

// C base detection, as strtoul(s, 0, 0) does it.
fn parse_c_int(text: &str) -> Option<u32> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if rest.starts_with("0x") || rest.starts_with("0X") {
        u32::from_str_radix(&rest[2..], 16).ok()?
    } else if rest.len() > 1 && rest.starts_with('0') {
        u32::from_str_radix(&rest[1..], 8).ok()?
    } else {
        rest.parse::<u32>().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}

pub fn load_test_data<P: AsRef<Path>>(path: P) -> io::Result<TestData> {
    let mut text = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut text)?;
    Ok(parse_test_data(&text))
}

/// Loads a hex listing into guest RAM.
pub fn load_image<P: AsRef<Path>>(memory: &mut Memory, path: P) -> io::Result<()> {
    for (addr, word) in hexfile::read_file(path)? {
        memory.write_word(addr, word);
    }
    Ok(())
}

/// The host side of the IO ports: the test-vector data port, the
/// console byte port, and the exit port. Failures are reported to
/// stderr before the machine is stopped.
pub struct HostDevice {
    data: TestData,
    in_next: usize,
    out_next: usize,
    trace: bool,
}

impl HostDevice {
    pub fn new(data: TestData, trace: bool) -> HostDevice {
        HostDevice {
            data,
            in_next: 0,
            out_next: 0,
            trace,
        }
    }
}

impl IoDevice for HostDevice {
    fn read(&mut self, pc: u32, addr: u32) -> IoResult<u32> {
        if addr != PORT_DATA {
            return Ok(0);
        }
        match self.data.input.get(self.in_next) {
            Some(&value) => {
                self.in_next += 1;
                if self.trace {
                    eprintln!("< {:08x}", value);
                }
                Ok(value)
            }
            None => {
                eprintln!("FAIL: PC={:08x}: input data exhausted", pc);
                Err(IoStop::Fail)
            }
        }
    }

    fn write(&mut self, pc: u32, addr: u32, value: u32) -> IoResult<()> {
        match addr {
            PORT_DATA => {
                if self.trace {
                    eprintln!("> {:08x}", value);
                }
                match self.data.output.get(self.out_next) {
                    Some(&expected) => {
                        self.out_next += 1;
                        if expected != value {
                            eprintln!(
                                "FAIL: PC={:08x}: output data {:08x} should be {:08x}",
                                pc, value, expected
                            );
                            return Err(IoStop::Fail);
                        }
                        Ok(())
                    }
                    None => {
                        eprintln!("FAIL: output data overrun");
                        Err(IoStop::Fail)
                    }
                }
            }
            PORT_CONSOLE => {
                let _ = io::stderr().write_all(&[value as u8]);
                Ok(())
            }
            PORT_EXIT => Err(IoStop::Halt),
            _ => Ok(()),
        }
    }
}

/// The word preloaded at the link register: a store of x1 to the exit
/// port, so a bare `ret` from the entry point halts cleanly.
pub const HALT_WORD: u32 = make_store(StoreOp::STX, 1, 0, 0xFFFD);

/// Lays out the guest stack and argument vector below the entry point
/// and seeds the machine: `r1` = link register, `r2` = stack pointer,
/// `r4` = argc, `r5` = argv, PC = entry. The argv vector sits above
/// its NUL-terminated strings; both grow downwards from `entry - 16`.
pub fn setup_guest(processor: &mut Processor, memory: &mut Memory, args: &[String]) {
    let entry = DEFAULT_ORIGIN;
    let mut sp = entry - 16;
    let lr = sp;
    memory.write_word(lr, HALT_WORD);

    let mut argv = 0;
    if !args.is_empty() {
        sp -= (args.len() as u32 + 1) * 4;
        let mut slot = sp;
        argv = slot;
        for arg in args {
            let bytes = arg.as_bytes();
            sp -= (bytes.len() as u32 + 1 + 3) & !3;
            for (i, &byte) in bytes.iter().enumerate() {
                memory.write_byte(sp + i as u32, byte);
            }
            memory.write_byte(sp + bytes.len() as u32, 0);
            memory.write_word(slot, sp);
            slot += 4;
        }
        memory.write_word(slot, 0);
    }

    processor.set_pc(entry);
    processor.set_register(1, lr as i32);
    processor.set_register(2, sp as i32);
    processor.set_register(4, args.len() as i32);
    processor.set_register(5, argv as i32);
}

/// Prints the diagnostic for a failed run and maps the exit code to a
/// process status.
pub fn report(exit: ExitCode, processor: &Processor, memory: &Memory) -> i32 {
    match exit {
        ExitCode::Halted => 0,
        ExitCode::UndefinedInstruction => {
            let pc = processor.pc();
            eprintln!(
                "UNDEF INSTR (PC={:08x} INS={:08x})",
                pc,
                memory.read_word(pc.wrapping_sub(4))
            );
            1
        }
        ExitCode::DivisionByZero => {
            eprintln!("DIVIDE BY ZERO (PC={:08x})", processor.pc());
            1
        }
        ExitCode::IoFault => 1,
    }
}
