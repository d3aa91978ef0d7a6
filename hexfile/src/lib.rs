//! The hex listing format shared by the assembler and the emulator.
//!
//! A listing carries one 32-bit word per line:
//!
//! ```text
//! 00100000: 06f0b00c // 001100 li x12, 1776              <- entry
//! ```
//!
//! The address and word are lowercase hex; the comment shows the low six
//! bits of the word (bit 5 first), the disassembly, and the name of any
//! symbol bound to the address. Loaders only look at the `addr: word`
//! prefix: lines starting with `#` or `/` are comments, and any other
//! line shorter than 18 characters or without `:` at column 8 is
//! ignored.

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One listing line: a word at an address plus its annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub address: u32,
    pub word: u32,
    pub disasm: String,
    pub label: Option<String>,
}

impl Entry {
    pub fn new(address: u32, word: u32, disasm: String, label: Option<String>) -> Entry {
        Entry {
            address,
            word,
            disasm,
            label,
        }
    }
}

fn class_bits(word: u32) -> String {
    (0..6).rev().map(|i| {
        if word & (1 << i) != 0 {
            '1'
        } else {
            '0'
        }
    }).collect()
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Parses a listing, returning the `(address, word)` pairs.
pub fn read<R: BufRead>(reader: &mut R) -> io::Result<Vec<(u32, u32)>> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.starts_with('/') {
            continue;
        }
        let bytes = line.as_bytes();
        if bytes.len() < 18 || bytes[8] != b':' || !line.is_ascii() {
            continue;
        }
        let address = u32::from_str_radix(&line[..8], 16)
            .map_err(|err| invalid_data(format!("bad address in '{}': {}", line, err)))?;
        let word = u32::from_str_radix(&line[10..18], 16)
            .map_err(|err| invalid_data(format!("bad word in '{}': {}", line, err)))?;
        words.push((address, word));
    }
    Ok(words)
}

/// Writes a full listing.
pub fn write<W: Write>(writer: &mut W, entries: &[Entry]) -> io::Result<()> {
    for entry in entries {
        match &entry.label {
            Some(label) => writeln!(
                writer,
                "{:08x}: {:08x} // {} {:<25} <- {}",
                entry.address,
                entry.word,
                class_bits(entry.word),
                entry.disasm,
                label
            )?,
            None => writeln!(
                writer,
                "{:08x}: {:08x} // {} {}",
                entry.address,
                entry.word,
                class_bits(entry.word),
                entry.disasm
            )?,
        }
    }
    Ok(())
}

pub trait ReadHexExt: BufRead + Sized {
    fn read_hex(&mut self) -> io::Result<Vec<(u32, u32)>> {
        read(self)
    }
}

impl<R: BufRead + Sized> ReadHexExt for R {}

pub trait WriteHexExt: Write + Sized {
    fn write_hex(&mut self, entries: &[Entry]) -> io::Result<()> {
        write(self, entries)
    }
}

impl<W: Write + Sized> WriteHexExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<(u32, u32)>> {
    BufReader::new(File::open(path)?).read_hex()
}

pub fn write_file<P: AsRef<Path>>(path: P, entries: &[Entry]) -> io::Result<()> {
    BufWriter::new(File::create(path)?).write_hex(entries)
}
