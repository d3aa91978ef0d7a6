use byteorder::ByteOrder;
use std::collections::BTreeMap;

use hexfile::Entry;
use sr32::{disassemble, Endian};

/// Capacity of the image buffer behind the base address.
const IMAGE_SIZE: u32 = 1 << 20;

/// The assembler's output: a byte buffer starting at a base address,
/// an advancing emission PC, and the symbol names used to annotate the
/// listing. Writes outside the buffer are silently discarded.
pub struct Image {
    base: u32,
    pc: u32,
    data: Vec<u8>,
    names: BTreeMap<u32, String>,
}

impl Image {
    pub(crate) fn new(base: u32) -> Image {
        Image {
            base,
            pc: base,
            data: vec![0; IMAGE_SIZE as usize],
            names: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// The next emission address.
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// The name bound to `pc`, if any.
    pub fn label_at(&self, pc: u32) -> Option<&str> {
        self.names.get(&pc).map(|name| name.as_str())
    }

    pub(crate) fn set_name(&mut self, pc: u32, name: &str) {
        self.names.insert(pc, name.to_owned());
    }

    /// Rounds the PC up to a multiple of `to` (a power of two).
    pub(crate) fn align(&mut self, to: u32) {
        self.pc = (self.pc + (to - 1)) & !(to - 1);
    }

    pub(crate) fn align_word(&mut self) {
        self.align(4);
    }

    /// Writes `word` at the aligned PC and returns the address it
    /// landed on.
    pub(crate) fn emit(&mut self, word: u32) -> u32 {
        self.align_word();
        let at = self.pc;
        self.wr32(at, word);
        self.pc += 4;
        at
    }

    pub(crate) fn emit_half(&mut self, value: u16) {
        self.align(2);
        let offset = self.pc.wrapping_sub(self.base) as usize;
        if let Some(slice) = self.data.get_mut(offset..offset + 2) {
            Endian::write_u16(slice, value);
        }
        self.pc += 2;
    }

    pub(crate) fn emit_byte(&mut self, value: u8) {
        let offset = self.pc.wrapping_sub(self.base) as usize;
        if let Some(byte) = self.data.get_mut(offset) {
            *byte = value;
        }
        self.pc += 1;
    }

    /// Word write used by fixups; the address is masked down to a word
    /// boundary.
    pub(crate) fn wr32(&mut self, addr: u32, value: u32) {
        let offset = (addr & !3).wrapping_sub(self.base) as usize;
        if let Some(slice) = self.data.get_mut(offset..offset + 4) {
            Endian::write_u32(slice, value);
        }
    }

    pub(crate) fn rd32(&self, addr: u32) -> u32 {
        let offset = (addr & !3).wrapping_sub(self.base) as usize;
        match self.data.get(offset..offset + 4) {
            Some(slice) => Endian::read_u32(slice),
            None => 0,
        }
    }

    /// The emitted bytes, from the base up to the current PC.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.pc.wrapping_sub(self.base) as usize]
    }

    /// Renders the emitted words as annotated listing entries.
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut addr = self.base;
        while addr < self.pc {
            let word = self.rd32(addr);
            entries.push(Entry::new(
                addr,
                word,
                disassemble(addr, word),
                self.names.get(&addr).cloned(),
            ));
            addr += 4;
        }
        entries
    }
}
