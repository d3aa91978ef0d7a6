use num_traits::FromPrimitive;

use crate::constants::*;
use crate::instructions::*;
use crate::io::IoDevice;
use crate::io::IoStop;
use crate::memory::Memory;
use crate::Word;

pub const TRACE_FETCH: u32 = 1 << 0;
pub const TRACE_REGS: u32 = 1 << 1;
pub const TRACE_BRANCH: u32 = 1 << 2;
pub const TRACE_IO: u32 = 1 << 3;

/// Why the interpreter loop ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitCode {
    /// The exit port was written (normal shutdown).
    Halted,
    /// Decode failed; the PC holds the address after the bad word.
    UndefinedInstruction,
    /// Integer division by zero.
    DivisionByZero,
    /// The IO device reported a failure.
    IoFault,
}

impl From<IoStop> for ExitCode {
    fn from(stop: IoStop) -> ExitCode {
        match stop {
            IoStop::Halt => ExitCode::Halted,
            IoStop::Fail => ExitCode::IoFault,
        }
    }
}

enum TickResult {
    Next,
    Stop(ExitCode),
}

/// The SR32 machine state: 32 signed registers and a program counter.
/// Register 0 reads as zero and discards writes.
pub struct Processor {
    registers: [i32; REGISTER_COUNT],
    pc: u32,
    flags: u32,
}

impl Processor {
    pub fn new() -> Processor {
        Processor {
            registers: [0; REGISTER_COUNT],
            pc: 0,
            flags: 0,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags;
    }

    pub fn register(&self, index: u32) -> i32 {
        self.registers[(index & REG_MASK) as usize]
    }

    /// Sets a register without tracing; used to seed machine state.
    pub fn set_register(&mut self, index: u32, value: i32) {
        let index = (index & REG_MASK) as usize;
        if index != 0 {
            self.registers[index] = value;
        }
    }

    /// Runs the fetch/decode/execute loop until the device stops the
    /// machine or decode fails.
    pub fn run(&mut self, memory: &mut Memory, io: &mut dyn IoDevice) -> ExitCode {
        loop {
            if let TickResult::Stop(code) = self.tick(memory, io) {
                return code;
            }
        }
    }

    fn tick(&mut self, memory: &mut Memory, io: &mut dyn IoDevice) -> TickResult {
        let pc = self.pc;
        let ins = memory.read_word(pc);
        if self.flags & TRACE_FETCH != 0 {
            eprintln!("{:08x} {:08x}", pc, ins);
        }
        let next = pc.wrapping_add(WORD_BYTES);
        self.pc = next;

        match get_class(ins) {
            CLASS_LOAD => self.load(memory, io, ins, pc, next),
            CLASS_STORE => self.store(memory, io, ins, pc),
            CLASS_BRANCH => self.branch(ins, pc, next),
            CLASS_JUMP => self.jump(io, ins, pc, next),
            _ => self.alu(ins, pc, next),
        }
    }

    fn write_back(&mut self, index: u32, value: i32) {
        let index = (index & REG_MASK) as usize;
        if index != 0 {
            self.registers[index] = value;
            if self.flags & TRACE_REGS != 0 {
                eprintln!("{:08x} -> X{}", value as u32, index);
            }
        }
    }

    fn take_branch(&mut self, pc: u32, target: u32) {
        if self.flags & TRACE_BRANCH != 0 {
            eprintln!("{:08x} => {:08x}", pc, target);
        }
        self.pc = target;
    }

    fn effective_address(&self, ins: Word) -> u32 {
        (self.register(get_ra(ins)) as u32).wrapping_add(get_i16(ins) as u32)
    }

    fn alu(&mut self, ins: Word, pc: u32, next: u32) -> TickResult {
        let a = self.register(get_ra(ins));
        let b = if ins & ALU_REG_BIT != 0 {
            self.register(get_rb(ins))
        } else {
            get_i16(ins)
        };
        let op = match AluOp::from_u32(ins & ALU_SUBOP_MASK) {
            Some(op) => op,
            None => return TickResult::Stop(ExitCode::UndefinedInstruction),
        };
        let n = match op {
            AluOp::ADD => a.wrapping_add(b),
            AluOp::SUB => a.wrapping_sub(b),
            AluOp::AND => a & b,
            AluOp::OR => a | b,
            AluOp::XOR => a ^ b,
            // Shift amounts are masked to five bits.
            AluOp::SLL => a.wrapping_shl(b as u32),
            AluOp::SRL => (a as u32).wrapping_shr(b as u32) as i32,
            AluOp::SRA => a.wrapping_shr(b as u32),
            AluOp::SLT => (a < b) as i32,
            AluOp::SLTU => ((a as u32) < (b as u32)) as i32,
            AluOp::MUL => a.wrapping_mul(b),
            AluOp::DIV => {
                if b == 0 {
                    return TickResult::Stop(ExitCode::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            AluOp::JALR => {
                self.take_branch(pc, (a as u32).wrapping_add(b as u32));
                next as i32
            }
        };
        self.write_back(get_rt(ins), n);
        TickResult::Next
    }

    fn load(
        &mut self,
        memory: &Memory,
        io: &mut dyn IoDevice,
        ins: Word,
        pc: u32,
        next: u32,
    ) -> TickResult {
        let addr = self.effective_address(ins);
        let op = match LoadOp::from_u32(ins & SUBOP_MASK) {
            Some(op) => op,
            None => return TickResult::Stop(ExitCode::UndefinedInstruction),
        };
        let n = match op {
            LoadOp::LDW => memory.read_word(addr) as i32,
            LoadOp::LDH => memory.read_half(addr) as i16 as i32,
            LoadOp::LDB => memory.read_byte(addr) as i8 as i32,
            LoadOp::LDX => match io.read(pc, addr) {
                Ok(value) => value as i32,
                Err(stop) => return TickResult::Stop(stop.into()),
            },
            LoadOp::LUI => (ins & 0xFFFF_0000) as i32,
            LoadOp::LDHU => memory.read_half(addr) as i32,
            LoadOp::LDBU => memory.read_byte(addr) as i32,
            LoadOp::AUIPC => next.wrapping_add(ins & 0xFFFF_0000) as i32,
        };
        self.write_back(get_rt(ins), n);
        TickResult::Next
    }

    fn store(
        &mut self,
        memory: &mut Memory,
        io: &mut dyn IoDevice,
        ins: Word,
        pc: u32,
    ) -> TickResult {
        let addr = self.effective_address(ins);
        let value = self.register(get_rt(ins));
        match StoreOp::from_u32(ins & SUBOP_MASK) {
            Some(StoreOp::STW) => memory.write_word(addr, value as u32),
            Some(StoreOp::STH) => memory.write_half(addr, value as u16),
            Some(StoreOp::STB) => memory.write_byte(addr, value as u8),
            Some(StoreOp::STX) => {
                if let Err(stop) = io.write(pc, addr, value as u32) {
                    return TickResult::Stop(stop.into());
                }
            }
            None => return TickResult::Stop(ExitCode::UndefinedInstruction),
        }
        TickResult::Next
    }

    fn branch(&mut self, ins: Word, pc: u32, next: u32) -> TickResult {
        let a = self.register(get_ra(ins));
        let b = self.register(get_rt(ins));
        let taken = match BranchOp::from_u32(ins & SUBOP_MASK) {
            Some(BranchOp::BEQ) => a == b,
            Some(BranchOp::BNE) => a != b,
            Some(BranchOp::BLT) => a < b,
            Some(BranchOp::BLTU) => (a as u32) < (b as u32),
            Some(BranchOp::BGE) => a >= b,
            Some(BranchOp::BGEU) => (a as u32) >= (b as u32),
            None => return TickResult::Stop(ExitCode::UndefinedInstruction),
        };
        if taken {
            self.take_branch(pc, next.wrapping_add(get_i16(ins) as u32));
        }
        TickResult::Next
    }

    fn jump(&mut self, io: &mut dyn IoDevice, ins: Word, pc: u32, next: u32) -> TickResult {
        match JumpOp::from_u32(ins & SUBOP_MASK) {
            Some(JumpOp::JAL) => {
                self.write_back(get_rt(ins), next as i32);
                self.take_branch(pc, next.wrapping_add(get_i21(ins) as u32));
                TickResult::Next
            }
            Some(JumpOp::SYSCALL) => match io.syscall(pc, get_i21(ins)) {
                Ok(()) => TickResult::Next,
                Err(stop) => TickResult::Stop(stop.into()),
            },
            // BREAK and SYSRET are reserved encodings.
            _ => TickResult::Stop(ExitCode::UndefinedInstruction),
        }
    }
}

impl Default for Processor {
    fn default() -> Processor {
        Processor::new()
    }
}
