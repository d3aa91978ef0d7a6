use super::*;

/// Scripted IO device for tests: serves queued input words on the data
/// port, records every port write, and halts on the exit port.
pub struct TestDevice {
    input: Vec<u32>,
    next: usize,
    pub written: Vec<(u32, u32)>,
}

impl TestDevice {
    pub fn new() -> TestDevice {
        TestDevice::with_input(&[])
    }

    pub fn with_input(input: &[u32]) -> TestDevice {
        TestDevice {
            input: Vec::from(input),
            next: 0,
            written: Vec::new(),
        }
    }
}

impl IoDevice for TestDevice {
    fn read(&mut self, _pc: u32, _addr: u32) -> IoResult<u32> {
        let value = self.input.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        Ok(value)
    }

    fn write(&mut self, _pc: u32, addr: u32, value: u32) -> IoResult<()> {
        if addr == PORT_EXIT {
            return Err(IoStop::Halt);
        }
        self.written.push((addr, value));
        Ok(())
    }
}

/// `stx x0, -3(x0)`: a one-word halt via the exit port.
pub const HALT: Word = make_store(StoreOp::STX, 0, 0, 0xFFFD);

pub fn load_words(memory: &mut Memory, words: &[Word]) {
    for (i, word) in words.iter().enumerate() {
        memory.write_word(i as u32 * WORD_BYTES, *word);
    }
}

pub fn run_expect(words: &[Word], expected: ExitCode) -> (Processor, Memory, TestDevice) {
    run_expect_io(words, TestDevice::new(), expected)
}

pub fn run_expect_io(
    words: &[Word],
    mut device: TestDevice,
    expected: ExitCode,
) -> (Processor, Memory, TestDevice) {
    let mut memory = Memory::new(1 << 16);
    load_words(&mut memory, words);

    let mut processor = Processor::new();
    let exit = processor.run(&mut memory, &mut device);
    assert_eq!(exit, expected);

    (processor, memory, device)
}

pub fn run_program(words: &[Word]) -> (Processor, Memory, TestDevice) {
    run_expect(words, ExitCode::Halted)
}

#[test]
fn halts_on_exit_port_write() {
    run_program(&[HALT]);
}

#[test]
fn pc_advances_by_four() {
    let (processor, _, _) = run_program(&[
        make_alu_imm(AluOp::ADD, 5, 0, 1),
        make_alu_imm(AluOp::ADD, 5, 5, 1),
        HALT,
    ]);

    assert_eq!(processor.register(5), 2);
    assert_eq!(processor.pc(), 3 * WORD_BYTES);
}

#[test]
fn exit_port_value_register_is_ignored() {
    // The halt preloaded for RET stores x1; any value works.
    let (_, _, device) = run_program(&[
        make_alu_imm(AluOp::ADD, 1, 0, 77),
        make_store(StoreOp::STX, 1, 0, 0xFFFD),
    ]);

    assert!(device.written.is_empty());
}

#[test]
fn null_device_reads_zero() {
    let mut processor = Processor::new();
    let mut memory = Memory::new(1 << 12);
    load_words(
        &mut memory,
        &[
            make_alu_imm(AluOp::ADD, 6, 0, -1i32 as u32),
            make_load(LoadOp::LDX, 5, 6, 0),
            0x0000_0037, // stop: no exit port on NullDevice
        ],
    );

    let exit = processor.run(&mut memory, &mut NullDevice);
    assert_eq!(exit, ExitCode::UndefinedInstruction);
    assert_eq!(processor.register(5), 0);
}
