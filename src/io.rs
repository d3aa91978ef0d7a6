//! The seam between the interpreter and the host's IO ports.

/// Why an IO access stopped the machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IoStop {
    /// The guest asked to stop; the run counts as successful.
    Halt,
    /// The device detected a failure and has already reported it.
    Fail,
}

pub type IoResult<T> = Result<T, IoStop>;

/// Port-IO backend used by `LDX`/`STX` and the `SYSCALL` hook. `pc`
/// is the address of the instruction performing the access; devices
/// include it in their diagnostics.
pub trait IoDevice {
    fn read(&mut self, pc: u32, addr: u32) -> IoResult<u32>;

    fn write(&mut self, pc: u32, addr: u32, value: u32) -> IoResult<()>;

    /// Invoked by `SYSCALL` with its immediate operand.
    fn syscall(&mut self, _pc: u32, _code: i32) -> IoResult<()> {
        Ok(())
    }
}

/// Device with no ports wired up: reads zero, discards writes.
pub struct NullDevice;

impl IoDevice for NullDevice {
    fn read(&mut self, _pc: u32, _addr: u32) -> IoResult<u32> {
        Ok(0)
    }

    fn write(&mut self, _pc: u32, _addr: u32, _value: u32) -> IoResult<()> {
        Ok(())
    }
}
