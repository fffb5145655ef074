//! # Register interface
//!
//! All register accesses of the driver go through the [CounterRegisters] trait. The hardware
//! implementation is [MmioCounter], which wraps the MMIO blocks of the PAC. A simulated
//! implementation for host tests is provided by the [crate::sim] module.
use simple_cnt::{
    cnt_control::{Control, MmioRegisters, Registers, Status},
    value::{CounterValue, MmioCounterValue},
};

/// Typed access to the register banks of one counter instance.
///
/// Every read or write is a single bus transaction. Read-modify-write sequences like
/// [Self::modify_control] are NOT atomic, so concurrent modification of the same register
/// requires external serialization.
pub trait CounterRegisters {
    fn read_control(&self) -> Control;
    fn write_control(&mut self, value: Control);

    fn read_status(&self) -> Status;
    /// The TC bit is write-one-to-clear, writing a zero has no effect.
    fn write_status(&mut self, value: Status);

    fn read_threshold(&self) -> u32;
    fn write_threshold(&mut self, value: u32);

    fn read_value(&self) -> u32;
    fn write_value(&mut self, value: u32);

    /// Read the control register, apply `f` and write the result back.
    #[inline]
    fn modify_control(&mut self, f: impl FnOnce(Control) -> Control) {
        let ctrl = self.read_control();
        self.write_control(f(ctrl));
    }

    /// Create a second handle to the same register banks.
    ///
    /// # Safety
    ///
    /// Circumvents ownership. The user must ensure that the two handles do not perform
    /// conflicting accesses. The driver uses this to hand a register handle to the interrupt
    /// handler, which only acknowledges the TC flag.
    unsafe fn steal(&self) -> Self
    where
        Self: Sized;
}

/// Memory-mapped register banks of one counter instance.
pub struct MmioCounter {
    regs: MmioRegisters<'static>,
    value: MmioCounterValue<'static>,
}

// Only owns pointers to peripheral memory.
unsafe impl Send for MmioCounter {}

impl MmioCounter {
    /// Create the register interface from the PAC MMIO blocks.
    #[inline]
    pub const fn new(regs: MmioRegisters<'static>, value: MmioCounterValue<'static>) -> Self {
        Self { regs, value }
    }

    /// Create the register interface from the two base addresses.
    ///
    /// # Safety
    ///
    /// Both addresses must point to the register banks of a simple counter instance. This API
    /// can be used to create multiple drivers for the same peripheral. The user must ensure
    /// that concurrent accesses do not interfere with each other.
    #[inline]
    pub const unsafe fn new_at(periph_base: usize, value_base: usize) -> Self {
        unsafe {
            Self {
                regs: Registers::new_mmio_at(periph_base),
                value: CounterValue::new_mmio_at(value_base),
            }
        }
    }

    /// Base address of the control plane registers.
    #[inline]
    pub fn periph_base(&self) -> usize {
        unsafe { self.regs.ptr() as usize }
    }

    /// Base address of the counter value register.
    #[inline]
    pub fn value_base(&self) -> usize {
        unsafe { self.value.ptr() as usize }
    }
}

impl CounterRegisters for MmioCounter {
    #[inline]
    fn read_control(&self) -> Control {
        self.regs.read_control()
    }

    #[inline]
    fn write_control(&mut self, value: Control) {
        self.regs.write_control(value);
    }

    #[inline]
    fn read_status(&self) -> Status {
        self.regs.read_status()
    }

    #[inline]
    fn write_status(&mut self, value: Status) {
        self.regs.write_status(value);
    }

    #[inline]
    fn read_threshold(&self) -> u32 {
        self.regs.read_threshold()
    }

    #[inline]
    fn write_threshold(&mut self, value: u32) {
        self.regs.write_threshold(value);
    }

    #[inline]
    fn read_value(&self) -> u32 {
        self.value.read_count()
    }

    #[inline]
    fn write_value(&mut self, value: u32) {
        self.value.write_count(value);
    }

    #[inline]
    fn modify_control(&mut self, f: impl FnOnce(Control) -> Control) {
        self.regs.modify_control(f);
    }

    #[inline]
    unsafe fn steal(&self) -> Self {
        unsafe {
            Self {
                regs: self.regs.clone(),
                value: self.value.clone(),
            }
        }
    }
}
