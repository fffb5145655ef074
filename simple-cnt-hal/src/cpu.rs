//! # Processor interface
//!
//! Global interrupt masking and the low-power wait primitive used by the interrupt driven
//! waiter.

/// Processor primitives required by the interrupt driven waiter.
pub trait Cpu {
    /// Mask all interrupts for the current core.
    fn disable_interrupts(&mut self);

    /// Unmask interrupts for the current core.
    ///
    /// # Safety
    ///
    /// Do not call this in a critical section.
    unsafe fn enable_interrupts(&mut self);

    /// Suspend the core until an interrupt arrives.
    ///
    /// This is called with interrupts masked. A pending interrupt must still wake up the
    /// core, which is the case for the WFI instruction on Cortex-A/R and RISC-V cores.
    fn wait_for_interrupt(&mut self);
}

/// Cortex-A/R processor primitives.
#[cfg(feature = "cortex-ar")]
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexAr;

#[cfg(feature = "cortex-ar")]
impl Cpu for CortexAr {
    #[inline]
    fn disable_interrupts(&mut self) {
        cortex_ar::interrupt::disable();
    }

    #[inline]
    unsafe fn enable_interrupts(&mut self) {
        unsafe {
            cortex_ar::interrupt::enable();
        }
    }

    #[inline]
    fn wait_for_interrupt(&mut self) {
        cortex_ar::asm::wfi();
    }
}
