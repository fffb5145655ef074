//! # Interrupt controller interface
//!
//! The counter driver does not configure a specific interrupt controller. Instead, it relies
//! on the [InterruptController] trait, which maps to the three registration calls of a
//! platform interrupt controller driver, for example a RISC-V PLIC driver.
use arbitrary_int::u3;

/// Interrupt handler signature. The argument is the ID of the interrupt line.
pub type InterruptHandler = fn(u32);

/// Interrupt line ID as used by the interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptLine(pub u32);

impl InterruptLine {
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

/// Registration interface of a platform interrupt controller.
///
/// All calls are fallible and the error must be surfaced to the caller.
pub trait InterruptController {
    type Error: core::fmt::Debug;

    fn set_priority(&mut self, line: InterruptLine, priority: u3) -> Result<(), Self::Error>;

    fn set_enabled(&mut self, line: InterruptLine, enabled: bool) -> Result<(), Self::Error>;

    fn assign_handler(
        &mut self,
        line: InterruptLine,
        handler: InterruptHandler,
    ) -> Result<(), Self::Error>;
}

/// Interrupt configuration for a counter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqConfig {
    pub line: InterruptLine,
    pub priority: u3,
}

impl IrqConfig {
    pub const DEFAULT_PRIORITY: u3 = u3::new(1);

    /// Configuration for the given line with [Self::DEFAULT_PRIORITY].
    #[inline]
    pub const fn new(line: InterruptLine) -> Self {
        Self {
            line,
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    #[inline]
    pub const fn with_priority(mut self, priority: u3) -> Self {
        self.priority = priority;
        self
    }
}
