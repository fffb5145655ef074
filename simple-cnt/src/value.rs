//! # Counter value register module.
//!
//! The live counter value is mapped at its own base address, separate from the control plane.

/// Live counter value register.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct CounterValue {
    /// Advances autonomously while the counter is enabled. Writes seed the counter.
    #[mmio(PureRead, Write)]
    count: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<CounterValue>(), 0x4);
