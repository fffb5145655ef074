//! # PAC for the simple counter peripheral
//!
//! The simple counter is a free-running 32-bit up-counter with a programmable threshold, a
//! terminal count (TC) status flag and an interrupt line which is asserted while the TC flag
//! is set.
//!
//! The peripheral exposes two register banks which are mapped independently:
//!
//! - The control plane at the peripheral base address, see [cnt_control].
//! - The live counter value at its own base address, see [value].
//!
//! Base addresses are platform specific and must be supplied by the user, for example
//! with [cnt_control::Registers::new_mmio_at].
#![no_std]

pub mod cnt_control;
pub mod value;
