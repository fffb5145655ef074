//! # HAL for the simple counter peripheral
//!
//! This crate contains the **H**ardware **A**bstraction **L**ayer (HAL) for the simple counter,
//! built on top of the [peripheral access API](simple_cnt).
//!
//! The counter is a free-running up-counter with a programmable threshold. Once the live value
//! reaches the threshold, the hardware sets the terminal count (TC) status flag and asserts the
//! interrupt line. Software can observe this event in two interchangeable ways:
//!
//! - Polling with [counter::SimpleCnt::wait_poll].
//! - Interrupts, after converting the driver with [counter::SimpleCnt::into_irq_driven], with
//!   the blocking [irq::SimpleCntIrq::wait_irq] or the asynchronous
//!   [irq::SimpleCntIrq::wait_async].
//!
//! Both strategies return exactly once per terminal count event and leave the TC flag
//! cleared.
//!
//! The interrupt controller and the processor are external collaborators which are
//! abstracted by the [intc::InterruptController] and the [cpu::Cpu] traits.
#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod asynch;
pub mod counter;
pub mod cpu;
pub mod intc;
pub mod irq;
pub mod regs;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod wait;

pub use counter::SimpleCnt;
pub use irq::{IrqContext, SimpleCntIrq};
pub use wait::{RunState, TimeoutError, WaitLimit, WaitTerminalCount};
