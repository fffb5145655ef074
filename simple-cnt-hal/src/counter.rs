//! # Simple counter driver
//!
//! [SimpleCnt] is the polling driver. It provides the full control surface of the peripheral
//! and the busy-waiting [SimpleCnt::wait_poll] completion waiter. For interrupt driven
//! operation, convert it with [SimpleCnt::into_irq_driven].
use simple_cnt::cnt_control::Status;

use crate::{
    regs::{CounterRegisters, MmioCounter},
    wait::{RunState, TimeoutError, WaitLimit, WaitTerminalCount},
};

/// High-level simple counter driver.
pub struct SimpleCnt<R: CounterRegisters = MmioCounter> {
    pub(crate) regs: R,
}

impl SimpleCnt<MmioCounter> {
    /// Create a driver for the counter at the given base addresses.
    ///
    /// # Safety
    ///
    /// See [MmioCounter::new_at].
    #[inline]
    pub const unsafe fn new_at(periph_base: usize, value_base: usize) -> Self {
        Self::new(unsafe { MmioCounter::new_at(periph_base, value_base) })
    }
}

impl<R: CounterRegisters> SimpleCnt<R> {
    #[inline]
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Start counting. Does nothing if the counter is already enabled.
    #[inline]
    pub fn enable(&mut self) {
        // The clear bit may read back as set, never write it back.
        self.regs.modify_control(|ctrl| ctrl.with_enable(true).with_clear(false));
    }

    /// Stop counting. The counter value is retained.
    #[inline]
    pub fn disable(&mut self) {
        self.regs.modify_control(|ctrl| ctrl.with_enable(false).with_clear(false));
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.regs.read_control().enable()
    }

    /// Reset the counter value to zero. The enable state is not changed.
    #[inline]
    pub fn clear(&mut self) {
        self.regs.modify_control(|mut ctrl| {
            ctrl.set_clear(true);
            ctrl
        });
    }

    /// Set the threshold at which the terminal count flag is set.
    ///
    /// Every value is accepted. The behaviour for a threshold of 0 is defined by the hardware.
    #[inline]
    pub fn set_threshold(&mut self, threshold: u32) {
        self.regs.write_threshold(threshold);
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.regs.read_threshold()
    }

    /// Current counter value.
    #[inline]
    pub fn value(&self) -> u32 {
        self.regs.read_value()
    }

    /// Seed the counter value.
    ///
    /// The counter should be disabled if deterministic seeding is required.
    #[inline]
    pub fn set_value(&mut self, value: u32) {
        self.regs.write_value(value);
    }

    /// Is the terminal count flag set? This does not clear the flag.
    #[inline]
    pub fn terminal_count(&self) -> bool {
        self.regs.read_status().tc()
    }

    /// Acknowledge a terminal count event.
    ///
    /// This must be called exactly once for every observed event, otherwise the next event
    /// can not be distinguished from the current one. Calling it while the flag is cleared
    /// has no effect.
    #[inline]
    pub fn clear_terminal_count(&mut self) {
        self.regs.write_status(Status::CLEAR_TC);
    }

    pub fn run_state(&self) -> RunState {
        if self.terminal_count() {
            RunState::Expired
        } else if self.is_enabled() {
            RunState::Armed
        } else {
            RunState::Idle
        }
    }

    /// Busy-wait until the terminal count flag is set, then clear it.
    pub fn wait_poll(&mut self, limit: WaitLimit) -> Result<(), TimeoutError> {
        let mut checks: u32 = 0;
        loop {
            if self.terminal_count() {
                self.clear_terminal_count();
                return Ok(());
            }
            checks = checks.saturating_add(1);
            if limit.is_exhausted(checks) {
                log::trace!("terminal count poll timed out after {checks} checks");
                return Err(TimeoutError);
            }
            core::hint::spin_loop();
        }
    }

    #[inline]
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    #[inline]
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: CounterRegisters> WaitTerminalCount for SimpleCnt<R> {
    #[inline]
    fn wait_terminal_count(&mut self, limit: WaitLimit) -> Result<(), TimeoutError> {
        self.wait_poll(limit)
    }
}
