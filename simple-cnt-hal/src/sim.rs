//! # Simulated counter hardware
//!
//! Host-side model of the counter peripheral, its interrupt line, a single-line interrupt
//! controller and the processor interrupt mask. It is used by the tests of this crate and can
//! be enabled for other crates with the `sim` feature.
//!
//! Counting model: every tick while the counter is enabled increments the value, wrapping at
//! [u32::MAX]. When the incremented value equals the threshold, the TC flag is set. Writing
//! the `clear` control bit resets the value and the bit does not stick. The TC flag is
//! write-one-to-clear.
//!
//! Simulated time only advances on [SimCounter::advance], on [SimCounter::set_auto_tick]
//! ticks before every register access and while the core sleeps in
//! [Cpu::wait_for_interrupt]. Interrupts are level-triggered: the handler runs whenever the
//! TC flag is set, the line is enabled with a non-zero priority, a handler is assigned and
//! the processor accepts interrupts. Interrupts are masked while the handler runs.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbitrary_int::u3;
use simple_cnt::cnt_control::{Control, Status};

use crate::{
    cpu::Cpu,
    intc::{InterruptController, InterruptHandler, InterruptLine},
    regs::CounterRegisters,
};

/// Maximum number of ticks simulated by a single wait-for-interrupt call before the core
/// wakes up without an interrupt.
pub const WFI_TICK_BUDGET: u32 = 1 << 20;

const MAX_BACK_TO_BACK_DELIVERIES: u32 = 16;

/// Interrupt registration step, used for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Priority,
    Enable,
    AssignHandler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SimIrqError {
    #[error("unknown interrupt line {0}")]
    UnknownLine(u32),
    #[error("request rejected")]
    Rejected,
}

struct Hardware {
    control: Control,
    status: Status,
    threshold: u32,
    value: u32,
    auto_tick: u32,
    tc_events: u32,
    line: InterruptLine,
    priority: Option<u3>,
    line_enabled: bool,
    handler: Option<InterruptHandler>,
    irq_accept: bool,
    in_handler: bool,
    handler_invocations: u32,
    wfi_count: u32,
}

impl Hardware {
    fn tick(&mut self) {
        if !self.control.enable() {
            return;
        }
        self.value = self.value.wrapping_add(1);
        if self.value == self.threshold {
            self.status.set_tc(true);
            self.tc_events += 1;
        }
    }

    fn irq_asserted(&self) -> bool {
        self.status.tc()
            && self.line_enabled
            && self.priority.is_some_and(|prio| prio.value() > 0)
    }
}

/// Simulated counter peripheral. Clones share the same hardware.
#[derive(Clone)]
pub struct SimCounter {
    hw: Arc<Mutex<Hardware>>,
}

impl Default for SimCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimCounter {
    /// Counter in reset state with interrupts accepted by the processor.
    pub fn new() -> Self {
        Self {
            hw: Arc::new(Mutex::new(Hardware {
                control: Control::DEFAULT,
                status: Status::DEFAULT,
                threshold: 0,
                value: 0,
                auto_tick: 0,
                tc_events: 0,
                line: InterruptLine(0),
                priority: None,
                line_enabled: false,
                handler: None,
                irq_accept: true,
                in_handler: false,
                handler_invocations: 0,
                wfi_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Hardware> {
        self.hw.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registers(&self) -> SimRegisters {
        SimRegisters { sim: self.clone() }
    }

    /// Interrupt controller which serves the counter interrupt on `line`.
    pub fn interrupt_controller(&self, line: InterruptLine) -> SimInterruptController {
        self.lock().line = line;
        SimInterruptController {
            sim: self.clone(),
            line,
            fail_at: None,
        }
    }

    pub fn cpu(&self) -> SimCpu {
        SimCpu { sim: self.clone() }
    }

    /// Number of ticks which elapse before every register access.
    pub fn set_auto_tick(&self, ticks: u32) {
        self.lock().auto_tick = ticks;
    }

    /// Let the counter run for the given number of ticks, delivering interrupts as they occur.
    pub fn advance(&self, ticks: u32) {
        for _ in 0..ticks {
            self.lock().tick();
            self.deliver();
        }
    }

    /// Number of times the counter reached the threshold.
    pub fn tc_events(&self) -> u32 {
        self.lock().tc_events
    }

    /// Current TC flag, read without a simulated bus access.
    pub fn tc_flag(&self) -> bool {
        self.lock().status.tc()
    }

    pub fn handler_invocations(&self) -> u32 {
        self.lock().handler_invocations
    }

    pub fn wfi_count(&self) -> u32 {
        self.lock().wfi_count
    }

    pub fn line_enabled(&self) -> bool {
        self.lock().line_enabled
    }

    pub fn line_priority(&self) -> Option<u3> {
        self.lock().priority
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.lock().irq_accept
    }

    fn deliver(&self) {
        for _ in 0..MAX_BACK_TO_BACK_DELIVERIES {
            let (handler, line) = {
                let mut hw = self.lock();
                if !hw.irq_accept || hw.in_handler || !hw.irq_asserted() {
                    return;
                }
                let Some(handler) = hw.handler else {
                    return;
                };
                hw.in_handler = true;
                hw.handler_invocations += 1;
                (handler, hw.line)
            };
            handler(line.raw());
            self.lock().in_handler = false;
        }
        panic!("interrupt storm, the handler does not acknowledge the terminal count");
    }

    fn access<T>(&self, f: impl FnOnce(&mut Hardware) -> T) -> T {
        let ticks = self.lock().auto_tick;
        self.advance(ticks);
        f(&mut *self.lock())
    }
}

/// Register interface of the simulated counter.
#[derive(Clone)]
pub struct SimRegisters {
    sim: SimCounter,
}

impl CounterRegisters for SimRegisters {
    fn read_control(&self) -> Control {
        self.sim.access(|hw| hw.control)
    }

    fn write_control(&mut self, value: Control) {
        self.sim.access(|hw| {
            if value.clear() {
                hw.value = 0;
            }
            hw.control = value.with_clear(false);
        });
    }

    fn read_status(&self) -> Status {
        self.sim.access(|hw| hw.status)
    }

    fn write_status(&mut self, value: Status) {
        self.sim.access(|hw| {
            if value.tc() {
                hw.status.set_tc(false);
            }
        });
    }

    fn read_threshold(&self) -> u32 {
        self.sim.access(|hw| hw.threshold)
    }

    fn write_threshold(&mut self, value: u32) {
        self.sim.access(|hw| hw.threshold = value);
    }

    fn read_value(&self) -> u32 {
        self.sim.access(|hw| hw.value)
    }

    fn write_value(&mut self, value: u32) {
        self.sim.access(|hw| hw.value = value);
    }

    unsafe fn steal(&self) -> Self {
        self.clone()
    }
}

/// Single-line interrupt controller with fault injection.
pub struct SimInterruptController {
    sim: SimCounter,
    line: InterruptLine,
    fail_at: Option<RegistrationStep>,
}

impl SimInterruptController {
    /// Reject the given registration step from now on. Disabling the line always succeeds.
    pub fn fail_at(&mut self, step: RegistrationStep) {
        self.fail_at = Some(step);
    }

    fn check(&self, line: InterruptLine, step: RegistrationStep) -> Result<(), SimIrqError> {
        if line != self.line {
            return Err(SimIrqError::UnknownLine(line.raw()));
        }
        if self.fail_at == Some(step) {
            return Err(SimIrqError::Rejected);
        }
        Ok(())
    }
}

impl InterruptController for SimInterruptController {
    type Error = SimIrqError;

    fn set_priority(&mut self, line: InterruptLine, priority: u3) -> Result<(), Self::Error> {
        self.check(line, RegistrationStep::Priority)?;
        self.sim.lock().priority = Some(priority);
        self.sim.deliver();
        Ok(())
    }

    fn set_enabled(&mut self, line: InterruptLine, enabled: bool) -> Result<(), Self::Error> {
        if enabled {
            self.check(line, RegistrationStep::Enable)?;
        } else if line != self.line {
            return Err(SimIrqError::UnknownLine(line.raw()));
        }
        self.sim.lock().line_enabled = enabled;
        self.sim.deliver();
        Ok(())
    }

    fn assign_handler(
        &mut self,
        line: InterruptLine,
        handler: InterruptHandler,
    ) -> Result<(), Self::Error> {
        self.check(line, RegistrationStep::AssignHandler)?;
        self.sim.lock().handler = Some(handler);
        self.sim.deliver();
        Ok(())
    }
}

/// Processor model: global interrupt mask and wait-for-interrupt.
pub struct SimCpu {
    sim: SimCounter,
}

impl Cpu for SimCpu {
    fn disable_interrupts(&mut self) {
        self.sim.lock().irq_accept = false;
    }

    unsafe fn enable_interrupts(&mut self) {
        self.sim.lock().irq_accept = true;
        self.sim.deliver();
    }

    fn wait_for_interrupt(&mut self) {
        let mut hw = self.sim.lock();
        hw.wfi_count += 1;
        for _ in 0..WFI_TICK_BUDGET {
            // A stopped counter can never wake us up, return like a spurious wakeup.
            if hw.irq_asserted() || !hw.control.enable() {
                return;
            }
            hw.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_write_one_to_clear() {
        let sim = SimCounter::new();
        let mut regs = sim.registers();
        regs.write_threshold(1);
        regs.write_control(Control::DEFAULT.with_enable(true));
        sim.advance(1);
        regs.write_status(Status::DEFAULT);
        assert!(regs.read_status().tc());
        regs.write_status(Status::CLEAR_TC);
        assert!(!regs.read_status().tc());
    }

    #[test]
    fn auto_tick_advances_on_access() {
        let sim = SimCounter::new();
        let mut regs = sim.registers();
        regs.write_threshold(100);
        regs.write_control(Control::DEFAULT.with_enable(true));
        sim.set_auto_tick(2);
        assert_eq!(regs.read_value(), 2);
        assert_eq!(regs.read_value(), 4);
    }

    #[test]
    fn wfi_returns_on_asserted_line() {
        let sim = SimCounter::new();
        let mut regs = sim.registers();
        let mut intc = sim.interrupt_controller(InterruptLine(3));
        intc.set_priority(InterruptLine(3), u3::new(2)).unwrap();
        intc.set_enabled(InterruptLine(3), true).unwrap();
        regs.write_threshold(500);
        regs.write_control(Control::DEFAULT.with_enable(true));
        let mut cpu = sim.cpu();
        cpu.disable_interrupts();
        cpu.wait_for_interrupt();
        assert_eq!(regs.read_value(), 500);
        assert!(sim.tc_flag());
        assert_eq!(sim.wfi_count(), 1);
    }

    #[test]
    fn zero_priority_never_asserts() {
        let sim = SimCounter::new();
        let mut regs = sim.registers();
        let mut intc = sim.interrupt_controller(InterruptLine(3));
        intc.set_priority(InterruptLine(3), u3::new(0)).unwrap();
        intc.set_enabled(InterruptLine(3), true).unwrap();
        intc.assign_handler(InterruptLine(3), |_| panic!("unexpected interrupt"))
            .unwrap();
        regs.write_threshold(1);
        regs.write_control(Control::DEFAULT.with_enable(true));
        sim.advance(1);
        assert!(sim.tc_flag());
        assert_eq!(sim.handler_invocations(), 0);
    }

    #[test]
    fn unknown_line_is_rejected() {
        let sim = SimCounter::new();
        let mut intc = sim.interrupt_controller(InterruptLine(3));
        assert_eq!(
            intc.set_enabled(InterruptLine(4), true),
            Err(SimIrqError::UnknownLine(4))
        );
    }
}
