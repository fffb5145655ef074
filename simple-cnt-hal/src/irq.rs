//! # Interrupt driven operation
//!
//! The interrupt path consists of three parts:
//!
//! 1. An [IrqContext], which should be placed inside a `static`. It contains the software
//!    pending flag of one counter instance and a register handle for the interrupt handler.
//! 2. A user provided interrupt handler which calls [IrqContext::on_interrupt].
//! 3. The [SimpleCntIrq] driver, created with [SimpleCnt::into_irq_driven], which registers
//!    the handler with the interrupt controller and waits on the pending flag.
//!
//! A context serves exactly one driver at a time. Installing a second driver on a context which
//! is still in use fails with [InstallError::ContextInUse].
//!
//! [IrqContext::on_interrupt] reads the TC status flag before it sets the pending flag and
//! acknowledges the event. Interrupts without a set TC flag, for example a line shared with
//! another source or a handler called after [SimpleCntIrq::release], do not produce an event.
//!
//! ```ignore
//! static CNT_IRQ: IrqContext = IrqContext::new();
//!
//! fn on_counter_irq(_line: u32) {
//!     CNT_IRQ.on_interrupt();
//! }
//!
//! let cnt = unsafe { SimpleCnt::new_at(CNT_BASE, CNT_VALUE_BASE) };
//! let mut cnt = cnt
//!     .into_irq_driven(&CNT_IRQ, cpu, &mut plic, IrqConfig::new(line), on_counter_irq)
//!     .map_err(|(_cnt, e)| e)?;
//! cnt.set_threshold(1000);
//! cnt.enable();
//! cnt.wait_irq(WaitLimit::Forever)?;
//! let (cnt, cpu) = cnt.release(&mut plic).map_err(|(_cnt, e)| e)?;
//! ```
use core::cell::{Cell, RefCell};

use critical_section::{CriticalSection, Mutex};
use embassy_sync::waitqueue::AtomicWaker;
use simple_cnt::cnt_control::Status;

use crate::{
    counter::SimpleCnt,
    cpu::Cpu,
    intc::{InterruptController, InterruptHandler, IrqConfig},
    regs::{CounterRegisters, MmioCounter},
    wait::{RunState, TimeoutError, WaitLimit, WaitTerminalCount},
};

/// Interrupt registration failure. The registration variants contain the interrupt controller
/// error.
#[derive(Debug, thiserror::Error)]
pub enum InstallError<E: core::fmt::Debug> {
    #[error("interrupt context is already used by another counter driver")]
    ContextInUse,
    #[error("interrupt controller rejected the priority: {0:?}")]
    PriorityRejected(E),
    #[error("interrupt controller rejected enabling the line: {0:?}")]
    EnableRejected(E),
    #[error("interrupt controller rejected the handler assignment: {0:?}")]
    HandlerAssignRejected(E),
}

/// Interrupt context of one counter instance.
///
/// The pending flag is only ever set by [Self::on_interrupt] and only ever cleared by the
/// waiter which consumes it, both inside a critical section.
pub struct IrqContext<R = MmioCounter> {
    // Register handle used by the interrupt handler to acknowledge the TC flag. None while
    // the counter is not interrupt driven.
    regs: Mutex<RefCell<Option<R>>>,
    pending: Mutex<Cell<bool>>,
    waker: AtomicWaker,
}

#[allow(clippy::new_without_default)]
impl<R: CounterRegisters> IrqContext<R> {
    pub const fn new() -> Self {
        Self {
            regs: Mutex::new(RefCell::new(None)),
            pending: Mutex::new(Cell::new(false)),
            waker: AtomicWaker::new(),
        }
    }

    /// This interrupt handler should be called ONCE in the interrupt handler for the counter
    /// interrupt line.
    ///
    /// It sets the pending flag and then clears the TC status flag. Interrupts which arrive
    /// while the counter is not interrupt driven or while the TC flag is not set are ignored.
    pub fn on_interrupt(&self) {
        let serviced = critical_section::with(|cs| {
            let mut regs = self.regs.borrow(cs).borrow_mut();
            let Some(regs) = regs.as_mut() else {
                return false;
            };
            if !regs.read_status().tc() {
                return false;
            }
            self.pending.borrow(cs).set(true);
            regs.write_status(Status::CLEAR_TC);
            true
        });
        if !serviced {
            log::trace!("ignoring spurious counter interrupt");
            return;
        }
        self.waker.wake();
    }

    /// Is an interrupt pending which was not consumed yet?
    #[inline]
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }

    /// Consume the pending flag. Returns whether it was set.
    #[inline]
    pub(crate) fn take_pending(&self, cs: CriticalSection) -> bool {
        self.pending.borrow(cs).replace(false)
    }

    #[inline]
    pub(crate) fn register_waker(&self, waker: &core::task::Waker) {
        self.waker.register(waker);
    }

    /// Attach the handler's register handle. Fails if the context is still in use.
    fn attach(&self, regs: R) -> bool {
        critical_section::with(|cs| {
            let mut slot = self.regs.borrow(cs).borrow_mut();
            if slot.is_some() {
                return false;
            }
            *slot = Some(regs);
            true
        })
    }

    /// Is a driver attached to this context?
    #[inline]
    pub fn is_attached(&self) -> bool {
        critical_section::with(|cs| self.regs.borrow(cs).borrow().is_some())
    }

    fn clear_pending_flag(&self) {
        critical_section::with(|cs| self.pending.borrow(cs).set(false));
    }

    fn detach(&self) {
        critical_section::with(|cs| {
            self.regs.borrow(cs).replace(None);
            self.pending.borrow(cs).set(false);
        });
    }
}

impl<R: CounterRegisters + Send + 'static> SimpleCnt<R> {
    /// Convert the polling driver into an interrupt driven driver.
    ///
    /// This claims `ctx`, clears a stale terminal count event and pending flag, then registers
    /// the handler with the interrupt controller: priority, line enable and handler assignment,
    /// in that order. The passed `handler` must call [IrqContext::on_interrupt] for `ctx`.
    ///
    /// If `ctx` is already used by another driver, nothing is touched and
    /// [InstallError::ContextInUse] is returned. Any registration failure aborts the
    /// installation. The line is left disabled, the context is detached and the polling driver
    /// is returned together with the error.
    pub fn into_irq_driven<C: Cpu, I: InterruptController>(
        mut self,
        ctx: &'static IrqContext<R>,
        cpu: C,
        intc: &mut I,
        config: IrqConfig,
        handler: InterruptHandler,
    ) -> Result<SimpleCntIrq<R, C>, (Self, InstallError<I::Error>)> {
        // Safety: The handler only uses its handle to acknowledge the TC flag, which this
        // driver no longer does once it is interrupt driven.
        if !ctx.attach(unsafe { self.regs.steal() }) {
            log::warn!("counter IRQ context already in use");
            return Err((self, InstallError::ContextInUse));
        }
        self.clear_terminal_count();
        ctx.clear_pending_flag();

        if let Err(e) = intc.set_priority(config.line, config.priority) {
            log::warn!("counter IRQ priority rejected for line {}: {e:?}", config.line.raw());
            ctx.detach();
            return Err((self, InstallError::PriorityRejected(e)));
        }
        if let Err(e) = intc.set_enabled(config.line, true) {
            log::warn!("counter IRQ enable rejected for line {}: {e:?}", config.line.raw());
            ctx.detach();
            return Err((self, InstallError::EnableRejected(e)));
        }
        if let Err(e) = intc.assign_handler(config.line, handler) {
            log::warn!(
                "counter IRQ handler assignment rejected for line {}: {e:?}",
                config.line.raw()
            );
            if let Err(rollback) = intc.set_enabled(config.line, false) {
                log::warn!("failed to disable counter IRQ line after error: {rollback:?}");
            }
            ctx.detach();
            return Err((self, InstallError::HandlerAssignRejected(e)));
        }
        log::debug!(
            "counter IRQ installed on line {} with priority {}",
            config.line.raw(),
            config.priority.value()
        );
        Ok(SimpleCntIrq {
            cnt: self,
            ctx,
            cpu,
            config,
        })
    }
}

/// Interrupt driven simple counter driver.
///
/// While this driver exists, only the interrupt handler clears the TC status flag. Therefore,
/// this driver does not expose [SimpleCnt::clear_terminal_count] and [SimpleCnt::wait_poll].
pub struct SimpleCntIrq<R: CounterRegisters + 'static, C: Cpu> {
    cnt: SimpleCnt<R>,
    ctx: &'static IrqContext<R>,
    cpu: C,
    config: IrqConfig,
}

impl<R: CounterRegisters + 'static, C: Cpu> SimpleCntIrq<R, C> {
    delegate::delegate! {
        to self.cnt {
            #[inline]
            pub fn enable(&mut self);
            #[inline]
            pub fn disable(&mut self);
            #[inline]
            pub fn is_enabled(&self) -> bool;
            #[inline]
            pub fn clear(&mut self);
            #[inline]
            pub fn set_threshold(&mut self, threshold: u32);
            #[inline]
            pub fn threshold(&self) -> u32;
            #[inline]
            pub fn value(&self) -> u32;
            #[inline]
            pub fn set_value(&mut self, value: u32);
            #[inline]
            pub fn terminal_count(&self) -> bool;
        }
    }

    #[inline]
    pub fn config(&self) -> IrqConfig {
        self.config
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.ctx.is_pending()
    }

    /// Discard a pending interrupt which was not consumed yet.
    #[inline]
    pub fn clear_pending(&mut self) {
        self.ctx.clear_pending_flag();
    }

    pub fn run_state(&self) -> RunState {
        if self.is_pending() {
            RunState::Expired
        } else if self.is_enabled() {
            RunState::Armed
        } else {
            RunState::Idle
        }
    }

    /// Block until the counter interrupt fired, then consume the pending flag.
    ///
    /// The pending flag is checked and cleared with interrupts masked. If it is not set, the
    /// core is put to sleep until the next interrupt and interrupts are unmasked again so the
    /// handler can run.
    ///
    /// This must not be called inside a critical section.
    pub fn wait_irq(&mut self, limit: WaitLimit) -> Result<(), TimeoutError> {
        let mut checks: u32 = 0;
        loop {
            self.cpu.disable_interrupts();
            let consumed = critical_section::with(|cs| self.ctx.take_pending(cs));
            checks = checks.saturating_add(1);
            let exhausted = !consumed && limit.is_exhausted(checks);
            if !consumed && !exhausted {
                self.cpu.wait_for_interrupt();
            }
            // Safety: Documented requirement of this function.
            unsafe { self.cpu.enable_interrupts() };
            if consumed {
                return Ok(());
            }
            if exhausted {
                log::trace!("counter IRQ wait timed out after {checks} checks");
                return Err(TimeoutError);
            }
        }
    }

    /// Disable the counter interrupt line. The driver stays interrupt driven.
    pub fn disable_line<I: InterruptController>(&mut self, intc: &mut I) -> Result<(), I::Error> {
        intc.set_enabled(self.config.line, false)
    }

    /// Return to polling operation.
    ///
    /// The interrupt line is disabled first, then the register handle of the interrupt handler
    /// is removed and the context can be used again. If the line can not be disabled, the
    /// driver stays interrupt driven and is returned together with the error.
    pub fn release<I: InterruptController>(
        self,
        intc: &mut I,
    ) -> Result<(SimpleCnt<R>, C), (Self, I::Error)> {
        if let Err(e) = intc.set_enabled(self.config.line, false) {
            log::warn!(
                "failed to disable counter IRQ line {} on release: {e:?}",
                self.config.line.raw()
            );
            return Err((self, e));
        }
        self.ctx.detach();
        Ok((self.cnt, self.cpu))
    }

    pub(crate) fn ctx(&self) -> &'static IrqContext<R> {
        self.ctx
    }
}

impl<R: CounterRegisters + 'static, C: Cpu> WaitTerminalCount for SimpleCntIrq<R, C> {
    #[inline]
    fn wait_terminal_count(&mut self, limit: WaitLimit) -> Result<(), TimeoutError> {
        self.wait_irq(limit)
    }
}
