//! Asynchronous terminal count waiter.
//!
//! The future is woken by [crate::irq::IrqContext::on_interrupt], so it requires an interrupt
//! driven counter, see [crate::irq::SimpleCntIrq::wait_async].
use core::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    cpu::Cpu,
    irq::{IrqContext, SimpleCntIrq},
    regs::CounterRegisters,
};

/// Completes once the counter interrupt fired and consumes the pending flag.
pub struct TerminalCountFuture<'ctx, R: CounterRegisters> {
    ctx: &'ctx IrqContext<R>,
}

impl<'ctx, R: CounterRegisters> TerminalCountFuture<'ctx, R> {
    pub fn new(ctx: &'ctx IrqContext<R>) -> Self {
        Self { ctx }
    }
}

impl<R: CounterRegisters> Future for TerminalCountFuture<'_, R> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Register first, so an interrupt between the check and returning still wakes us.
        self.ctx.register_waker(cx.waker());
        if critical_section::with(|cs| self.ctx.take_pending(cs)) {
            return Poll::Ready(());
        }
        Poll::Pending
    }
}

impl<R: CounterRegisters + 'static, C: Cpu> SimpleCntIrq<R, C> {
    /// Wait asynchronously for the counter interrupt.
    ///
    /// There is no built-in timeout. Combine this with a timer future if a deadline is
    /// required.
    pub async fn wait_async(&mut self) {
        TerminalCountFuture::new(self.ctx()).await
    }
}
