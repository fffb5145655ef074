//! # Counter control and status register module.

/// Width of all counter registers in bits.
pub const REG_WIDTH: usize = 32;

pub const CONTROL_OFFSET: usize = 0x0;
pub const STATUS_OFFSET: usize = 0x4;
pub const THRESHOLD_OFFSET: usize = 0x8;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Control {
    /// Resets the live counter value when written as one. Software must not assume that this
    /// bit persists.
    #[bit(1, rw)]
    clear: bool,
    /// Level sensitive counter enable.
    #[bit(0, rw)]
    enable: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Status {
    /// Terminal count, set by hardware when the counter reaches the threshold.
    /// Cleared by writing a one, never by reading.
    #[bit(0, rw)]
    tc: bool,
}

/// Counter control plane registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Registers {
    #[mmio(PureRead, Write, Modify)]
    control: Control,
    #[mmio(PureRead, Write)]
    status: Status,
    /// Compare value, continuously compared against the live counter value.
    #[mmio(PureRead, Write)]
    threshold: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<u32>() * 8, REG_WIDTH);
static_assertions::const_assert_eq!(core::mem::size_of::<Registers>(), 0xC);
static_assertions::const_assert_eq!(core::mem::offset_of!(Registers, control), CONTROL_OFFSET);
static_assertions::const_assert_eq!(core::mem::offset_of!(Registers, status), STATUS_OFFSET);
static_assertions::const_assert_eq!(
    core::mem::offset_of!(Registers, threshold),
    THRESHOLD_OFFSET
);

impl Status {
    /// Status value which acknowledges a terminal count event when written.
    pub const CLEAR_TC: Status = Status::DEFAULT.with_tc(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_bits() {
        assert_eq!(Control::DEFAULT.with_enable(true).raw_value(), 0b01);
        assert_eq!(Control::DEFAULT.with_clear(true).raw_value(), 0b10);
        let ctrl = Control::new_with_raw_value(0b11);
        assert!(ctrl.enable());
        assert!(ctrl.clear());
    }

    #[test]
    fn status_tc_bit() {
        assert_eq!(Status::CLEAR_TC.raw_value(), 0b1);
        assert!(!Status::new_with_raw_value(0b10).tc());
    }

    #[test]
    fn register_offsets() {
        let mut block = [0u32; 3];
        let mut regs = unsafe { Registers::new_mmio_at(block.as_mut_ptr() as usize) };
        regs.write_control(Control::DEFAULT.with_enable(true));
        regs.write_status(Status::CLEAR_TC);
        regs.write_threshold(0xDEAD_BEEF);
        assert_eq!(regs.read_threshold(), 0xDEAD_BEEF);
        regs.modify_control(|mut val| {
            val.set_clear(true);
            val
        });
        assert_eq!(block[CONTROL_OFFSET / 4], 0b11);
        assert_eq!(block[STATUS_OFFSET / 4], 0b1);
        assert_eq!(block[THRESHOLD_OFFSET / 4], 0xDEAD_BEEF);
    }
}
