//! Register layouts of a general purpose timer, as far as they are simulated.
use arbitrary_int::{u2, u3};
use bitbybit::bitfield;

/// Control register 1.
#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq)]
pub struct Cr1 {
    /// Counter enable.
    #[bit(0, rw)]
    pub cen: bool,
    /// Auto-reload preload enable.
    #[bit(7, rw)]
    pub arpe: bool,
}

/// Control register 2.
#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq)]
pub struct Cr2 {
    /// Master mode selection, see [crate::hardware::TriggerGenerator].
    #[bits(4..=6, rw)]
    pub mms: u3,
}

/// Slave mode control register.
#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq)]
pub struct Smcr {
    /// Slave mode selection, see [crate::hardware::SlaveMode].
    #[bits(0..=2, rw)]
    pub sms: u3,
    /// Trigger selection, see [crate::hardware::TriggerSource].
    #[bits(4..=6, rw)]
    pub ts: u3,
}

/// Capture/compare mode register, covering a pair of channels.
#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq)]
pub struct Ccmr {
    #[bits(0..=1, rw)]
    pub cc1s: u2,
    #[bit(3, rw)]
    pub oc1pe: bool,
    #[bits(4..=6, rw)]
    pub oc1m: u3,
    #[bits(8..=9, rw)]
    pub cc2s: u2,
    #[bit(11, rw)]
    pub oc2pe: bool,
    #[bits(12..=14, rw)]
    pub oc2m: u3,
}

/// Capture/compare enable register.
#[bitfield(u32, default = 0)]
#[derive(Debug, PartialEq)]
pub struct Ccer {
    #[bit(0, rw)]
    pub cc1e: bool,
    #[bit(4, rw)]
    pub cc2e: bool,
    #[bit(8, rw)]
    pub cc3e: bool,
    #[bit(12, rw)]
    pub cc4e: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let smcr = Smcr::default()
            .with_sms(u3::new(0b101))
            .with_ts(u3::new(0b001));
        assert_eq!(smcr.raw_value(), 0b001_0_101);

        let ccmr = Ccmr::default()
            .with_oc2m(u3::new(0b011))
            .with_oc2pe(true);
        assert_eq!(ccmr.raw_value(), 0b011_1_000 << 8);

        assert_eq!(Ccer::default().with_cc3e(true).raw_value(), 1 << 8);
        assert_eq!(Cr2::new_with_raw_value(0b100 << 4).mms().value(), 0b100);
    }
}
