//! Timer kernel clocks.
use fugit::HertzU32;
use num_enum::TryFromPrimitive;

use super::timers::TimerId;

/// Provides the kernel clock of a timer peripheral.
pub trait ClockSource {
    /// The clock feeding the prescaler of `timer`.
    fn timer_clock(&self, timer: TimerId) -> HertzU32;
}

/// The prescaler between the AHB clock and a peripheral bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ApbDivider {
    Div1 = 1,
    Div2 = 2,
    Div4 = 4,
    Div8 = 8,
    Div16 = 16,
}

/// The timer kernel clocks of the two peripheral buses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clocks {
    /// Kernel clock of the timers on APB1 (TIM2-TIM5).
    pub apb1_timer: HertzU32,

    /// Kernel clock of the timers on APB2 (TIM1, TIM8).
    pub apb2_timer: HertzU32,
}

impl Clocks {
    /// Construct from known timer kernel clocks.
    pub const fn new(apb1_timer: HertzU32, apb2_timer: HertzU32) -> Self {
        Self {
            apb1_timer,
            apb2_timer,
        }
    }

    /// Derive the timer kernel clocks from the bus clocks.
    ///
    /// # Args
    /// * `hclk` - The AHB clock.
    /// * `apb1` - The APB1 prescaler.
    /// * `apb2` - The APB2 prescaler.
    pub fn from_bus(
        hclk: HertzU32,
        apb1: ApbDivider,
        apb2: ApbDivider,
    ) -> Self {
        Self::new(
            Self::timer_kernel_clock(hclk, apb1),
            Self::timer_kernel_clock(hclk, apb2),
        )
    }

    // Timers run at twice the bus clock whenever the bus is divided down.
    fn timer_kernel_clock(hclk: HertzU32, divider: ApbDivider) -> HertzU32 {
        let pclk = hclk.to_Hz() / divider as u32;
        match divider {
            ApbDivider::Div1 => HertzU32::from_raw(pclk),
            _ => HertzU32::from_raw(2 * pclk),
        }
    }
}

impl ClockSource for Clocks {
    fn timer_clock(&self, timer: TimerId) -> HertzU32 {
        match timer {
            TimerId::Tim1 | TimerId::Tim8 => self.apb2_timer,
            _ => self.apb1_timer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_assignment() {
        // 72 MHz core with APB1 at 36 MHz, as on the STM32F103.
        let clocks = Clocks::from_bus(
            HertzU32::MHz(72),
            ApbDivider::Div2,
            ApbDivider::Div1,
        );
        assert_eq!(clocks.timer_clock(TimerId::Tim2), HertzU32::MHz(72));
        assert_eq!(clocks.timer_clock(TimerId::Tim1), HertzU32::MHz(72));

        let clocks = Clocks::from_bus(
            HertzU32::MHz(168),
            ApbDivider::Div4,
            ApbDivider::Div2,
        );
        assert_eq!(clocks.timer_clock(TimerId::Tim3), HertzU32::MHz(84));
        assert_eq!(clocks.timer_clock(TimerId::Tim8), HertzU32::MHz(168));
    }

    #[test]
    fn divider_values() {
        assert_eq!(ApbDivider::try_from(4u8).ok(), Some(ApbDivider::Div4));
        assert_eq!(ApbDivider::try_from(16u8).ok(), Some(ApbDivider::Div16));
        assert!(ApbDivider::try_from(0u8).is_err());
        assert!(ApbDivider::try_from(3u8).is_err());

        let clocks = Clocks::from_bus(
            HertzU32::MHz(64),
            ApbDivider::Div16,
            ApbDivider::Div8,
        );
        assert_eq!(clocks.apb1_timer, HertzU32::MHz(8));
        assert_eq!(clocks.apb2_timer, HertzU32::MHz(16));
    }
}
