#![no_std]
//! Time base planning for 16-bit general purpose timers.
//!
//! A general purpose timer divides its kernel clock twice: first by the prescaler
//! (`PSC + 1`) and then by the counter period (`ARR + 1`). The planner derives both from a
//! desired frequency without touching any hardware, so it can be called as often as needed
//! before a timer is programmed.
//!
//! Two forms are supported:
//! * Overflow planning: the target is the rate at which the counter wraps. The total divisor
//!   is split into prescaler and reload, favoring the smallest prescaler for the highest
//!   counting resolution.
//! * Tick planning: the target is the rate at which the counter increments and the period is
//!   given explicitly in ticks.

use fugit::HertzU32;

/// The largest division the prescaler can express (PSC = 0xFFFF).
pub const MAX_PRESCALER: u32 = 1 << 16;

/// The largest auto-reload value of a 16-bit counter.
pub const MAX_RELOAD: u32 = u16::MAX as u32;

/// The largest total division of prescaler and counter period.
pub const MAX_DIVISOR: u64 = MAX_PRESCALER as u64 * (MAX_RELOAD as u64 + 1);

/// Errors that can occur when planning a timer time base.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The target frequency must be nonzero.
    #[error("Target frequency is zero")]
    ZeroFrequency,
    /// No prescaler/reload pair can realize the requested division.
    #[error("Unreachable frequency (divisor {divisor})")]
    UnreachableFrequency { divisor: u64 },
    /// The requested period does not fit the 16-bit counter.
    #[error("Period of {0} ticks not representable")]
    PeriodOutOfRange(u32),
    /// The prescaler is outside of `1..=65536`.
    #[error("Prescaler {0} out of range")]
    PrescalerOutOfRange(u32),
    /// The reload value is outside of `0..=65535`.
    #[error("Reload {0} out of range")]
    ReloadOutOfRange(u32),
}

/// Prescaler and auto-reload settings of a timer counter.
///
/// # Note
/// Once constructed, the configuration always satisfies the hardware limits of the timer:
/// `prescaler` is within `1..=65536` and `reload` within `0..=65535`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    prescaler: u32,
    reload: u16,
    exact: bool,
}

impl TimerConfig {
    /// Construct a configuration from explicit prescaler and reload values.
    ///
    /// # Args
    /// * `prescaler` - The clock division ahead of the counter, `1..=65536`.
    /// * `reload` - The counter value at which the counter wraps, `0..=65535`.
    pub fn new(prescaler: u32, reload: u32) -> Result<Self, Error> {
        if !(1..=MAX_PRESCALER).contains(&prescaler) {
            return Err(Error::PrescalerOutOfRange(prescaler));
        }
        if reload > MAX_RELOAD {
            return Err(Error::ReloadOutOfRange(reload));
        }

        Ok(Self {
            prescaler,
            reload: reload as u16,
            exact: true,
        })
    }

    /// Split a total clock division into prescaler and reload.
    ///
    /// The smallest prescaler that divides `divisor` exactly while keeping the reload within
    /// the counter range is chosen.
    ///
    /// # Note
    /// A divisor without such a factor is [Error::UnreachableFrequency]. See
    /// [TimerConfig::nearest] for an approximating split.
    pub fn from_divisor(divisor: u64) -> Result<Self, Error> {
        let lowest = Self::lowest_prescaler(divisor)?;
        let prescaler = (lowest..=MAX_PRESCALER as u64)
            .find(|p| divisor % p == 0)
            .ok_or(Error::UnreachableFrequency { divisor })?;

        Self::new(prescaler as u32, (divisor / prescaler - 1) as u32)
    }

    /// Split a total clock division into prescaler and reload, approximating if needed.
    ///
    /// Exact splits are taken as by [TimerConfig::from_divisor]. Otherwise the smallest
    /// usable prescaler is taken with the nearest period and the result is marked inexact.
    pub fn nearest(divisor: u64) -> Result<Self, Error> {
        match Self::from_divisor(divisor) {
            Err(Error::UnreachableFrequency { .. }) => {}
            exact => return exact,
        }

        let lowest = Self::lowest_prescaler(divisor)?;
        // `divisor <= lowest * 65536`, the rounded period fits the counter.
        let period = (divisor + lowest / 2) / lowest;
        let mut config = Self::new(lowest as u32, (period - 1) as u32)?;
        config.exact = false;

        log::warn!(
            "Divisor {} has no exact split, using {} x {}",
            divisor,
            config.prescaler,
            config.period_ticks()
        );

        Ok(config)
    }

    fn lowest_prescaler(divisor: u64) -> Result<u64, Error> {
        if divisor == 0 || divisor > MAX_DIVISOR {
            return Err(Error::UnreachableFrequency { divisor });
        }
        Ok(divisor.div_ceil(MAX_RELOAD as u64 + 1))
    }

    /// The clock division ahead of the counter.
    pub fn prescaler(&self) -> u32 {
        self.prescaler
    }

    /// The value to be written into the PSC register.
    pub fn psc(&self) -> u16 {
        (self.prescaler - 1) as u16
    }

    /// The auto-reload value, i.e. the largest value the counter reaches.
    pub fn reload(&self) -> u16 {
        self.reload
    }

    /// The number of counter ticks per period.
    pub fn period_ticks(&self) -> u32 {
        self.reload as u32 + 1
    }

    /// The total division of the kernel clock per counter period.
    pub fn divisor(&self) -> u64 {
        self.prescaler as u64 * self.period_ticks() as u64
    }

    /// Whether the configuration realizes the requested division exactly.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// The rate at which the counter increments for a given kernel clock.
    pub fn tick_frequency(&self, input_clock: HertzU32) -> HertzU32 {
        HertzU32::from_raw(input_clock.to_Hz() / self.prescaler)
    }

    /// The rate at which the counter wraps for a given kernel clock.
    pub fn update_frequency(&self, input_clock: HertzU32) -> HertzU32 {
        HertzU32::from_raw((input_clock.to_Hz() as u64 / self.divisor()) as u32)
    }
}

/// The inputs to the time base planner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockParameters {
    /// The timer kernel clock.
    pub input_clock: HertzU32,

    /// The counter overflow rate if `period_ticks` is `None`, else the counter tick rate.
    pub target_frequency: HertzU32,

    /// An explicit counter period in ticks.
    pub period_ticks: Option<u32>,
}

impl ClockParameters {
    /// Plan the time base. See [plan].
    pub fn plan(&self) -> Result<TimerConfig, Error> {
        plan(self.input_clock, self.target_frequency, self.period_ticks)
    }
}

/// Derive the prescaler and reload values of a timer.
///
/// # Args
/// * `input_clock` - The timer kernel clock.
/// * `target_frequency` - The desired overflow rate, or the desired tick rate if
///   `period_ticks` is provided.
/// * `period_ticks` - Optional explicit counter period in ticks.
///
/// # Returns
/// The timer configuration. Integer truncation of `input_clock / target_frequency` is
/// tolerated and reported as a warning. An overflow divisor without an exact prescaler
/// and reload split is [Error::UnreachableFrequency].
pub fn plan(
    input_clock: HertzU32,
    target_frequency: HertzU32,
    period_ticks: Option<u32>,
) -> Result<TimerConfig, Error> {
    let input = input_clock.to_Hz();
    let target = target_frequency.to_Hz();
    if target == 0 {
        return Err(Error::ZeroFrequency);
    }

    let divisor = input / target;
    if input % target != 0 {
        log::warn!(
            "{} Hz does not divide {} Hz, running at {} Hz",
            target,
            input,
            input.checked_div(divisor).unwrap_or(0)
        );
    }

    let config = match period_ticks {
        None => TimerConfig::from_divisor(divisor as u64)?,
        Some(ticks) => {
            if divisor == 0 || divisor > MAX_PRESCALER {
                return Err(Error::UnreachableFrequency {
                    divisor: divisor as u64,
                });
            }
            if !(1..=MAX_RELOAD + 1).contains(&ticks) {
                return Err(Error::PeriodOutOfRange(ticks));
            }
            TimerConfig::new(divisor, ticks - 1)?
        }
    };

    log::debug!(
        "Planned PSC {:#x} ARR {:#x} for {} Hz from {} Hz",
        config.psc(),
        config.reload(),
        target,
        input
    );

    Ok(config)
}
