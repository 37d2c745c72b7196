//! Output compare channel configuration.
use timebase::TimerConfig;

use super::{
    timers::{Channel, OutputCompareMode},
    Error,
};

/// The duty cycle of a PWM output in percent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DutyCycle(u8);

impl DutyCycle {
    /// Construct a duty cycle.
    ///
    /// # Args
    /// * `percent` - The fraction of the period the output is active, `0..=100`.
    pub fn from_percent(percent: u8) -> Result<Self, Error> {
        if percent > 100 {
            return Err(Error::DutyOutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The duty cycle in percent, `0..=100`.
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// The compare value realizing this duty cycle, `round(reload * percent / 100)`.
    ///
    /// # Note
    /// Halves are rounded up.
    pub fn compare_value(&self, reload: u16) -> u16 {
        ((reload as u32 * self.0 as u32 + 50) / 100) as u16
    }
}

/// How an output compare channel drives its reference signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareMode {
    /// Active while the counter is below the compare value.
    PwmDutyPercent(DutyCycle),
    /// Flip the output whenever the counter reaches the given tick.
    ToggleAt(u16),
}

/// The configuration of one output compare channel of a timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelCompareConfig {
    pub channel: Channel,
    pub compare: u16,
    pub mode: CompareMode,
}

impl ChannelCompareConfig {
    /// A PWM channel with the given duty cycle over the period of `config`.
    pub fn pwm(
        channel: Channel,
        duty: DutyCycle,
        config: &TimerConfig,
    ) -> Self {
        Self {
            channel,
            compare: duty.compare_value(config.reload()),
            mode: CompareMode::PwmDutyPercent(duty),
        }
    }

    /// A toggling channel flipping its output once per period at `tick`.
    ///
    /// # Args
    /// * `channel` - The output compare channel.
    /// * `tick` - The counter value at which the output toggles. Must not exceed the reload
    ///   value of `config` or the compare event would never occur.
    pub fn toggle(
        channel: Channel,
        tick: u32,
        config: &TimerConfig,
    ) -> Result<Self, Error> {
        if tick > config.reload() as u32 {
            return Err(Error::CompareOutOfRange {
                value: tick,
                reload: config.reload(),
            });
        }

        Ok(Self {
            channel,
            compare: tick as u16,
            mode: CompareMode::ToggleAt(tick as u16),
        })
    }

    /// The hardware output compare mode implementing this configuration.
    pub fn output_compare_mode(&self) -> OutputCompareMode {
        match self.mode {
            CompareMode::PwmDutyPercent(_) => OutputCompareMode::Pwm1,
            CompareMode::ToggleAt(_) => OutputCompareMode::Toggle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_compare_values() {
        let quarter = DutyCycle::from_percent(25).unwrap();
        // round(7999 * 0.25) = round(1999.75)
        assert_eq!(quarter.compare_value(7999), 2000);
        assert_eq!(DutyCycle::from_percent(0).unwrap().compare_value(7999), 0);
        assert_eq!(
            DutyCycle::from_percent(100).unwrap().compare_value(u16::MAX),
            u16::MAX
        );
        let half = DutyCycle::from_percent(50).unwrap();
        assert_eq!(half.compare_value(199), 100);
        assert_eq!(
            DutyCycle::from_percent(101),
            Err(Error::DutyOutOfRange(101))
        );
    }

    #[test]
    fn toggle_within_period() {
        let config = TimerConfig::new(1, 199).unwrap();
        let toggle = ChannelCompareConfig::toggle(Channel::One, 199, &config)
            .unwrap();
        assert_eq!(toggle.compare, 199);
        assert_eq!(toggle.output_compare_mode(), OutputCompareMode::Toggle);

        assert_eq!(
            ChannelCompareConfig::toggle(Channel::One, 200, &config),
            Err(Error::CompareOutOfRange {
                value: 200,
                reload: 199
            })
        );
    }

    #[test]
    fn pwm_mode() {
        let config = TimerConfig::new(1, 7999).unwrap();
        let pwm = ChannelCompareConfig::pwm(
            Channel::Two,
            DutyCycle::from_percent(25).unwrap(),
            &config,
        );
        assert_eq!(pwm.compare, 2000);
        assert_eq!(pwm.output_compare_mode(), OutputCompareMode::Pwm1);
    }
}
