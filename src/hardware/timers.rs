//! General purpose timer register vocabulary and register-level access.
//!
//! The enumerations mirror the bit encodings of the STM32 general purpose timer registers
//! (CR2.MMS, SMCR.TS, SMCR.SMS, CCMRx.OCxM) so they can be written unchanged.
use num_enum::TryFromPrimitive;
use timebase::TimerConfig;

use super::compare::ChannelCompareConfig;

/// A general purpose timer peripheral instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TimerId {
    Tim1 = 1,
    Tim2 = 2,
    Tim3 = 3,
    Tim4 = 4,
    Tim5 = 5,
    Tim8 = 8,
}

/// A capture/compare channel of a timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Channel {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Channel {
    /// Zero-based index of the channel, e.g. into the CCR register array.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

/// The event that should generate an external trigger from the peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TriggerGenerator {
    Reset = 0b000,
    Enable = 0b001,
    Update = 0b010,
    ComparePulse = 0b011,
    Ch1Compare = 0b100,
    Ch2Compare = 0b101,
    Ch3Compare = 0b110,
    Ch4Compare = 0b111,
}

impl TriggerGenerator {
    /// The trigger generator forwarding the output compare reference (OCxREF) of a channel.
    pub fn compare_reference(channel: Channel) -> Self {
        match channel {
            Channel::One => Self::Ch1Compare,
            Channel::Two => Self::Ch2Compare,
            Channel::Three => Self::Ch3Compare,
            Channel::Four => Self::Ch4Compare,
        }
    }
}

/// Selects the trigger source for the timer peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TriggerSource {
    Trigger0 = 0b000,
    Trigger1 = 0b001,
    Trigger2 = 0b010,
    Trigger3 = 0b011,
    Ti1EdgeDetector = 0b100,
    Ti1Filtered = 0b101,
    Ti2Filtered = 0b110,
    External = 0b111,
}

/// Optional slave operation modes of a timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SlaveMode {
    Disabled = 0b000,
    Encoder1 = 0b001,
    Encoder2 = 0b010,
    Encoder3 = 0b011,
    /// The counter is reinitialized on a rising trigger edge.
    Reset = 0b100,
    /// The counter clock is enabled while the trigger is high.
    Gated = 0b101,
    /// The counter is started on a rising trigger edge.
    Trigger = 0b110,
    ExternalClock = 0b111,
}

/// Output compare modes of a capture/compare channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum OutputCompareMode {
    Frozen = 0b000,
    Active = 0b001,
    Inactive = 0b010,
    Toggle = 0b011,
    ForceInactive = 0b100,
    ForceActive = 0b101,
    /// Active while the counter is below the compare value.
    Pwm1 = 0b110,
    /// Inactive while the counter is below the compare value.
    Pwm2 = 0b111,
}

/// Find the internal trigger input (ITRx) of `slave` that is connected to the trigger output
/// of `master`.
///
/// # Note
/// The connection matrix follows the STM32F1/F4 reference manuals.
pub fn internal_trigger(
    slave: TimerId,
    master: TimerId,
) -> Option<TriggerSource> {
    use TimerId::*;

    let masters = match slave {
        Tim1 => [Tim5, Tim2, Tim3, Tim4],
        Tim2 => [Tim1, Tim8, Tim3, Tim4],
        Tim3 => [Tim1, Tim2, Tim5, Tim4],
        Tim4 => [Tim1, Tim2, Tim3, Tim8],
        Tim5 => [Tim2, Tim3, Tim4, Tim8],
        Tim8 => [Tim1, Tim2, Tim4, Tim5],
    };

    let sources = [
        TriggerSource::Trigger0,
        TriggerSource::Trigger1,
        TriggerSource::Trigger2,
        TriggerSource::Trigger3,
    ];

    masters
        .iter()
        .position(|&m| m == master)
        .map(|index| sources[index])
}

/// Register-level access to a single general purpose timer peripheral.
///
/// # Note
/// An implementor owns the peripheral. Once it has been handed to a timer controller, no other
/// code may modify the underlying registers. The counter is 16 bits wide and counts up.
pub trait TimerRegisters {
    /// The peripheral instance.
    fn id(&self) -> TimerId;

    /// Stop the counter.
    fn pause(&mut self);

    /// Enable the counter. This is the peripheral-enable primitive.
    fn resume(&mut self);

    /// Write the prescaler register. The counter clock is divided by `psc + 1`.
    fn set_prescaler(&mut self, psc: u16);

    /// Write the auto-reload register.
    fn set_period_ticks(&mut self, period: u16);

    /// Buffer auto-reload writes until the next update event.
    fn set_auto_reload_preload(&mut self, enable: bool);

    /// Generate an update event, loading all buffered registers and resetting the counter.
    fn apply_freq(&mut self);

    /// Write the compare register of a channel.
    fn set_compare(&mut self, channel: Channel, value: u16);

    /// Operate the channel as an output compare.
    ///
    /// # Args
    /// * `channel` - The channel to configure.
    /// * `mode` - The output compare mode.
    /// * `preload` - Buffer compare register writes until the next update event.
    fn set_output_compare(
        &mut self,
        channel: Channel,
        mode: OutputCompareMode,
        preload: bool,
    );

    /// Drive the channel output from its output compare reference.
    fn enable_output(&mut self, channel: Channel);

    /// Configure the timer peripheral to generate a trigger based on the provided source.
    fn generate_trigger(&mut self, source: TriggerGenerator);

    /// Select the trigger input and the slave mode reacting to it.
    fn set_slave_mode(&mut self, source: TriggerSource, mode: SlaveMode);
}

/// Maps the output of a timer channel onto a physical pin.
pub trait OutputRoute {
    /// Select the alternate function connecting `channel` of `timer` to this pin.
    fn route(&mut self, timer: TimerId, channel: Channel);
}

/// Program prescaler and period of an up-counting timer with auto-reload preload.
pub(crate) fn program_time_base<T: TimerRegisters>(
    timer: &mut T,
    config: &TimerConfig,
) {
    timer.set_prescaler(config.psc());
    timer.set_auto_reload_preload(true);
    timer.set_period_ticks(config.reload());

    // Force the new prescaler and period to take effect immediately.
    timer.apply_freq();
}

/// Program a preloaded output compare channel.
pub(crate) fn program_compare<T: TimerRegisters>(
    timer: &mut T,
    compare: &ChannelCompareConfig,
) {
    timer.set_compare(compare.channel, compare.compare);
    timer.set_output_compare(
        compare.channel,
        compare.output_compare_mode(),
        true,
    );

    // Latch the buffered compare value.
    timer.apply_freq();
}
