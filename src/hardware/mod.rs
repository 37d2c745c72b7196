//! Module for all hardware-specific setup of the synchronized timer pair.
pub mod clock;
pub mod compare;
pub mod design_parameters;
pub mod master;
pub mod setup;
pub mod slave;
pub mod timers;

pub use clock::{ApbDivider, ClockSource, Clocks};
pub use compare::{ChannelCompareConfig, CompareMode, DutyCycle};
pub use master::{MasterTimer, TriggerOutput, TriggerSelect};
pub use setup::{setup, PairPlan, SynchronizedTimers};
pub use slave::{GateMode, SlaveTimer, TriggerBinding};
pub use timers::{
    Channel, OutputCompareMode, OutputRoute, SlaveMode, TimerId,
    TimerRegisters, TriggerGenerator, TriggerSource,
};

/// Errors that can occur when configuring the timer pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The time base cannot be realized.
    #[error("Time base: {0}")]
    TimeBase(#[from] timebase::Error),
    /// A duty cycle above 100%.
    #[error("Duty cycle of {0}% out of range")]
    DutyOutOfRange(u8),
    /// A compare value that the counter never reaches.
    #[error("Compare value {value} beyond reload {reload}")]
    CompareOutOfRange { value: u32, reload: u16 },
    /// The master's trigger output is not wired to any trigger input of the slave.
    #[error("No internal trigger connects {master:?} to {slave:?}")]
    NoTriggerConnection { master: TimerId, slave: TimerId },
    /// A channel index outside of 1..=4.
    #[error("Invalid channel {0}")]
    InvalidChannel(u8),
}
