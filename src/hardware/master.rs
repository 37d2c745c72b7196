//! The master timer generates a PWM output compare reference and forwards it to its internal
//! trigger output (TRGO), where slave timers can observe it.
//!
//! # Design
//! The controller is a typestate: every configuration step consumes the controller and returns
//! it in the next state. The trigger output can only be enabled once the time base and the PWM
//! channel are programmed, since TRGO would otherwise carry an undefined waveform until channel
//! programming completes. Enabling it any earlier does not compile:
//!
//! ```compile_fail
//! use timsync::{hardware::{MasterTimer, TimerId}, sim::SimTimer};
//!
//! let tim2 = SimTimer::new(TimerId::Tim2);
//! let master = MasterTimer::new(&tim2);
//! master.enable_master_trigger_role();
//! ```
use serde::{Deserialize, Serialize};
use timebase::TimerConfig;

use super::{
    compare::{ChannelCompareConfig, DutyCycle},
    timers::{self, Channel, TimerId, TimerRegisters, TriggerGenerator},
};

/// The event of the master timer that drives its trigger output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSelect {
    /// The output compare reference of the PWM channel, high for the duty cycle.
    #[default]
    CompareReference,
    /// A pulse on every counter update event.
    Update,
}

/// Identity of the internal trigger output of a master timer.
///
/// # Note
/// This can only be obtained from a [MasterTimer], so a slave binding always refers to a timer
/// that is actually operated as a master.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriggerOutput {
    timer: TimerId,
}

impl TriggerOutput {
    /// The timer producing the trigger.
    pub fn timer(&self) -> TimerId {
        self.timer
    }
}

/// The master timer has been constructed and its counter is paused.
pub struct Idle;

/// The time base is programmed.
pub struct TimeBase {
    config: TimerConfig,
}

/// Time base and PWM channel are programmed.
pub struct Configured {
    config: TimerConfig,
    pwm: ChannelCompareConfig,
}

/// The complete configuration of a master timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MasterSetup {
    pub config: TimerConfig,
    pub pwm: ChannelCompareConfig,
    pub trigger: TriggerGenerator,
}

/// The trigger output is enabled, the counter is still paused.
pub struct Armed(MasterSetup);

/// The counter is running. There is no way back from this state.
pub struct Running(MasterSetup);

/// A timer operated as the trigger source of a master/slave pair.
pub struct MasterTimer<T, S = Idle> {
    timer: T,
    state: S,
}

impl<T: TimerRegisters, S> MasterTimer<T, S> {
    /// The trigger output of this timer, for binding slaves to it.
    pub fn trigger_output(&self) -> TriggerOutput {
        TriggerOutput {
            timer: self.timer.id(),
        }
    }

    fn into_state<N>(self, state: N) -> MasterTimer<T, N> {
        MasterTimer {
            timer: self.timer,
            state,
        }
    }
}

impl<T: TimerRegisters> MasterTimer<T, Idle> {
    /// Construct the master timer.
    ///
    /// # Args
    /// * `timer` - The timer peripheral. Its counter is paused.
    pub fn new(mut timer: T) -> Self {
        timer.pause();
        Self { timer, state: Idle }
    }

    /// Program prescaler and period. The counter counts up and wraps after `config.reload()`.
    pub fn configure_time_base(
        mut self,
        config: TimerConfig,
    ) -> MasterTimer<T, TimeBase> {
        timers::program_time_base(&mut self.timer, &config);
        log::debug!(
            "{:?} master time base: PSC {} ARR {}",
            self.timer.id(),
            config.psc(),
            config.reload()
        );
        self.into_state(TimeBase { config })
    }
}

impl<T: TimerRegisters> MasterTimer<T, TimeBase> {
    /// Operate a channel as PWM output compare.
    ///
    /// # Args
    /// * `channel` - The channel whose compare reference becomes the trigger.
    /// * `duty` - The fraction of the period during which the reference is high.
    pub fn configure_pwm_channel(
        mut self,
        channel: Channel,
        duty: DutyCycle,
    ) -> MasterTimer<T, Configured> {
        let config = self.state.config;
        let pwm = ChannelCompareConfig::pwm(channel, duty, &config);
        timers::program_compare(&mut self.timer, &pwm);
        log::debug!(
            "{:?} master PWM on {:?}: {}% (CCR {})",
            self.timer.id(),
            channel,
            duty.percent(),
            pwm.compare
        );
        self.into_state(Configured { config, pwm })
    }
}

impl<T: TimerRegisters> MasterTimer<T, Configured> {
    /// Forward the PWM channel's compare reference to the trigger output.
    pub fn enable_master_trigger_role(self) -> MasterTimer<T, Armed> {
        let generator =
            TriggerGenerator::compare_reference(self.state.pwm.channel);
        self.enable_master_trigger_role_on(generator)
    }

    /// Drive the trigger output from an arbitrary trigger generator.
    pub fn enable_master_trigger_role_on(
        mut self,
        trigger: TriggerGenerator,
    ) -> MasterTimer<T, Armed> {
        self.timer.generate_trigger(trigger);
        log::debug!("{:?} trigger output: {:?}", self.timer.id(), trigger);

        let Configured { config, pwm } = self.state;
        self.into_state(Armed(MasterSetup {
            config,
            pwm,
            trigger,
        }))
    }

    /// Enable the trigger output from the selected event.
    pub fn enable_trigger(
        self,
        select: TriggerSelect,
    ) -> MasterTimer<T, Armed> {
        match select {
            TriggerSelect::CompareReference => {
                self.enable_master_trigger_role()
            }
            TriggerSelect::Update => {
                self.enable_master_trigger_role_on(TriggerGenerator::Update)
            }
        }
    }
}

impl<T: TimerRegisters> MasterTimer<T, Armed> {
    /// Start the counter. From now on the trigger output runs without software intervention.
    pub fn start(mut self) -> MasterTimer<T, Running> {
        self.timer.resume();
        log::debug!("{:?} master started", self.timer.id());
        let Armed(setup) = self.state;
        self.into_state(Running(setup))
    }
}

impl<T: TimerRegisters> MasterTimer<T, Running> {
    /// The configuration the running master was programmed with.
    pub fn setup(&self) -> &MasterSetup {
        &self.state.0
    }
}
