//! The slave timer toggles an output on its own free-running cycle while its counter is gated
//! by the trigger output of a master timer.
//!
//! In [GateMode::Gated], the slave counter advances only while the trigger is high. While the
//! trigger is low, the counter holds its value and resumes from it once the trigger returns
//! high, so the toggle output freezes at its last level during gated-off windows.
//!
//! The gate role requires a binding to a master trigger output. Enabling it before
//! [SlaveTimer::bind_to_master] does not compile:
//!
//! ```compile_fail
//! use timsync::{
//!     hardware::{Channel, SlaveTimer, TimerId},
//!     sim::{SimPin, SimTimer},
//! };
//!
//! let tim3 = SimTimer::new(TimerId::Tim3);
//! let pin = SimPin::new();
//! let slave = SlaveTimer::new(&tim3)
//!     .configure_time_base(timebase::TimerConfig::new(10, 199).unwrap())
//!     .configure_toggle_channel(Channel::One, 199, &pin)
//!     .unwrap();
//! slave.enable_slave_gate_role();
//! ```
use serde::{Deserialize, Serialize};
use timebase::TimerConfig;

use super::{
    compare::ChannelCompareConfig,
    master::TriggerOutput,
    timers::{
        self, internal_trigger, Channel, OutputRoute, SlaveMode, TimerId,
        TimerRegisters, TriggerSource,
    },
    Error,
};

/// How the slave counter reacts to the trigger of its master.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateMode {
    /// Count while the trigger is high, hold while it is low.
    #[default]
    Gated,
    /// Restart counting from zero on every rising trigger edge.
    Reset,
    /// Start counting on the first rising trigger edge.
    Trigger,
}

impl From<GateMode> for SlaveMode {
    fn from(mode: GateMode) -> Self {
        match mode {
            GateMode::Gated => SlaveMode::Gated,
            GateMode::Reset => SlaveMode::Reset,
            GateMode::Trigger => SlaveMode::Trigger,
        }
    }
}

/// The relation between a master trigger output and a slave timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriggerBinding {
    producer: TimerId,
    source: TriggerSource,
    mode: GateMode,
}

impl TriggerBinding {
    /// The master timer producing the trigger.
    pub fn producer(&self) -> TimerId {
        self.producer
    }

    /// The internal trigger input of the slave connected to the producer.
    pub fn source(&self) -> TriggerSource {
        self.source
    }

    /// The reaction of the slave counter to the trigger.
    pub fn mode(&self) -> GateMode {
        self.mode
    }
}

/// The slave timer has been constructed and its counter is paused.
pub struct Idle;

/// The time base is programmed.
pub struct TimeBase {
    config: TimerConfig,
}

/// Time base and toggle channel are programmed, the channel is routed to its pin.
pub struct Configured<P> {
    config: TimerConfig,
    toggle: ChannelCompareConfig,
    pin: P,
}

/// The complete configuration of a slave timer.
pub struct SlaveSetup<P> {
    pub config: TimerConfig,
    pub toggle: ChannelCompareConfig,
    pub binding: TriggerBinding,
    pub pin: P,
}

/// The slave is fully described and bound to its master.
pub struct Bound<P>(SlaveSetup<P>);

/// The slave mode is active, the counter is still paused.
pub struct Armed<P>(SlaveSetup<P>);

/// The counter is enabled and advances as permitted by the trigger. Terminal.
pub struct Running<P>(SlaveSetup<P>);

/// A timer whose counting is governed by the trigger output of a master timer.
pub struct SlaveTimer<T, S = Idle> {
    timer: T,
    state: S,
}

impl<T: TimerRegisters, S> SlaveTimer<T, S> {
    fn into_state<N>(self, state: N) -> SlaveTimer<T, N> {
        SlaveTimer {
            timer: self.timer,
            state,
        }
    }
}

impl<T: TimerRegisters> SlaveTimer<T, Idle> {
    /// Construct the slave timer.
    ///
    /// # Args
    /// * `timer` - The timer peripheral. Its counter is paused.
    pub fn new(mut timer: T) -> Self {
        timer.pause();
        Self { timer, state: Idle }
    }

    /// Program prescaler and period, independent of the master's.
    pub fn configure_time_base(
        mut self,
        config: TimerConfig,
    ) -> SlaveTimer<T, TimeBase> {
        timers::program_time_base(&mut self.timer, &config);
        log::debug!(
            "{:?} slave time base: PSC {} ARR {}",
            self.timer.id(),
            config.psc(),
            config.reload()
        );
        self.into_state(TimeBase { config })
    }
}

impl<T: TimerRegisters> SlaveTimer<T, TimeBase> {
    /// Toggle a channel output every time the counter reaches `tick`.
    ///
    /// # Note
    /// The toggle repeats every counter period without software re-arming. The channel output
    /// is routed to `pin` before it is enabled.
    ///
    /// # Args
    /// * `channel` - The output compare channel.
    /// * `tick` - The counter value at which the output flips, at most the reload value.
    /// * `pin` - The pin presenting the channel output.
    pub fn configure_toggle_channel<P: OutputRoute>(
        mut self,
        channel: Channel,
        tick: u32,
        mut pin: P,
    ) -> Result<SlaveTimer<T, Configured<P>>, Error> {
        let config = self.state.config;
        let toggle = ChannelCompareConfig::toggle(channel, tick, &config)?;

        timers::program_compare(&mut self.timer, &toggle);
        pin.route(self.timer.id(), channel);
        self.timer.enable_output(channel);

        log::debug!(
            "{:?} slave toggle on {:?} at tick {}",
            self.timer.id(),
            channel,
            tick
        );

        Ok(self.into_state(Configured {
            config,
            toggle,
            pin,
        }))
    }
}

impl<T: TimerRegisters, P> SlaveTimer<T, Configured<P>> {
    /// Record the trigger binding to a master timer.
    ///
    /// # Note
    /// No register is written here. The slave mode takes effect with
    /// [SlaveTimer::enable_slave_gate_role].
    ///
    /// # Args
    /// * `master` - The trigger output of the master timer.
    /// * `mode` - How the counter reacts to the trigger.
    pub fn bind_to_master(
        self,
        master: TriggerOutput,
        mode: GateMode,
    ) -> Result<SlaveTimer<T, Bound<P>>, Error> {
        let slave = self.timer.id();
        let source = internal_trigger(slave, master.timer()).ok_or(
            Error::NoTriggerConnection {
                master: master.timer(),
                slave,
            },
        )?;

        let binding = TriggerBinding {
            producer: master.timer(),
            source,
            mode,
        };
        log::debug!("{:?} bound to {:?}", slave, binding);

        let SlaveTimer {
            timer,
            state: Configured {
                config,
                toggle,
                pin,
            },
        } = self;

        Ok(SlaveTimer {
            timer,
            state: Bound(SlaveSetup {
                config,
                toggle,
                binding,
                pin,
            }),
        })
    }
}

impl<T: TimerRegisters, P> SlaveTimer<T, Bound<P>> {
    /// The recorded trigger binding.
    pub fn binding(&self) -> &TriggerBinding {
        &self.state.0.binding
    }

    /// Select the bound trigger input and activate the slave mode.
    pub fn enable_slave_gate_role(mut self) -> SlaveTimer<T, Armed<P>> {
        let binding = self.state.0.binding;
        self.timer.set_slave_mode(binding.source, binding.mode.into());
        log::debug!(
            "{:?} slave mode {:?} on {:?}",
            self.timer.id(),
            binding.mode,
            binding.source
        );

        let Bound(setup) = self.state;
        SlaveTimer {
            timer: self.timer,
            state: Armed(setup),
        }
    }
}

impl<T: TimerRegisters, P> SlaveTimer<T, Armed<P>> {
    /// Enable the counter. It only advances as permitted by the trigger.
    ///
    /// # Note
    /// In [GateMode::Trigger], the hardware enables the counter on the first rising trigger
    /// edge, so the counter is left disabled here.
    pub fn start(mut self) -> SlaveTimer<T, Running<P>> {
        if self.state.0.binding.mode != GateMode::Trigger {
            self.timer.resume();
        }
        log::debug!("{:?} slave started", self.timer.id());

        let Armed(setup) = self.state;
        SlaveTimer {
            timer: self.timer,
            state: Running(setup),
        }
    }
}

impl<T: TimerRegisters, P> SlaveTimer<T, Running<P>> {
    /// The configuration the running slave was programmed with.
    pub fn setup(&self) -> &SlaveSetup<P> {
        &self.state.0
    }
}
