//! Setup of the synchronized master/slave timer pair.
//!
//! # Design
//! The order of operations matters:
//! 1. The slave is fully described (time base, toggle channel, trigger binding) before the
//!    trigger it reacts to goes live. Otherwise the slave may free-run ungated for a moment and
//!    emit spurious toggles.
//! 2. The master time base and PWM channel are programmed.
//! 3. The master trigger output is enabled and the master is started.
//! 4. The slave mode is enabled and the slave is started.
//!
//! All parameters are validated up front in a [PairPlan], so any error is reported before the
//! first register write.
use fugit::HertzU32;
use timebase::TimerConfig;

use super::{
    clock::ClockSource,
    compare::{ChannelCompareConfig, DutyCycle},
    master::{self, MasterTimer, TriggerSelect},
    slave::{self, GateMode, SlaveTimer},
    timers::{
        internal_trigger, Channel, OutputRoute, TimerId, TimerRegisters,
        TriggerSource,
    },
    Error,
};
use crate::settings::PairSettings;

/// The validated register-level parameters of a master/slave pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairPlan {
    pub master: TimerConfig,
    pub master_channel: Channel,
    pub duty: DutyCycle,
    pub trigger: TriggerSelect,
    pub slave: TimerConfig,
    pub toggle: ChannelCompareConfig,
    pub gate: GateMode,
    pub trigger_source: TriggerSource,
}

impl PairPlan {
    /// Plan both timers from the settings.
    ///
    /// # Args
    /// * `settings` - The desired behavior of the pair.
    /// * `clocks` - The kernel clocks of the timers.
    /// * `master` - The timer generating the trigger.
    /// * `slave` - The timer gated by the trigger.
    pub fn new<C: ClockSource>(
        settings: &PairSettings,
        clocks: &C,
        master: TimerId,
        slave: TimerId,
    ) -> Result<Self, Error> {
        let master_config = timebase::plan(
            clocks.timer_clock(master),
            HertzU32::Hz(*settings.master.tick_frequency),
            Some(*settings.master.period_ticks),
        )?;
        let slave_config = timebase::plan(
            clocks.timer_clock(slave),
            HertzU32::Hz(*settings.slave.tick_frequency),
            Some(*settings.slave.period_ticks),
        )?;

        let toggle = ChannelCompareConfig::toggle(
            channel(*settings.slave.channel)?,
            *settings.slave.toggle_tick,
            &slave_config,
        )?;

        let trigger_source = internal_trigger(slave, master)
            .ok_or(Error::NoTriggerConnection { master, slave })?;

        Ok(Self {
            master: master_config,
            master_channel: channel(*settings.master.channel)?,
            duty: DutyCycle::from_percent(*settings.master.duty_percent)?,
            trigger: *settings.master.trigger,
            slave: slave_config,
            toggle,
            gate: *settings.slave.gate,
            trigger_source,
        })
    }
}

fn channel(index: u8) -> Result<Channel, Error> {
    Channel::try_from(index).map_err(|_| Error::InvalidChannel(index))
}

/// The running master/slave pair.
pub struct SynchronizedTimers<M, S, P> {
    pub master: MasterTimer<M, master::Running>,
    pub slave: SlaveTimer<S, slave::Running<P>>,
}

/// Configure and start a master/slave timer pair.
///
/// # Args
/// * `master` - The timer generating the gating trigger.
/// * `slave` - The timer toggling the output while gated open.
/// * `clocks` - The kernel clocks of both timers.
/// * `pin` - The pin presenting the slave's toggle output.
/// * `settings` - The desired behavior of the pair.
///
/// # Returns
/// The running pair. No further software intervention is needed.
pub fn setup<M, S, C, P>(
    master: M,
    slave: S,
    clocks: &C,
    pin: P,
    settings: &PairSettings,
) -> Result<SynchronizedTimers<M, S, P>, Error>
where
    M: TimerRegisters,
    S: TimerRegisters,
    C: ClockSource,
    P: OutputRoute,
{
    let (master_id, slave_id) = (master.id(), slave.id());
    let plan = PairPlan::new(settings, clocks, master_id, slave_id)?;

    let master = MasterTimer::new(master);

    // The slave must be fully described before it starts reacting to a live trigger.
    let slave = SlaveTimer::new(slave)
        .configure_time_base(plan.slave)
        .configure_toggle_channel(
            plan.toggle.channel,
            plan.toggle.compare as u32,
            pin,
        )?
        .bind_to_master(master.trigger_output(), plan.gate)?;

    let master = master
        .configure_time_base(plan.master)
        .configure_pwm_channel(plan.master_channel, plan.duty);

    // Enabling of the trigger and slave roles must happen after the rest of each timer has been
    // set up.
    let master = master.enable_trigger(plan.trigger).start();
    let slave = slave.enable_slave_gate_role().start();

    log::info!(
        "{:?} gates {:?} via {:?}: {} Hz / {} ticks at {}%, \
         slave {} Hz / {} ticks",
        master_id,
        slave_id,
        plan.trigger_source,
        *settings.master.tick_frequency,
        plan.master.period_ticks(),
        plan.duty.percent(),
        *settings.slave.tick_frequency,
        plan.slave.period_ticks(),
    );

    Ok(SynchronizedTimers { master, slave })
}
