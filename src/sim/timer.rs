//! Cycle-level model of an up-counting general purpose timer.
//!
//! # Design
//! Registers are held in [Cell]s so a shared reference can serve as the register block handed
//! to a timer controller while a test bench keeps clocking and observing the same timer.
//!
//! One call to [SimTimer::clock] corresponds to one cycle of the timer kernel clock. The
//! prescaler, the counter, the slave mode controller and the output compare logic all advance
//! in that call. Prescaler, auto-reload (with ARPE set) and compare values (with OCxPE set) are
//! buffered and only take effect on an update event.
use core::cell::Cell;

use arbitrary_int::{u2, u3};

use super::registers::{Ccer, Ccmr, Cr1, Cr2, Smcr};
use crate::hardware::{
    Channel, OutputCompareMode, SlaveMode, TimerId, TimerRegisters,
    TriggerGenerator, TriggerSource,
};

const CHANNELS: [Channel; 4] =
    [Channel::One, Channel::Two, Channel::Three, Channel::Four];

/// A simulated timer peripheral.
pub struct SimTimer {
    id: TimerId,
    cr1: Cell<Cr1>,
    cr2: Cell<Cr2>,
    smcr: Cell<Smcr>,
    ccmr: [Cell<Ccmr>; 2],
    ccer: Cell<Ccer>,

    // Preload and active (shadow) registers.
    psc: Cell<u16>,
    psc_active: Cell<u16>,
    arr: Cell<u16>,
    arr_active: Cell<u16>,
    ccr: [Cell<u16>; 4],
    ccr_active: [Cell<u16>; 4],

    prescaler_counter: Cell<u16>,
    cnt: Cell<u16>,
    ocref: [Cell<bool>; 4],
    last_trigger: Cell<bool>,
    update_pulse: Cell<bool>,
    compare_pulse: Cell<bool>,
}

macro_rules! channel_registers {
    ($($channel:ident: $pair:literal, $n:literal, $i:literal);+) => {
        paste::paste! {
            impl SimTimer {
                fn ccmr_mode(
                    &self,
                    channel: Channel,
                ) -> Option<OutputCompareMode> {
                    let mode = match channel {
                        $(Channel::$channel => {
                            self.ccmr[$pair].get().[<oc $n m>]()
                        })+
                    };
                    OutputCompareMode::try_from(mode.value()).ok()
                }

                fn ccmr_preload(&self, channel: Channel) -> bool {
                    match channel {
                        $(Channel::$channel => {
                            self.ccmr[$pair].get().[<oc $n pe>]()
                        })+
                    }
                }

                fn write_ccmr(
                    &self,
                    channel: Channel,
                    mode: OutputCompareMode,
                    preload: bool,
                ) {
                    match channel {
                        $(Channel::$channel => {
                            let ccmr = &self.ccmr[$pair];
                            ccmr.set(
                                ccmr.get()
                                    .[<with_cc $n s>](u2::new(0))
                                    .[<with_oc $n m>](u3::new(mode as u8))
                                    .[<with_oc $n pe>](preload),
                            );
                        })+
                    }
                }

                fn output_enabled(&self, channel: Channel) -> bool {
                    match channel {
                        $(Channel::$channel => self.ccer.get().[<cc $i e>](),)+
                    }
                }

                fn write_output_enable(&self, channel: Channel) {
                    let ccer = self.ccer.get();
                    self.ccer.set(match channel {
                        $(Channel::$channel => ccer.[<with_cc $i e>](true),)+
                    });
                }
            }
        }
    };
}

channel_registers!(One: 0, 1, 1; Two: 0, 2, 2; Three: 1, 1, 3; Four: 1, 2, 4);

impl SimTimer {
    /// Construct a timer in its reset state.
    pub fn new(id: TimerId) -> Self {
        Self {
            id,
            cr1: Cell::new(Cr1::default()),
            cr2: Cell::new(Cr2::default()),
            smcr: Cell::new(Smcr::default()),
            ccmr: Default::default(),
            ccer: Cell::new(Ccer::default()),
            psc: Cell::new(0),
            psc_active: Cell::new(0),
            arr: Cell::new(u16::MAX),
            arr_active: Cell::new(u16::MAX),
            ccr: Default::default(),
            ccr_active: Default::default(),
            prescaler_counter: Cell::new(0),
            cnt: Cell::new(0),
            ocref: Default::default(),
            last_trigger: Cell::new(false),
            update_pulse: Cell::new(false),
            compare_pulse: Cell::new(false),
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// The current counter value.
    pub fn counter(&self) -> u16 {
        self.cnt.get()
    }

    /// Whether the counter is enabled (CR1.CEN).
    pub fn is_enabled(&self) -> bool {
        self.cr1.get().cen()
    }

    /// The output compare reference of a channel.
    pub fn compare_reference(&self, channel: Channel) -> bool {
        self.ocref[channel.index()].get()
    }

    /// The level of a channel output. Disabled outputs are low.
    pub fn output(&self, channel: Channel) -> bool {
        self.output_enabled(channel) && self.compare_reference(channel)
    }

    /// The selected trigger input, if a slave mode is active.
    pub fn trigger_input(&self) -> Option<TriggerSource> {
        let smcr = self.smcr.get();
        match SlaveMode::try_from(smcr.sms().value()) {
            Ok(SlaveMode::Disabled) | Err(_) => None,
            Ok(_) => TriggerSource::try_from(smcr.ts().value()).ok(),
        }
    }

    /// The current level of the trigger output (TRGO).
    pub fn trigger_output(&self) -> bool {
        match TriggerGenerator::try_from(self.cr2.get().mms().value()) {
            Ok(TriggerGenerator::Reset) | Ok(TriggerGenerator::Update) => {
                self.update_pulse.get()
            }
            Ok(TriggerGenerator::Enable) => self.is_enabled(),
            Ok(TriggerGenerator::ComparePulse) => self.compare_pulse.get(),
            Ok(TriggerGenerator::Ch1Compare) => {
                self.compare_reference(Channel::One)
            }
            Ok(TriggerGenerator::Ch2Compare) => {
                self.compare_reference(Channel::Two)
            }
            Ok(TriggerGenerator::Ch3Compare) => {
                self.compare_reference(Channel::Three)
            }
            Ok(TriggerGenerator::Ch4Compare) => {
                self.compare_reference(Channel::Four)
            }
            Err(_) => false,
        }
    }

    /// Advance the timer by one kernel clock cycle.
    ///
    /// # Args
    /// * `trigger` - The level of the selected trigger input during this cycle.
    pub fn clock(&self, trigger: bool) {
        let rising = trigger && !self.last_trigger.replace(trigger);
        self.update_pulse.set(false);
        self.compare_pulse.set(false);

        let mode = SlaveMode::try_from(self.smcr.get().sms().value())
            .unwrap_or(SlaveMode::Disabled);

        match mode {
            SlaveMode::Reset if rising => self.update_event(),
            SlaveMode::Trigger if rising => {
                self.cr1.set(self.cr1.get().with_cen(true));
            }
            _ => {}
        }

        let counting = self.is_enabled()
            && match mode {
                SlaveMode::Gated => trigger,
                SlaveMode::ExternalClock => rising,
                SlaveMode::Encoder1
                | SlaveMode::Encoder2
                | SlaveMode::Encoder3 => false,
                _ => true,
            };

        if counting {
            if self.prescaler_counter.get() >= self.psc_active.get() {
                self.prescaler_counter.set(0);
                self.tick();
            } else {
                self.prescaler_counter.set(self.prescaler_counter.get() + 1);
            }
        }

        self.evaluate_pwm();
    }

    fn tick(&self) {
        if self.cnt.get() >= self.arr_active.get() {
            self.cnt.set(0);
            self.update_event();
        } else {
            self.cnt.set(self.cnt.get() + 1);
        }

        let cnt = self.cnt.get();
        for channel in CHANNELS {
            if self.ccr_active[channel.index()].get() != cnt {
                continue;
            }
            if channel == Channel::One {
                self.compare_pulse.set(true);
            }
            if self.ccmr_mode(channel) == Some(OutputCompareMode::Toggle) {
                let ocref = &self.ocref[channel.index()];
                ocref.set(!ocref.get());
            }
        }
    }

    /// Load all buffered registers and restart the counter.
    fn update_event(&self) {
        self.psc_active.set(self.psc.get());
        self.arr_active.set(self.arr.get());
        for (active, preload) in self.ccr_active.iter().zip(self.ccr.iter()) {
            active.set(preload.get());
        }
        self.prescaler_counter.set(0);
        self.cnt.set(0);
        self.update_pulse.set(true);
    }

    fn evaluate_pwm(&self) {
        let cnt = self.cnt.get();
        for channel in CHANNELS {
            let ccr = self.ccr_active[channel.index()].get();
            let level = match self.ccmr_mode(channel) {
                Some(OutputCompareMode::Pwm1) => cnt < ccr,
                Some(OutputCompareMode::Pwm2) => cnt >= ccr,
                Some(OutputCompareMode::ForceActive) => true,
                Some(OutputCompareMode::ForceInactive) => false,
                _ => continue,
            };
            self.ocref[channel.index()].set(level);
        }
    }
}

impl TimerRegisters for &SimTimer {
    fn id(&self) -> TimerId {
        self.id
    }

    fn pause(&mut self) {
        self.cr1.set(self.cr1.get().with_cen(false));
    }

    fn resume(&mut self) {
        self.cr1.set(self.cr1.get().with_cen(true));
    }

    fn set_prescaler(&mut self, psc: u16) {
        self.psc.set(psc);
    }

    fn set_period_ticks(&mut self, period: u16) {
        self.arr.set(period);
        if !self.cr1.get().arpe() {
            self.arr_active.set(period);
        }
    }

    fn set_auto_reload_preload(&mut self, enable: bool) {
        self.cr1.set(self.cr1.get().with_arpe(enable));
    }

    fn apply_freq(&mut self) {
        self.update_event();
        self.evaluate_pwm();
    }

    fn set_compare(&mut self, channel: Channel, value: u16) {
        self.ccr[channel.index()].set(value);
        if !self.ccmr_preload(channel) {
            self.ccr_active[channel.index()].set(value);
        }
    }

    fn set_output_compare(
        &mut self,
        channel: Channel,
        mode: OutputCompareMode,
        preload: bool,
    ) {
        self.write_ccmr(channel, mode, preload);
    }

    fn enable_output(&mut self, channel: Channel) {
        self.write_output_enable(channel);
    }

    fn generate_trigger(&mut self, source: TriggerGenerator) {
        self.cr2.set(self.cr2.get().with_mms(u3::new(source as u8)));
    }

    fn set_slave_mode(&mut self, source: TriggerSource, mode: SlaveMode) {
        self.smcr.set(
            self.smcr
                .get()
                .with_ts(u3::new(source as u8))
                .with_sms(u3::new(mode as u8)),
        );
    }
}
