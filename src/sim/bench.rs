//! A test bench wiring a master timer, a slave timer and an output pin together.
use embedded_hal_1::digital::InputPin;
use heapless::Vec;

use super::{SimPin, SimTimer};
use crate::hardware::timers::internal_trigger;

/// Capacity of the edge capture buffer.
pub const EDGE_CAPACITY: usize = 128;

/// The observable signals after one kernel clock cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// The master trigger output.
    pub trigger: bool,
    /// The level of the output pin.
    pub output: bool,
}

/// A level change of the output pin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    /// The kernel clock cycle during which the level changed.
    pub cycle: u64,
    /// The new level.
    pub level: bool,
}

/// Clocks both timers from a common kernel clock and records output pin edges.
///
/// # Note
/// The slave only observes the master trigger on the internal trigger input that the
/// interconnect matrix wires to the master, and only if that input is selected.
pub struct Bench<'a> {
    master: &'a SimTimer,
    slave: &'a SimTimer,
    pin: &'a SimPin,
    cycle: u64,
    output: bool,
    edges: Vec<Edge, EDGE_CAPACITY>,
    dropped: usize,
}

impl<'a> Bench<'a> {
    /// Wire `master` and `slave` with the output observed on `pin`.
    pub fn new(
        master: &'a SimTimer,
        slave: &'a SimTimer,
        pin: &'a SimPin,
    ) -> Self {
        let mut probe = pin;
        let output = probe.is_high().unwrap_or_else(|e| match e {});
        Self {
            master,
            slave,
            pin,
            cycle: 0,
            output,
            edges: Vec::new(),
            dropped: 0,
        }
    }

    /// Advance both timers by one kernel clock cycle.
    pub fn step(&mut self) -> Sample {
        self.master.clock(false);
        let trigger = self.master.trigger_output();

        let connected = internal_trigger(self.slave.id(), self.master.id());
        let slave_trigger = trigger
            && connected.is_some()
            && self.slave.trigger_input() == connected;
        self.slave.clock(slave_trigger);

        let level = self.pin.routed().and_then(|(timer, channel)| {
            if timer == self.slave.id() {
                Some(self.slave.output(channel))
            } else if timer == self.master.id() {
                Some(self.master.output(channel))
            } else {
                None
            }
        });
        self.pin.drive(level);

        let mut probe = self.pin;
        let output = probe.is_high().unwrap_or_else(|e| match e {});
        if output != self.output {
            let edge = Edge {
                cycle: self.cycle,
                level: output,
            };
            if self.edges.push(edge).is_err() {
                if self.dropped == 0 {
                    log::warn!("Edge capture full at cycle {}", self.cycle);
                }
                self.dropped += 1;
            }
            self.output = output;
        }

        self.cycle += 1;
        Sample { trigger, output }
    }

    /// Advance by `cycles` kernel clock cycles, returning the last sample.
    pub fn run(&mut self, cycles: u64) -> Option<Sample> {
        (0..cycles).map(|_| self.step()).last()
    }

    /// The number of cycles stepped so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The captured output edges, oldest first.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The number of edges lost to a full capture buffer.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{
        Channel, OutputCompareMode, OutputRoute, SlaveMode, TimerId,
        TimerRegisters, TriggerGenerator, TriggerSource,
    };

    // Master: 25% PWM over 100 cycles on TRGO. Slave: toggles every 5 cycles.
    fn wire(master: &SimTimer, slave: &SimTimer, mut pin: &SimPin) {
        let mut regs = master;
        regs.set_period_ticks(99);
        regs.set_compare(Channel::One, 25);
        regs.set_output_compare(Channel::One, OutputCompareMode::Pwm1, false);
        regs.generate_trigger(TriggerGenerator::Ch1Compare);
        regs.apply_freq();

        let mut regs = slave;
        regs.set_period_ticks(4);
        regs.set_compare(Channel::Two, 4);
        regs.set_output_compare(Channel::Two, OutputCompareMode::Toggle, false);
        regs.enable_output(Channel::Two);
        regs.apply_freq();
        pin.route(slave.id(), Channel::Two);
    }

    #[test]
    fn gated_slave_follows_trigger() {
        let (master, slave, pin) = (
            SimTimer::new(TimerId::Tim2),
            SimTimer::new(TimerId::Tim3),
            SimPin::new(),
        );
        wire(&master, &slave, &pin);
        (&slave).set_slave_mode(TriggerSource::Trigger1, SlaveMode::Gated);
        (&slave).resume();
        (&master).resume();

        let mut bench = Bench::new(&master, &slave, &pin);
        for _ in 0..300 {
            let before = bench.edges().len();
            let sample = bench.step();
            if !sample.trigger {
                assert_eq!(bench.edges().len(), before);
            }
        }
        // 75 gated-open cycles, a toggle every 5 of them.
        assert_eq!(bench.edges().len(), 15);
        assert_eq!(bench.dropped(), 0);
    }

    #[test]
    fn wrong_trigger_input_never_counts() {
        let (master, slave, pin) = (
            SimTimer::new(TimerId::Tim2),
            SimTimer::new(TimerId::Tim3),
            SimPin::new(),
        );
        wire(&master, &slave, &pin);
        (&slave).set_slave_mode(TriggerSource::Trigger0, SlaveMode::Gated);
        (&slave).resume();
        (&master).resume();

        let mut bench = Bench::new(&master, &slave, &pin);
        bench.run(300);
        assert!(bench.edges().is_empty());
        assert_eq!(slave.counter(), 0);
    }

    #[test]
    fn ungated_slave_toggles_while_trigger_low() {
        let (master, slave, pin) = (
            SimTimer::new(TimerId::Tim2),
            SimTimer::new(TimerId::Tim3),
            SimPin::new(),
        );
        wire(&master, &slave, &pin);
        (&slave).resume();
        (&master).resume();

        let mut bench = Bench::new(&master, &slave, &pin);
        let mut low_edges = 0;
        for _ in 0..100 {
            let before = bench.edges().len();
            let sample = bench.step();
            if !sample.trigger && bench.edges().len() > before {
                low_edges += 1;
            }
        }
        assert!(low_edges > 0);
        assert_eq!(bench.edges().len(), 20);
    }
}
