use fugit::HertzU32;
use timsync::{
    hardware::{
        setup, ApbDivider, Channel, Clocks, Error, GateMode, PairPlan,
        TimerId, TriggerGenerator, TriggerSelect, TriggerSource,
    },
    settings::PairSettings,
    sim::{Bench, SimPin, SimTimer},
};

// A kernel clock of 20 kHz divides the 2 kHz tick rates by 10 and keeps the simulation short.
const KERNEL_CLOCK: HertzU32 = HertzU32::kHz(20);
const CLOCKS: Clocks = Clocks::new(KERNEL_CLOCK, KERNEL_CLOCK);

// Kernel cycles per second and per master period.
const SECOND: u64 = 20_000;
const MASTER_PERIOD: u64 = 4 * SECOND;

#[test]
fn gated_flashing() {
    let (tim2, tim3, pin) = (
        SimTimer::new(TimerId::Tim2),
        SimTimer::new(TimerId::Tim3),
        SimPin::new(),
    );
    let settings = PairSettings::default();
    let pair = setup(&tim2, &tim3, &CLOCKS, &pin, &settings).unwrap();

    assert_eq!(pair.master.setup().pwm.compare, 2000);
    assert_eq!(pair.master.setup().trigger, TriggerGenerator::Ch1Compare);
    assert_eq!(
        pair.slave.setup().binding.source(),
        TriggerSource::Trigger1
    );
    assert_eq!(pin.routed(), Some((TimerId::Tim3, Channel::One)));

    let mut bench = Bench::new(&tim2, &tim3, &pin);
    let mut high = [0u64; 3];
    let mut held = None;
    for cycle in 0..3 * MASTER_PERIOD {
        let before = bench.edges().len();
        let sample = bench.step();

        // One second high, three seconds low.
        assert_eq!(sample.trigger, (cycle + 1) % MASTER_PERIOD < SECOND);
        if sample.trigger {
            high[(cycle / MASTER_PERIOD) as usize] += 1;
            held = None;
        } else {
            // The output is frozen and the slave counter holds its value.
            assert_eq!(bench.edges().len(), before);
            let counter = tim3.counter();
            assert_eq!(*held.get_or_insert(counter), counter);
        }
    }
    assert_eq!(high[1], SECOND);
    assert_eq!(high[2], SECOND);
    assert_eq!(bench.dropped(), 0);

    // Ten toggles per open window, 100 ms apart.
    let edges = bench.edges();
    assert_eq!(edges.len(), 30);
    for window in edges.chunks(10) {
        for adjacent in window.windows(2) {
            assert_eq!(adjacent[1].cycle - adjacent[0].cycle, SECOND / 10);
            assert_ne!(adjacent[1].level, adjacent[0].level);
        }
    }
    assert!(edges[0].level);
    for (window, first) in edges.chunks(10).enumerate() {
        let start = (window as u64 * MASTER_PERIOD).saturating_sub(1);
        assert!(first[0].cycle >= start);
        assert!(first[9].cycle < start + SECOND);
    }
}

#[test]
fn trigger_mode_starts_on_first_edge() {
    let (tim2, tim3, pin) = (
        SimTimer::new(TimerId::Tim2),
        SimTimer::new(TimerId::Tim3),
        SimPin::new(),
    );
    let mut settings = PairSettings::default();
    *settings.slave.gate = GateMode::Trigger;
    setup(&tim2, &tim3, &CLOCKS, &pin, &settings).unwrap();
    assert!(tim2.is_enabled());
    assert!(!tim3.is_enabled());

    let mut bench = Bench::new(&tim2, &tim3, &pin);
    bench.step();
    assert!(tim3.is_enabled());

    // Once started, the slave keeps counting through the low part of the master period.
    bench.run(MASTER_PERIOD);
    assert_eq!(bench.edges().len(), 40);
}

#[test]
fn reference_plan() {
    let clocks =
        Clocks::from_bus(HertzU32::MHz(72), ApbDivider::Div2, ApbDivider::Div1);
    let plan = PairPlan::new(
        &PairSettings::default(),
        &clocks,
        TimerId::Tim2,
        TimerId::Tim3,
    )
    .unwrap();

    assert_eq!(plan.master.prescaler(), 36000);
    assert_eq!(plan.master.reload(), 7999);
    assert_eq!(plan.duty.compare_value(plan.master.reload()), 2000);
    assert_eq!(plan.slave.prescaler(), 36000);
    assert_eq!(plan.slave.reload(), 199);
    assert_eq!(plan.toggle.compare, 199);
    assert_eq!(plan.trigger_source, TriggerSource::Trigger1);
    assert_eq!(plan.gate, GateMode::Gated);
}

#[test]
fn plan_from_settings_paths() {
    let mut settings = PairSettings::default();
    settings.set_json("/master/duty_percent", b"50").unwrap();
    settings.set_json("/slave/gate", br#""Reset""#).unwrap();
    settings.set_json("/master/trigger", br#""Update""#).unwrap();

    let plan =
        PairPlan::new(&settings, &CLOCKS, TimerId::Tim2, TimerId::Tim3)
            .unwrap();
    assert_eq!(plan.duty.percent(), 50);
    assert_eq!(plan.master.reload(), 7999);
    assert_eq!(plan.duty.compare_value(plan.master.reload()), 4000);
    assert_eq!(plan.gate, GateMode::Reset);
    assert_eq!(plan.trigger, TriggerSelect::Update);

    // A rejected value leaves the previous one in place.
    assert!(settings.set_json("/master/duty_percent", b"-1").is_err());
    assert_eq!(
        PairPlan::new(&settings, &CLOCKS, TimerId::Tim2, TimerId::Tim3),
        Ok(plan)
    );
}

#[test]
fn plan_errors() {
    let plan = |settings: &PairSettings, master, slave| {
        PairPlan::new(settings, &CLOCKS, master, slave)
    };
    let defaults = PairSettings::default();

    assert_eq!(
        plan(&defaults, TimerId::Tim8, TimerId::Tim3),
        Err(Error::NoTriggerConnection {
            master: TimerId::Tim8,
            slave: TimerId::Tim3
        })
    );

    let mut settings = defaults.clone();
    *settings.slave.channel = 5;
    assert_eq!(
        plan(&settings, TimerId::Tim2, TimerId::Tim3),
        Err(Error::InvalidChannel(5))
    );

    let mut settings = defaults.clone();
    *settings.master.duty_percent = 101;
    assert_eq!(
        plan(&settings, TimerId::Tim2, TimerId::Tim3),
        Err(Error::DutyOutOfRange(101))
    );

    let mut settings = defaults.clone();
    *settings.slave.toggle_tick = 200;
    assert_eq!(
        plan(&settings, TimerId::Tim2, TimerId::Tim3),
        Err(Error::CompareOutOfRange {
            value: 200,
            reload: 199
        })
    );

    let mut settings = defaults;
    *settings.master.tick_frequency = 0;
    assert_eq!(
        plan(&settings, TimerId::Tim2, TimerId::Tim3),
        Err(Error::TimeBase(timebase::Error::ZeroFrequency))
    );
}

#[test]
fn failed_setup_leaves_timers_untouched() {
    let (tim2, tim3, pin) = (
        SimTimer::new(TimerId::Tim2),
        SimTimer::new(TimerId::Tim3),
        SimPin::new(),
    );
    let mut settings = PairSettings::default();
    *settings.slave.toggle_tick = 1000;

    assert!(setup(&tim2, &tim3, &CLOCKS, &pin, &settings).is_err());
    assert_eq!(pin.routed(), None);
    assert!(tim3.trigger_input().is_none());
    assert!(!tim2.trigger_output());
}
