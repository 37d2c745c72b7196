use fugit::HertzU32;

/// The counting frequency of the master timer in the reference configuration.
pub const MASTER_TICK_FREQUENCY: HertzU32 = HertzU32::Hz(2000);

// The master period is 8000 ticks, so at 2 kHz one cycle lasts 4 seconds.
pub const MASTER_PERIOD_TICKS: u32 = 8000;

/// The master duty cycle: 1 second of every 4 second cycle gates the slave open.
pub const MASTER_DUTY_PERCENT: u8 = 25;

/// The counting frequency of the slave timer in the reference configuration.
pub const SLAVE_TICK_FREQUENCY: HertzU32 = HertzU32::Hz(2000);

// The slave counts 0 to 199 inclusive, 10 times per second while gated open.
pub const SLAVE_PERIOD_TICKS: u32 = 200;

/// The slave toggles its output at the end of every period, flashing at 5 Hz.
pub const SLAVE_TOGGLE_TICK: u32 = SLAVE_PERIOD_TICKS - 1;
