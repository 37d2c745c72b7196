//! Cycle-level simulation of general purpose timers.
//!
//! Host-side backend for the timer controllers: [SimTimer] implements
//! [crate::hardware::TimerRegisters], [SimPin] implements [crate::hardware::OutputRoute], and a
//! [Bench] clocks a master/slave pair to observe the trigger and the output pin.
mod bench;
mod pin;
pub mod registers;
mod timer;

pub use bench::{Bench, Edge, Sample, EDGE_CAPACITY};
pub use pin::SimPin;
pub use timer::SimTimer;
