use core::{cell::Cell, convert::Infallible};

use embedded_hal_1::digital::{ErrorType, InputPin};

use crate::hardware::{Channel, OutputRoute, TimerId};

/// A simulated pin that can be routed to a timer channel output and read back.
#[derive(Default)]
pub struct SimPin {
    route: Cell<Option<(TimerId, Channel)>>,
    level: Cell<bool>,
}

impl SimPin {
    /// An unrouted pin, reading low.
    pub fn new() -> Self {
        Self::default()
    }

    /// The timer channel currently driving the pin.
    pub fn routed(&self) -> Option<(TimerId, Channel)> {
        self.route.get()
    }

    /// Drive the pin from its routed source. Unrouted pins are pulled low.
    pub(crate) fn drive(&self, level: Option<bool>) {
        self.level.set(level.unwrap_or(false));
    }
}

impl OutputRoute for &SimPin {
    fn route(&mut self, timer: TimerId, channel: Channel) {
        self.route.set(Some((timer, channel)));
    }
}

impl ErrorType for &SimPin {
    type Error = Infallible;
}

impl InputPin for &SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}
