//! Settings of the synchronized timer pair.
//!
//! # Design
//! The settings describe the pair in physical terms (tick rates, periods, duty cycle). They are
//! turned into register values by [crate::hardware::PairPlan] at setup time and are not
//! consulted afterwards, as the pair is not reconfigured once running.
//!
//! Individual entries are addressed by path, e.g. `/master/duty_percent` or `/slave/gate`,
//! with JSON values.
use miniconf::{Leaf, Tree};
use serde::{Deserialize, Serialize};

use crate::hardware::{design_parameters, GateMode, TriggerSelect};

/// Settings of the master timer.
#[derive(Clone, Debug, Tree, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSettings {
    /// The rate at which the master counter increments in Hertz.
    pub tick_frequency: Leaf<u32>,

    /// The master period in counter ticks.
    pub period_ticks: Leaf<u32>,

    /// The fraction of the period during which the slave is gated open, in percent.
    pub duty_percent: Leaf<u8>,

    /// The capture/compare channel (1-4) generating the trigger.
    pub channel: Leaf<u8>,

    /// The event driving the trigger output. See [TriggerSelect] variants.
    pub trigger: Leaf<TriggerSelect>,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            tick_frequency: design_parameters::MASTER_TICK_FREQUENCY
                .to_Hz()
                .into(),
            period_ticks: design_parameters::MASTER_PERIOD_TICKS.into(),
            duty_percent: design_parameters::MASTER_DUTY_PERCENT.into(),
            channel: 1.into(),
            trigger: TriggerSelect::CompareReference.into(),
        }
    }
}

/// Settings of the slave timer.
#[derive(Clone, Debug, Tree, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveSettings {
    /// The rate at which the slave counter increments while gated open, in Hertz.
    pub tick_frequency: Leaf<u32>,

    /// The slave period in counter ticks.
    pub period_ticks: Leaf<u32>,

    /// The counter value at which the output toggles.
    pub toggle_tick: Leaf<u32>,

    /// The capture/compare channel (1-4) presenting the toggle output.
    pub channel: Leaf<u8>,

    /// How the slave reacts to the trigger. See [GateMode] variants.
    pub gate: Leaf<GateMode>,
}

impl Default for SlaveSettings {
    fn default() -> Self {
        Self {
            tick_frequency: design_parameters::SLAVE_TICK_FREQUENCY
                .to_Hz()
                .into(),
            period_ticks: design_parameters::SLAVE_PERIOD_TICKS.into(),
            toggle_tick: design_parameters::SLAVE_TOGGLE_TICK.into(),
            channel: 1.into(),
            gate: GateMode::Gated.into(),
        }
    }
}

/// Settings of the master/slave pair.
#[derive(Clone, Debug, Default, Tree, Serialize, Deserialize)]
#[serde(default)]
pub struct PairSettings {
    /// The master timer generating the gate.
    pub master: MasterSettings,

    /// The slave timer toggling the output.
    pub slave: SlaveSettings,
}

impl PairSettings {
    /// Parse settings from JSON. Missing entries keep their default value.
    pub fn from_json(json: &str) -> Result<Self, serde_json_core::de::Error> {
        serde_json_core::from_str(json).map(|(settings, _)| settings)
    }

    /// Update a single setting.
    ///
    /// # Args
    /// * `path` - The `/` separated path of the setting, e.g. `/slave/gate`.
    /// * `value` - The JSON encoded value.
    ///
    /// # Returns
    /// The number of bytes consumed from `value`.
    pub fn set_json<'de>(
        &mut self,
        path: &str,
        value: &'de [u8],
    ) -> Result<usize, miniconf::Error<serde_json_core::de::Error>> {
        let len = miniconf::json::set(self, path, value)?;
        log::info!("Updated {}", path);
        Ok(len)
    }

    /// Serialize a single setting as JSON into `buf`, returning the length used.
    pub fn get_json(
        &self,
        path: &str,
        buf: &mut [u8],
    ) -> Result<usize, miniconf::Error<serde_json_core::ser::Error>> {
        miniconf::json::get(self, path, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference() {
        let settings = PairSettings::default();
        assert_eq!(*settings.master.tick_frequency, 2000);
        assert_eq!(*settings.master.period_ticks, 8000);
        assert_eq!(*settings.master.duty_percent, 25);
        assert_eq!(*settings.slave.period_ticks, 200);
        assert_eq!(*settings.slave.toggle_tick, 199);
        assert_eq!(*settings.slave.gate, GateMode::Gated);
    }

    #[test]
    fn partial_json() {
        let settings = PairSettings::from_json(
            r#"{"master": {"duty_percent": 50, "trigger": "Update"},
                "slave": {"gate": "Reset"}}"#,
        )
        .unwrap();
        assert_eq!(*settings.master.duty_percent, 50);
        assert_eq!(*settings.master.trigger, TriggerSelect::Update);
        assert_eq!(*settings.master.period_ticks, 8000);
        assert_eq!(*settings.slave.gate, GateMode::Reset);
        assert_eq!(*settings.slave.toggle_tick, 199);
    }

    #[test]
    fn malformed_json() {
        assert!(PairSettings::from_json(r#"{"master": {"channel": "one"}}"#)
            .is_err());
    }

    #[test]
    fn path_access() {
        let mut settings = PairSettings::default();
        settings.set_json("/master/trigger", br#""Update""#).unwrap();
        assert_eq!(*settings.master.trigger, TriggerSelect::Update);

        let mut buf = [0u8; 16];
        let len = settings.get_json("/slave/toggle_tick", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"199");
    }

    #[test]
    fn path_errors() {
        let mut settings = PairSettings::default();
        assert!(matches!(
            settings.set_json("/master/phase", b"1"),
            Err(miniconf::Error::Traversal(_))
        ));
        assert!(matches!(
            settings.set_json("/slave/gate", br#""Sometimes""#),
            Err(miniconf::Error::Inner(..))
        ));
        assert!(matches!(
            settings.set_json("/master/duty_percent", b"300"),
            Err(miniconf::Error::Inner(..))
        ));
        assert_eq!(*settings.master.duty_percent, 25);
        assert_eq!(*settings.slave.gate, GateMode::Gated);
    }
}
