pub mod display;
pub mod doctor;
pub mod machine;
pub mod run;
pub mod schedule;
pub mod stop;

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::machine::{ControlStateMachine, DEFAULT_ALTITUDE_TOLERANCE, DEFAULT_LANDING_BATTERY_PCT};
use crate::run::Pacing;
use crate::schedule::{Schedule, ScheduleCfg};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Distance from the current target altitude that counts as reached.
    pub altitude_tolerance: f64,

    /// Landing starts once reported battery drops below this percentage.
    pub landing_battery_pct: f64,

    /// Pause between decision cycles.
    pub command_interval_ms: u64,

    /// How long the landed frame is kept before the run ends.
    pub landed_grace_ms: u64,

    pub schedule: ScheduleCfg,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            altitude_tolerance: DEFAULT_ALTITUDE_TOLERANCE,
            landing_battery_pct: DEFAULT_LANDING_BATTERY_PCT,
            command_interval_ms: 300,
            landed_grace_ms: 3000,
            schedule: ScheduleCfg::default(),
        }
    }
}

impl ControlConfig {
    pub fn pacing(&self) -> Pacing {
        Pacing {
            interval: Duration::from_millis(self.command_interval_ms),
            landed_grace: Duration::from_millis(self.landed_grace_ms),
        }
    }

    pub fn machine(&self) -> Result<ControlStateMachine> {
        let schedule = Schedule::try_from(&self.schedule).context("control.schedule")?;
        Ok(ControlStateMachine::new(schedule, self.altitude_tolerance, self.landing_battery_pct))
    }
}
