use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    #[serde(rename = "fwd")]
    Forward,
}

/// Command object sent to the flight peer. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub speed: i32,
    /// Relative altitude change, [`Command::LAND_ALTITUDE`] for landing, or
    /// the absolute start altitude on the first command of a run.
    pub altitude: i32,
    pub movement: Movement,
}

impl Command {
    /// Altitude sentinel the peer interprets as "land now".
    pub const LAND_ALTITUDE: i32 = -1;

    pub fn forward(speed: i32, altitude: i32) -> Self {
        Self { speed, altitude, movement: Movement::Forward }
    }

    pub fn land() -> Self {
        Self::forward(0, Self::LAND_ALTITUDE)
    }

    pub fn is_land(&self) -> bool {
        self.speed == 0 && self.altitude == Self::LAND_ALTITUDE
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
