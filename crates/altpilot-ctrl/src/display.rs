use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Label shown once touchdown is confirmed.
pub const LANDED_LABEL: &str = "LANDED";

/// Per-iteration state handed to whatever draws the flight.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub position: (f64, f64),
    pub landed: bool,
    pub final_distance: f64,
    pub iteration_count: i64,
    pub current_altitude: f64,
    pub current_x: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayInfo {
    Landed { distance: f64, iterations: i64 },
    Flying { altitude: f64, x: f64 },
}

impl DisplaySnapshot {
    pub fn info(&self) -> DisplayInfo {
        if self.landed {
            DisplayInfo::Landed { distance: self.final_distance, iterations: self.iteration_count }
        } else {
            DisplayInfo::Flying { altitude: self.current_altitude, x: self.current_x }
        }
    }

    /// Text overlay lines, top to bottom.
    pub fn status_lines(&self) -> Vec<String> {
        match self.info() {
            DisplayInfo::Landed { distance, iterations } => vec![
                LANDED_LABEL.to_string(),
                format!("Distance covered: {:.1}", distance),
                format!("Iterations: {}", iterations),
            ],
            DisplayInfo::Flying { altitude, x } => {
                vec![format!("Altitude: {:.1}", altitude), format!("X: {:.1}", x)]
            }
        }
    }
}

/// Consumer of display snapshots. Free to render or ignore them.
pub trait DisplaySink: Send {
    fn present(&mut self, snap: &DisplaySnapshot);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenMap {
    pub max_x: f64,
    pub screen_width: f64,
    pub screen_height: f64,
    pub px_per_unit: f64,
}

impl Default for ScreenMap {
    fn default() -> Self {
        Self { max_x: 200.0, screen_width: 800.0, screen_height: 600.0, px_per_unit: 20.0 }
    }
}

impl ScreenMap {
    /// World (x, altitude) to screen pixels; altitude zero sits mid-screen.
    pub fn project(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let sx = x / self.max_x * self.screen_width;
        let sy = self.screen_height / 2.0 - y * self.px_per_unit;
        (sx, sy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Log,
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayCfg {
    #[serde(default)]
    pub sink: SinkKind,
    #[serde(flatten)]
    pub screen: ScreenMap,
}

impl DisplayCfg {
    pub fn build(&self) -> Box<dyn DisplaySink> {
        match self.sink {
            SinkKind::Log => Box::new(LogSink::new(self.screen)),
            SinkKind::None => Box::new(NullSink),
        }
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn present(&mut self, snap: &DisplaySnapshot) {
        (**self).present(snap)
    }
}

/// Writes the overlay text through `tracing`, only when it changes.
pub struct LogSink {
    screen: ScreenMap,
    last: Vec<String>,
}

impl LogSink {
    pub fn new(screen: ScreenMap) -> Self {
        Self { screen, last: Vec::new() }
    }
}

impl DisplaySink for LogSink {
    fn present(&mut self, snap: &DisplaySnapshot) {
        let (sx, sy) = self.screen.project(snap.position);
        debug!("display: world={:?} screen=({:.0}, {:.0})", snap.position, sx, sy);

        let lines = snap.status_lines();
        if lines != self.last {
            info!("display: {}", lines.join(" | "));
            self.last = lines;
        }
    }
}

pub struct NullSink;

impl DisplaySink for NullSink {
    fn present(&mut self, _snap: &DisplaySnapshot) {}
}
