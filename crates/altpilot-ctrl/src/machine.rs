use altpilot_proto::{command::Command, telemetry::TelemetryRecord};
use tracing::info;

use crate::display::DisplaySnapshot;
use crate::schedule::Schedule;

/// Commands counted as bookkeeping (the start command plus the landing
/// re-assertions before touchdown) and left out of the landed iteration figure.
pub const BOOKKEEPING_COMMANDS: i64 = 3;

pub const DEFAULT_ALTITUDE_TOLERANCE: f64 = 0.1;
pub const DEFAULT_LANDING_BATTERY_PCT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub target_index: usize,
    pub landing_triggered: bool,
    pub has_landed: bool,
    pub command_count: u64,
    pub final_x: f64,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            target_index: 0,
            landing_triggered: false,
            has_landed: false,
            command_count: 0,
            final_x: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Command to send after the snapshot has been presented.
    pub command: Option<Command>,
    pub display: DisplaySnapshot,
}

pub struct ControlStateMachine {
    schedule: Schedule,
    tolerance: f64,
    landing_battery_pct: f64,
    state: ControlState,
}

impl ControlStateMachine {
    pub fn new(schedule: Schedule, tolerance: f64, landing_battery_pct: f64) -> Self {
        Self { schedule, tolerance, landing_battery_pct, state: ControlState::default() }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_landed(&self) -> bool {
        self.state.has_landed
    }

    /// First command of a run. Carries the absolute altitude of the first
    /// target; every later altitude is a relative change.
    pub fn initial_command(&self) -> Command {
        Command::forward(self.schedule.speed(0), self.schedule.altitude(0) as i32)
    }

    /// Landing command to push before reading telemetry, repeated on every
    /// iteration once landing has been triggered.
    pub fn reassert_landing(&self) -> Option<Command> {
        self.state.landing_triggered.then(Command::land)
    }

    /// Counts a command the link actually delivered.
    pub fn note_sent(&mut self) {
        self.state.command_count += 1;
    }

    /// Landed iteration figure; negative when fewer than three commands went out.
    pub fn landed_iterations(&self) -> i64 {
        self.state.command_count as i64 - BOOKKEEPING_COMMANDS
    }

    pub fn step(&mut self, rec: &TelemetryRecord) -> StepOutput {
        let st = &mut self.state;

        if !st.landing_triggered && rec.bat < self.landing_battery_pct {
            st.landing_triggered = true;
            info!("ctrl: battery {:.1}% below {:.1}%, landing", rec.bat, self.landing_battery_pct);
        }

        if st.landing_triggered && rec.y <= 0.0 && !st.has_landed {
            st.has_landed = true;
            st.final_x = rec.x;
            info!("ctrl: touchdown confirmed at x={:.1}", rec.x);
        }

        let display = self.snapshot(rec);

        let mut command = None;
        if !self.state.landing_triggered {
            let target = self.schedule.altitude(self.state.target_index);
            if (rec.y - target).abs() <= self.tolerance {
                let next = self.schedule.next_index(self.state.target_index);
                self.state.target_index = next;
                let delta = (self.schedule.altitude(next) - rec.y).round_ties_even() as i32;
                info!(
                    "ctrl: reached {:.1} (y={:.2}), next target #{} {:.1} (delta {})",
                    target, rec.y, next, self.schedule.altitude(next), delta
                );
                command = Some(Command::forward(self.schedule.speed(next), delta));
            }
        }

        StepOutput { command, display }
    }

    fn snapshot(&self, rec: &TelemetryRecord) -> DisplaySnapshot {
        DisplaySnapshot {
            position: (rec.x, rec.y),
            landed: self.state.has_landed,
            final_distance: self.state.final_x,
            iteration_count: self.landed_iterations(),
            current_altitude: rec.y,
            current_x: rec.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayInfo;

    fn machine() -> ControlStateMachine {
        ControlStateMachine::new(Schedule::default(), DEFAULT_ALTITUDE_TOLERANCE, DEFAULT_LANDING_BATTERY_PCT)
    }

    fn rec(x: f64, y: f64, bat: f64) -> TelemetryRecord {
        TelemetryRecord { x, y, bat, sens: None }
    }

    #[test]
    fn fresh_state() {
        let m = machine();
        assert_eq!(m.state(), &ControlState::default());
        assert_eq!(m.reassert_landing(), None);
    }

    #[test]
    fn initial_command_uses_absolute_altitude() {
        let m = machine();
        assert_eq!(m.initial_command(), Command::forward(1, 3));

        let m = ControlStateMachine::new(Schedule::new(vec![4.7], vec![2]).unwrap(), 0.1, 1.0);
        assert_eq!(m.initial_command(), Command::forward(2, 4));
    }

    #[test]
    fn advances_when_within_tolerance() {
        let mut m = machine();

        let out = m.step(&rec(1.0, 2.5, 90.0));
        assert!(out.command.is_none());
        assert_eq!(m.state().target_index, 0);

        let out = m.step(&rec(2.0, 2.95, 90.0));
        assert_eq!(m.state().target_index, 1);
        // round(2 - 2.95) = round(-0.95)
        assert_eq!(out.command, Some(Command::forward(1, -1)));

        // 2.05 is within 0.1 of the second target: wrap back to the first
        let out = m.step(&rec(3.0, 2.05, 90.0));
        assert_eq!(m.state().target_index, 0);
        assert_eq!(out.command, Some(Command::forward(1, 1)));
    }

    #[test]
    fn advancement_delta_rounds_half_to_even() {
        let s = Schedule::new(vec![1.0, 3.5], vec![1, 2]).unwrap();
        let mut m = ControlStateMachine::new(s, 0.1, 1.0);
        let out = m.step(&rec(0.0, 1.0, 50.0));
        assert_eq!(out.command, Some(Command::forward(2, 2)));
    }

    #[test]
    fn landing_trigger_latches() {
        let mut m = machine();
        m.step(&rec(5.0, 2.0, 0.5));
        assert!(m.state().landing_triggered);

        for bat in [100.0, 50.0, 0.0] {
            m.step(&rec(5.0, 1.0, bat));
            assert!(m.state().landing_triggered);
        }
    }

    #[test]
    fn trigger_step_emits_no_extra_command() {
        let mut m = machine();
        // on target and low battery at once: landing wins, no advancement
        let out = m.step(&rec(5.0, 3.0, 0.9));
        assert!(out.command.is_none());
        assert_eq!(m.state().target_index, 0);
        assert_eq!(m.reassert_landing(), Some(Command::land()));
    }

    #[test]
    fn landing_reasserted_regardless_of_telemetry() {
        let mut m = machine();
        m.step(&rec(0.0, 2.0, 0.1));
        for r in [rec(1.0, 3.0, 100.0), TelemetryRecord::fallback(), rec(2.0, 2.0, 80.0)] {
            assert_eq!(m.reassert_landing(), Some(Command::land()));
            let out = m.step(&r);
            assert!(out.command.is_none());
        }
    }

    #[test]
    fn touchdown_captures_final_x_once() {
        let mut m = machine();
        m.step(&rec(10.0, 1.0, 0.2));
        assert!(!m.is_landed());

        m.step(&rec(17.5, 0.0, 0.2));
        assert!(m.is_landed());
        assert!(m.state().landing_triggered);
        assert_eq!(m.state().final_x, 17.5);

        m.step(&rec(30.0, -0.5, 0.2));
        assert_eq!(m.state().final_x, 17.5);
    }

    #[test]
    fn ground_contact_without_trigger_is_not_a_landing() {
        let mut m = machine();
        m.step(&rec(4.0, 0.0, 100.0));
        assert!(!m.is_landed());
        assert!(!m.state().landing_triggered);
    }

    #[test]
    fn landed_display_reports_offset_count() {
        let mut m = machine();
        for _ in 0..5 {
            m.note_sent();
        }
        m.step(&rec(9.0, 0.5, 0.3));
        let out = m.step(&rec(12.0, 0.0, 0.3));
        assert_eq!(out.display.info(), DisplayInfo::Landed { distance: 12.0, iterations: 2 });
        assert_eq!(out.display.status_lines()[0], "LANDED");
    }

    #[test]
    fn flying_display_reports_position() {
        let mut m = machine();
        let out = m.step(&rec(8.0, 1.5, 70.0));
        assert_eq!(out.display.info(), DisplayInfo::Flying { altitude: 1.5, x: 8.0 });
        assert_eq!(out.display.position, (8.0, 1.5));
    }
}
