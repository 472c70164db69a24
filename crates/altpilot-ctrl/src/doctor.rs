use anyhow::Result;

use crate::display::DisplayCfg;
use crate::schedule::Schedule;
use crate::ControlConfig;

pub fn check_control(cfg: &ControlConfig) -> Result<()> {
    let schedule = Schedule::try_from(&cfg.schedule)?;
    anyhow::ensure!(
        cfg.altitude_tolerance > 0.0 && cfg.altitude_tolerance.is_finite(),
        "control.altitude_tolerance must be > 0"
    );
    anyhow::ensure!(
        cfg.landing_battery_pct > 0.0 && cfg.landing_battery_pct <= 100.0,
        "control.landing_battery_pct should be in (0, 100]"
    );
    anyhow::ensure!(cfg.command_interval_ms > 0, "control.command_interval_ms must be > 0");
    anyhow::ensure!(cfg.landed_grace_ms <= 60_000, "control.landed_grace_ms should be <= 60000");

    // targets closer than twice the tolerance can be reached together
    for i in 0..schedule.len() {
        let j = schedule.next_index(i);
        if i != j {
            anyhow::ensure!(
                (schedule.altitude(i) - schedule.altitude(j)).abs() > 2.0 * cfg.altitude_tolerance,
                "control.schedule targets #{} and #{} overlap within tolerance",
                i,
                j
            );
        }
    }
    Ok(())
}

pub fn check_display(cfg: &DisplayCfg) -> Result<()> {
    let s = &cfg.screen;
    anyhow::ensure!(s.max_x > 0.0, "display.max_x must be > 0");
    anyhow::ensure!(s.screen_width > 0.0 && s.screen_height > 0.0, "display screen size must be > 0");
    anyhow::ensure!(s.px_per_unit > 0.0, "display.px_per_unit must be > 0");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleCfg;

    #[test]
    fn defaults_pass() {
        check_control(&ControlConfig::default()).unwrap();
        check_display(&DisplayCfg::default()).unwrap();
    }

    #[test]
    fn flags_bad_values() {
        let mut cfg = ControlConfig::default();
        cfg.altitude_tolerance = 0.0;
        assert!(check_control(&cfg).is_err());

        let mut cfg = ControlConfig::default();
        cfg.landing_battery_pct = 120.0;
        assert!(check_control(&cfg).is_err());

        let mut cfg = ControlConfig::default();
        cfg.command_interval_ms = 0;
        assert!(check_control(&cfg).is_err());

        let mut cfg = ControlConfig::default();
        cfg.schedule = ScheduleCfg { altitudes: vec![3.0, 2.95], speeds: vec![1, 1] };
        assert!(check_control(&cfg).is_err());

        let mut cfg = DisplayCfg::default();
        cfg.screen.max_x = 0.0;
        assert!(check_display(&cfg).is_err());
    }
}
