use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Fixed cyclic list of (target altitude, speed) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    altitudes: Vec<f64>,
    speeds: Vec<i32>,
}

impl Schedule {
    pub fn new(altitudes: Vec<f64>, speeds: Vec<i32>) -> Result<Self> {
        anyhow::ensure!(!altitudes.is_empty(), "schedule must have at least one target");
        anyhow::ensure!(
            altitudes.len() == speeds.len(),
            "schedule altitudes ({}) and speeds ({}) differ in length",
            altitudes.len(),
            speeds.len()
        );
        anyhow::ensure!(altitudes.iter().all(|a| a.is_finite()), "schedule altitudes must be finite");
        Ok(Self { altitudes, speeds })
    }

    pub fn len(&self) -> usize {
        self.altitudes.len()
    }

    pub fn altitude(&self, idx: usize) -> f64 {
        self.altitudes[idx]
    }

    pub fn speed(&self, idx: usize) -> i32 {
        self.speeds[idx]
    }

    /// Index after `idx`, wrapping back to the first target.
    pub fn next_index(&self, idx: usize) -> usize {
        (idx + 1) % self.len()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        let cfg = ScheduleCfg::default();
        Self { altitudes: cfg.altitudes, speeds: cfg.speeds }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCfg {
    pub altitudes: Vec<f64>,
    pub speeds: Vec<i32>,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self { altitudes: vec![3.0, 2.0], speeds: vec![1, 1] }
    }
}

impl TryFrom<&ScheduleCfg> for Schedule {
    type Error = anyhow::Error;

    fn try_from(cfg: &ScheduleCfg) -> Result<Self> {
        Schedule::new(cfg.altitudes.clone(), cfg.speeds.clone())
    }
}
