use crate::model::Operator;
use crate::rotation::Rotation;
use crate::scheduler::BuildOptions;
use crate::summary::HourRules;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const MIN_YEAR: i32 = 2024;
pub const MAX_YEAR: i32 = 2030;
/// Durée maximale d'un turno, en heures.
pub const MAX_SHIFT_HOURS: u32 = 24;

/// Configuration complète d'une génération.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub year: i32,
    pub month: u32,
    pub operators: Vec<String>,
    pub region: String,
    /// Jour 0 de la rotation ; `None` = 1er du mois.
    pub anchor: Option<NaiveDate>,
    pub rotation: Rotation,
    pub hours: HourRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            year: 2025,
            month: 1,
            operators: Operator::default_roster()
                .into_iter()
                .map(|o| o.id.as_str().to_string())
                .collect(),
            region: "CO".to_string(),
            anchor: None,
            rotation: Rotation::default(),
            hours: HourRules::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading settings {}", path.display()))?;
        let settings: Settings = serde_json::from_slice(&data)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            bail!("year must be within {MIN_YEAR}..={MAX_YEAR}");
        }
        if !(1..=12).contains(&self.month) {
            bail!("month must be within 1..=12");
        }
        if self.operators.is_empty() {
            bail!("operator roster cannot be empty");
        }
        let mut seen = HashSet::new();
        for op in &self.operators {
            if op.trim().is_empty() {
                bail!("operator handle cannot be empty");
            }
            if !seen.insert(op.as_str()) {
                bail!("duplicate operator handle: {op}");
            }
        }
        if self.region.trim().is_empty() {
            bail!("holiday region cannot be empty");
        }
        if let Some(h) = self.hours.shift_hours.iter().find(|h| **h > MAX_SHIFT_HOURS) {
            bail!("shift duration {h} exceeds {MAX_SHIFT_HOURS} hours");
        }
        if self.hours.night_shift.work_slot().is_none() {
            bail!("night shift must be one of T1, T2, T3");
        }
        self.rotation
            .strategy()
            .check_roster(self.operators.len())
            .context("rotation does not fit the operator roster")?;
        Ok(())
    }

    pub fn roster(&self) -> Vec<Operator> {
        self.operators.iter().map(Operator::new).collect()
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            region: self.region.clone(),
            anchor: self.anchor,
            years: MIN_YEAR..=MAX_YEAR,
        }
    }
}
