use crate::rotation::RotationError;
use chrono::NaiveDate;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Options de construction
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Région passée à l'oracle de fériés.
    pub region: String,
    /// Jour 0 de la rotation ; par défaut le 1er du mois demandé.
    pub anchor: Option<NaiveDate>,
    pub years: RangeInclusive<i32>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            region: "CO".to_string(),
            anchor: None,
            years: 2024..=2030,
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("year {year} outside supported range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
    #[error("operator roster is empty")]
    EmptyRoster,
    #[error("duplicate operator in roster: {0}")]
    DuplicateOperator(String),
    #[error(transparent)]
    Rotation(#[from] RotationError),
}
