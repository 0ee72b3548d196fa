//! Consultation des jours fériés.
//!
//! Le calendrier lui-même est externe : la lib ne consomme que le trait
//! [`HolidayOracle`]. Une erreur de l'oracle ne bloque jamais la génération,
//! [`HolidayLookup`] la dégrade en « non férié ».

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HolidayError {
    #[error("holiday calendar unavailable for region {region} in {year}")]
    Unavailable { region: String, year: i32 },
}

pub trait HolidayOracle {
    fn is_holiday(&self, date: NaiveDate, region: &str) -> Result<bool, HolidayError>;
}

/// Oracle sans aucun férié.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHolidays;

impl HolidayOracle for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate, _region: &str) -> Result<bool, HolidayError> {
        Ok(false)
    }
}

/// Calendrier en mémoire : dates fériées par région.
///
/// Une année sans aucune entrée pour la région est considérée inconnue.
#[derive(Debug, Default, Clone)]
pub struct HolidayCalendar {
    dates: HashMap<String, HashSet<NaiveDate>>,
    years: HashSet<(String, i32)>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<R: Into<String>>(&mut self, region: R, date: NaiveDate) {
        let region = normalize_region(&region.into());
        self.years.insert((region.clone(), date.year()));
        self.dates.entry(region).or_default().insert(date);
    }

    /// Import CSV: header `date,region[,name]`
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("opening holidays {}", path.display()))?;
        let mut calendar = Self::new();
        for rec in rdr.records() {
            let rec = rec?;
            let date = rec.get(0).context("missing date")?.trim();
            let region = rec.get(1).context("missing region")?.trim();
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid holiday date: {date}"))?;
            if region.is_empty() {
                anyhow::bail!("empty region for holiday {date}");
            }
            calendar.insert(region, date);
        }
        Ok(calendar)
    }
}

impl HolidayOracle for HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate, region: &str) -> Result<bool, HolidayError> {
        let region = normalize_region(region);
        if !self.years.contains(&(region.clone(), date.year())) {
            return Err(HolidayError::Unavailable {
                region,
                year: date.year(),
            });
        }
        Ok(self
            .dates
            .get(&region)
            .is_some_and(|dates| dates.contains(&date)))
    }
}

fn normalize_region(region: &str) -> String {
    region.trim().to_ascii_uppercase()
}

/// Cache par date au-dessus d'un oracle, avec dégradation en `false`.
pub struct HolidayLookup<'a> {
    oracle: &'a dyn HolidayOracle,
    region: String,
    cache: HashMap<NaiveDate, bool>,
    unavailable: HashSet<i32>,
}

impl<'a> HolidayLookup<'a> {
    pub fn new(oracle: &'a dyn HolidayOracle, region: &str) -> Self {
        Self {
            oracle,
            region: region.to_string(),
            cache: HashMap::new(),
            unavailable: HashSet::new(),
        }
    }

    pub fn is_holiday(&mut self, date: NaiveDate) -> bool {
        if let Some(hit) = self.cache.get(&date) {
            return *hit;
        }
        if self.unavailable.contains(&date.year()) {
            return false;
        }
        let flag = match self.oracle.is_holiday(date, &self.region) {
            Ok(flag) => flag,
            Err(err) => {
                warn!(error = %err, "holiday lookup failed; treating dates as regular days");
                self.unavailable.insert(date.year());
                false
            }
        };
        self.cache.insert(date, flag);
        flag
    }
}
