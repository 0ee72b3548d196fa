//! Résumé hebdomadaire des heures (semaines calendaires lundi → dimanche).
//!
//! Chaque semaine ne compte que les jours présents dans le planning : la
//! première et la dernière semaine d'un mois peuvent être partielles. Aucun
//! report d'une semaine sur l'autre.

use crate::model::{DayRecord, OperatorId, Schedule, ShiftCode};
use crate::scheduler::week_start;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Règles de décompte des heures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRules {
    /// Durée de T1, T2, T3.
    #[serde(default = "default_shift_hours")]
    pub shift_hours: [u32; 3],
    #[serde(default = "default_night_shift")]
    pub night_shift: ShiftCode,
    /// Seuil hebdomadaire au-delà duquel les heures sont des heures sup.
    #[serde(default = "default_weekly_threshold")]
    pub weekly_threshold: u32,
}

fn default_shift_hours() -> [u32; 3] {
    [8, 8, 8]
}

fn default_night_shift() -> ShiftCode {
    ShiftCode::WorkShift3
}

fn default_weekly_threshold() -> u32 {
    46
}

impl Default for HourRules {
    fn default() -> Self {
        Self {
            shift_hours: default_shift_hours(),
            night_shift: default_night_shift(),
            weekly_threshold: default_weekly_threshold(),
        }
    }
}

impl HourRules {
    /// Heures d'une journée pour un code (0 pour repos et congé).
    pub fn hours(&self, code: ShiftCode) -> u32 {
        code.work_slot().map_or(0, |slot| self.shift_hours[slot])
    }
}

/// Fenêtre hebdomadaire ancrée sur le lundi.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekBucket {
    /// Lundi de la semaine (peut tomber dans le mois précédent).
    pub start: NaiveDate,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub days: u32,
}

impl WeekBucket {
    pub fn is_partial(&self) -> bool {
        self.days < 7
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorWeeklyTotals {
    pub operator: OperatorId,
    pub hours: u32,
    pub night_hours: u32,
    pub sunday_hours: u32,
    pub days_worked: u32,
    pub overtime: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub bucket: WeekBucket,
    /// Un total par opérateur, dans l'ordre du roster.
    pub totals: Vec<OperatorWeeklyTotals>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorMonthTotals {
    pub operator: OperatorId,
    pub hours: u32,
    pub night_hours: u32,
    pub sunday_hours: u32,
    pub days_worked: u32,
    /// Somme des heures sup de chaque semaine.
    pub overtime: u32,
}

/// Découpe le planning en semaines et calcule les totaux par opérateur.
pub fn summarize_weeks(schedule: &Schedule, rules: &HourRules) -> Vec<WeeklySummary> {
    let mut out: Vec<WeeklySummary> = Vec::new();
    let mut current: Vec<&DayRecord> = Vec::new();

    for day in &schedule.days {
        let same_week = current
            .first()
            .is_some_and(|first| week_start(first.date) == week_start(day.date));
        if !same_week && !current.is_empty() {
            out.push(summarize_bucket(schedule, &current, rules));
            current.clear();
        }
        current.push(day);
    }
    if !current.is_empty() {
        out.push(summarize_bucket(schedule, &current, rules));
    }
    out
}

fn summarize_bucket(schedule: &Schedule, days: &[&DayRecord], rules: &HourRules) -> WeeklySummary {
    let first = days[0].date;
    let last = days[days.len() - 1].date;
    let bucket = WeekBucket {
        start: week_start(first),
        first_day: first,
        last_day: last,
        days: days.len() as u32,
    };

    let totals = schedule
        .operators
        .iter()
        .enumerate()
        .map(|(idx, op)| {
            let mut t = OperatorWeeklyTotals {
                operator: op.id.clone(),
                hours: 0,
                night_hours: 0,
                sunday_hours: 0,
                days_worked: 0,
                overtime: 0,
            };
            for day in days {
                let Some(code) = day.shifts.get(idx).copied() else {
                    continue;
                };
                let hours = rules.hours(code);
                t.hours = t.hours.saturating_add(hours);
                if code == rules.night_shift {
                    t.night_hours = t.night_hours.saturating_add(hours);
                }
                if day.is_sunday && code.is_work() {
                    t.sunday_hours = t.sunday_hours.saturating_add(hours);
                }
                if code.is_work() {
                    t.days_worked += 1;
                }
            }
            t.overtime = t.hours.saturating_sub(rules.weekly_threshold);
            t
        })
        .collect();

    WeeklySummary { bucket, totals }
}

/// Totaux du mois par opérateur, à partir des semaines déjà calculées.
pub fn month_totals(schedule: &Schedule, weeks: &[WeeklySummary]) -> Vec<OperatorMonthTotals> {
    schedule
        .operators
        .iter()
        .enumerate()
        .map(|(idx, op)| {
            let mut m = OperatorMonthTotals {
                operator: op.id.clone(),
                hours: 0,
                night_hours: 0,
                sunday_hours: 0,
                days_worked: 0,
                overtime: 0,
            };
            for t in weeks.iter().filter_map(|w| w.totals.get(idx)) {
                m.hours = m.hours.saturating_add(t.hours);
                m.night_hours = m.night_hours.saturating_add(t.night_hours);
                m.sunday_hours = m.sunday_hours.saturating_add(t.sunday_hours);
                m.days_worked = m.days_worked.saturating_add(t.days_worked);
                m.overtime = m.overtime.saturating_add(t.overtime);
            }
            m
        })
        .collect()
}
