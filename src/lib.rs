#![forbid(unsafe_code)]
//! Shiftroster — planning mensuel de turnos en rotation (lib locale, sans BD).
//!
//! - Rotation 6x2 décalée ou table fixe, au choix par configuration.
//! - Novedades (vacances, permis, incapacités) en surcouche : un congé prime
//!   toujours sur la rotation.
//! - Fériés via un oracle externe, dimanches en convention lundi = 0.
//! - Résumé hebdomadaire des heures (normales, nuit, dimanche, sup).
//! - Export CSV/JSON ; tout le calcul est synchrone et sans état global.

pub mod config;
pub mod holiday;
pub mod io;
pub mod leave;
pub mod model;
pub mod rotation;
pub mod scheduler;
pub mod storage;
pub mod summary;

pub use config::Settings;
pub use holiday::{HolidayCalendar, HolidayError, HolidayLookup, HolidayOracle, NoHolidays};
pub use leave::{LeaveError, LeaveReceipt, LeaveRegistry, LeaveSubmission};
pub use model::{DayRecord, LeaveKind, Operator, OperatorId, Schedule, ShiftCode};
pub use rotation::{FixedTable, Rotation, RotationStrategy, StaggeredCycle};
pub use scheduler::{BuildOptions, SchedError, ScheduleBuilder};
pub use storage::{JsonSessionStore, LeaveSession, SessionStore};
pub use summary::{
    month_totals, summarize_weeks, HourRules, OperatorMonthTotals, OperatorWeeklyTotals,
    WeekBucket, WeeklySummary,
};
