mod assemble;
mod types;
mod util;

pub use types::{BuildOptions, SchedError};
pub use util::{is_sunday, month_dates, week_start, weekday_index};

use crate::holiday::{HolidayOracle, NoHolidays};
use crate::leave::LeaveRegistry;
use crate::model::{Operator, Schedule};
use crate::rotation::RotationStrategy;

static NO_HOLIDAYS: NoHolidays = NoHolidays;

/// ScheduleBuilder : fusionne rotation, congés et fériés en un planning mensuel
pub struct ScheduleBuilder<'a> {
    operators: Vec<Operator>,
    rotation: &'a dyn RotationStrategy,
    leave: Option<&'a LeaveRegistry>,
    holidays: &'a dyn HolidayOracle,
    options: BuildOptions,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(operators: Vec<Operator>, rotation: &'a dyn RotationStrategy) -> Self {
        Self {
            operators,
            rotation,
            leave: None,
            holidays: &NO_HOLIDAYS,
            options: BuildOptions::default(),
        }
    }

    pub fn leave(mut self, registry: &'a LeaveRegistry) -> Self {
        self.leave = Some(registry);
        self
    }

    pub fn holidays(mut self, oracle: &'a dyn HolidayOracle) -> Self {
        self.holidays = oracle;
        self
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Construit le planning du mois : un `DayRecord` par date, en ordre
    /// croissant. Un congé remplace toujours le turno de la rotation.
    pub fn build_month(&self, year: i32, month: u32) -> Result<Schedule, SchedError> {
        assemble::build_month(self, year, month)
    }
}
