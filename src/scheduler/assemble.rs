use super::{util, SchedError, ScheduleBuilder};
use crate::holiday::HolidayLookup;
use crate::model::{DayRecord, Schedule, ShiftCode};
use crate::rotation;
use std::collections::HashSet;
use tracing::debug;

pub(super) fn build_month(
    builder: &ScheduleBuilder<'_>,
    year: i32,
    month: u32,
) -> Result<Schedule, SchedError> {
    let years = &builder.options.years;
    if !years.contains(&year) {
        return Err(SchedError::YearOutOfRange {
            year,
            min: *years.start(),
            max: *years.end(),
        });
    }
    let Some(dates) = util::month_dates(year, month) else {
        return Err(SchedError::InvalidMonth { year, month });
    };
    check_roster(builder)?;

    let operators = &builder.operators;
    builder.rotation.check_roster(operators.len())?;

    let anchor = builder.options.anchor.unwrap_or(dates[0]);
    debug!(
        year,
        month,
        strategy = builder.rotation.name(),
        %anchor,
        "building monthly schedule"
    );

    let base = rotation::base_rows(builder.rotation, operators.len(), anchor, &dates);
    let mut holidays = HolidayLookup::new(builder.holidays, &builder.options.region);

    let days = dates
        .into_iter()
        .zip(base)
        .map(|(date, row)| {
            let shifts = operators
                .iter()
                .zip(row)
                .map(|(op, code)| match builder.leave {
                    Some(leave) if leave.is_on_leave(&op.id, date) => ShiftCode::OnLeave,
                    _ => code,
                })
                .collect();
            DayRecord {
                date,
                shifts,
                is_holiday: holidays.is_holiday(date),
                is_sunday: util::is_sunday(date),
            }
        })
        .collect();

    Ok(Schedule {
        year,
        month,
        operators: operators.clone(),
        days,
    })
}

fn check_roster(builder: &ScheduleBuilder<'_>) -> Result<(), SchedError> {
    if builder.operators.is_empty() {
        return Err(SchedError::EmptyRoster);
    }
    let mut seen = HashSet::new();
    for op in &builder.operators {
        if !seen.insert(&op.id) {
            return Err(SchedError::DuplicateOperator(op.id.to_string()));
        }
    }
    Ok(())
}
