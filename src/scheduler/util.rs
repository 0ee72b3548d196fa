use chrono::{Datelike, Days, NaiveDate};

/// Index du jour de la semaine, convention fixe : lundi = 0 … dimanche = 6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

pub fn is_sunday(date: NaiveDate) -> bool {
    weekday_index(date) == 6
}

/// Lundi de la semaine contenant `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(weekday_index(date))))
        .unwrap_or(date)
}

/// Toutes les dates du mois, en ordre croissant. `None` si le mois est invalide.
pub fn month_dates(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .collect(),
    )
}
