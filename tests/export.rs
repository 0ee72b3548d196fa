#![forbid(unsafe_code)]
use chrono::NaiveDate;
use shiftroster::io;
use shiftroster::model::ShiftCode::{
    OnLeave as V, RestDay as X, WorkShift1 as T1, WorkShift2 as T2, WorkShift3 as T3,
};
use shiftroster::{
    summarize_weeks, DayRecord, HolidayCalendar, HolidayOracle, HourRules, LeaveKind,
    LeaveRegistry, Operator, OperatorId, Schedule, ScheduleBuilder, StaggeredCycle,
};
use tempfile::tempdir;

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn small_schedule() -> Schedule {
    Schedule {
        year: 2025,
        month: 1,
        operators: vec![Operator::new("A"), Operator::new("B")],
        days: vec![
            DayRecord {
                date: jan(4),
                shifts: vec![T1, X],
                is_holiday: false,
                is_sunday: false,
            },
            DayRecord {
                date: jan(5),
                shifts: vec![T3, V],
                is_holiday: false,
                is_sunday: true,
            },
            DayRecord {
                date: jan(6),
                shifts: vec![X, T2],
                is_holiday: true,
                is_sunday: false,
            },
        ],
    }
}

#[test]
fn daily_csv_layout() {
    let mut buf = Vec::new();
    io::write_schedule_csv(&mut buf, &small_schedule()).unwrap();
    let text = String::from_utf8(buf).unwrap();
    insta::assert_snapshot!(text.trim_end(), @r"
    date,A,B,holiday,sunday
    2025-01-04,T1,X,0,0
    2025-01-05,T3,V,0,1
    2025-01-06,X,T2,1,0
    ");
}

#[test]
fn weekly_csv_layout() {
    let weeks = summarize_weeks(&small_schedule(), &HourRules::default());
    let mut buf = Vec::new();
    io::write_weekly_csv(&mut buf, &weeks).unwrap();
    let text = String::from_utf8(buf).unwrap();
    insta::assert_snapshot!(text.trim_end(), @r"
    week_start,first_day,last_day,operator,days,hours,night_hours,sunday_hours,overtime
    2024-12-30,2025-01-04,2025-01-05,A,2,16,8,8,0
    2024-12-30,2025-01-04,2025-01-05,B,0,0,0,0,0
    2025-01-06,2025-01-06,2025-01-06,A,0,0,0,0,0
    2025-01-06,2025-01-06,2025-01-06,B,1,8,0,0,0
    ");
}

#[test]
fn daily_csv_roundtrip_keeps_triples() {
    let roster = Operator::default_roster();
    let mut registry = LeaveRegistry::new(&roster);
    registry
        .submit_range(&OperatorId::new("Op2"), jan(10), jan(12), LeaveKind::Vacation)
        .unwrap();
    let rotation = StaggeredCycle::default();
    let schedule = ScheduleBuilder::new(roster, &rotation)
        .leave(&registry)
        .build_month(2025, 1)
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("turnos.csv");
    io::export_schedule_csv(&path, &schedule).unwrap();
    let back = io::import_schedule_csv(&path).unwrap();

    let before: Vec<_> = schedule.triples().collect();
    let after: Vec<_> = back.triples().collect();
    assert_eq!(before, after);
    assert_eq!(back, schedule);
}

#[test]
fn leave_csv_rows_feed_the_registry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("novedades.csv");
    std::fs::write(
        &path,
        "operator,kind,start,end\n\
         Op2,vacaciones,2025-01-10,2025-01-12\n\
         Op3,permiso,2025-01-20\n\
         Op1,incapacidad,2025-01-09,2025-01-02\n",
    )
    .unwrap();

    let rows: Vec<_> = io::import_leave_csv(&path)
        .unwrap()
        .into_iter()
        .collect::<anyhow::Result<_>>()
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].start, rows[1].end);

    let mut registry = LeaveRegistry::new(&Operator::default_roster());
    let results = io::submit_leave_rows(&mut registry, &rows);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
    assert_eq!(registry.history().len(), 2);
    assert!(registry.is_on_leave(&OperatorId::new("Op3"), jan(20)));
}

#[test]
fn malformed_leave_row_keeps_the_valid_ones() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("novedades.csv");
    std::fs::write(
        &path,
        "operator,kind,start,end\n\
         Op2,vacaciones,2025-01-10,2025-01-12\n\
         Op3,vacaciones,2025-13-01,\n\
         Op4,siesta,2025-01-15\n\
         ,permiso,2025-01-15\n",
    )
    .unwrap();

    let parsed = io::import_leave_csv(&path).unwrap();
    assert_eq!(parsed.len(), 4);
    assert!(parsed[0].is_ok());
    let err = parsed[1].as_ref().unwrap_err();
    assert!(format!("{err:#}").contains("invalid date: 2025-13-01"));
    assert!(parsed[2].is_err());
    assert!(parsed[3].is_err());

    let rows: Vec<_> = parsed.into_iter().filter_map(Result::ok).collect();
    let mut registry = LeaveRegistry::new(&Operator::default_roster());
    assert!(io::submit_leave_rows(&mut registry, &rows)[0].is_ok());
    assert!(registry.is_on_leave(&OperatorId::new("Op2"), jan(11)));
}

#[test]
fn missing_leave_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(io::import_leave_csv(dir.path().join("absent.csv")).is_err());
}

#[test]
fn holiday_calendar_reads_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("festivos.csv");
    std::fs::write(
        &path,
        "date,region,name\n2025-01-01,CO,Año Nuevo\n2025-01-06,co,Reyes Magos\n2025-07-14,FR\n",
    )
    .unwrap();

    let calendar = HolidayCalendar::from_csv_path(&path).unwrap();
    assert_eq!(calendar.is_holiday(jan(6), "CO"), Ok(true));
    assert_eq!(calendar.is_holiday(jan(7), "CO"), Ok(false));
    assert!(calendar
        .is_holiday(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), "CO")
        .is_err());

    let rotation = StaggeredCycle::default();
    let schedule = ScheduleBuilder::new(Operator::default_roster(), &rotation)
        .holidays(&calendar)
        .build_month(2025, 1)
        .unwrap();
    let flagged: Vec<_> = schedule
        .days
        .iter()
        .filter(|d| d.is_holiday)
        .map(|d| d.date)
        .collect();
    assert_eq!(flagged, vec![jan(1), jan(6)]);
}

#[test]
fn holiday_csv_rejects_bad_rows() {
    let dir = tempdir().unwrap();
    let bad_date = dir.path().join("bad_date.csv");
    std::fs::write(&bad_date, "date,region\n2025-02-30,CO\n").unwrap();
    let err = HolidayCalendar::from_csv_path(&bad_date).unwrap_err();
    assert!(err.to_string().contains("invalid holiday date"));

    let no_region = dir.path().join("no_region.csv");
    std::fs::write(&no_region, "date,region\n2025-01-06, \n").unwrap();
    let err = HolidayCalendar::from_csv_path(&no_region).unwrap_err();
    assert!(err.to_string().contains("empty region"));
}

#[test]
fn json_export_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("turnos.json");
    io::export_schedule_json(&path, &small_schedule()).unwrap();
    let parsed: Schedule = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(parsed, small_schedule());
}

#[test]
fn export_to_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent").join("turnos.csv");
    assert!(io::export_schedule_csv(&path, &small_schedule()).is_err());
}
