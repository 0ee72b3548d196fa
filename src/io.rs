use crate::leave::{LeaveError, LeaveReceipt, LeaveRegistry};
use crate::model::{DayRecord, LeaveKind, Operator, OperatorId, Schedule, ShiftCode};
use crate::summary::WeeklySummary;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Ligne de novedad importée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveRow {
    pub operator: OperatorId,
    pub kind: LeaveKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Import de novedades depuis CSV: header `operator,kind,start[,end]`
///
/// `end` vide ou absent = une seule journée. Seule l'ouverture du fichier est
/// fatale : chaque ligne donne son propre résultat.
pub fn import_leave_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<anyhow::Result<LeaveRow>>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening leave file {}", path.display()))?;
    let rows = rdr
        .records()
        .map(|rec| -> anyhow::Result<LeaveRow> {
            let rec = rec?;
            let line = rec.position().map_or(0, |p| p.line());
            parse_leave_row(&rec).with_context(|| format!("leave row at line {line}"))
        })
        .collect();
    Ok(rows)
}

fn parse_leave_row(rec: &StringRecord) -> anyhow::Result<LeaveRow> {
    let operator = rec.get(0).context("missing operator")?.trim();
    if operator.is_empty() {
        bail!("invalid leave row (empty operator)");
    }
    let kind: LeaveKind = rec
        .get(1)
        .context("missing kind")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    let start = parse_date(rec.get(2).context("missing start")?)?;
    let end = match rec.get(3).map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_date(raw)?,
        _ => start,
    };
    Ok(LeaveRow {
        operator: OperatorId::new(operator),
        kind,
        start,
        end,
    })
}

/// Soumet chaque ligne au registre. Une ligne invalide est rejetée sans
/// arrêter les suivantes.
pub fn submit_leave_rows(
    registry: &mut LeaveRegistry,
    rows: &[LeaveRow],
) -> Vec<Result<LeaveReceipt, LeaveError>> {
    rows.iter()
        .map(|row| registry.submit_range(&row.operator, row.start, row.end, row.kind))
        .collect()
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "si" | "sí" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => bail!("expected boolean flag, got {other}"),
    }
}

/// Planning journalier en CSV: header `date,<op1>,...,<opN>,holiday,sunday`
pub fn write_schedule_csv<W: Write>(w: W, schedule: &Schedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(w);
    let mut header = vec!["date"];
    header.extend(schedule.operators.iter().map(|o| o.id.as_str()));
    header.extend(["holiday", "sunday"]);
    w.write_record(&header)?;

    for day in &schedule.days {
        let date = day.date.to_string();
        let mut record = vec![date.as_str()];
        record.extend(day.shifts.iter().map(|c| c.code()));
        record.push(flag(day.is_holiday));
        record.push(flag(day.is_sunday));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// Résumé hebdomadaire en CSV (une ligne par semaine et par opérateur):
/// header `week_start,first_day,last_day,operator,days,hours,night_hours,sunday_hours,overtime`
pub fn write_weekly_csv<W: Write>(w: W, weeks: &[WeeklySummary]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(w);
    w.write_record([
        "week_start",
        "first_day",
        "last_day",
        "operator",
        "days",
        "hours",
        "night_hours",
        "sunday_hours",
        "overtime",
    ])?;
    for week in weeks {
        let start = week.bucket.start.to_string();
        let first = week.bucket.first_day.to_string();
        let last = week.bucket.last_day.to_string();
        for t in &week.totals {
            let mut days = itoa::Buffer::new();
            let mut hours = itoa::Buffer::new();
            let mut night = itoa::Buffer::new();
            let mut sunday = itoa::Buffer::new();
            let mut overtime = itoa::Buffer::new();
            w.write_record([
                start.as_str(),
                first.as_str(),
                last.as_str(),
                t.operator.as_str(),
                days.format(t.days_worked),
                hours.format(t.hours),
                night.format(t.night_hours),
                sunday.format(t.sunday_hours),
                overtime.format(t.overtime),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Relit un planning journalier écrit par [`write_schedule_csv`].
pub fn read_schedule_csv<R: std::io::Read>(r: R) -> anyhow::Result<Schedule> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(r);
    let headers = rdr.headers()?.clone();
    let width = headers.len();
    if width < 4
        || headers.get(0) != Some("date")
        || headers.get(width - 2) != Some("holiday")
        || headers.get(width - 1) != Some("sunday")
    {
        bail!("unexpected schedule header: expected date,<operators>,holiday,sunday");
    }
    let operators: Vec<Operator> = headers
        .iter()
        .skip(1)
        .take(width - 3)
        .map(Operator::new)
        .collect();

    let mut days: Vec<DayRecord> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let date = parse_date(rec.get(0).context("missing date")?)?;
        if let Some(prev) = days.last() {
            if date <= prev.date {
                bail!("dates must be strictly ascending ({date} after {})", prev.date);
            }
        }
        let shifts = (1..width - 2)
            .map(|i| {
                let raw = rec.get(i).context("missing shift code")?;
                raw.parse::<ShiftCode>().map_err(anyhow::Error::msg)
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .with_context(|| format!("row {date}"))?;
        days.push(DayRecord {
            date,
            shifts,
            is_holiday: parse_flag(rec.get(width - 2).context("missing holiday")?)?,
            is_sunday: parse_flag(rec.get(width - 1).context("missing sunday")?)?,
        });
    }

    let first = days.first().context("schedule file has no rows")?.date;
    if days
        .iter()
        .any(|d| d.date.year() != first.year() || d.date.month() != first.month())
    {
        bail!("schedule file spans more than one month");
    }
    Ok(Schedule {
        year: first.year(),
        month: first.month(),
        operators,
        days,
    })
}

pub fn import_schedule_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Schedule> {
    let path = path.as_ref();
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_schedule_csv(file)
}

pub fn export_schedule_csv<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    write_atomic(path.as_ref(), |w| write_schedule_csv(w, schedule))
}

pub fn export_weekly_csv<P: AsRef<Path>>(path: P, weeks: &[WeeklySummary]) -> anyhow::Result<()> {
    write_atomic(path.as_ref(), |w| write_weekly_csv(w, weeks))
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_schedule_json<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    write_atomic(path.as_ref(), |w| {
        serde_json::to_writer_pretty(w, schedule)?;
        Ok(())
    })
}

fn write_atomic<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> anyhow::Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    write(&mut tmp)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
