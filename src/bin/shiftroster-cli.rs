#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use shiftroster::{
    io,
    leave::LeaveRegistry,
    model::{LeaveKind, OperatorId, Schedule},
    rotation::Rotation,
    scheduler::ScheduleBuilder,
    storage::{JsonSessionStore, LeaveSession, SessionStore},
    summary::{month_totals, summarize_weeks},
    HolidayCalendar, HolidayOracle, NoHolidays, Settings,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Planning mensuel de turnos en rotation (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de configuration
    #[arg(long, global = true)]
    config: Option<String>,

    /// Roster "Op1,Op2,..." (remplace celui de la configuration)
    #[arg(long, global = true)]
    operators: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug)]
struct MonthArgs {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
    /// staggered | fixed_table
    #[arg(long)]
    strategy: Option<String>,
    /// Région pour les fériés (ex: CO)
    #[arg(long)]
    region: Option<String>,
    /// Jour 0 de la rotation (YYYY-MM-DD)
    #[arg(long)]
    anchor: Option<String>,
    /// CSV de fériés `date,region[,name]`
    #[arg(long)]
    holidays: Option<String>,
    /// CSV de novedades `operator,kind,start[,end]`
    #[arg(long)]
    leave_csv: Option<String>,
    /// Fichier de session (historique des novedades)
    #[arg(long)]
    session: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le planning du mois
    Generate {
        #[command(flatten)]
        month: MonthArgs,
        /// Export CSV du planning journalier
        #[arg(long)]
        out: Option<String>,
        /// Export CSV du résumé hebdomadaire
        #[arg(long)]
        summary_out: Option<String>,
        /// Export JSON du planning
        #[arg(long)]
        json: Option<String>,
    },

    /// Afficher le résumé hebdomadaire des heures
    Summary {
        #[command(flatten)]
        month: MonthArgs,
        #[arg(long)]
        out: Option<String>,
    },

    /// Gérer les novedades d'une session
    Leave {
        #[command(subcommand)]
        cmd: LeaveCommands,
    },

    /// Relire un planning CSV exporté
    Import {
        #[arg(long)]
        csv: String,
    },
}

#[derive(Subcommand, Debug)]
enum LeaveCommands {
    /// Ajouter une novedad (intervalle inclusif)
    Add {
        #[arg(long)]
        session: String,
        #[arg(long)]
        operator: String,
        /// vacation | permission | incapacity
        #[arg(long, default_value = "vacation")]
        kind: String,
        #[arg(long)]
        start: String,
        /// Par défaut = start
        #[arg(long)]
        end: Option<String>,
        /// Remplace toute la sélection précédente de l'opérateur
        #[arg(long)]
        replace: bool,
    },

    /// Lister l'historique de la session
    List {
        #[arg(long)]
        session: String,
    },

    /// Retirer toutes les dates d'un opérateur
    Clear {
        #[arg(long)]
        session: String,
        #[arg(long)]
        operator: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(list) = &cli.operators {
        settings.operators = list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let code = match cli.cmd {
        Commands::Generate {
            month,
            out,
            summary_out,
            json,
        } => {
            let (schedule, code) = build(&mut settings, &month)?;
            print_schedule(&schedule);
            if let Some(path) = out {
                io::export_schedule_csv(path, &schedule)?;
            }
            if let Some(path) = json {
                io::export_schedule_json(path, &schedule)?;
            }
            if let Some(path) = summary_out {
                let weeks = summarize_weeks(&schedule, &settings.hours);
                io::export_weekly_csv(path, &weeks)?;
            }
            code
        }
        Commands::Summary { month, out } => {
            let (schedule, code) = build(&mut settings, &month)?;
            let weeks = summarize_weeks(&schedule, &settings.hours);
            for week in &weeks {
                println!(
                    "semaine {} ({} → {}, {} j)",
                    week.bucket.start, week.bucket.first_day, week.bucket.last_day, week.bucket.days
                );
                for t in &week.totals {
                    println!(
                        "  {:<8} jours={} heures={} nuit={} dimanche={} sup={}",
                        t.operator.as_str(),
                        t.days_worked,
                        t.hours,
                        t.night_hours,
                        t.sunday_hours,
                        t.overtime
                    );
                }
            }
            println!("mois {}-{:02}", schedule.year, schedule.month);
            for m in month_totals(&schedule, &weeks) {
                println!(
                    "  {:<8} jours={} heures={} nuit={} dimanche={} sup={}",
                    m.operator.as_str(),
                    m.days_worked,
                    m.hours,
                    m.night_hours,
                    m.sunday_hours,
                    m.overtime
                );
            }
            if let Some(path) = out {
                io::export_weekly_csv(path, &weeks)?;
            }
            code
        }
        Commands::Leave { cmd } => {
            settings.validate()?;
            let roster = settings.roster();
            match cmd {
                LeaveCommands::Add {
                    session,
                    operator,
                    kind,
                    start,
                    end,
                    replace,
                } => {
                    let store = JsonSessionStore::open(&session);
                    let mut registry = load_registry(&store, &settings)?;
                    let kind: LeaveKind = kind.parse().map_err(anyhow::Error::msg)?;
                    let start = parse_date(&start)?;
                    let end = end.as_deref().map(parse_date).transpose()?.unwrap_or(start);
                    let op = OperatorId::new(&operator);
                    let receipt = if replace {
                        registry.replace_range(&op, start, end, kind)?
                    } else {
                        registry.submit_range(&op, start, end, kind)?
                    };
                    store.save(&LeaveSession::from_registry(&roster, &registry))?;
                    println!(
                        "Novedad registrada: {kind} pour {operator} ({start} → {end}), \
                         {} jour(s)",
                        receipt.dates
                    );
                    if receipt.has_overlap() {
                        eprintln!(
                            "Chevauchement avec des congés existants ({} date(s)), \
                             la dernière saisie prime",
                            receipt.overrides.len()
                        );
                        // Code 2 = WARNING
                        2
                    } else {
                        0
                    }
                }
                LeaveCommands::List { session } => {
                    let store = JsonSessionStore::open(&session);
                    let registry = load_registry(&store, &settings)?;
                    for sub in registry.history() {
                        let dates = sub.dates.expand();
                        let span = match (dates.first(), dates.last()) {
                            (Some(first), Some(last)) => format!("{first} → {last}"),
                            _ => "-".to_string(),
                        };
                        println!(
                            "{} | {} | {} | {:?} | {} jour(s) | {}",
                            sub.id,
                            sub.operator,
                            sub.kind,
                            sub.mode,
                            dates.len(),
                            span
                        );
                    }
                    0
                }
                LeaveCommands::Clear { session, operator } => {
                    let store = JsonSessionStore::open(&session);
                    let mut registry = load_registry(&store, &settings)?;
                    registry.clear_operator(&OperatorId::new(&operator))?;
                    store.save(&LeaveSession::from_registry(&roster, &registry))?;
                    0
                }
            }
        }
        Commands::Import { csv } => {
            let schedule = io::import_schedule_csv(&csv)?;
            print_schedule(&schedule);
            println!("{} affectation(s) relue(s)", schedule.triples().count());
            0
        }
    };

    std::process::exit(code);
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date (YYYY-MM-DD expected): {raw}"))
}

fn load_registry(store: &JsonSessionStore, settings: &Settings) -> Result<LeaveRegistry> {
    let roster = settings.roster();
    match store.load()? {
        Some(session) => session.into_registry(&roster),
        None => Ok(LeaveRegistry::new(&roster)),
    }
}

/// Applique les options de la ligne de commande puis construit le planning.
/// Retourne aussi le code de sortie (2 si des novedades se chevauchent).
fn build(settings: &mut Settings, args: &MonthArgs) -> Result<(Schedule, i32)> {
    if let Some(year) = args.year {
        settings.year = year;
    }
    if let Some(month) = args.month {
        settings.month = month;
    }
    if let Some(name) = &args.strategy {
        settings.rotation = Rotation::from_name(name)
            .with_context(|| format!("unknown rotation strategy: {name}"))?;
    }
    if let Some(region) = &args.region {
        settings.region = region.clone();
    }
    if let Some(anchor) = &args.anchor {
        settings.anchor = Some(parse_date(anchor)?);
    }
    settings.validate()?;

    let roster = settings.roster();
    let mut registry = match &args.session {
        Some(path) => load_registry(&JsonSessionStore::open(path), settings)?,
        None => LeaveRegistry::new(&roster),
    };

    let mut code = 0;
    if let Some(path) = &args.leave_csv {
        let mut rows = Vec::new();
        for parsed in io::import_leave_csv(path)? {
            match parsed {
                Ok(row) => rows.push(row),
                Err(err) => {
                    eprintln!("Novedad ignorée: {err:#}");
                    code = 2;
                }
            }
        }
        for (row, result) in rows.iter().zip(io::submit_leave_rows(&mut registry, &rows)) {
            match result {
                Ok(receipt) if receipt.has_overlap() => {
                    eprintln!(
                        "Chevauchement pour {} ({} date(s)), la dernière saisie prime",
                        row.operator,
                        receipt.overrides.len()
                    );
                    code = 2;
                }
                Ok(_) => {}
                Err(err) => {
                    eprintln!("Novedad ignorée pour {}: {err}", row.operator);
                    code = 2;
                }
            }
        }
    }

    let oracle: Box<dyn HolidayOracle> = match &args.holidays {
        Some(path) => Box::new(HolidayCalendar::from_csv_path(path)?),
        None => Box::new(NoHolidays),
    };

    let schedule = ScheduleBuilder::new(roster, settings.rotation.strategy())
        .leave(&registry)
        .holidays(oracle.as_ref())
        .options(settings.build_options())
        .build_month(settings.year, settings.month)?;
    Ok((schedule, code))
}

fn print_schedule(schedule: &Schedule) {
    let mut header = String::from("date      ");
    for op in &schedule.operators {
        header.push_str(&format!(" {:>4}", op.id.as_str()));
    }
    header.push_str("  F  D");
    println!("{header}");
    for day in &schedule.days {
        let mut line = day.date.to_string();
        for code in &day.shifts {
            line.push_str(&format!(" {:>4}", code.code()));
        }
        line.push_str(if day.is_holiday { "  *" } else { "  -" });
        line.push_str(if day.is_sunday { "  *" } else { "  -" });
        println!("{line}");
    }
}
