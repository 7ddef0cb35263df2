//! tutor-plan - reference-book planning CLI
//!
//! Browses the master catalog and presets, adds books to a student's plan in
//! one batch, shows progress summaries and renders the admission calendar.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tutor_common::config::TomlConfig;
use tutor_common::models::{parse_json, AdmissionRecord, StudentAssignment};
use tutor_common::{AuthSession, Role, Session, StudentId};
use tutor_plan::calendar::{build_month_grid, parse_target_month, MonthGrid};
use tutor_plan::preset::presets_for_subject;
use tutor_plan::progress::summarize;
use tutor_plan::{
    AddBooksSession, BookFilter, CatalogIndex, CustomBookForm, HttpProgressApi, PresetExpansion,
    ProgressApi,
};

#[derive(Parser, Debug)]
#[command(name = "tutor-plan")]
#[command(about = "Reference-book planning for tutoring students")]
#[command(version)]
struct Args {
    /// Config file (overrides TUTOR_CONFIG and the platform default)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for the progress API
    #[arg(long, global = true, env = "TUTOR_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, global = true, default_value = "admin")]
    user: String,

    /// admin, instructor or student
    #[arg(long, global = true, default_value = "admin")]
    role: Role,

    /// Own student id when acting as a student
    #[arg(long, global = true)]
    self_id: Option<StudentId>,

    /// JSON array of instructor assignments, required for --role instructor
    #[arg(long, global = true)]
    assignments: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List master-catalog books
    Catalog {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        level: Option<String>,
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },
    /// List presets
    Presets {
        #[arg(long)]
        subject: Option<String>,
    },
    /// Show a student's progress rows and summary
    Progress {
        #[arg(long)]
        student: Option<StudentId>,
    },
    /// Add books to a student's plan in one batch
    Add {
        #[arg(long)]
        student: Option<StudentId>,
        #[arg(long = "catalog-id")]
        catalog_ids: Vec<i64>,
        #[arg(long = "preset")]
        presets: Vec<i64>,
        /// subject|level|name|hours
        #[arg(long = "custom")]
        custom: Vec<CustomBookForm>,
    },
    /// Render one month of the admission calendar
    Calendar {
        /// YYYY-MM; defaults to the current month
        #[arg(long)]
        month: Option<String>,
        /// JSON array of admission records
        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_assignments(path: Option<&Path>) -> Result<Vec<StudentAssignment>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading assignments file {}", path.display()))?;
    let assignments: Vec<StudentAssignment> = parse_json(&content)?;
    info!(path = %path.display(), count = assignments.len(), "Loaded instructor assignments");
    Ok(assignments)
}

fn build_session(args: &Args) -> Result<Session> {
    match args.role {
        Role::Student => {
            let id = args
                .self_id
                .ok_or_else(|| anyhow!("--self-id is required with --role student"))?;
            Ok(Session::student(&args.user, id))
        }
        role => Ok(Session::new(&args.user, role)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_deref())?;
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }
    init_tracing(&config)?;

    info!(
        "Starting tutor-plan v{} (api {})",
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );

    let token = args.token.clone().or_else(|| config.api.token.clone());
    let auth = AuthSession::new(build_session(&args)?, token);
    if auth.token().is_none() {
        warn!("No API token configured; requests are sent unauthenticated");
    }

    if let Command::Calendar { month, file } = &args.command {
        return run_calendar(month.as_deref(), file);
    }

    let assignments = load_assignments(args.assignments.as_deref())?;
    let api = HttpProgressApi::new(&config.api, &auth)?;

    match args.command {
        Command::Catalog { subject, level, search } => {
            let index = CatalogIndex::new(api.master_catalog().await?);
            let mut filter = BookFilter::new();
            if let Some(s) = subject {
                filter = filter.subject(s);
            }
            if let Some(l) = level {
                filter = filter.level(l);
            }
            if let Some(q) = search {
                filter = filter.name_contains(q);
            }
            for book in index.filter(&filter) {
                println!(
                    "{:>5}  {}  [{}]  {}  ({}h)",
                    book.id, book.subject, book.level, book.name, book.duration_hours
                );
            }
        }
        Command::Presets { subject } => {
            let presets = api.presets().await?;
            let shown: Vec<_> = match &subject {
                Some(s) => presets_for_subject(&presets, s),
                None => presets.iter().collect(),
            };
            for preset in shown {
                println!("{:>5}  {}  ({}, {} books)", preset.id, preset.name, preset.subject, preset.books.len());
                for book in &preset.books {
                    let origin = if book.catalog_id.is_some() { "catalog" } else { "preset" };
                    println!("         - {} [{}] {}", book.name, book.level, origin);
                }
            }
        }
        Command::Progress { student } => {
            let student_id = auth.session.authorize_student(student, &assignments)?;
            print_progress(&api, student_id).await?;
        }
        Command::Add {
            student,
            catalog_ids,
            presets,
            custom,
        } => {
            let session = AddBooksSession::new(&auth, student, &assignments)?;
            run_add(&api, session, &catalog_ids, &presets, &custom).await?;
        }
        Command::Calendar { .. } => {}
    }

    Ok(())
}

async fn print_progress(api: &HttpProgressApi, student_id: StudentId) -> Result<()> {
    let items = api.progress_list(student_id).await?;
    for item in &items {
        println!(
            "{:<8} {:<10} {}  {}/{}",
            item.subject,
            item.level.as_deref().unwrap_or("-"),
            item.book_name,
            item.completed_units,
            item.total_units
        );
    }
    let summary = summarize(&items);
    println!(
        "Progress {:.1}%  planned {:.1}h  completed {:.1}h",
        summary.progress_rate, summary.planned_hours, summary.completed_hours
    );
    for subject in &summary.by_subject {
        println!("  {:<10} {:.1}%", subject.subject, subject.rate);
    }
    Ok(())
}

async fn run_add(
    api: &HttpProgressApi,
    mut session: AddBooksSession,
    catalog_ids: &[i64],
    preset_ids: &[i64],
    custom: &[CustomBookForm],
) -> Result<()> {
    session.open();

    if !catalog_ids.is_empty() {
        let index = CatalogIndex::new(api.master_catalog().await?);
        for id in catalog_ids {
            let book = index
                .get(*id)
                .ok_or_else(|| anyhow!("catalog id {} not found", id))?;
            session.add_from_catalog(book)?;
        }
    }

    if !preset_ids.is_empty() {
        let presets = api.presets().await?;
        for id in preset_ids {
            let preset = presets
                .iter()
                .find(|p| p.id == *id)
                .ok_or_else(|| anyhow!("preset {} not found", id))?;
            match session.add_from_preset(preset)? {
                PresetExpansion::NothingNew { skipped } => {
                    println!("Preset {}: nothing new ({} already selected)", preset.name, skipped)
                }
                PresetExpansion::EmptyPreset => println!("Preset {} has no books", preset.name),
                expansion @ PresetExpansion::Added { .. } => {
                    println!("Preset {}: {} added", preset.name, expansion.added_count())
                }
            }
        }
    }

    for form in custom {
        session.add_custom(form)?;
    }

    if session.candidates().is_empty() {
        bail!("nothing to add");
    }

    let receipt = match session.submit(api).await {
        Ok(receipt) => receipt,
        Err(tutor_plan::PlanError::Submission(e)) if e.is_safe_to_retry() => {
            return Err(anyhow!("{} (nothing was created; safe to retry)", e));
        }
        Err(e) => return Err(e.into()),
    };

    println!("{} (requested {})", receipt.message, receipt.requested);
    match &receipt.progress {
        Some(items) => {
            let summary = summarize(items);
            println!("Progress {:.1}% across {} books", summary.progress_rate, items.len());
        }
        None => println!("Books added, but the progress list could not be refreshed"),
    }
    Ok(())
}

fn run_calendar(month: Option<&str>, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading admissions file {}", file.display()))?;
    let records: Vec<AdmissionRecord> = parse_json(&content)
        .with_context(|| format!("parsing admissions file {}", file.display()))?;

    let first = parse_target_month(month, chrono::Local::now().date_naive());
    let grid = build_month_grid(&records, first);
    print!("{}", render_grid(&grid));
    Ok(())
}

fn render_grid(grid: &MonthGrid) -> String {
    let mut out = format!("{}\n", grid.heading());
    out.push_str(&format!("{:<24}", ""));
    for day in &grid.days {
        out.push_str(&format!("{:>3}", day.day));
    }
    out.push('\n');
    for row in &grid.rows {
        let label: String = format!("{} {}", row.university_name, row.faculty_name)
            .chars()
            .take(22)
            .collect();
        out.push_str(&format!("{:<24}", label));
        for cell in &row.cells {
            let text = cell.text();
            out.push_str(&format!("{:>3}", if text.is_empty() { "." } else { text.as_str() }));
        }
        out.push('\n');
    }
    out
}
