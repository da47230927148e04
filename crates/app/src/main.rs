use std::fmt;

use exam_core::model::{ExamId, catalog, find_in_catalog};
use exam_core::time::format_countdown;
use services::{ApiConfig, AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod take;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingExamId,
    UnknownArg(String),
    UnknownExam(String),
    InvalidDbUrl { raw: String },
    InvalidLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingExamId => write!(f, "an exam id is required (see `exam list`)"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownExam(id) => write!(f, "unknown exam: {id} (see `exam list`)"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  exam list");
    eprintln!("  exam take <exam-id>    [--db <sqlite_url>] [--api <base_url>] [--fresh]");
    eprintln!("  exam history <exam-id> [--db <sqlite_url>] [--limit <n>]");
    eprintln!();
    eprintln!("Fill the local question pool with:");
    eprintln!("  cargo run -p storage --bin seed -- --db <sqlite_url>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://exam.sqlite3");
    eprintln!("  --limit 10");
    eprintln!();
    eprintln!("Environment (flags win):");
    eprintln!("  EXAM_DB_URL, EXAM_API_BASE_URL, EXAM_API_TOKEN, EXAM_API_TIMEOUT_SECS");
    eprintln!("  RUST_LOG (default: info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Take,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "take" => Some(Self::Take),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    exam_id: Option<String>,
    db_url: String,
    api_base_url: Option<String>,
    fresh: bool,
    limit: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            exam_id: None,
            db_url: std::env::var("EXAM_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://exam.sqlite3".into(), normalize_sqlite_url),
            api_base_url: None,
            fresh: false,
            limit: 10,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--api" => parsed.api_base_url = Some(require_value(args, "--api")?),
                "--fresh" => parsed.fresh = true,
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    parsed.limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with("--") && parsed.exam_id.is_none() => {
                    parsed.exam_id = Some(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn api_config(&self) -> Result<Option<ApiConfig>, Box<dyn std::error::Error>> {
        let from_env = ApiConfig::from_env()?;
        let Some(base_url) = &self.api_base_url else {
            return Ok(from_env);
        };

        let mut config = ApiConfig::new(base_url)?;
        if let Ok(token) = std::env::var("EXAM_API_TOKEN") {
            config = config.with_token(token);
        }
        Ok(Some(config))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn list_exams() {
    for exam in catalog() {
        let categories = if exam.categories().is_empty() {
            "all categories".to_string()
        } else {
            exam.categories().join(", ")
        };
        println!(
            "{:<18} {:<26} {:>3} min  {:>2} questions  ({categories})",
            exam.id().as_str(),
            exam.title(),
            exam.duration_minutes(),
            exam.question_count(),
        );
    }
}

async fn show_history(
    services: &AppServices,
    exam_id: &str,
    limit: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let exam_id = ExamId::new(exam_id)?;
    let rows = services.history(&exam_id, limit).await?;
    if rows.is_empty() {
        println!("No results for {exam_id} yet.");
        return Ok(());
    }

    for row in rows {
        let result = &row.record.result;
        println!(
            "{}  {:>3}%  {:<13} {:>2}/{:<2} correct  {} used",
            row.record.completed_at.format("%Y-%m-%d %H:%M"),
            result.score,
            result.grade().as_str(),
            result.correct,
            result.total,
            format_countdown(result.time_spent),
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if cmd == Command::List {
        list_exams();
        return Ok(());
    }

    let exam_id = parsed.exam_id.clone().ok_or(ArgsError::MissingExamId)?;

    // Open + migrate SQLite here so the library crates never touch the filesystem layout.
    prepare_sqlite_file(&parsed.db_url)?;
    let api = if cmd == Command::Take {
        parsed.api_config()?
    } else {
        None
    };
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default(), api).await?;

    match cmd {
        Command::Take => {
            let exam = find_in_catalog(&exam_id).ok_or(ArgsError::UnknownExam(exam_id))?;
            take::run(&services, exam, parsed.fresh).await
        }
        Command::History => show_history(&services, &exam_id, parsed.limit).await,
        Command::List => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
