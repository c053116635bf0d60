use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::catalog;
use quiz_core::model::{QuizConfigDraft, QuizMode, UserId, UserPreferences};
use services::{AppServices, Clock, StaticQuestionProvider};
use tracing_subscriber::EnvFilter;

mod play;
mod report;

const DEFAULT_DB_URL: &str = "sqlite://examprep.sqlite3";
const DEFAULT_USER_ID: &str = "local";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_value<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play  [--db <sqlite_url>] [--user <id>] [quiz options]");
    eprintln!("  cargo run -p app -- stats [--db <sqlite_url>] [--user <id>]");
    eprintln!();
    eprintln!("Quiz options:");
    eprintln!("  --exam <name>          --subject <name|key>   --topic <name> (repeatable)");
    eprintln!("  --count <5-120>        --difficulty <easy|medium|hard>");
    eprintln!("  --mode <solo|versus>   --p1 <name>            --p2 <name>");
    eprintln!("  --prefer <topic>       (repeatable, steers generated questions)");
    eprintln!("  --questions <file>     play from a JSON question file instead of the AI provider");
    eprintln!("  --turn-secs <n>        seconds per turn (default 60)");
    eprintln!("  --surprise             randomize exam, subject, topic, count and difficulty");
    eprintln!();
    eprintln!("During a quiz: a-d select, n next, back (solo only), q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAMPREP_DB_URL, EXAMPREP_USER_ID, RUST_LOG");
    eprintln!("  EXAMPREP_AI_API_KEY, EXAMPREP_AI_BASE_URL, EXAMPREP_AI_MODEL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    user: UserId,
    questions_file: Option<PathBuf>,
    draft: QuizConfigDraft,
    preferences: UserPreferences,
    turn_secs: Option<u32>,
    surprise: bool,
}

impl Args {
    fn defaults() -> Self {
        let db_url = std::env::var("EXAMPREP_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let user = std::env::var("EXAMPREP_USER_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| UserId::new(DEFAULT_USER_ID), UserId::new);

        Self {
            db_url,
            user,
            questions_file: None,
            draft: catalog::default_draft(),
            preferences: UserPreferences::default(),
            turn_secs: None,
            surprise: false,
        }
    }

    fn parse(
        cmd: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self::defaults();
        let mut topics: Vec<String> = Vec::new();
        let mut party_one = None;
        let mut party_two = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidValue {
                            flag: "--user",
                            raw: value,
                        });
                    }
                    parsed.user = UserId::new(value.trim());
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Stats => return Err(ArgsError::UnknownArg(arg)),
                "--exam" => parsed.draft.exam = require_value(args, "--exam")?,
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    parsed.draft.subject = catalog::find_subject(&value)
                        .map_or(value, |subject| subject.name.to_string());
                }
                "--topic" => topics.push(require_value(args, "--topic")?),
                "--prefer" => parsed
                    .preferences
                    .preferred_topics
                    .push(require_value(args, "--prefer")?),
                "--count" => {
                    parsed.draft.question_count =
                        parse_value(require_value(args, "--count")?, "--count")?;
                }
                "--difficulty" => {
                    parsed.draft.difficulty =
                        parse_value(require_value(args, "--difficulty")?, "--difficulty")?;
                }
                "--mode" => {
                    parsed.draft.mode = parse_value(require_value(args, "--mode")?, "--mode")?;
                }
                "--p1" => party_one = Some(require_value(args, "--p1")?),
                "--p2" => party_two = Some(require_value(args, "--p2")?),
                "--questions" => {
                    parsed.questions_file = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--turn-secs" => {
                    let secs: u32 = parse_value(require_value(args, "--turn-secs")?, "--turn-secs")?;
                    parsed.turn_secs = Some(secs);
                }
                "--surprise" => parsed.surprise = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if !topics.is_empty() {
            parsed.draft.topics = topics;
        }
        parsed.draft.party_one_name = party_one;
        parsed.draft.party_two_name = party_two;
        // A file-backed quiz has no topic selection of its own.
        if parsed.questions_file.is_some() {
            parsed.draft.allow_general_syllabus = true;
        }

        Ok(parsed)
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
            .unwrap_or_else(|_| PathBuf::from("."))
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so they never interleave with the quiz on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let clock = Clock::default_clock();
    let mut services = AppServices::new_sqlite(&parsed.db_url, clock).await?;

    match cmd {
        Command::Play => {
            if let Some(path) = &parsed.questions_file {
                let raw = std::fs::read_to_string(path)?;
                let provider = StaticQuestionProvider::from_json(&raw)?;
                tracing::info!(path = %path.display(), questions = provider.len(), "loaded question file");
                services = services.with_provider(clock, Arc::new(provider));
            }

            let draft = if parsed.surprise {
                catalog::surprise_draft(&mut rand::rng(), parsed.draft)
            } else {
                parsed.draft
            };
            if draft.mode == QuizMode::Solo && draft.party_two_name.is_some() {
                eprintln!("note: --p2 is ignored in solo mode");
            }
            let config = draft.validate()?;

            play::run_quiz(
                &services,
                config,
                parsed.preferences,
                &parsed.user,
                parsed.turn_secs,
            )
            .await
        }
        Command::Stats => {
            let snapshot = services.dashboard().snapshot(&parsed.user).await;
            report::print_dashboard(&parsed.user, &snapshot);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
