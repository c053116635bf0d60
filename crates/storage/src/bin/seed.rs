use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    AnsweredQuestion, Explanation, PlayerResult, Question, QuestionId, QuizMode, QuizResult,
    UserId,
};
use quiz_core::scoring::accuracy;
use storage::repository::{NewHistoryRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    days: u32,
    per_day: u32,
    questions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDays { raw: String },
    InvalidPerDay { raw: String },
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidPerDay { raw } => write!(f, "invalid --per-day value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

fn env_u32(name: &str, fallback: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(fallback)
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAMPREP_DB_URL")
            .unwrap_or_else(|_| "sqlite://examprep.sqlite3?mode=rwc".into());
        let mut user_id = UserId::new(
            std::env::var("EXAMPREP_USER_ID").unwrap_or_else(|_| "local".into()),
        );
        let mut days = env_u32("EXAMPREP_SEED_DAYS", 5);
        let mut per_day = env_u32("EXAMPREP_SEED_PER_DAY", 1);
        let mut questions = env_u32("EXAMPREP_SEED_QUESTIONS", 10);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidUser { raw: value });
                    }
                    user_id = UserId::new(value.trim());
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--per-day" => {
                    let value = require_value(&mut args, "--per-day")?;
                    per_day = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidPerDay { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            days,
            per_day,
            questions,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://examprep.sqlite3?mode=rwc)");
    eprintln!("  --user <id>               Owner of the seeded history (default: local)");
    eprintln!("  --days <n>                Consecutive days of history ending today (default: 5)");
    eprintln!("  --per-day <n>             Quizzes recorded per day (default: 1)");
    eprintln!("  --questions <n>           Questions per seeded quiz (default: 10)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  EXAMPREP_DB_URL, EXAMPREP_USER_ID, EXAMPREP_SEED_DAYS, EXAMPREP_SEED_PER_DAY, EXAMPREP_SEED_QUESTIONS"
    );
}

const SAMPLES: [(&str, &str); 4] = [
    ("RRB NTPC", "Reasoning"),
    ("IBPS PO", "Quantitative Aptitude"),
    ("SBI Clerk", "English"),
    ("RRB Group D", "General Studies"),
];

fn demo_result(total: u32, score: u32) -> QuizResult {
    let questions: Vec<Question> = (0..total)
        .map(|i| Question {
            id: QuestionId::new(format!("seed-{i}")),
            text: format!("Seeded question {}", i + 1),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: 0,
            explanation: Explanation {
                concept: "Seeded data".into(),
                ..Explanation::default()
            },
        })
        .collect();
    let answers = questions
        .iter()
        .zip(0..total)
        .map(|(q, i)| AnsweredQuestion {
            question_id: q.id.clone(),
            selected_option: Some(if i < score { 0 } else { 1 }),
            is_correct: i < score,
        })
        .collect();

    QuizResult {
        mode: QuizMode::Solo,
        total_questions: total,
        questions,
        party_one: PlayerResult {
            name: "Player 1".into(),
            score,
            accuracy: accuracy(score, total as usize),
            time_taken: total.saturating_mul(35),
            answers,
        },
        party_two: None,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut seeded = 0_u32;
    for day in 0..args.days {
        for slot in 0..args.per_day {
            let (exam, subject) = SAMPLES[((day + slot) as usize) % SAMPLES.len()];
            let score = (day * 3 + slot * 5 + 4) % (args.questions + 1);
            let recorded_at =
                now - Duration::days(i64::from(day)) - Duration::minutes(i64::from(slot) * 20);
            let record = NewHistoryRecord::new(
                args.user_id.clone(),
                recorded_at,
                exam,
                subject,
                demo_result(args.questions, score),
            );
            storage.history.append_result(&record).await?;
            seeded += 1;
        }
    }

    println!(
        "Seeded {seeded} quizzes over {} days for {} into {}",
        args.days, args.user_id, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
