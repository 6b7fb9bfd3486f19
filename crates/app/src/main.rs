use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lesson_core::model::{ChapterId, LessonPolicy, Step, VerseNumber};
use lesson_core::scoring::PronunciationScore;
use services::{
    AppServices, Clock, CompletionOutcome, FixedScorer, LessonSession, PronunciationScorer,
    RandomScorer, RecordingRef, Route, Transition,
};
use storage::content::{ContentSource, JsonDirContent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum CliError {
    InvalidDbUrl { raw: String },
    VerseLocked { chapter: ChapterId, verse: VerseNumber },
    Stalled { step: Step },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            CliError::VerseLocked { chapter, verse } => write!(
                f,
                "verse {verse} of chapter {chapter} is locked; finish verse {} first",
                verse.previous().unwrap_or(*verse)
            ),
            CliError::Stalled { step } => {
                write!(f, "lesson could not leave the {} step", step.label())
            }
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Parser)]
#[command(name = "verses")]
#[command(author, version, about = "Verse micro-lessons in the terminal", long_about = None)]
struct Cli {
    /// SQLite database holding learner progress
    #[arg(long = "db", env = "VERSE_DB_URL", default_value = "sqlite://verses.sqlite3", global = true)]
    db_url: String,

    /// Directory of chapter_<n>.json content files
    #[arg(long, env = "VERSE_CONTENT_DIR", default_value = "content", global = true)]
    content_dir: PathBuf,

    /// Comma-separated chapter order (defaults to the chapters found in the content dir)
    #[arg(long, env = "VERSE_CHAPTER_ORDER", value_delimiter = ',', global = true)]
    chapter_order: Vec<ChapterId>,

    /// Require a recording before the recording step can be left
    #[arg(long, env = "VERSE_RECORDING_REQUIRED", global = true)]
    recording_required: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chapters with lock state and stars
    Chapters,
    /// List the verses of a chapter
    Verses { chapter: ChapterId },
    /// Run one scripted lesson through every step
    Play {
        chapter: ChapterId,
        verse: VerseNumber,
        /// Pronunciation score to use instead of a random one
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        score: Option<u8>,
    },
    /// Print the stored progress record as JSON
    Progress,
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
        .ok_or_else(|| CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(CliError::InvalidDbUrl {
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.db_url.trim().is_empty() {
        return Err(CliError::InvalidDbUrl { raw: cli.db_url }.into());
    }
    let db_url = normalize_sqlite_url(cli.db_url);
    prepare_sqlite_file(&db_url)?;

    let content: Arc<dyn ContentSource> = Arc::new(JsonDirContent::new(cli.content_dir));
    let policy = LessonPolicy::default().with_recording_required(cli.recording_required);
    let order = (!cli.chapter_order.is_empty()).then_some(cli.chapter_order);
    let app = AppServices::new_sqlite(&db_url, content, Clock::system(), policy, order).await?;
    if app.is_new_learner() {
        println!("Welcome! A new learner profile was created.");
    }

    match cli.command {
        Commands::Chapters => print_chapters(&app).await,
        Commands::Verses { chapter } => print_verses(&app, chapter).await,
        Commands::Play {
            chapter,
            verse,
            score,
        } => {
            let scorer: Box<dyn PronunciationScorer> = match score {
                Some(value) => Box::new(FixedScorer::new(PronunciationScore::new(value).ok())),
                None => Box::new(RandomScorer::default()),
            };
            play(&app, chapter, verse, scorer.as_ref()).await
        }
        Commands::Progress => {
            let progress = app.progress().load(app.learner()).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
            Ok(())
        }
    }
}

async fn print_chapters(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    for item in app.catalog().chapter_list(app.learner()).await? {
        let state = if item.total_verses == 0 {
            "no content"
        } else if item.completed {
            "done"
        } else if item.unlocked {
            "open"
        } else {
            "locked"
        };
        println!(
            "{:>4}  {:<24} {:<20} {:>6}  {}/{} verses  {} stars",
            item.id.value(),
            item.name_localized,
            item.name_native,
            state,
            item.completed_verses,
            item.total_verses,
            item.total_stars
        );
    }
    Ok(())
}

async fn print_verses(
    app: &AppServices,
    chapter: ChapterId,
) -> Result<(), Box<dyn std::error::Error>> {
    for item in app.catalog().verse_list(app.learner(), chapter).await? {
        let stars = item.stars.map_or_else(String::new, |s| "*".repeat(usize::from(s.value())));
        let state = match (item.completed, item.unlocked) {
            (true, _) => "done",
            (false, true) => "open",
            (false, false) => "locked",
        };
        let missing = if item.has_content { "" } else { "  (no lesson yet)" };
        println!("{:>4}  {:<6} {:<3}{missing}", item.number.value(), state, stars);
    }
    Ok(())
}

async fn play(
    app: &AppServices,
    chapter: ChapterId,
    verse: VerseNumber,
    scorer: &dyn PronunciationScorer,
) -> Result<(), Box<dyn std::error::Error>> {
    let learner = app.learner();
    let verses = app.catalog().verse_list(learner, chapter).await?;
    if !verses.iter().any(|v| v.number == verse && v.unlocked) {
        return Err(CliError::VerseLocked { chapter, verse }.into());
    }

    let lessons = app.lesson_loop();
    let mut session = lessons.open_session(learner, chapter, verse).await?;
    let mut rng = rand::rng();

    loop {
        run_step(&mut session, scorer, &mut rng);
        match session.advance() {
            Transition::Moved { .. } => {}
            Transition::ReadyToComplete => break,
            Transition::Blocked { step } => return Err(CliError::Stalled { step }.into()),
        }
    }

    let outcome = match lessons.complete_session(&mut session).await {
        Ok(outcome) => outcome,
        Err(err) if err.is_retryable() => {
            tracing::warn!(error = %err, "saving the lesson failed, retrying once");
            lessons.retry_completion(&mut session).await?
        }
        Err(err) => return Err(err.into()),
    };
    print_outcome(&outcome);
    Ok(())
}

fn run_step(
    session: &mut LessonSession,
    scorer: &dyn PronunciationScorer,
    rng: &mut impl rand::Rng,
) {
    let step = session.step();
    println!("\n[{}/{}] {}", step.index() + 1, Step::ALL.len(), step.label());

    match step {
        Step::Explanation => {
            println!("{}", session.verse().translation());
            println!("{}", session.verse().explanation());
        }
        Step::Recitation => {
            println!("{}", session.verse().arabic_text());
            println!("listen: {}", session.verse().audio_url());
        }
        Step::Recording => {
            let take = RecordingRef::new(format!(
                "recordings/{}-{}.m4a",
                session.chapter_id(),
                session.verse_number()
            ));
            let score = scorer.score(&take);
            match score {
                Some(score) => println!("pronunciation score: {}", score.value()),
                None => println!("no pronunciation score"),
            }
            session.submit_recording(take, score);
        }
        Step::WordOrderQuiz => {
            println!("{}", session.verse().word_order().instruction);
            for word in session.verse().canonical_words() {
                let bank = session.word_bank(rng);
                println!("  bank: {}", bank.join(" | "));
                println!("  place: {word} -> {:?}", session.submit_word(&word));
            }
        }
        Step::ComprehensionQuiz => {
            let question = session.verse().comprehension().clone();
            println!("{}", question.question());
            for (idx, option) in question.options().iter().enumerate() {
                println!("  {}. {option}", idx + 1);
            }
            let correct = session.submit_comprehension_text(question.correct_option_text());
            let verdict = if correct { "correct" } else { "try again" };
            println!("  answer: {} ({verdict})", question.correct_option_text());
        }
        Step::Celebration => {
            println!("verse {} finished", session.verse_number());
        }
    }
}

fn print_outcome(outcome: &CompletionOutcome) {
    println!("\nstars earned: {}", outcome.stars);
    match outcome.route {
        Route::ChapterComplete {
            chapter,
            total_stars,
        } => println!("chapter {chapter} complete with {total_stars} stars"),
        Route::VerseList { chapter } => println!("back to chapter {chapter}"),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verses=info,services=info,storage=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
