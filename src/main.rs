use anyhow::{Result, anyhow};
use std::collections::BTreeSet;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quiz_scheduler::config::LoggingConfig;
use quiz_scheduler::quiz_source::FileLoad;
use quiz_scheduler::selection::{all_tags, scope_stats, select};
use quiz_scheduler::{
    Config, Console, ContentIndex, DirectorySource, ErrorContext, ExamDates, FilterMode, QuizError,
    QuizQuestion, QuizScope, ReviewStore, ScopeStats, SessionEngine, StdConsole, log_system_event,
    reconcile,
};

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config.logging)?;
    config.log_configuration_summary();
    if let Err(e) = config.validate() {
        let message = e.report_with_context(ErrorContext::new("validate", "configuration"));
        eprintln!("{}", message);
        return Err(anyhow!(message));
    }

    log_system_event!(startup, component = "cli", "quiz scheduler starting");

    let source = DirectorySource::new(&config.data.data_folder);
    let discovered = match source.scan() {
        Ok(files) => files,
        Err(e) => {
            let message = e.report_with_context(
                ErrorContext::new("scan", "data_folder")
                    .with_id(&config.data.data_folder.display().to_string()),
            );
            eprintln!("{}", message);
            return Err(anyhow!(message));
        }
    };

    let previous = ContentIndex::load(&config.data.index_file);
    let reconciliation = reconcile(&previous, &discovered);
    if let Err(e) = reconciliation.index.save(&config.data.index_file) {
        let message = QuizError::Storage(e).report_with_context(
            ErrorContext::new("save_index", "quiz index")
                .with_user_message("Could not save the quiz index; ids stay valid for this run."),
        );
        eprintln!("{}", message);
    }

    let index = reconciliation.index;
    let questions = reconciliation.questions;
    let archived = index.archived.clone();

    let mut store = ReviewStore::open(&config.data.performance_file);
    let exam_dates = ExamDates::load(&config.data.exam_dates_file);
    info!(courses = exam_dates.len(), "Exam dates loaded");

    let mut engine = SessionEngine::from_config(&config.session, exam_dates)?;
    let mut console = StdConsole;

    let files: Vec<String> = discovered
        .iter()
        .filter(|file| matches!(file.load, FileLoad::Loaded { .. }))
        .map(|file| file.relative_path.clone())
        .collect();

    console.show(&format!(
        "Loaded {} questions from {} files ({} new ids, {} archived).",
        questions.len(),
        files.len(),
        reconciliation.report.ids_allocated,
        archived.len()
    ));
    for file in &files {
        let stats = scope_stats(
            &questions,
            &archived,
            &store,
            &QuizScope::File(file.clone()),
            engine.today(),
        );
        console.show(&format!("  {}: {}", file, format_stats(&stats)));
    }

    run_menu(&mut engine, &mut store, &mut console, &questions, &archived, &files)?;

    log_system_event!(shutdown, component = "cli", "quiz scheduler exiting");
    Ok(())
}

fn run_menu(
    engine: &mut SessionEngine,
    store: &mut ReviewStore,
    console: &mut dyn Console,
    questions: &[QuizQuestion],
    archived: &BTreeSet<u64>,
    files: &[String],
) -> Result<()> {
    loop {
        console.show("\n=== Quiz ===");
        console.show("1) Due today");
        console.show("2) All questions");
        console.show("3) Never answered");
        console.show("4) Last answer wrong");
        console.show("5) Wrong or skipped");
        console.show("6) One file");
        console.show("7) One tag");
        console.show("8) Statistics");
        console.show("9) Reset progress");
        console.show("0) Quit");

        let Some(choice) = console.prompt("\nChoose an option: ")? else {
            return Ok(());
        };

        let (scope, mode) = match choice.trim() {
            "1" => (QuizScope::Repository, FilterMode::Due),
            "2" => (QuizScope::Repository, FilterMode::All),
            "3" => (QuizScope::Repository, FilterMode::Unanswered),
            "4" => (QuizScope::Repository, FilterMode::Wrong),
            "5" => (QuizScope::Repository, FilterMode::WrongOrSkipped),
            "6" => match choose(console, "file", files)? {
                Some(file) => (QuizScope::File(file), FilterMode::All),
                None => continue,
            },
            "7" => match choose(console, "tag", &all_tags(questions, archived))? {
                Some(tag) => (QuizScope::Tag(tag), FilterMode::All),
                None => continue,
            },
            "8" => {
                let stats = scope_stats(questions, archived, store, &QuizScope::Repository, engine.today());
                console.show(&format!("\n{}", format_stats(&stats)));
                continue;
            }
            "9" => {
                reset_progress(store, console)?;
                continue;
            }
            "0" => return Ok(()),
            _ => {
                console.show("Invalid option.");
                continue;
            }
        };

        let play_set = select(questions, archived, store, &scope, mode, engine.today());
        engine.run(mode, &play_set, store, console)?;
    }
}

fn choose(console: &mut dyn Console, kind: &str, options: &[String]) -> Result<Option<String>> {
    if options.is_empty() {
        console.show(&format!("No {} available.", kind));
        return Ok(None);
    }
    for (number, option) in options.iter().enumerate() {
        console.show(&format!("{}) {}", number + 1, option));
    }
    console.show("0) Cancel");

    let Some(choice) = console.prompt(&format!("Choose a {}: ", kind))? else {
        return Ok(None);
    };
    Ok(choice
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .cloned())
}

fn reset_progress(store: &mut ReviewStore, console: &mut dyn Console) -> Result<()> {
    let confirm = console.prompt("Erase all review progress? (y/n): ")?;
    if !matches!(confirm.as_deref().map(str::trim), Some("y" | "Y" | "s" | "S")) {
        return Ok(());
    }
    match store.reset() {
        Ok(()) => console.show("Progress cleared."),
        Err(e) => {
            let message = QuizError::Storage(e)
                .report_with_context(ErrorContext::new("reset", "performance"));
            console.show(&message);
        }
    }
    Ok(())
}

fn format_stats(stats: &ScopeStats) -> String {
    format!(
        "{} questions, {} due, {} never answered, {} correct, {} wrong, {} skipped",
        stats.total, stats.due, stats.never, stats.correct, stats.wrong, stats.skipped
    )
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new("info,quiz_scheduler=debug"));

    // Set up file appender with daily rotation
    let (file_layer, guard) = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });
        let file_appender = tracing_appender::rolling::daily(&config.log_directory, "quiz-scheduler.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        directory = %config.log_directory,
        file_enabled = config.file_enabled,
        console_enabled = config.console_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
