use anyhow::Result;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use uuid::Uuid;

use crate::clock::{Clock, DayRollover, SystemClock};
use crate::config::SessionConfig;
use crate::errors::{ErrorContext, QuizError};
use crate::exam_dates::ExamDates;
use crate::models::{FilterMode, Outcome, QuizQuestion, SessionCounters};
use crate::review_store::ReviewStore;
use crate::scheduler::Sm2Scheduler;
use crate::shuffler::{Presentation, ReferenceRemapper, Shuffler};
use crate::validator::{is_exit_sentinel, parse_letters, validate};
use crate::{log_session_error, log_session_start, log_session_success, log_session_warn};

/// Line-oriented terminal the session talks through.
pub trait Console {
    fn show(&mut self, text: &str);
    /// `None` when input is exhausted.
    fn prompt(&mut self, label: &str) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn show(&mut self, text: &str) {
        println!("{}", text);
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", label)?;
        stdout.flush()?;

        read_input_line(&mut io::stdin().lock())
    }
}

/// One line of user input with the line ending removed. Bytes that are not
/// valid UTF-8 are replaced rather than rejected.
pub fn read_input_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut bytes = Vec::new();
    if reader.read_until(b'\n', &mut bytes)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&bytes);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Result of presenting one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Exit was declined; ask the same question again.
    Continue,
    Answered(Outcome),
    AbortRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub counters: SessionCounters,
    pub aborted: bool,
}

/// Presents questions, grades answers and reschedules them.
pub struct SessionEngine {
    shuffler: Shuffler,
    scheduler: Sm2Scheduler,
    exam_dates: ExamDates,
    rollover: DayRollover,
    clock: Box<dyn Clock>,
    rng: StdRng,
}

impl SessionEngine {
    pub fn new(
        shuffler: Shuffler,
        scheduler: Sm2Scheduler,
        exam_dates: ExamDates,
        rollover: DayRollover,
        clock: Box<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            shuffler,
            scheduler,
            exam_dates,
            rollover,
            clock,
            rng,
        }
    }

    pub fn from_config(config: &SessionConfig, exam_dates: ExamDates) -> Result<Self> {
        let remapper = ReferenceRemapper::new(config.conjunctions.as_slice())?;
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::new(
            Shuffler::new(remapper),
            Sm2Scheduler::with_history_limit(config.history_limit),
            exam_dates,
            config.day_rollover,
            Box::new(SystemClock),
            rng,
        ))
    }

    pub fn today(&self) -> NaiveDate {
        self.rollover.today(self.clock.as_ref())
    }

    /// Run a play set to completion or until the user leaves.
    pub fn run(
        &mut self,
        mode: FilterMode,
        questions: &[&QuizQuestion],
        store: &mut ReviewStore,
        console: &mut dyn Console,
    ) -> Result<SessionSummary> {
        let session_id = Uuid::new_v4();
        let mut counters = SessionCounters::default();
        let mut aborted = false;

        if questions.is_empty() {
            console.show("\n[No questions match this filter]\n");
            return Ok(SessionSummary {
                session_id,
                counters,
                aborted,
            });
        }

        log_session_start!(mode.title(), session_id = session_id, questions = questions.len());
        console.show(&format!("\n=== {} ({} questions) ===", mode.title(), questions.len()));

        'questions: for (index, question) in questions.iter().enumerate() {
            loop {
                match self.ask(question, index + 1, questions.len(), store, console)? {
                    Interaction::Continue => continue,
                    Interaction::Answered(outcome) => {
                        counters.record(outcome);
                        break;
                    }
                    Interaction::AbortRequested => {
                        log_session_warn!("left before the end of the play set");
                        counters.record(Outcome::Skipped);
                        aborted = true;
                        break 'questions;
                    }
                }
            }
        }

        console.show("\n=== Session summary ===");
        console.show(&format!("Correct: {}", counters.correct));
        console.show(&format!("Wrong: {}", counters.wrong));
        console.show(&format!("Unanswered (or skipped): {}", counters.unanswered));
        console.show(&format!("Total this session: {}\n", counters.total()));

        log_session_success!(
            finished,
            session_id = session_id,
            correct = counters.correct,
            wrong = counters.wrong,
            unanswered = counters.unanswered
        );

        Ok(SessionSummary {
            session_id,
            counters,
            aborted,
        })
    }

    /// Present one question and, when it was answered, reschedule and persist it.
    pub fn ask(
        &mut self,
        question: &QuizQuestion,
        position: usize,
        total: usize,
        store: &mut ReviewStore,
        console: &mut dyn Console,
    ) -> Result<Interaction> {
        let presentation = self.shuffler.present(&question.question, &mut self.rng);
        self.show_question(question, &presentation, position, total, console);

        if presentation.auto_pass() {
            log_session_warn!(
                question_id = question.id,
                "question has no answer marked correct, counting it as passed"
            );
            console.show("[This question has no correct answer marked. Counted as correct.]");
            self.pause(console)?;
            return Ok(Interaction::Answered(Outcome::Correct));
        }

        let Some(input) = console.prompt("Your answer: ")? else {
            return Ok(Interaction::AbortRequested);
        };

        if is_exit_sentinel(&input) {
            let confirm = console.prompt("Leave this session? (y/n): ")?;
            return Ok(match confirm.as_deref().map(|s| s.trim().to_lowercase()) {
                None => Interaction::AbortRequested,
                Some(answer) if answer == "y" || answer == "s" => Interaction::AbortRequested,
                Some(_) => Interaction::Continue,
            });
        }

        let outcome = if input.trim().is_empty() {
            Outcome::Skipped
        } else if validate(&input, &presentation.correct_letters) {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };

        let today = self.today();
        let deadline = self.exam_dates.deadline_for(&question.course);
        let previous = store.state_or_init(question.id, today);
        let (state, log) = self.scheduler.schedule(&previous, outcome, today, deadline);
        let next_review = state.next_review;
        store.record(question.id, state);

        if let Err(e) = store.save() {
            log_session_error!(question_id = question.id, error = e, "review state not saved");
            let message = QuizError::Storage(e).report_with_context(
                ErrorContext::new("save_review", "performance").with_id(&question.id.to_string()),
            );
            console.show(&format!("[{}]", message));
        }

        log_session_success!(
            answer,
            question_id = question.id,
            outcome = outcome.as_str(),
            interval = log.scheduled_days
        );

        self.show_verdict(question, &presentation, &input, outcome, console);
        if let Some(next) = next_review {
            let capped = if log.capped { " (capped by exam date)" } else { "" };
            console.show(&format!(
                "Next review: {} (in {} day(s)){}",
                next, log.scheduled_days, capped
            ));
        }
        self.pause(console)?;

        Ok(Interaction::Answered(outcome))
    }

    fn show_question(
        &self,
        question: &QuizQuestion,
        presentation: &Presentation,
        position: usize,
        total: usize,
        console: &mut dyn Console,
    ) {
        console.show(&format!("\n[{}/{}] {} (#{})", position, total, question.source, question.id));
        console.show(&format!("{}\n", question.question.question.trim()));
        for answer in &presentation.answers {
            console.show(&format!("[{}] {}", answer.letter, answer.text));
        }
        console.show("\n[0] Leave this session\n");
        if presentation.is_multi_select() {
            console.show("More than one answer may be correct. Example: 'A,C'");
        }
    }

    fn show_verdict(
        &self,
        question: &QuizQuestion,
        presentation: &Presentation,
        input: &str,
        outcome: Outcome,
        console: &mut dyn Console,
    ) {
        let expected = presentation
            .correct_letters
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        match outcome {
            Outcome::Correct => console.show("\nCORRECT!\n"),
            Outcome::Wrong => console.show(&format!("\nWRONG! Correct answer: {}\n", expected)),
            Outcome::Skipped => console.show(&format!("\nSKIPPED. Correct answer: {}\n", expected)),
        }

        if let Some(explanation) = &presentation.explanation {
            console.show(&format!("EXPLANATION:\n{}\n", explanation));
        }

        if outcome == Outcome::Wrong {
            let chosen: BTreeSet<char> = parse_letters(input)
                .iter()
                .filter_map(|token| {
                    let mut chars = token.chars();
                    match (chars.next(), chars.next()) {
                        (Some(letter), None) => Some(letter),
                        _ => None,
                    }
                })
                .collect();
            for message in self.shuffler.wrong_feedback(&question.question, presentation, &chosen) {
                console.show(&message);
            }
        }
    }

    fn pause(&self, console: &mut dyn Console) -> Result<()> {
        console.prompt("\nPress Enter to continue...")?;
        Ok(())
    }
}
