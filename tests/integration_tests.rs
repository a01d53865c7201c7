use chrono::{Duration, NaiveDate};
use quiz_scheduler::session::Console;
use quiz_scheduler::{
    ContentIndex, DayRollover, DirectorySource, ExamDates, FixedClock, Interaction, Outcome,
    ReviewStore, SessionEngine, Shuffler, Sm2Scheduler, reconcile,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SEED: u64 = 42;

struct ScriptedConsole {
    inputs: VecDeque<String>,
    output: Vec<String>,
}

impl ScriptedConsole {
    fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: Vec::new(),
        }
    }

    fn transcript(&self) -> String {
        self.output.join("\n")
    }
}

impl Console for ScriptedConsole {
    fn show(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        self.output.push(label.to_string());
        Ok(self.inputs.pop_front())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()
}

fn engine(seed: u64, exam_dates: ExamDates) -> SessionEngine {
    SessionEngine::new(
        Shuffler::default(),
        Sm2Scheduler::new(),
        exam_dates,
        DayRollover::default(),
        Box::new(FixedClock(today().and_hms_opt(10, 0, 0).unwrap())),
        StdRng::seed_from_u64(seed),
    )
}

fn write_quiz(root: &Path, relative: &str, value: serde_json::Value) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn two_of_four() -> serde_json::Value {
    json!({
        "file_name": "Sets",
        "questions": [{
            "question": "Which of these are subsets of {1, 2}?",
            "answers": [
                {"text": "{1}", "correct": true},
                {"text": "{3}", "correct": false},
                {"text": "{}", "correct": true},
                {"text": "{1, 3}", "correct": false}
            ],
            "explanation": "a and c are correct"
        }]
    })
}

#[test]
fn test_end_to_end_multi_select_session() {
    let data = TempDir::new().unwrap();
    write_quiz(data.path(), "CourseX/sets.json", two_of_four());

    let discovered = DirectorySource::new(data.path()).scan().unwrap();
    let reconciliation = reconcile(&ContentIndex::new(), &discovered);
    assert_eq!(reconciliation.questions.len(), 1);
    let question = &reconciliation.questions[0];
    assert_eq!(question.id, 1);
    assert_eq!(question.course, "CourseX");

    // Same seed, same first shuffle as the engine below.
    let presentation = Shuffler::default().present(&question.question, &mut StdRng::seed_from_u64(SEED));
    let letters: Vec<char> = presentation.correct_letters.iter().copied().collect();
    assert_eq!(letters.len(), 2);
    let (first, second) = (letters[0], letters[1]);

    let styles = [
        format!("{},{}", first, second),
        format!("{} {}", second, first),
        format!("{};{}", first.to_ascii_lowercase(), second.to_ascii_lowercase()),
        format!(" {} ,  {} ", second, first.to_ascii_lowercase()),
    ];

    for style in &styles {
        let state_dir = TempDir::new().unwrap();
        let mut store = ReviewStore::open(state_dir.path().join("quiz_performance.json"));
        let mut console = ScriptedConsole::new(&[style.as_str(), ""]);

        let result = engine(SEED, ExamDates::default())
            .ask(question, 1, 1, &mut store, &mut console)
            .unwrap();
        assert_eq!(result, Interaction::Answered(Outcome::Correct), "input {:?}", style);

        let state = store.get(question.id).unwrap();
        assert_eq!(state.repetition, 1);
        assert_eq!(state.interval, 1);
        assert!((state.ease - 2.6).abs() < 1e-9);
        assert_eq!(state.next_review, Some(today() + Duration::days(1)));

        let transcript = console.transcript();
        assert!(transcript.contains(&format!("{} and {} are correct", first, second)));

        let persisted = ReviewStore::open(state_dir.path().join("quiz_performance.json"));
        assert_eq!(persisted.get(question.id), Some(state));
    }
}

#[test]
fn test_wrong_answer_shows_per_choice_feedback() {
    let data = TempDir::new().unwrap();
    write_quiz(
        data.path(),
        "logic.json",
        json!({
            "questions": [{
                "question": "Pick the tautology",
                "answers": [
                    {"text": "p or not p", "correct": true},
                    {"text": "p and not p"}
                ],
                "wrongmsg": ["", "That one is never true, unlike a"]
            }]
        }),
    );

    let discovered = DirectorySource::new(data.path()).scan().unwrap();
    let questions = reconcile(&ContentIndex::new(), &discovered).questions;
    let question = &questions[0];
    assert_eq!(question.course, "logic");

    let presentation = Shuffler::default().present(&question.question, &mut StdRng::seed_from_u64(SEED));
    let correct = *presentation.correct_letters.iter().next().unwrap();
    let wrong = if correct == 'A' { 'B' } else { 'A' };

    let state_dir = TempDir::new().unwrap();
    let mut store = ReviewStore::open(state_dir.path().join("perf.json"));
    let wrong_input = wrong.to_string();
    let mut console = ScriptedConsole::new(&[wrong_input.as_str(), ""]);

    let result = engine(SEED, ExamDates::default())
        .ask(question, 1, 1, &mut store, &mut console)
        .unwrap();
    assert_eq!(result, Interaction::Answered(Outcome::Wrong));

    let transcript = console.transcript();
    assert!(transcript.contains(&format!("That one is never true, unlike {}", correct)));

    let state = store.get(question.id).unwrap();
    assert_eq!(state.repetition, 0);
    assert_eq!(state.interval, 1);
    assert!((state.ease - 1.7).abs() < 1e-9);
}

#[test]
fn test_exam_date_from_data_folder_caps_interval() {
    let data = TempDir::new().unwrap();
    write_quiz(data.path(), "CourseY/unit.json", two_of_four());
    fs::write(
        data.path().join("exam_dates.json"),
        r#"{"CourseY": "2025-05-07"}"#,
    )
    .unwrap();

    let discovered = DirectorySource::new(data.path()).scan().unwrap();
    assert_eq!(discovered.len(), 1);
    let questions = reconcile(&ContentIndex::new(), &discovered).questions;
    let question = &questions[0];

    let exam_dates = ExamDates::load(&data.path().join("exam_dates.json"));
    let state_dir = TempDir::new().unwrap();
    let mut store = ReviewStore::open(state_dir.path().join("perf.json"));

    let mut state = Sm2Scheduler::new().initial_state(today());
    state.repetition = 2;
    state.interval = 3;
    state.ease = 2.7;
    store.record(question.id, state);

    let presentation = Shuffler::default().present(&question.question, &mut StdRng::seed_from_u64(SEED));
    let answer: String = presentation
        .correct_letters
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mut console = ScriptedConsole::new(&[answer.as_str(), ""]);

    engine(SEED, exam_dates)
        .ask(question, 1, 1, &mut store, &mut console)
        .unwrap();

    let updated = store.get(question.id).unwrap();
    assert_eq!(updated.interval, 2);
    assert_eq!(updated.next_review, NaiveDate::from_ymd_opt(2025, 5, 7));
}
