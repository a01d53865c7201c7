use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// Feedback shown after a wrong answer. A single message applies to every
/// wrong choice; a list is indexed by the answer's original position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WrongFeedback {
    Message(String),
    PerChoice(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrongmsg: Option<WrongFeedback>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.correct).count()
    }
}

/// On-disk shape of a content file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizFile {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub questions: Option<Vec<serde_json::Value>>,
}

/// A live question tagged with its stable id and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub id: u64,
    pub source: String,
    pub course: String,
    pub question: Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

impl Outcome {
    /// Binary grading: only a correct answer earns a passing quality.
    pub fn quality(self) -> u8 {
        match self {
            Outcome::Correct => 5,
            Outcome::Wrong | Outcome::Skipped => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
            Outcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewState {
    pub ease: f64,
    pub interval: u32,
    pub repetition: u32,
    pub next_review: Option<NaiveDate>,
    pub history: Vec<Outcome>,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease: 2.5,
            interval: 0,
            repetition: 0,
            next_review: None,
            history: Vec::new(),
        }
    }
}

impl ReviewState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            next_review: Some(today),
            ..Self::default()
        }
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.history.last().copied()
    }

    pub fn wrong_count(&self) -> usize {
        self.history
            .iter()
            .filter(|outcome| **outcome == Outcome::Wrong)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub correct: u32,
    pub wrong: u32,
    pub unanswered: u32,
}

impl SessionCounters {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Skipped => self.unanswered += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.wrong + self.unanswered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Due,
    All,
    Unanswered,
    Wrong,
    Skipped,
    WrongOrSkipped,
}

impl FilterMode {
    pub fn title(self) -> &'static str {
        match self {
            FilterMode::Due => "Scheduled for today",
            FilterMode::All => "All questions",
            FilterMode::Unanswered => "Never answered",
            FilterMode::Wrong => "Last answer wrong",
            FilterMode::Skipped => "Last answer skipped",
            FilterMode::WrongOrSkipped => "Wrong or skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizScope {
    Repository,
    File(String),
    Tag(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeStats {
    pub total: usize,
    pub never: usize,
    pub skipped: usize,
    pub wrong: usize,
    pub correct: usize,
    pub due: usize,
}
