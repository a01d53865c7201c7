use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::errors::{ErrorContext, QuizError};
use crate::persistence::load_json_or_default;

/// Per-course exam dates, read from a `{"Course": "YYYY-MM-DD"}` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamDates {
    by_course: HashMap<String, NaiveDate>,
}

impl ExamDates {
    pub fn load(path: &Path) -> Self {
        let raw: BTreeMap<String, String> = load_json_or_default(path, "exam-dates");
        Self::from_raw(raw)
    }

    /// Entries that are not ISO dates are reported and ignored.
    pub fn from_raw(raw: BTreeMap<String, String>) -> Self {
        let mut by_course = HashMap::new();
        for (course, value) in raw {
            match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
                Ok(date) => {
                    by_course.insert(course, date);
                }
                Err(_) => {
                    QuizError::InvalidExamDate {
                        course: course.clone(),
                        value,
                    }
                    .report_with_context(ErrorContext::new("load_exam_dates", "course").with_id(&course));
                }
            }
        }
        Self { by_course }
    }

    pub fn insert(&mut self, course: impl Into<String>, date: NaiveDate) {
        self.by_course.insert(course.into(), date);
    }

    pub fn deadline_for(&self, course: &str) -> Option<NaiveDate> {
        self.by_course.get(course).copied()
    }

    pub fn len(&self) -> usize {
        self.by_course.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_course.is_empty()
    }
}
