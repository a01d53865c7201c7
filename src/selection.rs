use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use crate::models::{FilterMode, Outcome, QuizQuestion, QuizScope, ReviewState, ScopeStats};
use crate::review_store::ReviewStore;

/// A question is due when it has never been scheduled or its review date has come.
pub fn is_due(state: Option<&ReviewState>, today: NaiveDate) -> bool {
    match state.and_then(|s| s.next_review) {
        None => true,
        Some(next) => next <= today,
    }
}

pub fn questions_in_scope<'a>(
    questions: &'a [QuizQuestion],
    archived: &BTreeSet<u64>,
    scope: &QuizScope,
) -> Vec<&'a QuizQuestion> {
    questions
        .iter()
        .filter(|q| !archived.contains(&q.id))
        .filter(|q| match scope {
            QuizScope::Repository => true,
            QuizScope::File(path) => &q.source == path,
            QuizScope::Tag(tag) => q.question.tags.iter().any(|t| t == tag),
        })
        .collect()
}

/// Play set for a scope and filter, in load order. The wrong-or-skipped
/// filter orders the most often missed questions first.
pub fn select<'a>(
    questions: &'a [QuizQuestion],
    archived: &BTreeSet<u64>,
    store: &ReviewStore,
    scope: &QuizScope,
    mode: FilterMode,
    today: NaiveDate,
) -> Vec<&'a QuizQuestion> {
    let mut seen = HashSet::new();
    let mut selected: Vec<&QuizQuestion> = questions_in_scope(questions, archived, scope)
        .into_iter()
        .filter(|q| seen.insert(q.id))
        .filter(|q| {
            let state = store.get(q.id);
            let last = state.and_then(ReviewState::last_outcome);
            match mode {
                FilterMode::Due => is_due(state, today),
                FilterMode::All => true,
                FilterMode::Unanswered => state.is_none_or(|s| s.history.is_empty()),
                FilterMode::Wrong => last == Some(Outcome::Wrong),
                FilterMode::Skipped => last == Some(Outcome::Skipped),
                FilterMode::WrongOrSkipped => {
                    matches!(last, Some(Outcome::Wrong) | Some(Outcome::Skipped))
                }
            }
        })
        .collect();

    if mode == FilterMode::WrongOrSkipped {
        selected.sort_by_key(|q| {
            std::cmp::Reverse(store.get(q.id).map_or(0, ReviewState::wrong_count))
        });
    }
    selected
}

pub fn scope_stats(
    questions: &[QuizQuestion],
    archived: &BTreeSet<u64>,
    store: &ReviewStore,
    scope: &QuizScope,
    today: NaiveDate,
) -> ScopeStats {
    let mut stats = ScopeStats::default();
    let mut seen = HashSet::new();
    for question in questions_in_scope(questions, archived, scope) {
        if !seen.insert(question.id) {
            continue;
        }
        let state = store.get(question.id);
        stats.total += 1;
        match state.and_then(ReviewState::last_outcome) {
            None => stats.never += 1,
            Some(Outcome::Skipped) => stats.skipped += 1,
            Some(Outcome::Wrong) => stats.wrong += 1,
            Some(Outcome::Correct) => stats.correct += 1,
        }
        if is_due(state, today) {
            stats.due += 1;
        }
    }
    stats
}

pub fn all_tags(questions: &[QuizQuestion], archived: &BTreeSet<u64>) -> Vec<String> {
    questions
        .iter()
        .filter(|q| !archived.contains(&q.id))
        .flat_map(|q| q.question.tags.iter())
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;
    use chrono::Duration;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()
    }

    fn quiz(id: u64, source: &str, tags: &[&str]) -> QuizQuestion {
        QuizQuestion {
            id,
            source: source.to_string(),
            course: "CourseX".to_string(),
            question: Question {
                question: format!("Q{}", id),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Question::default()
            },
        }
    }

    fn state(history: &[Outcome], next_review: Option<NaiveDate>) -> ReviewState {
        ReviewState {
            history: history.to_vec(),
            next_review,
            ..ReviewState::default()
        }
    }

    fn fixture(dir: &TempDir) -> (Vec<QuizQuestion>, ReviewStore) {
        let questions = vec![
            quiz(1, "CourseX/a.json", &["sets"]),
            quiz(2, "CourseX/a.json", &[]),
            quiz(3, "CourseX/b.json", &["sets", "logic"]),
            quiz(4, "CourseX/b.json", &[]),
            quiz(5, "CourseX/b.json", &[]),
        ];
        let mut store = ReviewStore::open(dir.path().join("perf.json"));
        store.record(2, state(&[Outcome::Wrong], Some(today())));
        store.record(
            3,
            state(&[Outcome::Wrong, Outcome::Wrong, Outcome::Skipped], Some(today() + Duration::days(1))),
        );
        store.record(4, state(&[Outcome::Correct], Some(today() + Duration::days(3))));
        store.record(5, state(&[Outcome::Wrong, Outcome::Wrong, Outcome::Wrong], Some(today() - Duration::days(1))));
        (questions, store)
    }

    fn ids(selected: &[&QuizQuestion]) -> Vec<u64> {
        selected.iter().map(|q| q.id).collect()
    }

    #[test]
    fn test_due_rule() {
        assert!(is_due(None, today()));
        assert!(is_due(Some(&state(&[], None)), today()));
        assert!(is_due(Some(&state(&[], Some(today()))), today()));
        assert!(!is_due(Some(&state(&[], Some(today() + Duration::days(1)))), today()));
    }

    #[test]
    fn test_filters() {
        let dir = TempDir::new().unwrap();
        let (questions, store) = fixture(&dir);
        let archived = BTreeSet::new();
        let run = |mode| ids(&select(&questions, &archived, &store, &QuizScope::Repository, mode, today()));

        assert_eq!(run(FilterMode::Due), vec![1, 2, 5]);
        assert_eq!(run(FilterMode::All), vec![1, 2, 3, 4, 5]);
        assert_eq!(run(FilterMode::Unanswered), vec![1]);
        assert_eq!(run(FilterMode::Wrong), vec![2, 5]);
        assert_eq!(run(FilterMode::Skipped), vec![3]);
        assert_eq!(run(FilterMode::WrongOrSkipped), vec![5, 3, 2]);
    }

    #[test]
    fn test_scopes_and_archive() {
        let dir = TempDir::new().unwrap();
        let (questions, store) = fixture(&dir);
        let archived: BTreeSet<u64> = [4].into_iter().collect();

        let by_file = select(
            &questions,
            &archived,
            &store,
            &QuizScope::File("CourseX/b.json".to_string()),
            FilterMode::All,
            today(),
        );
        assert_eq!(ids(&by_file), vec![3, 5]);

        let by_tag = select(
            &questions,
            &archived,
            &store,
            &QuizScope::Tag("sets".to_string()),
            FilterMode::All,
            today(),
        );
        assert_eq!(ids(&by_tag), vec![1, 3]);
    }

    #[test]
    fn test_scope_stats() {
        let dir = TempDir::new().unwrap();
        let (questions, store) = fixture(&dir);
        let stats = scope_stats(&questions, &BTreeSet::new(), &store, &QuizScope::Repository, today());
        assert_eq!(
            stats,
            ScopeStats {
                total: 5,
                never: 1,
                skipped: 1,
                wrong: 2,
                correct: 1,
                due: 3,
            }
        );
    }

    #[test]
    fn test_all_tags_sorted_and_unique() {
        let dir = TempDir::new().unwrap();
        let (questions, _) = fixture(&dir);
        assert_eq!(all_tags(&questions, &BTreeSet::new()), vec!["logic", "sets"]);
        let archived: BTreeSet<u64> = [3].into_iter().collect();
        assert_eq!(all_tags(&questions, &archived), vec!["sets"]);
    }
}
