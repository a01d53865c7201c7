use std::collections::BTreeSet;
use std::time::Instant;

use crate::content_index::{ContentIndex, FileRecord, IndexedQuestion};
use crate::fingerprint::fingerprint_question;
use crate::models::QuizQuestion;
use crate::quiz_source::{DiscoveredFile, FileLoad, course_of};
use crate::{log_performance, log_reconcile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub files_live: usize,
    pub files_reused: usize,
    pub files_fingerprinted: usize,
    pub files_dropped: usize,
    pub ids_allocated: u64,
    pub newly_archived: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub index: ContentIndex,
    pub questions: Vec<QuizQuestion>,
    pub report: ReconcileReport,
}

/// Compare freshly discovered content against the previous index, assigning
/// or reusing ids and archiving ids that no longer belong to any live file.
///
/// Files whose modification time matches the previous record reuse their
/// stored ids without re-fingerprinting. `merged_questions` lists live
/// questions file by file, in file order.
pub fn reconcile(previous: &ContentIndex, discovered: &[DiscoveredFile]) -> Reconciliation {
    let started = Instant::now();
    let mut index = previous.clone();
    let mut report = ReconcileReport::default();
    let mut questions = Vec::new();
    let mut archived_now = BTreeSet::new();
    let mut seen = BTreeSet::new();

    for file in discovered {
        let path = file.relative_path.as_str();
        seen.insert(path);
        let prior = previous.files.get(path);

        let live_questions = match &file.load {
            FileLoad::Loaded { questions, .. } => questions,
            FileLoad::Disabled | FileLoad::Unreadable(_) => {
                if let Some(prior) = prior {
                    archived_now.extend(index.archive(prior.ids()));
                    index.files.remove(path);
                    report.files_dropped += 1;
                    log_reconcile!(drop, path = path, ids = prior.questions.len());
                }
                continue;
            }
        };

        let reusable = prior.filter(|record| {
            record.mtime == file.mtime && record.questions.len() == live_questions.len()
        });
        let entries: Vec<IndexedQuestion> = match reusable {
            Some(record) => {
                report.files_reused += 1;
                record.questions.clone()
            }
            None => {
                report.files_fingerprinted += 1;
                live_questions
                    .iter()
                    .map(|question| {
                        let fingerprint = fingerprint_question(question);
                        let id = index.resolve_id(&fingerprint);
                        IndexedQuestion { fingerprint, id }
                    })
                    .collect()
            }
        };

        if let Some(prior) = prior {
            let kept: BTreeSet<u64> = entries.iter().map(|entry| entry.id).collect();
            let dropped = prior.ids().filter(|id| !kept.contains(id));
            archived_now.extend(index.archive(dropped));
        }

        let course = course_of(path);
        questions.extend(
            entries
                .iter()
                .zip(live_questions)
                .map(|(entry, question)| QuizQuestion {
                    id: entry.id,
                    source: path.to_string(),
                    course: course.clone(),
                    question: question.clone(),
                }),
        );

        index.files.insert(
            path.to_string(),
            FileRecord {
                mtime: file.mtime,
                questions: entries,
            },
        );
        report.files_live += 1;
    }

    let vanished: Vec<String> = previous
        .files
        .keys()
        .filter(|path| !seen.contains(path.as_str()))
        .cloned()
        .collect();
    for path in vanished {
        if let Some(record) = index.files.remove(&path) {
            archived_now.extend(index.archive(record.ids()));
            report.files_dropped += 1;
            log_reconcile!(drop, path = path, ids = record.questions.len());
        }
    }

    // A question moved between files, or restored after removal, is live again.
    let live = index.live_ids();
    index.archived.retain(|id| !live.contains(id));
    archived_now.retain(|id| !live.contains(id));

    report.ids_allocated = index.next_id - previous.next_id;
    report.newly_archived = archived_now.into_iter().collect();

    log_reconcile!(
        done,
        files = report.files_live,
        reused = report.files_reused,
        allocated = report.ids_allocated,
        archived = report.newly_archived.len()
    );
    log_performance!("reconcile", duration_ms = started.elapsed().as_millis() as u64);

    Reconciliation {
        index,
        questions,
        report,
    }
}
