use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{ErrorContext, QuizError};
use crate::models::{Question, QuizFile};
use crate::{log_service_start, log_service_success, log_service_warn};

pub const EXAM_DATES_FILE_NAME: &str = "exam_dates.json";

/// Result of reading one content file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileLoad {
    Loaded {
        file_name: Option<String>,
        questions: Vec<Question>,
    },
    Disabled,
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredFile {
    /// Path relative to the data root, always `/`-separated.
    pub relative_path: String,
    pub mtime: i64,
    pub load: FileLoad,
}

/// Course a file belongs to: its top-level folder, or its stem when the file
/// sits directly in the data root.
pub fn course_of(relative_path: &str) -> String {
    let mut parts = relative_path.split('/');
    let first = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return first.to_string();
    }
    Path::new(first)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| first.to_string())
}

pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse the text of a content file into its live questions. Entries without
/// both a `question` and an `answers` key are not questions and are skipped.
pub fn parse_quiz_document(text: &str) -> FileLoad {
    let file: QuizFile = match serde_json::from_str(text) {
        Ok(file) => file,
        Err(e) => return FileLoad::Unreadable(format!("Error loading JSON: {}", e)),
    };

    if file.disabled {
        return FileLoad::Disabled;
    }

    let Some(entries) = file.questions else {
        return FileLoad::Unreadable("Missing 'questions' list".to_string());
    };

    let mut questions = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let has_keys = entry
            .as_object()
            .is_some_and(|obj| obj.contains_key("question") && obj.contains_key("answers"));
        if !has_keys {
            debug!(position, "Skipping entry without question/answers keys");
            continue;
        }
        match serde_json::from_value::<Question>(entry) {
            Ok(question) => questions.push(question),
            Err(e) => warn!(position, error = %e, "Skipping malformed question entry"),
        }
    }

    FileLoad::Loaded {
        file_name: file.file_name,
        questions,
    }
}

pub fn load_quiz_file(path: &Path) -> FileLoad {
    match fs::read_to_string(path) {
        Ok(text) => parse_quiz_document(&text),
        Err(e) => FileLoad::Unreadable(format!("Error reading file: {}", e)),
    }
}

fn modified_nanos(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(since_epoch.as_nanos()).ok()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_content_file(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_file()
        && name.to_lowercase().ends_with(".json")
        && name != EXAM_DATES_FILE_NAME
}

/// Content files under a data root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `*.json` content file, sorted by relative path. Hidden files and
    /// folders (including the index) and the exam-date table are excluded.
    pub fn discover_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log_service_warn!("quiz_source", "discover", format!("skipping unreadable path: {}", e));
                    None
                }
            })
            .filter(is_content_file)
            .map(|entry| entry.into_path())
            .collect();
        paths.sort_by_key(|path| relative_path(&self.root, path));
        paths
    }

    /// Discover and read every content file. Finding none at all is fatal.
    pub fn scan(&self) -> Result<Vec<DiscoveredFile>, QuizError> {
        let started = Instant::now();
        log_service_start!("quiz_source", "scan", path = self.root.display());

        let paths = self.discover_paths();
        if paths.is_empty() {
            return Err(QuizError::NoQuizFiles(self.root.display().to_string()));
        }

        let files = paths
            .iter()
            .map(|path| {
                let relative_path = relative_path(&self.root, path);
                let (mtime, load) = match modified_nanos(path) {
                    Some(mtime) => (mtime, load_quiz_file(path)),
                    None => (0, FileLoad::Unreadable("Could not read modification time".to_string())),
                };
                if let FileLoad::Unreadable(reason) = &load {
                    QuizError::MalformedFile {
                        path: relative_path.clone(),
                        reason: reason.clone(),
                    }
                    .report_with_context(
                        ErrorContext::new("scan", "quiz_file").with_id(&relative_path),
                    );
                }
                DiscoveredFile {
                    relative_path,
                    mtime,
                    load,
                }
            })
            .collect::<Vec<_>>();

        log_service_success!(
            "quiz_source",
            "scan",
            count = files.len(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_course_of() {
        assert_eq!(course_of("Algebra/unit1/a.json"), "Algebra");
        assert_eq!(course_of("Algebra/a.json"), "Algebra");
        assert_eq!(course_of("history.json"), "history");
    }

    #[test]
    fn test_parse_missing_questions() {
        let load = parse_quiz_document(r#"{"foo": []}"#);
        assert!(matches!(load, FileLoad::Unreadable(ref r) if r.contains("Missing 'questions'")));
    }

    #[test]
    fn test_parse_invalid_json() {
        let load = parse_quiz_document("{bad json}");
        assert!(matches!(load, FileLoad::Unreadable(ref r) if r.contains("Error loading JSON")));
    }

    #[test]
    fn test_parse_disabled_file() {
        let load = parse_quiz_document(r#"{"disabled": true, "questions": []}"#);
        assert_eq!(load, FileLoad::Disabled);
    }

    #[test]
    fn test_parse_skips_entries_without_keys() {
        let load = parse_quiz_document(
            r#"{"file_name": "Unit 1", "questions": [
                {"q": "old style", "answers": []},
                {"question": "Kept", "answers": [{"text": "x", "correct": true}]},
                {"question": "No answers"}
            ]}"#,
        );
        match load {
            FileLoad::Loaded { file_name, questions } => {
                assert_eq!(file_name.as_deref(), Some("Unit 1"));
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].question, "Kept");
            }
            other => panic!("unexpected load result: {:?}", other),
        }
    }

    #[test]
    fn test_discover_skips_non_content_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Course/unit")).unwrap();
        fs::write(root.join("b.json"), r#"{"questions":[]}"#).unwrap();
        fs::write(root.join("Course/unit/a.JSON"), r#"{"questions":[]}"#).unwrap();
        fs::write(root.join("notes.txt"), "Not a JSON quiz").unwrap();
        fs::write(root.join(".quiz_index.json"), "{}").unwrap();
        fs::write(root.join(EXAM_DATES_FILE_NAME), "{}").unwrap();

        let source = DirectorySource::new(root);
        let found: Vec<String> = source
            .discover_paths()
            .iter()
            .map(|p| relative_path(root, p))
            .collect();
        assert_eq!(found, vec!["Course/unit/a.JSON", "b.json"]);
    }

    #[test]
    fn test_scan_empty_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = DirectorySource::new(dir.path()).scan();
        assert!(matches!(result, Err(QuizError::NoQuizFiles(_))));
    }

    #[test]
    fn test_scan_reports_unreadable_but_continues() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{bad json}").unwrap();
        fs::write(
            dir.path().join("good.json"),
            r#"{"questions":[{"question":"Q","answers":[{"text":"A","correct":true}]}]}"#,
        )
        .unwrap();

        let files = DirectorySource::new(dir.path()).scan().unwrap();
        assert_eq!(files.len(), 2);
        assert!(matches!(files[0].load, FileLoad::Unreadable(_)));
        assert!(matches!(files[1].load, FileLoad::Loaded { .. }));
        assert!(files[1].mtime > 0);
    }
}
