use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::log_store_operation;

/// `<file>.bak` next to the given path.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// `<file>.corrupt`, where an unparseable file is moved before a save.
pub fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parses_as_json(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|text| serde_json::from_str::<serde_json::Value>(&text).is_ok())
        .unwrap_or(false)
}

/// Read a JSON record. A file that cannot be read or parsed is replaced by
/// its `.bak` copy when that one loads, and by the default value otherwise.
/// Neither file is modified here.
pub fn load_json_or_default<T>(path: &Path, label: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(store = label, path = %path.display(), "No existing file, starting empty");
            return T::default();
        }
        _ => {}
    }

    let error = match read_json(path) {
        Ok(value) => {
            log_store_operation!(debug, "load", store = label, path = path.display());
            return value;
        }
        Err(e) => e,
    };

    let backup = backup_path(path);
    match read_json(&backup) {
        Ok(value) => {
            warn!(
                store = label,
                path = %path.display(),
                backup = %backup.display(),
                error = %error,
                "Could not load {}, restored the backup copy", label
            );
            value
        }
        Err(_) => {
            warn!(store = label, path = %path.display(), error = %error, "Could not load {}, starting empty", label);
            T::default()
        }
    }
}

/// Write a JSON record so that a crash mid-write never clobbers the previous
/// good copy. The value goes to a temp file beside the target, which is then
/// renamed into place. A current file that parses becomes the new `.bak`;
/// one that does not is moved to `.corrupt` and the old `.bak` stays.
pub fn save_json_with_backup<T: Serialize>(path: &Path, value: &T, label: &str) -> Result<()> {
    write_with_backup(path, value, label).inspect_err(|e| {
        log_store_operation!(error, "save", store = label, error = format!("{:#}", e));
    })
}

fn write_with_backup<T: Serialize>(path: &Path, value: &T, label: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating directory for {} at {}", label, dir.display()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("creating temp file for {} in {}", label, dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value)
        .with_context(|| format!("serializing {}", label))?;
    tmp.write_all(b"\n")?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("flushing {}", label))?;

    if path.exists() {
        if parses_as_json(path) {
            let backup = backup_path(path);
            fs::copy(path, &backup)
                .with_context(|| format!("backing up {} to {}", label, backup.display()))?;
        } else {
            let aside = corrupt_path(path);
            fs::rename(path, &aside)
                .with_context(|| format!("moving unreadable {} to {}", label, aside.display()))?;
            warn!(store = label, path = %aside.display(), "Moved unreadable {} aside", label);
        }
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {} at {}", label, path.display()))?;

    log_store_operation!(debug, "save", store = label, path = path.display());
    Ok(())
}
