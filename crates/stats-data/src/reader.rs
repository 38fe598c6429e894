//! Export layout discovery.
//!
//! A chat export stores each conversation in its own directory under the
//! inbox, holding exactly one `message_1.json`. This module finds those
//! directories and reads the raw JSON bytes for the loader.

use std::path::{Path, PathBuf};

use stats_core::error::{Result, StatsError};
use tracing::{debug, warn};

/// The only message file name the loader accepts.
pub const MESSAGES_FILE_NAME: &str = "message_1.json";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all conversation directories directly under `inbox`, sorted by path.
///
/// Fails with a layout error when `inbox` is missing or not a directory.
pub fn find_conversation_dirs(inbox: &Path) -> Result<Vec<PathBuf>> {
    if !inbox.is_dir() {
        return Err(StatsError::layout(inbox, "inbox directory does not exist"));
    }

    let mut dirs: Vec<PathBuf> = walkdir::WalkDir::new(inbox)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable inbox entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();

    dirs.sort();
    debug!(
        "Found {} conversation directories in {}",
        dirs.len(),
        inbox.display()
    );
    Ok(dirs)
}

/// Locate the message file of one conversation directory.
///
/// The directory must contain exactly one `*.json` file and it must be named
/// [`MESSAGES_FILE_NAME`].
pub fn locate_messages_file(chat_dir: &Path) -> Result<PathBuf> {
    if !chat_dir.is_dir() {
        return Err(StatsError::layout(
            chat_dir,
            "conversation directory does not exist",
        ));
    }

    let json_files: Vec<PathBuf> = walkdir::WalkDir::new(chat_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    match json_files.as_slice() {
        [] => Err(StatsError::layout(chat_dir, "no JSON file found")),
        [only] => {
            if only.file_name().map(|n| n == MESSAGES_FILE_NAME) == Some(true) {
                Ok(only.clone())
            } else {
                Err(StatsError::layout(
                    chat_dir,
                    format!(
                        "expected {} but found {}",
                        MESSAGES_FILE_NAME,
                        only.display()
                    ),
                ))
            }
        }
        many => Err(StatsError::layout(
            chat_dir,
            format!("expected exactly 1 JSON file, found {}", many.len()),
        )),
    }
}

/// Read one conversation directory.
///
/// Returns the conversation identifier (the directory name) and the raw bytes
/// of its message file.
pub fn read_conversation(chat_dir: &Path) -> Result<(String, Vec<u8>)> {
    let id = conversation_id(chat_dir)?;
    let path = locate_messages_file(chat_dir)?;
    debug!("Loading messages file '{}'", path.display());

    let bytes = std::fs::read(&path).map_err(|source| StatsError::FileRead {
        path: path.clone(),
        source,
    })?;
    Ok((id, bytes))
}

/// The identifier of a conversation directory: its final path component.
///
/// Names that are not valid UTF-8 are rejected rather than mapped lossily, so
/// two distinct directories never share an id.
pub fn conversation_id(chat_dir: &Path) -> Result<String> {
    let name = chat_dir
        .file_name()
        .ok_or_else(|| StatsError::layout(chat_dir, "path has no directory name"))?;
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| StatsError::layout(chat_dir, "directory name is not valid UTF-8"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
