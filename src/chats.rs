//! Per-project chat history files.
//!
//! Each project gets one JSON file under the chats directory, named by
//! the sanitized project name. A project that has no file yet loads as
//! an empty history, and a corrupt file is treated the same so chat
//! never hard-fails on a bad history.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::types::ChatMessage;
use crate::util::{atomic_write_str, sanitize_project_name};

pub const CHAT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub project: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

pub struct ChatArchive {
    dir: PathBuf,
}

impl ChatArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn project_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_project_name(name)))
    }

    /// Sorted list of project slugs that have a history file.
    pub fn list_projects(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    Some(path.file_stem()?.to_str()?.to_string())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a project's history. Missing or unreadable files load as an
    /// empty history.
    pub fn load(&self, name: &str) -> ChatHistory {
        let path = self.project_path(name);
        let empty = || ChatHistory {
            project: sanitize_project_name(name),
            messages: Vec::new(),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return empty(),
        };
        match serde_json::from_str(&content) {
            Ok(history) => history,
            Err(e) => {
                log::warn!("Corrupt chat history at {}: {}", path.display(), e);
                empty()
            }
        }
    }

    /// Append one message and persist the full history.
    pub fn save_message(&self, name: &str, role: &str, content: &str) -> Result<(), StoreError> {
        let mut history = self.load(name);
        history.project = sanitize_project_name(name);
        history.messages.push(ChatMessage {
            timestamp: Utc::now().format(CHAT_TIMESTAMP_FORMAT).to_string(),
            role: role.to_string(),
            content: content.to_string(),
        });
        self.write(name, &history)
    }

    /// Replace a project's messages wholesale (used by history edits).
    pub fn overwrite(&self, name: &str, messages: Vec<ChatMessage>) -> Result<(), StoreError> {
        let history = ChatHistory {
            project: sanitize_project_name(name),
            messages,
        };
        self.write(name, &history)
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.project_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Plain-text transcript: one `[timestamp] ROLE: content` line per
    /// message.
    pub fn export_text(&self, name: &str) -> String {
        let history = self.load(name);
        history
            .messages
            .iter()
            .map(|m| {
                let who = if m.role == "user" { "USER" } else { "ASSISTANT" };
                format!("[{}] {}: {}", m.timestamp, who, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write(&self, name: &str, history: &ChatHistory) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(history)?;
        atomic_write_str(&self.project_path(name), &content)?;
        Ok(())
    }
}

impl ChatArchive {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
