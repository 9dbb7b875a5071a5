//! Flat-file record store.
//!
//! The whole collection lives in one pretty-printed JSON array so the
//! store file stays human-diffable and compatible with files written by
//! earlier deployments. Every read loads the full collection and every
//! write rewrites it atomically (tempfile + rename). A missing or empty
//! file reads as an empty collection; genuine I/O and parse errors
//! surface as [`StoreError`] instead of being swallowed.
//!
//! The store holds no lock itself. The server serializes mutations by
//! wrapping it in a `parking_lot::Mutex`, which is what resolves the
//! last-save-wins race between concurrent writers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::enrich::clean_note_text;
use crate::types::{DocumentRef, NewDem, Note, Priority, ProjectRecord, NOTE_DATE_FORMAT};
use crate::util::atomic_write_str;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -------------------------------------------------------------------
    // Load / save
    // -------------------------------------------------------------------

    /// Read the persisted collection. A file that doesn't exist yet (or
    /// is empty) is an empty collection, not an error.
    pub fn load(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Serialize and persist the full collection, overwriting prior
    /// content. Write failures surface to the caller.
    pub fn save(&self, records: &[ProjectRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(records)?;
        atomic_write_str(&self.path, &content)?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Create a record from the request fields and persist it. The id is
    /// derived from the creation timestamp; on a millisecond collision
    /// the counter bumps until the id is unique within the store.
    pub fn create(&self, new: &NewDem, now: DateTime<Utc>) -> Result<ProjectRecord, StoreError> {
        let mut records = self.load()?;

        let mut millis = now.timestamp_millis();
        let mut id = format!("dem_{}", millis);
        while records.iter().any(|r| r.id == id) {
            millis += 1;
            id = format!("dem_{}", millis);
        }

        let now_iso = now.to_rfc3339();
        let status = non_empty_or(&new.status, "Idea");
        let workflow_status = non_empty_or(&new.workflow_status, "Intake");

        let mut record = ProjectRecord {
            id,
            name: new.name.trim().to_string(),
            sponsor: new.sponsor.trim().to_string(),
            requester: new.requester.trim().to_string(),
            ba_owner: new.ba_owner.trim().to_string(),
            title: new.title.trim().to_string(),
            change_request: new.change_request.trim().to_string(),
            cost_center: new.cost_center.trim().to_string(),
            status,
            workflow_status,
            current_owner: new.current_owner.trim().to_string(),
            start_date: new.start_date.trim().to_string(),
            priority: new
                .priority
                .as_deref()
                .and_then(Priority::from_code)
                .unwrap_or_default(),
            notes: Vec::new(),
            documents: Vec::new(),
            doc_summary: String::new(),
            created_at: now_iso.clone(),
            updated_at: now_iso,
            archived: false,
        };

        let initial_note = new.initial_note.trim();
        if !initial_note.is_empty() {
            record.notes.push(Note {
                text: clean_note_text(initial_note),
                date: now.format(NOTE_DATE_FORMAT).to_string(),
            });
        }

        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    /// Load, locate by id (linear scan), apply the mutator, stamp
    /// `updated_at`, persist, and return the updated record. A mutator
    /// error aborts before anything is written, so `updated_at` stays
    /// untouched on validation failures.
    pub fn update(
        &self,
        id: &str,
        now: DateTime<Utc>,
        mutate: impl FnOnce(&mut ProjectRecord) -> Result<(), StoreError>,
    ) -> Result<ProjectRecord, StoreError> {
        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;

        mutate(record)?;
        record.updated_at = now.to_rfc3339();
        let updated = record.clone();

        self.save(&records)?;
        Ok(updated)
    }

    /// Remove a record permanently. No tombstone is kept.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        self.save(&records)?;
        Ok(())
    }

    /// Merge imported records into the store, keyed by id. Records that
    /// arrive without an id get a fresh timestamp id; entries that are
    /// not objects are skipped. Returns the merged collection.
    pub fn import(
        &self,
        incoming: Vec<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProjectRecord>, StoreError> {
        let mut records = self.load()?;
        let mut next_millis = now.timestamp_millis();

        for mut value in incoming {
            let Some(obj) = value.as_object_mut() else {
                continue;
            };
            let id_missing = obj
                .get("id")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().is_empty())
                .unwrap_or(true);
            if id_missing {
                while records
                    .iter()
                    .any(|r| r.id == format!("dem_{}", next_millis))
                {
                    next_millis += 1;
                }
                obj.insert(
                    "id".to_string(),
                    serde_json::Value::String(format!("dem_{}", next_millis)),
                );
                next_millis += 1;
            }

            let incoming_record: ProjectRecord = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Skipping malformed record on import: {}", e);
                    continue;
                }
            };

            match records.iter_mut().find(|r| r.id == incoming_record.id) {
                Some(existing) => *existing = incoming_record,
                None => records.push(incoming_record),
            }
        }

        self.save(&records)?;
        Ok(records)
    }

    // -------------------------------------------------------------------
    // Record operations
    // -------------------------------------------------------------------

    pub fn add_note(
        &self,
        id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation("Note text is required.".into()));
        }
        let note = Note {
            text: clean_note_text(text),
            date: now.format(NOTE_DATE_FORMAT).to_string(),
        };
        self.update(id, now, |record| {
            record.notes.push(note);
            Ok(())
        })
    }

    pub fn edit_note(
        &self,
        id: &str,
        index: usize,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Validation("Note text is required.".into()));
        }
        let note = Note {
            text: clean_note_text(text),
            date: now.format(NOTE_DATE_FORMAT).to_string(),
        };
        self.update(id, now, move |record| {
            let slot = record
                .notes
                .get_mut(index)
                .ok_or_else(|| StoreError::Validation("Invalid note index.".into()))?;
            *slot = note;
            Ok(())
        })
    }

    /// Delete the note at `index`; later notes shift down by one.
    pub fn delete_note(
        &self,
        id: &str,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        self.update(id, now, move |record| {
            if index >= record.notes.len() {
                return Err(StoreError::Validation("Invalid note index.".into()));
            }
            record.notes.remove(index);
            Ok(())
        })
    }

    pub fn set_archived(
        &self,
        id: &str,
        archived: bool,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        self.update(id, now, move |record| {
            record.archived = archived;
            Ok(())
        })
    }

    /// Record an attached document: appended to the document list, its
    /// summary kept as the current `doc_summary`, and a marker note added.
    pub fn attach_document(
        &self,
        id: &str,
        document: DocumentRef,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        let marker = Note {
            text: "AI analysis generated from attached document.".to_string(),
            date: now.format(NOTE_DATE_FORMAT).to_string(),
        };
        self.update(id, now, move |record| {
            record.doc_summary = document.summary.clone();
            record.documents.push(document);
            record.notes.push(marker);
            Ok(())
        })
    }

    pub fn clear_doc_summary(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectRecord, StoreError> {
        self.update(id, now, |record| {
            record.doc_summary.clear();
            Ok(())
        })
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::new(dir.path().join("dem_projects.json"));
        (dir, store)
    }

    fn new_dem(name: &str) -> NewDem {
        NewDem {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = test_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let (_dir, store) = test_store();
        std::fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_surfaces_parse_errors() {
        let (_dir, store) = test_store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_save_load_round_trip_is_stable() {
        let (_dir, store) = test_store();
        store.create(&new_dem("Migration X"), Utc::now()).unwrap();
        store.create(&new_dem("Rollout Y"), Utc::now()).unwrap();

        let first = std::fs::read_to_string(store.path()).unwrap();
        store.save(&store.load().unwrap()).unwrap();
        let second = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(first, second, "save(load()) must not lose fields");
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let (_dir, store) = test_store();
        let now = Utc::now();
        let a = store.create(&new_dem("A"), now).unwrap();
        let b = store.create(&new_dem("B"), now).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("dem_"));
    }

    #[test]
    fn test_create_with_initial_note() {
        let (_dir, store) = test_store();
        let record = store
            .create(
                &NewDem {
                    name: "With note".into(),
                    initial_note: "[2025-11-18 00:52] — kickoff done".into(),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(record.notes.len(), 1);
        // duplicated timestamp bracket stripped at write time
        assert_eq!(record.notes[0].text, "kickoff done");
    }

    #[test]
    fn test_update_not_found() {
        let (_dir, store) = test_store();
        let result = store.update("dem_missing", Utc::now(), |_| Ok(()));
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn test_update_stamps_updated_at_from_the_given_clock() {
        let (_dir, store) = test_store();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let created = store.create(&new_dem("A"), t0).unwrap();
        let updated = store.add_note(&created.id, "first note", t1).unwrap();

        assert_eq!(updated.updated_at, t1.to_rfc3339());
        assert!(updated.updated_at > created.updated_at);
    }

    #[test]
    fn test_add_note_rejects_empty_text() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        let result = store.add_note(&record.id, "   ", Utc::now());
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_edit_note_out_of_range_leaves_record_untouched() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        let record = store.add_note(&record.id, "one", Utc::now()).unwrap();
        let record = store.add_note(&record.id, "two", Utc::now()).unwrap();

        let result = store.edit_note(&record.id, 5, "ghost", Utc::now());
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded[0].notes.len(), 2);
        assert_eq!(
            reloaded[0].updated_at, record.updated_at,
            "failed edit must not advance updated_at"
        );
    }

    #[test]
    fn test_delete_note_shifts_indices() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        store.add_note(&record.id, "zero", Utc::now()).unwrap();
        store.add_note(&record.id, "one", Utc::now()).unwrap();
        store.add_note(&record.id, "two", Utc::now()).unwrap();

        let after = store.delete_note(&record.id, 1, Utc::now()).unwrap();
        let texts: Vec<&str> = after.notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["zero", "two"]);
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        store.delete(&record.id).unwrap();
        let result = store.update(&record.id, Utc::now(), |_| Ok(()));
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn test_archive_and_restore() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        let archived = store.set_archived(&record.id, true, Utc::now()).unwrap();
        assert!(archived.archived);
        let restored = store.set_archived(&record.id, false, Utc::now()).unwrap();
        assert!(!restored.archived);
    }

    #[test]
    fn test_import_merges_by_id_and_assigns_missing_ids() {
        let (_dir, store) = test_store();
        let existing = store.create(&new_dem("Existing"), Utc::now()).unwrap();

        let incoming = vec![
            serde_json::json!({"id": existing.id, "name": "Existing (renamed)"}),
            serde_json::json!({"name": "Brand new"}),
            serde_json::json!("not an object"),
        ];
        let merged = store.import(incoming, Utc::now()).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Existing (renamed)");
        assert!(merged[1].id.starts_with("dem_"));
    }

    #[test]
    fn test_attach_document_updates_summary_and_notes() {
        let (_dir, store) = test_store();
        let record = store.create(&new_dem("A"), Utc::now()).unwrap();
        let after = store
            .attach_document(
                &record.id,
                DocumentRef {
                    filename: "req.docx".into(),
                    summary: "Executive summary.".into(),
                    date: "2026-01-01 10:00".into(),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(after.documents.len(), 1);
        assert_eq!(after.doc_summary, "Executive summary.");
        assert_eq!(
            after.notes.last().unwrap().text,
            "AI analysis generated from attached document."
        );
    }
}
