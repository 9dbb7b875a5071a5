//! Record model for the DEM portfolio store.
//!
//! The serde schema matches the on-disk store files: snake_case keys, note dates formatted `%Y-%m-%d %H:%M`, record
//! timestamps as RFC 3339 strings. Fields that later versions added
//! (`archived`, `priority`, `documents`) carry serde defaults so legacy
//! store files load without migration.

use serde::{Deserialize, Serialize};

/// Timestamp format used for note and document dates.
pub const NOTE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// =============================================================================
// Priority
// =============================================================================

/// Four ordinal priority levels, serialized as the codes "1".."4" the
/// store files use. Anything unrecognized (missing, empty, malformed)
/// deserializes to the P2 default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    P1,
    #[default]
    P2,
    P3,
    P4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::P1, Priority::P2, Priority::P3, Priority::P4];

    pub fn code(&self) -> &'static str {
        match self {
            Priority::P1 => "1",
            Priority::P2 => "2",
            Priority::P3 => "3",
            Priority::P4 => "4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::P1 => "P1 (Critical)",
            Priority::P2 => "P2 (High)",
            Priority::P3 => "P3 (Medium)",
            Priority::P4 => "P4 (Low)",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Priority::P1),
            "2" => Some(Priority::P2),
            "3" => Some(Priority::P3),
            "4" => Some(Priority::P4),
            _ => None,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Store files from older variants hold strings, numbers, or nothing.
        let value = serde_json::Value::deserialize(deserializer)?;
        let priority = match &value {
            serde_json::Value::String(s) => Priority::from_code(s),
            serde_json::Value::Number(n) => {
                n.as_i64().and_then(|n| Priority::from_code(&n.to_string()))
            }
            _ => None,
        };
        Ok(priority.unwrap_or_default())
    }
}

// =============================================================================
// Record
// =============================================================================

/// A follow-up note on a record. `date` uses [`NOTE_DATE_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
}

/// A document attached to a record, with its generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub date: String,
}

/// One tracked DEM (Digital Enhancement Management) request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Immutable, unique within the store. Generated from the creation
    /// timestamp: `dem_{unix_millis}`.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub ba_owner: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub change_request: String,
    #[serde(default)]
    pub cost_center: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_workflow_status")]
    pub workflow_status: String,
    #[serde(default)]
    pub current_owner: String,
    /// `YYYY-MM-DD`, empty when unset.
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    /// Summary of the most recently attached document.
    #[serde(default)]
    pub doc_summary: String,
    /// RFC 3339 UTC.
    #[serde(default)]
    pub created_at: String,
    /// RFC 3339 UTC. Advances on every successful mutation.
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub archived: bool,
}

fn default_status() -> String {
    "Idea".to_string()
}

fn default_workflow_status() -> String {
    "Intake".to_string()
}

/// Fields a caller may create a record with. Everything is optional;
/// missing strings become empty and status/workflow take their intake
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sponsor: String,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub ba_owner: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub change_request: String,
    #[serde(default)]
    pub cost_center: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub workflow_status: String,
    #[serde(default)]
    pub current_owner: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub initial_note: String,
}

/// Partial update of the editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemFieldPatch {
    pub name: Option<String>,
    pub sponsor: Option<String>,
    pub requester: Option<String>,
    pub ba_owner: Option<String>,
    pub title: Option<String>,
    pub change_request: Option<String>,
    pub cost_center: Option<String>,
    pub status: Option<String>,
    pub workflow_status: Option<String>,
    pub current_owner: Option<String>,
    pub start_date: Option<String>,
    pub priority: Option<String>,
}

impl DemFieldPatch {
    /// Apply every present field, trimming each value. Absent fields
    /// leave the record untouched.
    pub fn apply(&self, record: &mut ProjectRecord) {
        let set = |target: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        };
        set(&mut record.name, &self.name);
        set(&mut record.sponsor, &self.sponsor);
        set(&mut record.requester, &self.requester);
        set(&mut record.ba_owner, &self.ba_owner);
        set(&mut record.title, &self.title);
        set(&mut record.change_request, &self.change_request);
        set(&mut record.cost_center, &self.cost_center);
        set(&mut record.status, &self.status);
        set(&mut record.workflow_status, &self.workflow_status);
        set(&mut record.current_owner, &self.current_owner);
        set(&mut record.start_date, &self.start_date);
        if let Some(p) = &self.priority {
            record.priority = Priority::from_code(p).unwrap_or_default();
        }
    }
}

// =============================================================================
// Enriched view
// =============================================================================

/// A record plus the derived, non-persisted fields. Produced by
/// [`crate::enrich::enrich`]; this is what reports, exports and API
/// responses consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: ProjectRecord,
    /// Whole days from start_date to now; None when unset/unparsable.
    pub duration_days: Option<i64>,
    /// Most recent note formatted `[{date}] — {text}`, empty when none.
    pub last_note: String,
    /// True iff the record went 5+ days without an update.
    pub sla_breached: bool,
}

// =============================================================================
// Chat history
// =============================================================================

/// One message in a per-project chat history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub timestamp: String,
    pub role: String,
    pub content: String,
}
