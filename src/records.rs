//! Record Module
//!
//! The fixed record schema, validated once at ingestion. Optional fields
//! stay `None` when missing and read back as [`PLACEHOLDER`] for display
//! and matching.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RecordError;

/// Shown in place of a missing optional field
pub const PLACEHOLDER: &str = "-";

// == Search Field ==
/// Text fields a query or filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Category,
    Location,
    Notes,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Name,
        SearchField::Category,
        SearchField::Location,
        SearchField::Notes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Category => "category",
            SearchField::Location => "location",
            SearchField::Notes => "notes",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Record ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier, never blank
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates a record with only its identifier set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: None,
            location: None,
            notes: None,
            recorded_at: None,
        }
    }

    pub fn with_field(mut self, field: SearchField, value: impl Into<String>) -> Self {
        *self.field_slot(field) = normalize_text(value.into());
        self
    }

    // == Ingestion ==
    /// Validates a raw JSON payload into a record.
    ///
    /// The identifier may be a string or a number. Text fields accept
    /// strings, numbers and booleans; blank strings and nulls count as
    /// missing. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let id = match object.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(RecordError::MissingId),
        };

        let mut record = Record::new(id);
        for field in SearchField::ALL {
            *record.field_slot(field) = text_field(object, field.as_str())?;
        }
        record.recorded_at = date_field(object, "recorded_at")?;
        Ok(record)
    }

    /// Value of a text field, `None` when missing.
    pub fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Name => self.name.as_deref(),
            SearchField::Category => self.category.as_deref(),
            SearchField::Location => self.location.as_deref(),
            SearchField::Notes => self.notes.as_deref(),
        }
    }

    /// Value of a text field, or the placeholder when missing.
    pub fn display(&self, field: SearchField) -> &str {
        self.field(field).unwrap_or(PLACEHOLDER)
    }

    /// Merges `patch` into this record. The identifier never changes.
    pub fn apply(&mut self, patch: &RecordPatch) {
        for field in SearchField::ALL {
            if let Some(value) = patch.field(field) {
                *self.field_slot(field) = normalize_text(value.to_string());
            }
        }
        if let Some(at) = patch.recorded_at {
            self.recorded_at = Some(at);
        }
    }

    fn field_slot(&mut self, field: SearchField) -> &mut Option<String> {
        match field {
            SearchField::Name => &mut self.name,
            SearchField::Category => &mut self.category,
            SearchField::Location => &mut self.location,
            SearchField::Notes => &mut self.notes,
        }
    }
}

// == Record Patch ==
/// Partial update. `Some("")` clears a field, `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    pub fn field(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Name => self.name.as_deref(),
            SearchField::Category => self.category.as_deref(),
            SearchField::Location => self.location.as_deref(),
            SearchField::Notes => self.notes.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RecordPatch::default()
    }
}

// == Field Filter ==
/// Case-insensitive equality on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: SearchField,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: SearchField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.display(self.field).to_lowercase() == self.value.trim().to_lowercase()
    }
}

// == Collection Snapshot ==
/// Immutable, cheaply cloneable ordered list of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionSnapshot(Arc<Vec<Record>>);

impl CollectionSnapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self(Arc::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    /// Owned working copy for consumers that mutate locally.
    pub fn to_vec(&self) -> Vec<Record> {
        self.0.as_ref().clone()
    }
}

impl From<Vec<Record>> for CollectionSnapshot {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

// == Helpers ==
fn normalize_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn text_field(object: &Map<String, Value>, name: &str) -> Result<Option<String>, RecordError> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(normalize_text(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(RecordError::InvalidField {
            field: name.to_string(),
            reason: "expected text".to_string(),
        }),
    }
}

fn date_field(
    object: &Map<String, Value>,
    name: &str,
) -> Result<Option<DateTime<Utc>>, RecordError> {
    let invalid = |reason: String| RecordError::InvalidField {
        field: name.to_string(),
        reason,
    };

    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(at) = DateTime::parse_from_rfc3339(s) {
                return Ok(Some(at.with_timezone(&Utc)));
            }
            let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| invalid(format!("'{}' is not a date: {}", s, e)))?;
            Ok(day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
        }
        Some(_) => Err(invalid("expected a date string".to_string())),
    }
}
