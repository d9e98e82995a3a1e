//! Enrichment record validation
//!
//! Enrichment output is checked one record at a time. A record missing a
//! required field (or carrying one with the wrong type) is rejected and
//! logged; the rest of the batch goes through.

use super::records::ContentRecord;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Fields every enrichment record must carry
pub const REQUIRED_CONTENT_FIELDS: [&str; 6] = [
    "id",
    "traffic_likelihood",
    "species_being_mentioned",
    "location",
    "pii",
    "actions",
];

/// A rejected enrichment record
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("content record #{index} rejected: {reason}")]
pub struct ValidationError {
    /// Position of the record in its input table
    pub index: usize,
    pub reason: String,
}

/// Validated enrichment records plus the ones that were rejected
#[derive(Debug, Clone, Default)]
pub struct ContentBatch {
    pub records: Vec<ContentRecord>,
    pub rejected: Vec<ValidationError>,
}

/// Validate a single raw record
pub fn validate_record(index: usize, value: serde_json::Value) -> Result<ContentRecord, ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError {
            index,
            reason: format!("expected an object, found {}", json_kind(&value)),
        });
    };

    let missing: Vec<&str> = REQUIRED_CONTENT_FIELDS
        .iter()
        .copied()
        .filter(|f| object.get(*f).map_or(true, |v| v.is_null()))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError {
            index,
            reason: format!("missing required field(s): {}", missing.join(", ")),
        });
    }

    serde_json::from_value(value).map_err(|e| ValidationError {
        index,
        reason: e.to_string(),
    })
}

/// Validate a table of raw enrichment records
pub fn validate_content(values: Vec<serde_json::Value>) -> ContentBatch {
    validate_rows(values.into_iter().map(Ok))
}

/// Validate enrichment rows where some could not even be parsed as JSON.
///
/// A parse failure (`Err(reason)`) is rejected at its row index like any
/// other invalid record.
pub fn validate_rows(rows: impl IntoIterator<Item = Result<serde_json::Value, String>>) -> ContentBatch {
    let mut batch = ContentBatch::default();
    for (index, row) in rows.into_iter().enumerate() {
        let checked = row
            .map_err(|reason| ValidationError { index, reason })
            .and_then(|value| validate_record(index, value));
        match checked {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!("{}", e);
                batch.rejected.push(e);
            }
        }
    }
    debug!(
        "Validated {} content records, rejected {}",
        batch.records.len(),
        batch.rejected.len()
    );
    batch
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid(id: i64, score: i64) -> serde_json::Value {
        json!({
            "id": id,
            "traffic_likelihood": score,
            "species_being_mentioned": ["ivory"],
            "location": ["Mombasa"],
            "pii": ["name_Jack"],
            "actions": ["selling"],
        })
    }

    #[test]
    fn test_valid_batch() {
        let batch = validate_content(vec![valid(1, 5), valid(2, 1)]);
        assert_eq!(batch.records.len(), 2);
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn test_unparsable_row_is_rejected_in_place() {
        let rows = vec![Ok(valid(1, 5)), Err("EOF while parsing".to_string()), Ok(valid(3, 2))];
        let batch = validate_rows(rows);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected, vec![ValidationError { index: 1, reason: "EOF while parsing".to_string() }]);
    }

    #[test]
    fn test_missing_field_rejects_only_that_record() {
        let mut broken = valid(2, 3);
        broken.as_object_mut().unwrap().remove("pii");

        let batch = validate_content(vec![valid(1, 5), broken, valid(3, 2)]);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].index, 1);
        assert!(batch.rejected[0].reason.contains("pii"));
    }

    #[test]
    fn test_null_field_counts_as_missing() {
        let mut broken = valid(1, 3);
        broken["traffic_likelihood"] = serde_json::Value::Null;
        let err = validate_record(0, broken).unwrap_err();
        assert!(err.reason.contains("traffic_likelihood"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut broken = valid(1, 3);
        broken["actions"] = json!("selling");
        assert!(validate_record(4, broken).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        let err = validate_record(0, json!([1, 2])).unwrap_err();
        assert_eq!(err.reason, "expected an object, found array");
    }
}
