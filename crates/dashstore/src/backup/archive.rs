use crate::error::{Result, StoreError};
use crate::model::{json_type_name, validate_collection_name, validate_documents, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const ARCHIVE_PREFIX: &str = "backup-";
pub const ARCHIVE_EXT: &str = ".json";

/// File stem of a backup archive, e.g. `backup-2026-10-19T08-30-00-123456Z`.
///
/// Stems sort in capture order. Parsing accepts an optional `.json` suffix and
/// rejects anything that could escape the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn parse(input: &str) -> Result<Self> {
        let stem = input.strip_suffix(ARCHIVE_EXT).unwrap_or(input);
        if stem.is_empty() {
            return Err(StoreError::Validation("archive id cannot be empty".to_string()));
        }
        if !stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::Validation(format!(
                "invalid archive id '{}'",
                input
            )));
        }
        Ok(Self(stem.to_string()))
    }

    pub(crate) fn for_capture(captured_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}{}",
            ARCHIVE_PREFIX,
            captured_at.format("%Y-%m-%dT%H-%M-%S-%6fZ")
        ))
    }

    pub(crate) fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{:06}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, ARCHIVE_EXT)
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArchiveId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        ArchiveId::parse(s)
    }
}

/// On-disk archive: capture time plus one entry per backed-up collection.
///
/// A `null` entry marks a collection that could not be captured; `errors`
/// says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub timestamp: DateTime<Utc>,
    pub data: BTreeMap<String, Option<Vec<Document>>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl Archive {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Unparsable JSON is `CorruptData`; JSON of the wrong shape is `Validation`.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| StoreError::CorruptData {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_value(value).map_err(|msg| {
            StoreError::Validation(format!("archive {}: {}", origin.display(), msg))
        })
    }

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        let mut root = match value {
            Value::Object(map) => map,
            other => return Err(format!("expected an object, found {}", json_type_name(&other))),
        };

        let timestamp = match root.remove("timestamp") {
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| format!("invalid timestamp '{}': {}", s, e))?,
            Some(other) => {
                return Err(format!(
                    "timestamp must be a string, found {}",
                    json_type_name(&other)
                ))
            }
            None => return Err("missing timestamp".to_string()),
        };

        let entries = match root.remove("data") {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(format!("data must be an object, found {}", json_type_name(&other)))
            }
            None => return Err("missing data".to_string()),
        };

        let mut data = BTreeMap::new();
        for (name, entry) in entries {
            validate_collection_name(&name).map_err(|e| e.to_string())?;
            let docs = match entry {
                Value::Null => None,
                Value::Array(items) => Some(parse_entry(&name, items)?),
                other => {
                    return Err(format!(
                        "collection '{}' must be an array or null, found {}",
                        name,
                        json_type_name(&other)
                    ))
                }
            };
            data.insert(name, docs);
        }

        let errors = match root.remove("errors") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => parse_errors(map)?,
            Some(other) => {
                return Err(format!("errors must be an object, found {}", json_type_name(&other)))
            }
        };

        Ok(Self {
            timestamp,
            data,
            errors,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.data.values().all(Option::is_some)
    }
}

fn parse_entry(name: &str, items: Vec<Value>) -> std::result::Result<Vec<Document>, String> {
    let mut docs = Vec::with_capacity(items.len());
    for (pos, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => docs.push(Document::from_map(map)),
            other => {
                return Err(format!(
                    "collection '{}' element {} is {}, expected an object",
                    name,
                    pos,
                    json_type_name(&other)
                ))
            }
        }
    }
    validate_documents(&docs).map_err(|msg| format!("collection '{}': {}", name, msg))?;
    Ok(docs)
}

fn parse_errors(map: Map<String, Value>) -> std::result::Result<BTreeMap<String, String>, String> {
    map.into_iter()
        .map(|(name, reason)| match reason {
            Value::String(s) => Ok((name, s)),
            other => Err(format!(
                "error for '{}' must be a string, found {}",
                name,
                json_type_name(&other)
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn origin() -> &'static Path {
        Path::new("backups/backup-x.json")
    }

    #[test]
    fn archive_id_sorts_by_capture_time() {
        let early = ArchiveId::for_capture(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
        let late = ArchiveId::for_capture(Utc.with_ymd_and_hms(2026, 11, 2, 3, 4, 5).unwrap());
        assert_eq!(early.as_str(), "backup-2026-01-02T03-04-05-000000Z");
        assert!(early < late);
        assert!(early < early.with_suffix(1));
        assert_eq!(early.with_suffix(2).as_str(), "backup-2026-01-02T03-04-05-000000Z-000002");
        assert!(early.with_suffix(2) < early.with_suffix(10));
        assert!(early.with_suffix(10) < late);
    }

    #[test]
    fn archive_id_parse_accepts_file_names() {
        let id = ArchiveId::parse("backup-2026-01-02T03-04-05-000000Z.json").unwrap();
        assert_eq!(id.as_str(), "backup-2026-01-02T03-04-05-000000Z");
        assert_eq!(id.file_name(), "backup-2026-01-02T03-04-05-000000Z.json");
    }

    #[test]
    fn archive_id_parse_rejects_paths() {
        assert!(ArchiveId::parse("../data/rebels-ranking").is_err());
        assert!(ArchiveId::parse("a/b").is_err());
        assert!(ArchiveId::parse("").is_err());
        assert!(ArchiveId::parse(".json").is_err());
    }

    #[test]
    fn parses_layout_without_errors_field() {
        let text = json!({
            "timestamp": "2024-07-10T13:39:00.000Z",
            "data": {
                "rebels-ranking": [{"id": 1, "name": "KRIMSON"}],
                "notifications": null
            }
        })
        .to_string();

        let archive = Archive::parse(&text, origin()).unwrap();

        assert_eq!(archive.data.len(), 2);
        assert_eq!(archive.data["rebels-ranking"].as_ref().unwrap().len(), 1);
        assert!(archive.data["notifications"].is_none());
        assert!(!archive.is_complete());
        assert!(archive.errors.is_empty());
    }

    #[test]
    fn non_json_is_corrupt() {
        let err = Archive::parse("{\"timestamp\":", origin()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptData { .. }));
    }

    #[test]
    fn malformed_entry_is_validation_error() {
        let text = json!({
            "timestamp": "2024-07-10T13:39:00Z",
            "data": {"rebels-ranking": {"id": 1}}
        })
        .to_string();
        let err = Archive::parse(&text, origin()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(msg) if msg.contains("rebels-ranking")));
    }

    #[test]
    fn missing_data_is_validation_error() {
        let text = json!({"timestamp": "2024-07-10T13:39:00Z"}).to_string();
        assert!(matches!(
            Archive::parse(&text, origin()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn bad_timestamp_is_validation_error() {
        let text = json!({"timestamp": "yesterday", "data": {}}).to_string();
        assert!(matches!(
            Archive::parse(&text, origin()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_ids_in_entry_are_rejected() {
        let text = json!({
            "timestamp": "2024-07-10T13:39:00Z",
            "data": {"notifications": [{"id": "n"}, {"id": "n"}]}
        })
        .to_string();
        assert!(matches!(
            Archive::parse(&text, origin()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn serialized_archive_parses_back() {
        let mut archive = Archive::new(Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap());
        archive.data.insert(
            "dashboard-stats".into(),
            Some(vec![Document::from_value(json!({"label": "ACCIDENTS"})).unwrap()]),
        );
        archive.data.insert("notifications".into(), None);
        archive
            .errors
            .insert("notifications".into(), "collection does not exist".into());

        let text = serde_json::to_string_pretty(&archive).unwrap();
        assert_eq!(Archive::parse(&text, origin()).unwrap(), archive);
    }
}
