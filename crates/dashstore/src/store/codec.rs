use crate::error::{Result, StoreError};
use crate::model::{json_type_name, validate_documents, Document};
use serde_json::Value;
use std::path::Path;

/// Parse collection file content. Anything other than an array of objects with
/// well-formed, unique ids is corrupt; `origin` names the file in the error.
pub fn decode_collection(text: &str, origin: &Path) -> Result<Vec<Document>> {
    let corrupt = |message: String| StoreError::CorruptData {
        path: origin.to_path_buf(),
        message,
    };

    let value: Value = serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(corrupt(format!(
                "expected a JSON array, found {}",
                json_type_name(&other)
            )))
        }
    };

    let mut docs = Vec::with_capacity(items.len());
    for (pos, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => docs.push(Document::from_map(map)),
            other => {
                return Err(corrupt(format!(
                    "element {} is {}, expected an object",
                    pos,
                    json_type_name(&other)
                )))
            }
        }
    }
    validate_documents(&docs).map_err(corrupt)?;
    Ok(docs)
}

/// Two-space pretty JSON, the layout hand-edited data files already use.
pub fn encode_collection(docs: &[Document]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(docs)?)
}
