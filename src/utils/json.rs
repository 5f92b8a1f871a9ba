use mongodb::bson::{self, Bson, Document};
use serde_json::{Map, Value};

use super::error::AppError;

/// Converts a JSON object into a BSON document ready for storage.
pub fn object_to_document(object: Map<String, Value>) -> Result<Document, AppError> {
    bson::to_document(&object)
        .map_err(|e| AppError::Validation(format!("Unsupported value in payload: {}", e)))
}

/// Requires the payload to be a JSON object whose top-level keys are plain
/// field names. `$` operators and dotted paths would be read as update syntax.
pub fn expect_object(payload: Value, what: &str) -> Result<Map<String, Value>, AppError> {
    let map = match payload {
        Value::Object(map) => map,
        _ => return Err(AppError::Validation(format!("{} must be a JSON object", what))),
    };

    if let Some(key) = map
        .keys()
        .find(|key| key.is_empty() || key.starts_with('$') || key.contains('.'))
    {
        return Err(AppError::Validation(format!(
            "{} field name '{}' is not allowed",
            what, key
        )));
    }

    Ok(map)
}

/// Reads a required, non-empty string field and writes it back trimmed, so the
/// stored value matches the one used in lookups.
pub fn required_str(object: &mut Map<String, Value>, field: &str) -> Result<String, AppError> {
    let value = match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err(AppError::Validation(format!("{} is required", field)))
        }
        Some(_) => return Err(AppError::Validation(format!("{} must be a string", field))),
    };

    object.insert(field.to_string(), Value::String(value.clone()));
    Ok(value)
}

/// Renders a generated or upserted id the way clients see it.
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a stored document as relaxed extended JSON with `_id` as a hex string.
pub fn document_to_json(mut doc: Document) -> Value {
    if let Ok(id) = doc.get_object_id("_id") {
        let hex = id.to_hex();
        doc.insert("_id", hex);
    }
    Bson::Document(doc).into_relaxed_extjson()
}
