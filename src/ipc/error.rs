use serde_json::json;

use crate::error::SchoolError;

/// Success envelope: `{ id, ok: true, result }`.
pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

/// Failure envelope. `code` is a stable machine-readable string such as
/// `bad_params` or `not_found`; `details` is attached only when given.
pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps a domain error onto its IPC code.
pub fn school_err(id: &str, e: SchoolError) -> serde_json::Value {
    if !matches!(e, SchoolError::Validation(_)) {
        tracing::warn!(error = %e, "request failed");
    }
    err(id, e.code(), e.to_string(), None)
}
