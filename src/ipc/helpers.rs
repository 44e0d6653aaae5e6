use rusqlite::Connection;

use crate::ipc::error::{err, school_err};
use crate::ipc::types::{AppState, Request};
use crate::model::Group;
use crate::years;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

/// Absent or null gives `None`; anything other than an integer is rejected.
pub fn optional_i64(req: &Request, key: &str) -> Result<Option<i64>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be an integer", key),
                None,
            )
        }),
    }
}

/// Absent, null or blank gives the common case; non-strings are rejected.
pub fn optional_group(req: &Request, key: &str) -> Result<Option<Group>, serde_json::Value> {
    let raw = match req.params.get(key) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            return Err(err(
                &req.id,
                "bad_params",
                format!("{} must be a string", key),
                None,
            ))
        }
    };
    Group::parse_optional(raw).map_err(|e| school_err(&req.id, e))
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// `params.yearId` when given, else the session's active year.
pub fn resolve_year(
    state: &AppState,
    conn: &Connection,
    req: &Request,
) -> Result<Option<String>, serde_json::Value> {
    let explicit = optional_str(req, "yearId");
    years::resolve_year_param(conn, explicit.as_deref(), &state.active_year)
        .map_err(|e| school_err(&req.id, e))
}
