use crate::dashboard;
use crate::ipc::error::{ok, school_err};
use crate::ipc::helpers::{db_conn, resolve_year};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match dashboard::dashboard_summary(conn, year_id.as_deref()) {
        Ok(summary) => ok(&req.id, json!({ "summary": summary })),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        _ => None,
    }
}
