use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use crate::years::{self, ActiveYearSelector};
use serde_json::json;

fn handle_years_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "years": [] }));
    };
    match years::list_years(conn) {
        Ok(list) => ok(&req.id, json!({ "years": list })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_years_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match years::create_year(conn, &name) {
        Ok(year) => ok(&req.id, json!({ "year": year })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_years_get_active(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "yearId": null, "selected": false }));
    };
    match years::resolve_active_year(conn, &state.active_year) {
        Ok(year_id) => ok(
            &req.id,
            json!({
                "yearId": year_id,
                "selected": state.active_year.get().is_some()
            }),
        ),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_years_set_active(state: &mut AppState, req: &Request) -> serde_json::Value {
    let year_id = match required_str(req, "yearId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match years::year_exists(conn, &year_id) {
        Ok(true) => {}
        Ok(false) => return err(&req.id, "not_found", "academic year not found", None),
        Err(e) => return school_err(&req.id, e),
    }
    state.active_year.set(year_id.clone());
    tracing::info!(%year_id, "active year selected");
    ok(&req.id, json!({ "yearId": year_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "years.list" => Some(handle_years_list(state, req)),
        "years.create" => Some(handle_years_create(state, req)),
        "years.getActive" => Some(handle_years_get_active(state, req)),
        "years.setActive" => Some(handle_years_set_active(state, req)),
        _ => None,
    }
}
