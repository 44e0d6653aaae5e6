use crate::classes;
use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, required_str, resolve_year};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::list_classes(conn, year_id.as_deref()) {
        Ok(rows) => ok(
            &req.id,
            json!({ "academicYearId": year_id, "classes": rows }),
        ),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::create_class(conn, &name) {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_classes_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::class_details(conn, &class_id) {
        Ok(Some(details)) => ok(&req.id, json!({ "class": details })),
        Ok(None) => err(&req.id, "not_found", "class not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_classes_roster(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::get_class(conn, &class_id) {
        Ok(Some(_)) => {}
        Ok(None) => return err(&req.id, "not_found", "class not found", None),
        Err(e) => return school_err(&req.id, e),
    }
    match roster::class_roster(conn, &class_id, year_id.as_deref()) {
        Ok(r) => ok(&req.id, json!(r)),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.get" => Some(handle_classes_get(state, req)),
        "classes.roster" => Some(handle_classes_roster(state, req)),
        _ => None,
    }
}
