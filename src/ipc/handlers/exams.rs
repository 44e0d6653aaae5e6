use crate::exams;
use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, required_str, resolve_year};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_exams_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "exams": [] }));
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match exams::list_exams(conn, year_id.as_deref()) {
        Ok(list) => ok(
            &req.id,
            json!({ "academicYearId": year_id, "exams": list }),
        ),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_exams_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "bad_params", "no academic year to attach the exam to", None),
        Err(e) => return e,
    };
    match exams::create_exam(conn, &name, &year_id) {
        Ok(exam) => ok(&req.id, json!({ "exam": exam })),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exams.list" => Some(handle_exams_list(state, req)),
        "exams.create" => Some(handle_exams_create(state, req)),
        _ => None,
    }
}
