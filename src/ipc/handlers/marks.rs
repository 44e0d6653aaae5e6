use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, optional_i64, optional_str, required_str, resolve_year};
use crate::ipc::types::{AppState, Request};
use crate::results::{self, MarkInput, MarksSheetQuery};
use serde_json::json;

fn handle_marks_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let enrollment_id = match required_str(req, "enrollmentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_id = match required_str(req, "examId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut components = [None; 4];
    for (slot, key) in components
        .iter_mut()
        .zip(["cqMarks", "mcqMarks", "practicalMarks", "marksObtained"])
    {
        *slot = match optional_i64(req, key) {
            Ok(v) => v,
            Err(e) => return e,
        };
    }
    let [cq_marks, mcq_marks, practical_marks, marks_obtained] = components;

    let input = MarkInput {
        enrollment_id,
        exam_id,
        subject_id,
        cq_marks,
        mcq_marks,
        practical_marks,
        marks_obtained,
    };
    match results::upsert_mark(conn, &input) {
        Ok(Some(mark)) => ok(&req.id, json!({ "mark": mark })),
        Ok(None) => err(&req.id, "not_found", "enrollment not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_marks_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exam_id = match required_str(req, "examId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(Some(v)) => v,
        Ok(None) => return ok(&req.id, json!({ "rows": [] })),
        Err(e) => return e,
    };
    let section = optional_str(req, "section").filter(|s| !s.trim().is_empty());

    let query = MarksSheetQuery {
        class_id: &class_id,
        year_id: &year_id,
        section: section.as_deref(),
        exam_id: &exam_id,
        subject_id: &subject_id,
    };
    match results::marks_sheet(conn, &query) {
        Ok(rows) => ok(&req.id, json!({ "rows": rows })),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.upsert" => Some(handle_marks_upsert(state, req)),
        "marks.sheet" => Some(handle_marks_sheet(state, req)),
        _ => None,
    }
}
