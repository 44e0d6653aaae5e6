use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, optional_group, optional_i64, required_str};
use crate::ipc::types::{AppState, Request};
use crate::subjects::{self, AssignOutcome, ClassSubjectPatch, ALREADY_ASSIGNED_MESSAGE};
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "subjects": [] }));
    };
    match subjects::list_subjects(conn) {
        Ok(list) => ok(&req.id, json!({ "subjects": list })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let code = match required_str(req, "code") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match subjects::create_subject(conn, &name, &code) {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_class_subjects_assign(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let group = match optional_group(req, "group") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // A duplicate is reported in the result, not as a failed request.
    match subjects::assign_subject(conn, &class_id, &subject_id, group) {
        Ok(AssignOutcome::Assigned { link_id }) => ok(&req.id, json!({ "linkId": link_id })),
        Ok(AssignOutcome::AlreadyAssigned) => {
            ok(&req.id, json!({ "error": ALREADY_ASSIGNED_MESSAGE }))
        }
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_class_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let link_id = match required_str(req, "linkId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let full_marks = match optional_i64(req, "fullMarks") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // An absent key keeps the group; null or blank makes the subject common.
    let group = if req.params.get("group").is_some() {
        match optional_group(req, "group") {
            Ok(v) => Some(v),
            Err(e) => return e,
        }
    } else {
        None
    };
    let patch = ClassSubjectPatch { full_marks, group };
    match subjects::update_class_subject(conn, &link_id, &patch) {
        Ok(Some(())) => ok(&req.id, json!({ "linkId": link_id })),
        Ok(None) => err(&req.id, "not_found", "class subject not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_class_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let link_id = match required_str(req, "linkId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match subjects::delete_class_subject(conn, &link_id) {
        Ok(true) => ok(&req.id, json!({ "ok": true })),
        Ok(false) => err(&req.id, "not_found", "class subject not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "classSubjects.assign" => Some(handle_class_subjects_assign(state, req)),
        "classSubjects.update" => Some(handle_class_subjects_update(state, req)),
        "classSubjects.delete" => Some(handle_class_subjects_delete(state, req)),
        _ => None,
    }
}
