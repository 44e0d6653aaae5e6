use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{
    db_conn, optional_group, optional_i64, optional_str, required_str, resolve_year,
};
use crate::ipc::types::{AppState, Request};
use crate::students::{self, NewEnrollment, NewStudent, StudentPatch, StudentProfile};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let year_id = match resolve_year(state, conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = optional_str(req, "classId");
    match students::list_students(conn, class_id.as_deref(), year_id.as_deref()) {
        Ok(rows) => ok(
            &req.id,
            json!({ "academicYearId": year_id, "students": rows }),
        ),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let academic_year_id = match required_str(req, "academicYearId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match required_str(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let group = match optional_group(req, "group") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roll = match optional_i64(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let text = |key: &str| optional_str(req, key).unwrap_or_default();

    let input = NewStudent {
        name,
        father_name: text("fatherName"),
        mother_name: text("motherName"),
        phone: text("phone"),
        address: text("address"),
        nid_dob: text("nidDob"),
        academic_year_id,
        class_id,
        section,
        group,
        roll,
    };
    match students::create_student(conn, &input) {
        Ok((student, enrollment)) => ok(
            &req.id,
            json!({ "student": student, "enrollment": enrollment }),
        ),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = StudentPatch {
        name: optional_str(req, "name"),
        father_name: optional_str(req, "fatherName"),
        mother_name: optional_str(req, "motherName"),
        phone: optional_str(req, "phone"),
        address: optional_str(req, "address"),
        nid_dob: optional_str(req, "nidDob"),
    };
    match students::update_student(conn, &student_id, &patch) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

/// Shared lookup for the three per-student read methods.
fn load_profile(state: &AppState, req: &Request) -> Result<StudentProfile, serde_json::Value> {
    let conn = db_conn(state, req)?;
    let student_id = required_str(req, "studentId")?;
    let year_id = resolve_year(state, conn, req)?;
    match students::student_profile(conn, &student_id, year_id.as_deref()) {
        Ok(Some(p)) => Ok(p),
        Ok(None) => Err(err(&req.id, "not_found", "student not found", None)),
        Err(e) => Err(school_err(&req.id, e)),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load_profile(state, req) {
        Ok(profile) => ok(&req.id, json!({ "profile": profile })),
        Err(e) => e,
    }
}

fn handle_students_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load_profile(state, req) {
        Ok(profile) => ok(
            &req.id,
            json!({
                "enrollment": profile.current_enrollment,
                "subjects": profile.subjects
            }),
        ),
        Err(e) => e,
    }
}

fn handle_students_results(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load_profile(state, req) {
        Ok(profile) => ok(
            &req.id,
            json!({
                "student": profile.student,
                "enrollment": profile.current_enrollment,
                "examResults": profile.exam_results
            }),
        ),
        Err(e) => e,
    }
}

fn handle_enrollments_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let academic_year_id = match required_str(req, "academicYearId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match required_str(req, "section") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let group = match optional_group(req, "group") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let roll = match optional_i64(req, "roll") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let input = NewEnrollment {
        student_id,
        academic_year_id,
        class_id,
        section,
        group,
        roll,
    };
    match students::enroll_student(conn, &input) {
        Ok(Some(enrollment)) => ok(&req.id, json!({ "enrollment": enrollment })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_enrollments_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let enrollment_id = match required_str(req, "enrollmentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match students::delete_enrollment(conn, &enrollment_id) {
        Ok(true) => ok(&req.id, json!({ "ok": true })),
        Ok(false) => err(&req.id, "not_found", "enrollment not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.subjects" => Some(handle_students_subjects(state, req)),
        "students.results" => Some(handle_students_results(state, req)),
        "enrollments.create" => Some(handle_enrollments_create(state, req)),
        "enrollments.delete" => Some(handle_enrollments_delete(state, req)),
        _ => None,
    }
}
