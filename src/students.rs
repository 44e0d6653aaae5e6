use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::db;
use crate::error::{require_text, SchoolResult};
use crate::model::{group_column, Enrollment, Group, Payment, Student};
use crate::payments;
use crate::results::{self, ExamResult};
use crate::subjects::{self, ClassSubjectEntry};
use crate::years::{self, EnrollmentSummary};

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub phone: String,
    pub address: String,
    pub nid_dob: String,
    pub academic_year_id: String,
    pub class_id: String,
    pub section: String,
    pub group: Option<Group>,
    pub roll: Option<i64>,
}

/// Contact fields that may change after creation. `None` keeps the value.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub nid_dob: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub student_id: String,
    pub academic_year_id: String,
    pub class_id: String,
    pub section: String,
    pub group: Option<Group>,
    pub roll: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListRow {
    pub student_id: String,
    pub name: String,
    pub guardian_phone: String,
    pub enrollment_id: Option<String>,
    pub class_id: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    pub group: Option<Group>,
    pub roll: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub student: Student,
    pub current_enrollment: Option<EnrollmentSummary>,
    pub enrollment_history: Vec<EnrollmentSummary>,
    pub subjects: Vec<ClassSubjectEntry>,
    pub payments: Vec<Payment>,
    pub exam_results: Vec<ExamResult>,
}

const STUDENT_COLUMNS: &str =
    "id, name, father_name, mother_name, phone, address, nid_dob, created_at, updated_at";

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        father_name: r.get(2)?,
        mother_name: r.get(3)?,
        phone: r.get(4)?,
        address: r.get(5)?,
        nid_dob: r.get(6)?,
        created_at: r.get(7)?,
        updated_at: r.get(8)?,
    })
}

pub fn get_student(conn: &Connection, student_id: &str) -> SchoolResult<Option<Student>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
    let student = conn
        .query_row(&sql, [student_id], student_from_row)
        .optional()?;
    Ok(student)
}

fn insert_enrollment(conn: &Connection, e: &NewEnrollment) -> SchoolResult<Enrollment> {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO enrollments(id, student_id, academic_year_id, class_id, section, student_group, roll, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &e.student_id,
            &e.academic_year_id,
            &e.class_id,
            &e.section,
            group_column(e.group),
            e.roll,
            db::now_rfc3339(),
        ),
    )?;
    Ok(Enrollment {
        id,
        student_id: e.student_id.clone(),
        academic_year_id: e.academic_year_id.clone(),
        class_id: e.class_id.clone(),
        section: e.section.clone(),
        group: e.group,
        roll: e.roll,
    })
}

/// Inserts the student and the first enrollment together. If either insert
/// fails neither row is kept.
pub fn create_student(conn: &Connection, input: &NewStudent) -> SchoolResult<(Student, Enrollment)> {
    let name = require_text("name", &input.name)?;
    let section = require_text("section", &input.section)?;
    let academic_year_id = require_text("academicYearId", &input.academic_year_id)?;
    let class_id = require_text("classId", &input.class_id)?;

    let student = Student {
        id: db::new_id(),
        name,
        father_name: input.father_name.trim().to_string(),
        mother_name: input.mother_name.trim().to_string(),
        phone: input.phone.trim().to_string(),
        address: input.address.trim().to_string(),
        nid_dob: input.nid_dob.trim().to_string(),
        created_at: db::now_rfc3339(),
        updated_at: None,
    };

    // Dropping the transaction on an early return rolls it back.
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO students(id, name, father_name, mother_name, phone, address, nid_dob, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &student.id,
            &student.name,
            &student.father_name,
            &student.mother_name,
            &student.phone,
            &student.address,
            &student.nid_dob,
            &student.created_at,
        ),
    )?;
    let enrollment = insert_enrollment(
        &tx,
        &NewEnrollment {
            student_id: student.id.clone(),
            academic_year_id,
            class_id,
            section,
            group: input.group,
            roll: input.roll,
        },
    )?;
    tx.commit()?;

    tracing::info!(student_id = %student.id, enrollment_id = %enrollment.id, "student created");
    Ok((student, enrollment))
}

pub fn update_student(
    conn: &Connection,
    student_id: &str,
    patch: &StudentPatch,
) -> SchoolResult<Option<Student>> {
    let Some(mut student) = get_student(conn, student_id)? else {
        return Ok(None);
    };

    if let Some(name) = &patch.name {
        student.name = require_text("name", name)?;
    }
    let fields = [
        (&patch.father_name, &mut student.father_name),
        (&patch.mother_name, &mut student.mother_name),
        (&patch.phone, &mut student.phone),
        (&patch.address, &mut student.address),
        (&patch.nid_dob, &mut student.nid_dob),
    ];
    for (value, slot) in fields {
        if let Some(v) = value {
            *slot = v.trim().to_string();
        }
    }
    student.updated_at = Some(db::now_rfc3339());

    conn.execute(
        "UPDATE students
         SET name = ?, father_name = ?, mother_name = ?, phone = ?, address = ?, nid_dob = ?, updated_at = ?
         WHERE id = ?",
        (
            &student.name,
            &student.father_name,
            &student.mother_name,
            &student.phone,
            &student.address,
            &student.nid_dob,
            &student.updated_at,
            &student.id,
        ),
    )?;
    Ok(Some(student))
}

/// Enrolls an existing student for another year.
pub fn enroll_student(conn: &Connection, input: &NewEnrollment) -> SchoolResult<Option<Enrollment>> {
    if get_student(conn, &input.student_id)?.is_none() {
        return Ok(None);
    }
    let normalized = NewEnrollment {
        section: require_text("section", &input.section)?,
        academic_year_id: require_text("academicYearId", &input.academic_year_id)?,
        class_id: require_text("classId", &input.class_id)?,
        ..input.clone()
    };
    let enrollment = insert_enrollment(conn, &normalized)?;
    tracing::info!(student_id = %enrollment.student_id, enrollment_id = %enrollment.id, "student enrolled");
    Ok(Some(enrollment))
}

/// Removes an enrollment with its marks and payments.
pub fn delete_enrollment(conn: &Connection, enrollment_id: &str) -> SchoolResult<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM enrollments WHERE id = ?",
            [enrollment_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(false);
    }

    // No ON DELETE CASCADE; owned rows go first.
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM student_marks WHERE enrollment_id = ?",
        [enrollment_id],
    )?;
    tx.execute("DELETE FROM payments WHERE enrollment_id = ?", [enrollment_id])?;
    tx.execute("DELETE FROM enrollments WHERE id = ?", [enrollment_id])?;
    tx.commit()?;

    tracing::info!(%enrollment_id, "enrollment deleted");
    Ok(true)
}

/// One row per student. With a year, enrollment columns describe that
/// year's enrollment; a class filter keeps only students enrolled in it.
pub fn list_students(
    conn: &Connection,
    class_id: Option<&str>,
    year_id: Option<&str>,
) -> SchoolResult<Vec<StudentListRow>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.phone, e.id, e.class_id, c.name, e.section, e.student_group, e.roll
         FROM students s
         LEFT JOIN enrollments e ON e.student_id = s.id AND e.academic_year_id = ?
         LEFT JOIN classes c ON c.id = e.class_id
         WHERE (? IS NULL OR e.class_id = ?)
         ORDER BY s.created_at DESC, s.rowid DESC",
    )?;
    let rows = stmt
        .query_map((year_id, class_id, class_id), |r| {
            Ok(StudentListRow {
                student_id: r.get(0)?,
                name: r.get(1)?,
                guardian_phone: r.get(2)?,
                enrollment_id: r.get(3)?,
                class_id: r.get(4)?,
                class_name: r.get(5)?,
                section: r.get(6)?,
                group: Group::from_column(r.get(7)?),
                roll: r.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Everything the student page shows. A student without enrollments gets
/// empty subject, payment and result lists.
pub fn student_profile(
    conn: &Connection,
    student_id: &str,
    active_year_id: Option<&str>,
) -> SchoolResult<Option<StudentProfile>> {
    let Some(student) = get_student(conn, student_id)? else {
        return Ok(None);
    };

    let history = years::enrollment_history(conn, student_id)?;
    let current = years::current_enrollment(&history, active_year_id).cloned();

    let (subjects, payments, exam_results) = match &current {
        Some(e) => (
            subjects::effective_subjects(conn, &e.class_id, e.group)?,
            payments::list_payments(conn, &e.id)?,
            results::exam_results(conn, &e.id, &e.class_id)?,
        ),
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    Ok(Some(StudentProfile {
        student,
        current_enrollment: current,
        enrollment_history: history,
        subjects,
        payments,
        exam_results,
    }))
}
