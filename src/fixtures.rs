//! Seed helpers for unit tests. Rows are inserted directly so tests can set
//! up states the public write paths refuse to produce.

use rusqlite::Connection;

use crate::db;
use crate::model::{group_column, Group};

pub fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    // The bundled SQLite defaults foreign keys on; tests opt in explicitly.
    conn.execute("PRAGMA foreign_keys = OFF", []).expect("pragma");
    db::init_schema(&conn).expect("init schema");
    conn
}

pub fn year(conn: &Connection, name: &str) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO academic_years(id, name, is_active) VALUES(?, ?, 1)",
        (&id, name),
    )
    .expect("insert year");
    id
}

pub fn class(conn: &Connection, name: &str) -> String {
    let id = db::new_id();
    conn.execute("INSERT INTO classes(id, name) VALUES(?, ?)", (&id, name))
        .expect("insert class");
    id
}

pub fn subject(conn: &Connection, name: &str, code: &str) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO subjects(id, name, code) VALUES(?, ?, ?)",
        (&id, name, code),
    )
    .expect("insert subject");
    id
}

pub fn class_subject(
    conn: &Connection,
    class_id: &str,
    subject_id: &str,
    group: Option<Group>,
    full_marks: Option<i64>,
) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO class_subjects(id, class_id, subject_id, subject_group, full_marks)
         VALUES(?, ?, ?, ?, ?)",
        (&id, class_id, subject_id, group_column(group), full_marks),
    )
    .expect("insert class subject");
    id
}

pub fn student(conn: &Connection, name: &str) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO students(id, name, father_name, mother_name, phone, address, nid_dob, created_at)
         VALUES(?, ?, 'Father', 'Mother', '01700000000', 'Dhaka', '2010-01-01', ?)",
        (&id, name, db::now_rfc3339()),
    )
    .expect("insert student");
    id
}

pub fn enrollment(
    conn: &Connection,
    student_id: &str,
    year_id: &str,
    class_id: &str,
    section: &str,
    group: Option<Group>,
    roll: Option<i64>,
) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO enrollments(id, student_id, academic_year_id, class_id, section, student_group, roll, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            student_id,
            year_id,
            class_id,
            section,
            group_column(group),
            roll,
            db::now_rfc3339(),
        ),
    )
    .expect("insert enrollment");
    id
}

pub fn payment(conn: &Connection, enrollment_id: &str, term: &str, amount: i64, status: &str) {
    conn.execute(
        "INSERT INTO payments(id, enrollment_id, term, amount, status) VALUES(?, ?, ?, ?, ?)",
        (db::new_id(), enrollment_id, term, amount, status),
    )
    .expect("insert payment");
}

pub fn exam(conn: &Connection, name: &str, year_id: &str) -> String {
    let id = db::new_id();
    conn.execute(
        "INSERT INTO exams(id, name, academic_year_id) VALUES(?, ?, ?)",
        (&id, name, year_id),
    )
    .expect("insert exam");
    id
}

#[allow(clippy::too_many_arguments)]
pub fn mark(
    conn: &Connection,
    enrollment_id: &str,
    exam_id: &str,
    subject_id: &str,
    cq: Option<i64>,
    mcq: Option<i64>,
    practical: Option<i64>,
    stored_total: i64,
) {
    conn.execute(
        "INSERT INTO student_marks(id, enrollment_id, exam_id, subject_id, cq_marks, mcq_marks, practical_marks, marks_obtained)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            db::new_id(),
            enrollment_id,
            exam_id,
            subject_id,
            cq,
            mcq,
            practical,
            stored_total,
        ),
    )
    .expect("insert mark");
}
