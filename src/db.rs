use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path, file_name: &str) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(file_name);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            father_name TEXT NOT NULL,
            mother_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            address TEXT NOT NULL,
            nid_dob TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS academic_years(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_code ON subjects(code)",
        [],
    )?;

    // group NULL means the subject is common to every student in the class.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_subjects(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            subject_group TEXT,
            full_marks INTEGER DEFAULT 100,
            FOREIGN KEY(class_id) REFERENCES classes(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            UNIQUE(class_id, subject_id)
        )",
        [],
    )?;
    ensure_class_subjects_full_marks(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_subjects_class ON class_subjects(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            class_id TEXT NOT NULL,
            section TEXT NOT NULL,
            student_group TEXT,
            roll INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(academic_year_id) REFERENCES academic_years(id),
            FOREIGN KEY(class_id) REFERENCES classes(id),
            UNIQUE(student_id, academic_year_id)
        )",
        [],
    )?;
    ensure_enrollments_roll(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_class_year ON enrollments(class_id, academic_year_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments(
            id TEXT PRIMARY KEY,
            enrollment_id TEXT NOT NULL,
            term TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            paid_at TEXT,
            FOREIGN KEY(enrollment_id) REFERENCES enrollments(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_enrollment ON payments(enrollment_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exams(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            academic_year_id TEXT NOT NULL,
            FOREIGN KEY(academic_year_id) REFERENCES academic_years(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exams_year ON exams(academic_year_id)",
        [],
    )?;

    // marks_obtained and full_marks are kept for the record only; reports
    // recompute the total from components and read full marks from
    // class_subjects.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_marks(
            id TEXT PRIMARY KEY,
            enrollment_id TEXT NOT NULL,
            exam_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            cq_marks INTEGER DEFAULT 0,
            mcq_marks INTEGER DEFAULT 0,
            practical_marks INTEGER DEFAULT 0,
            marks_obtained INTEGER NOT NULL,
            full_marks INTEGER,
            created_at TEXT,
            FOREIGN KEY(enrollment_id) REFERENCES enrollments(id),
            FOREIGN KEY(exam_id) REFERENCES exams(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id),
            UNIQUE(enrollment_id, exam_id, subject_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_marks_enrollment ON student_marks(enrollment_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_marks_exam ON student_marks(exam_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_marks_subject ON student_marks(subject_id)",
        [],
    )?;

    Ok(())
}

// Workspaces created before roll numbers existed have no roll column.
fn ensure_enrollments_roll(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "enrollments", "roll")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE enrollments ADD COLUMN roll INTEGER", [])?;
    Ok(())
}

fn ensure_class_subjects_full_marks(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "class_subjects", "full_marks")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE class_subjects ADD COLUMN full_marks INTEGER DEFAULT 100",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first init");
        init_schema(&conn).expect("second init");
        assert!(table_has_column(&conn, "enrollments", "roll").expect("pragma"));
        assert!(table_has_column(&conn, "class_subjects", "full_marks").expect("pragma"));
    }
}
