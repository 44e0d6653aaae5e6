use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db;
use crate::error::{SchoolError, SchoolResult};

/// One subject's result inside an exam.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMark {
    pub subject_id: String,
    pub subject_name: String,
    pub subject_code: String,
    pub cq_marks: i64,
    pub mcq_marks: i64,
    pub practical_marks: i64,
    pub marks_obtained: i64,
    pub full_marks: Option<i64>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub exam_id: String,
    pub exam_name: String,
    pub subjects: Vec<SubjectMark>,
    pub total_obtained: i64,
    pub total_full_marks: i64,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MarkInput {
    pub enrollment_id: String,
    pub exam_id: String,
    pub subject_id: String,
    pub cq_marks: Option<i64>,
    pub mcq_marks: Option<i64>,
    pub practical_marks: Option<i64>,
    /// Total as entered by the caller. Defaults to the component sum.
    pub marks_obtained: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMark {
    pub id: String,
    pub enrollment_id: String,
    pub exam_id: String,
    pub subject_id: String,
    pub cq_marks: Option<i64>,
    pub mcq_marks: Option<i64>,
    pub practical_marks: Option<i64>,
    pub marks_obtained: i64,
}

#[derive(Debug, Clone)]
pub struct MarksSheetQuery<'a> {
    pub class_id: &'a str,
    pub year_id: &'a str,
    pub section: Option<&'a str>,
    pub exam_id: &'a str,
    pub subject_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarksSheetRow {
    pub enrollment_id: String,
    pub student_id: String,
    pub student_name: String,
    pub section: String,
    pub roll: Option<i64>,
    pub cq_marks: Option<i64>,
    pub mcq_marks: Option<i64>,
    pub practical_marks: Option<i64>,
    /// Recomputed from components; `None` until a mark is entered.
    pub marks_obtained: Option<i64>,
}

/// Largest value accepted for a single mark component.
pub const MAX_COMPONENT_MARKS: i64 = 1000;

/// Saturates so rows written before the ceiling existed cannot overflow.
pub fn component_total(cq: Option<i64>, mcq: Option<i64>, practical: Option<i64>) -> i64 {
    [cq, mcq, practical]
        .into_iter()
        .flatten()
        .fold(0i64, i64::saturating_add)
}

/// `obtained / full * 100`, or `None` when full marks are missing or not
/// positive.
pub fn percentage(obtained: i64, full_marks: Option<i64>) -> Option<f64> {
    match full_marks {
        Some(full) if full > 0 => Some(100.0 * obtained as f64 / full as f64),
        _ => None,
    }
}

/// Marks of one enrollment grouped by exam. Full marks come from the
/// class's subject assignment. Marks whose exam or subject no longer exists
/// are left out.
pub fn exam_results(
    conn: &Connection,
    enrollment_id: &str,
    class_id: &str,
) -> SchoolResult<Vec<ExamResult>> {
    let mut stmt = conn.prepare(
        "SELECT m.exam_id, x.name, m.subject_id, s.name, s.code,
                m.cq_marks, m.mcq_marks, m.practical_marks, cs.full_marks
         FROM student_marks m
         JOIN exams x ON x.id = m.exam_id
         JOIN subjects s ON s.id = m.subject_id
         LEFT JOIN class_subjects cs ON cs.class_id = ? AND cs.subject_id = m.subject_id
         WHERE m.enrollment_id = ?
         ORDER BY x.name, s.name, m.rowid",
    )?;
    let rows = stmt.query_map((class_id, enrollment_id), |r| {
        let cq: Option<i64> = r.get(5)?;
        let mcq: Option<i64> = r.get(6)?;
        let practical: Option<i64> = r.get(7)?;
        let full_marks: Option<i64> = r.get(8)?;
        let marks_obtained = component_total(cq, mcq, practical);
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            SubjectMark {
                subject_id: r.get(2)?,
                subject_name: r.get(3)?,
                subject_code: r.get(4)?,
                cq_marks: cq.unwrap_or(0),
                mcq_marks: mcq.unwrap_or(0),
                practical_marks: practical.unwrap_or(0),
                marks_obtained,
                full_marks,
                percentage: percentage(marks_obtained, full_marks),
            },
        ))
    })?;

    let mut out: Vec<ExamResult> = Vec::new();
    for row in rows {
        let (exam_id, exam_name, mark) = row?;
        if let Some(last) = out.last_mut().filter(|e| e.exam_name == exam_name) {
            last.subjects.push(mark);
            continue;
        }
        out.push(ExamResult {
            exam_id,
            exam_name,
            subjects: vec![mark],
            total_obtained: 0,
            total_full_marks: 0,
            percentage: None,
        });
    }

    for exam in &mut out {
        exam.total_obtained = exam
            .subjects
            .iter()
            .map(|m| m.marks_obtained)
            .fold(0, i64::saturating_add);
        exam.total_full_marks = exam
            .subjects
            .iter()
            .map(|m| m.full_marks.unwrap_or(0))
            .fold(0, i64::saturating_add);
        exam.percentage = percentage(exam.total_obtained, Some(exam.total_full_marks));
    }
    Ok(out)
}

/// Writes the mark for (enrollment, exam, subject), replacing an earlier
/// entry. `None` when the enrollment does not exist.
pub fn upsert_mark(conn: &Connection, input: &MarkInput) -> SchoolResult<Option<StoredMark>> {
    for (field, value) in [
        ("cqMarks", input.cq_marks),
        ("mcqMarks", input.mcq_marks),
        ("practicalMarks", input.practical_marks),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(SchoolError::validation(format!(
                "{} must not be negative",
                field
            )));
        }
        if value.is_some_and(|v| v > MAX_COMPONENT_MARKS) {
            return Err(SchoolError::validation(format!(
                "{} must not exceed {}",
                field, MAX_COMPONENT_MARKS
            )));
        }
    }
    if input
        .marks_obtained
        .is_some_and(|v| !(0..=3 * MAX_COMPONENT_MARKS).contains(&v))
    {
        return Err(SchoolError::validation(format!(
            "marksObtained must be between 0 and {}",
            3 * MAX_COMPONENT_MARKS
        )));
    }

    let class_id: Option<String> = conn
        .query_row(
            "SELECT class_id FROM enrollments WHERE id = ?",
            [&input.enrollment_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(class_id) = class_id else {
        return Ok(None);
    };

    let full_marks: Option<i64> = conn
        .query_row(
            "SELECT full_marks FROM class_subjects WHERE class_id = ? AND subject_id = ?",
            (&class_id, &input.subject_id),
            |r| r.get(0),
        )
        .optional()?
        .flatten();

    let marks_obtained = input.marks_obtained.unwrap_or_else(|| {
        component_total(input.cq_marks, input.mcq_marks, input.practical_marks)
    });

    conn.execute(
        "INSERT INTO student_marks(
            id, enrollment_id, exam_id, subject_id,
            cq_marks, mcq_marks, practical_marks, marks_obtained, full_marks, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(enrollment_id, exam_id, subject_id) DO UPDATE SET
            cq_marks = excluded.cq_marks,
            mcq_marks = excluded.mcq_marks,
            practical_marks = excluded.practical_marks,
            marks_obtained = excluded.marks_obtained,
            full_marks = excluded.full_marks",
        (
            db::new_id(),
            &input.enrollment_id,
            &input.exam_id,
            &input.subject_id,
            input.cq_marks,
            input.mcq_marks,
            input.practical_marks,
            marks_obtained,
            full_marks,
            db::now_rfc3339(),
        ),
    )?;

    let id: String = conn.query_row(
        "SELECT id FROM student_marks
         WHERE enrollment_id = ? AND exam_id = ? AND subject_id = ?",
        (&input.enrollment_id, &input.exam_id, &input.subject_id),
        |r| r.get(0),
    )?;

    Ok(Some(StoredMark {
        id,
        enrollment_id: input.enrollment_id.clone(),
        exam_id: input.exam_id.clone(),
        subject_id: input.subject_id.clone(),
        cq_marks: input.cq_marks,
        mcq_marks: input.mcq_marks,
        practical_marks: input.practical_marks,
        marks_obtained,
    }))
}

/// Entry sheet for one exam and subject: every enrolled student of the
/// class (optionally one section) with whatever mark is recorded.
pub fn marks_sheet(conn: &Connection, q: &MarksSheetQuery<'_>) -> SchoolResult<Vec<MarksSheetRow>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, s.id, s.name, e.section, e.roll,
                m.id, m.cq_marks, m.mcq_marks, m.practical_marks
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         LEFT JOIN student_marks m
           ON m.enrollment_id = e.id AND m.exam_id = ? AND m.subject_id = ?
         WHERE e.class_id = ? AND e.academic_year_id = ?
           AND (? IS NULL OR e.section = ?)
         ORDER BY e.section, e.roll IS NULL, e.roll, e.rowid",
    )?;
    let rows = stmt
        .query_map(
            (
                q.exam_id,
                q.subject_id,
                q.class_id,
                q.year_id,
                q.section,
                q.section,
            ),
            |r| {
                let mark_id: Option<String> = r.get(5)?;
                let cq: Option<i64> = r.get(6)?;
                let mcq: Option<i64> = r.get(7)?;
                let practical: Option<i64> = r.get(8)?;
                Ok(MarksSheetRow {
                    enrollment_id: r.get(0)?,
                    student_id: r.get(1)?,
                    student_name: r.get(2)?,
                    section: r.get(3)?,
                    roll: r.get(4)?,
                    cq_marks: cq,
                    mcq_marks: mcq,
                    practical_marks: practical,
                    marks_obtained: mark_id.map(|_| component_total(cq, mcq, practical)),
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
