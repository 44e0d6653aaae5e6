use rusqlite::Connection;
use serde::Serialize;

use crate::error::SchoolResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub academic_year_id: Option<String>,
    pub active_students: i64,
    pub pending_fee_students: i64,
    pub exam_count: i64,
}

/// Headline counters for one year. Without a year everything is zero.
pub fn dashboard_summary(conn: &Connection, year_id: Option<&str>) -> SchoolResult<DashboardSummary> {
    let Some(year_id) = year_id else {
        return Ok(DashboardSummary::default());
    };

    let active_students: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments WHERE academic_year_id = ?",
        [year_id],
        |r| r.get(0),
    )?;
    let pending_fee_students: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments e
         WHERE e.academic_year_id = ?
           AND EXISTS (
             SELECT 1 FROM payments p
             WHERE p.enrollment_id = e.id AND p.status = 'PENDING'
           )",
        [year_id],
        |r| r.get(0),
    )?;
    let exam_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM exams WHERE academic_year_id = ?",
        [year_id],
        |r| r.get(0),
    )?;

    Ok(DashboardSummary {
        academic_year_id: Some(year_id.to_string()),
        active_students,
        pending_fee_students,
        exam_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn counts_pending_enrollments_once() {
        let conn = fixtures::memory_db();
        let year = fixtures::year(&conn, "2024");
        let class_id = fixtures::class(&conn, "Class 9");
        let a = fixtures::student(&conn, "A");
        let b = fixtures::student(&conn, "B");
        let ea = fixtures::enrollment(&conn, &a, &year, &class_id, "A", None, Some(1));
        fixtures::enrollment(&conn, &b, &year, &class_id, "A", None, Some(2));
        fixtures::payment(&conn, &ea, "Midterm", 100, "PENDING");
        fixtures::payment(&conn, &ea, "Final", 100, "PENDING");
        fixtures::exam(&conn, "Midterm", &year);

        let summary = dashboard_summary(&conn, Some(year.as_str())).expect("summary");
        assert_eq!(summary.active_students, 2);
        assert_eq!(summary.pending_fee_students, 1);
        assert_eq!(summary.exam_count, 1);
        assert_eq!(
            dashboard_summary(&conn, None).expect("summary"),
            DashboardSummary::default()
        );
    }
}
