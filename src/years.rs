use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db;
use crate::error::{require_text, SchoolResult};
use crate::model::{AcademicYear, Group};

/// Read/write cell holding the year a client has chosen as its default
/// context. Held per session and passed into the queries that need it.
pub trait ActiveYearSelector {
    fn get(&self) -> Option<String>;
    fn set(&mut self, year_id: String);
}

#[derive(Debug, Clone, Default)]
pub struct SessionYear {
    year_id: Option<String>,
}

impl ActiveYearSelector for SessionYear {
    fn get(&self) -> Option<String> {
        self.year_id.clone()
    }

    fn set(&mut self, year_id: String) {
        self.year_id = Some(year_id);
    }
}

/// One row of a student's enrollment history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummary {
    pub id: String,
    pub academic_year_id: String,
    pub year: String,
    pub class_id: String,
    pub class_name: String,
    pub section: String,
    pub group: Option<Group>,
    pub roll: Option<i64>,
}

/// Years ordered by name descending, the most recent first.
pub fn list_years(conn: &Connection) -> SchoolResult<Vec<AcademicYear>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, is_active FROM academic_years ORDER BY name DESC, rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(AcademicYear {
                id: r.get(0)?,
                name: r.get(1)?,
                is_active: r.get::<_, i64>(2)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_year(conn: &Connection, name: &str) -> SchoolResult<AcademicYear> {
    let name = require_text("name", name)?;
    let id = db::new_id();
    conn.execute(
        "INSERT INTO academic_years(id, name, is_active) VALUES(?, ?, 1)",
        (&id, &name),
    )?;
    tracing::info!(year_id = %id, %name, "academic year created");
    Ok(AcademicYear {
        id,
        name,
        is_active: true,
    })
}

pub fn year_exists(conn: &Connection, year_id: &str) -> SchoolResult<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM academic_years WHERE id = ?",
            [year_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

/// The selector's year when set, else the year with the greatest name.
/// Names are compared as stored text, so "2024" > "2023" but "Session 9"
/// > "Session 10".
pub fn resolve_active_year(
    conn: &Connection,
    selector: &dyn ActiveYearSelector,
) -> SchoolResult<Option<String>> {
    if let Some(id) = selector.get() {
        return Ok(Some(id));
    }
    let recent: Option<String> = conn
        .query_row(
            "SELECT id FROM academic_years ORDER BY name DESC, rowid LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(recent)
}

/// Explicit year wins over the session selection.
pub fn resolve_year_param(
    conn: &Connection,
    explicit: Option<&str>,
    selector: &dyn ActiveYearSelector,
) -> SchoolResult<Option<String>> {
    match explicit {
        Some(id) => Ok(Some(id.to_string())),
        None => resolve_active_year(conn, selector),
    }
}

pub fn enrollment_history(
    conn: &Connection,
    student_id: &str,
) -> SchoolResult<Vec<EnrollmentSummary>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.academic_year_id, y.name, e.class_id, c.name, e.section, e.student_group, e.roll
         FROM enrollments e
         JOIN academic_years y ON y.id = e.academic_year_id
         JOIN classes c ON c.id = e.class_id
         WHERE e.student_id = ?
         ORDER BY y.name DESC, e.rowid",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok(EnrollmentSummary {
                id: r.get(0)?,
                academic_year_id: r.get(1)?,
                year: r.get(2)?,
                class_id: r.get(3)?,
                class_name: r.get(4)?,
                section: r.get(5)?,
                group: Group::from_column(r.get(6)?),
                roll: r.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Enrollment in the active year if there is one, else the newest by year
/// name. `history` must already be ordered by year name descending.
pub fn current_enrollment<'a>(
    history: &'a [EnrollmentSummary],
    active_year_id: Option<&str>,
) -> Option<&'a EnrollmentSummary> {
    active_year_id
        .and_then(|year| history.iter().find(|e| e.academic_year_id == year))
        .or_else(|| history.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn selector_value_wins_over_most_recent_year() {
        let conn = fixtures::memory_db();
        let y2023 = fixtures::year(&conn, "2023");
        let y2024 = fixtures::year(&conn, "2024");

        let mut session = SessionYear::default();
        assert_eq!(
            resolve_active_year(&conn, &session).expect("resolve"),
            Some(y2024.clone())
        );
        session.set(y2023.clone());
        assert_eq!(
            resolve_active_year(&conn, &session).expect("resolve"),
            Some(y2023.clone())
        );
        assert_eq!(
            resolve_year_param(&conn, Some(y2024.as_str()), &session).expect("resolve"),
            Some(y2024)
        );
    }

    #[test]
    fn no_years_resolves_to_none() {
        let conn = fixtures::memory_db();
        let session = SessionYear::default();
        assert_eq!(resolve_active_year(&conn, &session).expect("resolve"), None);
    }

    #[test]
    fn current_enrollment_prefers_active_year_then_newest_name() {
        let conn = fixtures::memory_db();
        let y2023 = fixtures::year(&conn, "2023");
        let y2024 = fixtures::year(&conn, "2024");
        let y2025 = fixtures::year(&conn, "2025");
        let c8 = fixtures::class(&conn, "Class 8");
        let c9 = fixtures::class(&conn, "Class 9");
        let s = fixtures::student(&conn, "Rahim");
        let e8 = fixtures::enrollment(&conn, &s, &y2023, &c8, "A", None, Some(4));
        let e9 = fixtures::enrollment(&conn, &s, &y2024, &c9, "B", Some(Group::Science), None);

        let history = enrollment_history(&conn, &s).expect("history");
        assert_eq!(
            history.iter().map(|e| e.year.as_str()).collect::<Vec<_>>(),
            vec!["2024", "2023"]
        );

        assert_eq!(
            current_enrollment(&history, Some(y2023.as_str())).map(|e| e.id.as_str()),
            Some(e8.as_str())
        );
        // Active year without an enrollment falls back to the newest.
        assert_eq!(
            current_enrollment(&history, Some(y2025.as_str())).map(|e| e.id.as_str()),
            Some(e9.as_str())
        );
        assert_eq!(
            current_enrollment(&history, None).map(|e| e.class_name.as_str()),
            Some("Class 9")
        );
        assert!(current_enrollment(&[], Some(y2024.as_str())).is_none());
    }

    #[test]
    fn create_year_rejects_blank_name() {
        let conn = fixtures::memory_db();
        assert!(create_year(&conn, " ").is_err());
        let y = create_year(&conn, "2026").expect("create");
        assert!(year_exists(&conn, &y.id).expect("exists"));
        assert_eq!(list_years(&conn).expect("list").len(), 1);
    }
}
