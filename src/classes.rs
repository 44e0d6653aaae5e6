use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db;
use crate::error::{require_text, SchoolResult};
use crate::model::Class;
use crate::subjects::{self, GroupedSubjects};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassListRow {
    pub id: String,
    pub name: String,
    pub subject_count: i64,
    /// Enrollments in the requested year; zero without a year.
    pub student_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDetails {
    pub id: String,
    pub name: String,
    pub subjects: GroupedSubjects,
}

pub fn list_classes(conn: &Connection, year_id: Option<&str>) -> SchoolResult<Vec<ClassListRow>> {
    // Correlated subqueries so the two counts don't multiply each other.
    let mut stmt = conn.prepare(
        "SELECT
           c.id,
           c.name,
           (SELECT COUNT(*) FROM class_subjects cs WHERE cs.class_id = c.id) AS subject_count,
           (SELECT COUNT(*) FROM enrollments e
             WHERE e.class_id = c.id AND e.academic_year_id = ?) AS student_count
         FROM classes c
         ORDER BY c.name, c.rowid",
    )?;
    let rows = stmt
        .query_map([year_id], |r| {
            Ok(ClassListRow {
                id: r.get(0)?,
                name: r.get(1)?,
                subject_count: r.get(2)?,
                student_count: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_class(conn: &Connection, name: &str) -> SchoolResult<Class> {
    let name = require_text("name", name)?;
    let id = db::new_id();
    conn.execute("INSERT INTO classes(id, name) VALUES(?, ?)", (&id, &name))?;
    tracing::info!(class_id = %id, %name, "class created");
    Ok(Class { id, name })
}

pub fn get_class(conn: &Connection, class_id: &str) -> SchoolResult<Option<Class>> {
    let class = conn
        .query_row(
            "SELECT id, name FROM classes WHERE id = ?",
            [class_id],
            |r| {
                Ok(Class {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(class)
}

/// The class with its subjects split into common and per-group buckets.
pub fn class_details(conn: &Connection, class_id: &str) -> SchoolResult<Option<ClassDetails>> {
    let Some(class) = get_class(conn, class_id)? else {
        return Ok(None);
    };
    let entries = subjects::class_subjects(conn, class_id)?;
    Ok(Some(ClassDetails {
        id: class.id,
        name: class.name,
        subjects: subjects::grouped(entries),
    }))
}
