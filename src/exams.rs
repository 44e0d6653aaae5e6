use rusqlite::Connection;

use crate::db;
use crate::error::{require_text, SchoolError, SchoolResult};
use crate::model::Exam;
use crate::years;

pub fn create_exam(conn: &Connection, name: &str, year_id: &str) -> SchoolResult<Exam> {
    let name = require_text("name", name)?;
    if !years::year_exists(conn, year_id)? {
        return Err(SchoolError::validation(format!(
            "unknown academic year: {}",
            year_id
        )));
    }
    let id = db::new_id();
    conn.execute(
        "INSERT INTO exams(id, name, academic_year_id) VALUES(?, ?, ?)",
        (&id, &name, year_id),
    )?;
    tracing::info!(exam_id = %id, %name, "exam created");
    Ok(Exam {
        id,
        name,
        academic_year_id: year_id.to_string(),
    })
}

/// Exams of one year by name. Without a year there are none.
pub fn list_exams(conn: &Connection, year_id: Option<&str>) -> SchoolResult<Vec<Exam>> {
    let Some(year_id) = year_id else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(
        "SELECT id, name, academic_year_id FROM exams
         WHERE academic_year_id = ?
         ORDER BY name, rowid",
    )?;
    let rows = stmt
        .query_map([year_id], |r| {
            Ok(Exam {
                id: r.get(0)?,
                name: r.get(1)?,
                academic_year_id: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
