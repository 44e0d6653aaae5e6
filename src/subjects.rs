use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::db;
use crate::error::{require_text, SchoolError, SchoolResult};
use crate::model::{group_column, Group, Subject};

/// A subject as assigned to one class.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSubjectEntry {
    pub link_id: String,
    pub subject_id: String,
    pub name: String,
    pub code: String,
    pub group: Option<Group>,
    pub full_marks: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedSubjects {
    pub common: Vec<ClassSubjectEntry>,
    pub science: Vec<ClassSubjectEntry>,
    pub commerce: Vec<ClassSubjectEntry>,
    pub arts: Vec<ClassSubjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned { link_id: String },
    AlreadyAssigned,
}

pub const ALREADY_ASSIGNED_MESSAGE: &str = "Subject already assigned to this class";

pub fn list_subjects(conn: &Connection) -> SchoolResult<Vec<Subject>> {
    let mut stmt = conn.prepare("SELECT id, name, code FROM subjects ORDER BY name, rowid")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Subject {
                id: r.get(0)?,
                name: r.get(1)?,
                code: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Codes identify subjects; creating an existing code returns that subject.
pub fn create_subject(conn: &Connection, name: &str, code: &str) -> SchoolResult<Subject> {
    let name = require_text("name", name)?;
    let code = require_text("code", code)?;

    let existing = conn
        .query_row(
            "SELECT id, name, code FROM subjects WHERE code = ? ORDER BY rowid LIMIT 1",
            [&code],
            |r| {
                Ok(Subject {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    code: r.get(2)?,
                })
            },
        )
        .optional()?;
    if let Some(subject) = existing {
        return Ok(subject);
    }

    let id = db::new_id();
    conn.execute(
        "INSERT INTO subjects(id, name, code) VALUES(?, ?, ?)",
        (&id, &name, &code),
    )?;
    tracing::info!(subject_id = %id, %code, "subject created");
    Ok(Subject { id, name, code })
}

/// Every subject assigned to the class, common and group-specific alike.
pub fn class_subjects(conn: &Connection, class_id: &str) -> SchoolResult<Vec<ClassSubjectEntry>> {
    let mut stmt = conn.prepare(
        "SELECT cs.id, s.id, s.name, s.code, cs.subject_group, cs.full_marks
         FROM class_subjects cs
         JOIN subjects s ON s.id = cs.subject_id
         WHERE cs.class_id = ?
         ORDER BY s.name, cs.rowid",
    )?;
    let rows = stmt
        .query_map([class_id], |r| {
            Ok(ClassSubjectEntry {
                link_id: r.get(0)?,
                subject_id: r.get(1)?,
                name: r.get(2)?,
                code: r.get(3)?,
                group: Group::from_column(r.get(4)?),
                full_marks: r.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn is_effective(subject_group: Option<Group>, enrollment_group: Option<Group>) -> bool {
    match subject_group {
        None => true,
        Some(g) => enrollment_group == Some(g),
    }
}

/// Subjects a student in `group` actually takes in the class.
pub fn effective_subjects(
    conn: &Connection,
    class_id: &str,
    group: Option<Group>,
) -> SchoolResult<Vec<ClassSubjectEntry>> {
    Ok(class_subjects(conn, class_id)?
        .into_iter()
        .filter(|e| is_effective(e.group, group))
        .collect())
}

pub fn grouped(entries: Vec<ClassSubjectEntry>) -> GroupedSubjects {
    let mut out = GroupedSubjects::default();
    for e in entries {
        match e.group {
            None => out.common.push(e),
            Some(Group::Science) => out.science.push(e),
            Some(Group::Commerce) => out.commerce.push(e),
            Some(Group::Arts) => out.arts.push(e),
        }
    }
    out
}

pub fn assign_subject(
    conn: &Connection,
    class_id: &str,
    subject_id: &str,
    group: Option<Group>,
) -> SchoolResult<AssignOutcome> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM class_subjects WHERE class_id = ? AND subject_id = ?",
            (class_id, subject_id),
            |r| r.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(AssignOutcome::AlreadyAssigned);
    }

    let link_id = db::new_id();
    conn.execute(
        "INSERT INTO class_subjects(id, class_id, subject_id, subject_group)
         VALUES(?, ?, ?, ?)",
        (&link_id, class_id, subject_id, group_column(group)),
    )?;
    tracing::info!(%class_id, %subject_id, group = ?group, "subject assigned to class");
    Ok(AssignOutcome::Assigned { link_id })
}

/// Changes to one class-subject link. `None` leaves the field alone;
/// `group: Some(None)` makes the subject common.
#[derive(Debug, Clone, Default)]
pub struct ClassSubjectPatch {
    pub full_marks: Option<i64>,
    pub group: Option<Option<Group>>,
}

/// `None` when the link is unknown.
pub fn update_class_subject(
    conn: &Connection,
    link_id: &str,
    patch: &ClassSubjectPatch,
) -> SchoolResult<Option<()>> {
    if patch.full_marks.is_some_and(|v| v < 0) {
        return Err(SchoolError::validation("fullMarks must not be negative"));
    }
    let current: Option<(Option<i64>, Option<String>)> = conn
        .query_row(
            "SELECT full_marks, subject_group FROM class_subjects WHERE id = ?",
            [link_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((full_marks, group)) = current else {
        return Ok(None);
    };

    let full_marks = patch.full_marks.or(full_marks);
    let group = patch.group.unwrap_or_else(|| Group::from_column(group));
    conn.execute(
        "UPDATE class_subjects SET full_marks = ?, subject_group = ? WHERE id = ?",
        (full_marks, group_column(group), link_id),
    )?;
    Ok(Some(()))
}

pub fn delete_class_subject(conn: &Connection, link_id: &str) -> SchoolResult<bool> {
    let changed = conn.execute("DELETE FROM class_subjects WHERE id = ?", [link_id])?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn common_subjects_are_effective_for_every_group() {
        for g in [None, Some(Group::Science), Some(Group::Commerce), Some(Group::Arts)] {
            assert!(is_effective(None, g));
        }
        assert!(is_effective(Some(Group::Science), Some(Group::Science)));
        assert!(!is_effective(Some(Group::Science), Some(Group::Arts)));
        assert!(!is_effective(Some(Group::Science), None));
    }

    #[test]
    fn effective_subjects_filter_by_enrollment_group() {
        let conn = fixtures::memory_db();
        let class_id = fixtures::class(&conn, "Class 9");
        let bangla = fixtures::subject(&conn, "Bangla", "BAN");
        let physics = fixtures::subject(&conn, "Physics", "PHY");
        let accounting = fixtures::subject(&conn, "Accounting", "ACC");
        assign_subject(&conn, &class_id, &bangla, None).expect("assign");
        assign_subject(&conn, &class_id, &physics, Some(Group::Science)).expect("assign");
        assign_subject(&conn, &class_id, &accounting, Some(Group::Commerce)).expect("assign");

        let names = |g| {
            effective_subjects(&conn, &class_id, g)
                .expect("resolve")
                .into_iter()
                .map(|e| e.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(None), vec!["Bangla"]);
        assert_eq!(names(Some(Group::Science)), vec!["Bangla", "Physics"]);
        assert_eq!(names(Some(Group::Commerce)), vec!["Accounting", "Bangla"]);
        assert_eq!(names(Some(Group::Arts)), vec!["Bangla"]);
    }

    #[test]
    fn class_without_subjects_resolves_to_empty() {
        let conn = fixtures::memory_db();
        let class_id = fixtures::class(&conn, "Class 1");
        assert!(class_subjects(&conn, &class_id).expect("list").is_empty());
        assert!(effective_subjects(&conn, &class_id, Some(Group::Arts))
            .expect("resolve")
            .is_empty());
    }

    #[test]
    fn duplicate_assignment_is_reported_not_inserted() {
        let conn = fixtures::memory_db();
        let class_id = fixtures::class(&conn, "Class 10");
        let math = fixtures::subject(&conn, "Math", "MAT");

        let first = assign_subject(&conn, &class_id, &math, None).expect("first");
        assert!(matches!(first, AssignOutcome::Assigned { .. }));
        let second =
            assign_subject(&conn, &class_id, &math, Some(Group::Science)).expect("second");
        assert_eq!(second, AssignOutcome::AlreadyAssigned);

        let entries = class_subjects(&conn, &class_id).expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].group, None);
        assert_eq!(entries[0].full_marks, Some(100));
    }

    #[test]
    fn create_subject_reuses_existing_code() {
        let conn = fixtures::memory_db();
        let a = create_subject(&conn, "Physics", "PHY").expect("create");
        let b = create_subject(&conn, "Physics II", "PHY").expect("reuse");
        assert_eq!(a.id, b.id);
        assert_eq!(list_subjects(&conn).expect("list").len(), 1);
        assert!(create_subject(&conn, "  ", "X").is_err());
    }

    #[test]
    fn update_and_delete_class_subject() {
        let conn = fixtures::memory_db();
        let class_id = fixtures::class(&conn, "Class 11");
        let chem = fixtures::subject(&conn, "Chemistry", "CHE");
        let AssignOutcome::Assigned { link_id } =
            assign_subject(&conn, &class_id, &chem, None).expect("assign")
        else {
            panic!("expected a new assignment");
        };

        let patch = ClassSubjectPatch {
            full_marks: Some(75),
            group: Some(Some(Group::Science)),
        };
        update_class_subject(&conn, &link_id, &patch)
            .expect("update")
            .expect("link exists");
        let g = grouped(class_subjects(&conn, &class_id).expect("list"));
        assert!(g.common.is_empty());
        assert_eq!(g.science.len(), 1);
        assert_eq!(g.science[0].full_marks, Some(75));

        // Omitted fields are kept.
        let marks_only = ClassSubjectPatch {
            full_marks: Some(60),
            group: None,
        };
        update_class_subject(&conn, &link_id, &marks_only)
            .expect("update")
            .expect("link exists");
        let g = grouped(class_subjects(&conn, &class_id).expect("list"));
        assert_eq!(g.science[0].full_marks, Some(60));

        assert!(update_class_subject(&conn, "missing", &marks_only)
            .expect("update")
            .is_none());
        let negative = ClassSubjectPatch {
            full_marks: Some(-1),
            group: None,
        };
        assert!(update_class_subject(&conn, &link_id, &negative).is_err());
        assert!(delete_class_subject(&conn, &link_id).expect("delete"));
        assert!(!delete_class_subject(&conn, &link_id).expect("delete again"));
    }
}
