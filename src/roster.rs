use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::error::SchoolResult;
use crate::model::{FeeStatus, Group, PaymentStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub enrollment_id: String,
    pub student_id: String,
    pub student_name: String,
    pub phone: String,
    pub section: String,
    pub group: Option<Group>,
    pub roll: Option<i64>,
    pub fee_status: FeeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total_students: usize,
    pub sections: Vec<String>,
    pub groups: Vec<Group>,
    pub paid_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoster {
    pub academic_year_id: Option<String>,
    pub students: Vec<RosterRow>,
    pub stats: RosterStats,
}

/// PENDING as soon as one payment is pending. No payments at all counts as
/// PAID.
pub fn fee_status<I>(payments: I) -> FeeStatus
where
    I: IntoIterator<Item = PaymentStatus>,
{
    if payments.into_iter().any(|p| p == PaymentStatus::Pending) {
        FeeStatus::Pending
    } else {
        FeeStatus::Paid
    }
}

pub fn roster_stats(rows: &[RosterRow]) -> RosterStats {
    let sections: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.section.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let groups: BTreeSet<Group> = rows.iter().filter_map(|r| r.group).collect();
    let pending_count = rows
        .iter()
        .filter(|r| r.fee_status == FeeStatus::Pending)
        .count();

    RosterStats {
        total_students: rows.len(),
        sections: sections.into_iter().map(str::to_string).collect(),
        groups: groups.into_iter().collect(),
        paid_count: rows.len() - pending_count,
        pending_count,
    }
}

/// Enrollments of one class in one year with their fee standing.
/// Without a year the roster is empty rather than an error.
pub fn class_roster(
    conn: &Connection,
    class_id: &str,
    year_id: Option<&str>,
) -> SchoolResult<ClassRoster> {
    let Some(year_id) = year_id else {
        return Ok(ClassRoster::default());
    };

    let mut stmt = conn.prepare(
        "SELECT e.id, s.id, s.name, s.phone, e.section, e.student_group, e.roll
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         WHERE e.class_id = ? AND e.academic_year_id = ?
         ORDER BY e.section, e.roll IS NULL, e.roll, e.rowid",
    )?;
    let base = stmt
        .query_map((class_id, year_id), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                Group::from_column(r.get(5)?),
                r.get::<_, Option<i64>>(6)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut pay_stmt = conn.prepare(
        "SELECT p.enrollment_id, p.status
         FROM payments p
         JOIN enrollments e ON e.id = p.enrollment_id
         WHERE e.class_id = ? AND e.academic_year_id = ?",
    )?;
    let mut statuses: HashMap<String, Vec<PaymentStatus>> = HashMap::new();
    let pay_rows = pay_stmt.query_map((class_id, year_id), |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    for row in pay_rows {
        let (enrollment_id, status) = row?;
        statuses
            .entry(enrollment_id)
            .or_default()
            .push(PaymentStatus::from_column(&status));
    }

    let students: Vec<RosterRow> = base
        .into_iter()
        .map(
            |(enrollment_id, student_id, student_name, phone, section, group, roll)| {
                let fee = fee_status(
                    statuses
                        .get(&enrollment_id)
                        .map(|v| v.as_slice())
                        .unwrap_or(&[])
                        .iter()
                        .copied(),
                );
                RosterRow {
                    enrollment_id,
                    student_id,
                    student_name,
                    phone,
                    section,
                    group,
                    roll,
                    fee_status: fee,
                }
            },
        )
        .collect();

    let stats = roster_stats(&students);
    Ok(ClassRoster {
        academic_year_id: Some(year_id.to_string()),
        students,
        stats,
    })
}
