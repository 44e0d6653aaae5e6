use rusqlite::{Connection, OptionalExtension};

use crate::db;
use crate::error::{require_text, SchoolError, SchoolResult};
use crate::model::{Payment, PaymentStatus};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub enrollment_id: String,
    pub term: String,
    pub amount: i64,
    pub status: PaymentStatus,
    /// Only kept for PAID payments; defaults to now.
    pub paid_at: Option<String>,
}

fn paid_at_for(status: PaymentStatus, requested: Option<&str>) -> Option<String> {
    match status {
        PaymentStatus::Paid => Some(
            requested
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(db::now_rfc3339),
        ),
        PaymentStatus::Pending => None,
    }
}

/// `None` when the enrollment does not exist.
pub fn add_payment(conn: &Connection, input: &NewPayment) -> SchoolResult<Option<Payment>> {
    let term = require_text("term", &input.term)?;
    if input.amount < 0 {
        return Err(SchoolError::validation("amount must not be negative"));
    }

    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM enrollments WHERE id = ?",
            [&input.enrollment_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }

    let payment = Payment {
        id: db::new_id(),
        enrollment_id: input.enrollment_id.clone(),
        term,
        amount: input.amount,
        status: input.status,
        paid_at: paid_at_for(input.status, input.paid_at.as_deref()),
    };
    conn.execute(
        "INSERT INTO payments(id, enrollment_id, term, amount, status, paid_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &payment.id,
            &payment.enrollment_id,
            &payment.term,
            payment.amount,
            payment.status.as_str(),
            &payment.paid_at,
        ),
    )?;
    tracing::info!(
        payment_id = %payment.id,
        enrollment_id = %payment.enrollment_id,
        status = payment.status.as_str(),
        "payment recorded"
    );
    Ok(Some(payment))
}

pub fn list_payments(conn: &Connection, enrollment_id: &str) -> SchoolResult<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT id, enrollment_id, term, amount, status, paid_at
         FROM payments
         WHERE enrollment_id = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([enrollment_id], |r| {
            let status: String = r.get(4)?;
            Ok(Payment {
                id: r.get(0)?,
                enrollment_id: r.get(1)?,
                term: r.get(2)?,
                amount: r.get(3)?,
                status: PaymentStatus::from_column(&status),
                paid_at: r.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Marks a payment paid or pending again. `None` when the payment is unknown.
pub fn set_payment_status(
    conn: &Connection,
    payment_id: &str,
    status: PaymentStatus,
    paid_at: Option<&str>,
) -> SchoolResult<Option<Payment>> {
    let enrollment_id: Option<String> = conn
        .query_row(
            "SELECT enrollment_id FROM payments WHERE id = ?",
            [payment_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(enrollment_id) = enrollment_id else {
        return Ok(None);
    };

    conn.execute(
        "UPDATE payments SET status = ?, paid_at = ? WHERE id = ?",
        (status.as_str(), paid_at_for(status, paid_at), payment_id),
    )?;
    let updated = list_payments(conn, &enrollment_id)?
        .into_iter()
        .find(|p| p.id == payment_id);
    Ok(updated)
}
