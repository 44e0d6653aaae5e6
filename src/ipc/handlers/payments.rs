use crate::ipc::error::{err, ok, school_err};
use crate::ipc::helpers::{db_conn, optional_i64, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::PaymentStatus;
use crate::payments::{self, NewPayment};
use serde_json::json;

fn parse_status(req: &Request) -> Result<PaymentStatus, serde_json::Value> {
    match optional_str(req, "status") {
        None => Ok(PaymentStatus::Pending),
        Some(raw) => PaymentStatus::parse(&raw).map_err(|e| school_err(&req.id, e)),
    }
}

fn handle_payments_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let enrollment_id = match required_str(req, "enrollmentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let term = match required_str(req, "term") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let amount = match optional_i64(req, "amount") {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "bad_params", "missing amount", None),
        Err(e) => return e,
    };
    let status = match parse_status(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let input = NewPayment {
        enrollment_id,
        term,
        amount,
        status,
        paid_at: optional_str(req, "paidAt"),
    };
    match payments::add_payment(conn, &input) {
        Ok(Some(payment)) => ok(&req.id, json!({ "payment": payment })),
        Ok(None) => err(&req.id, "not_found", "enrollment not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_payments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let enrollment_id = match required_str(req, "enrollmentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match payments::list_payments(conn, &enrollment_id) {
        Ok(list) => ok(&req.id, json!({ "payments": list })),
        Err(e) => school_err(&req.id, e),
    }
}

fn handle_payments_set_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let payment_id = match required_str(req, "paymentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw = match required_str(req, "status") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let status = match PaymentStatus::parse(&raw) {
        Ok(v) => v,
        Err(e) => return school_err(&req.id, e),
    };
    let paid_at = optional_str(req, "paidAt");
    match payments::set_payment_status(conn, &payment_id, status, paid_at.as_deref()) {
        Ok(Some(payment)) => ok(&req.id, json!({ "payment": payment })),
        Ok(None) => err(&req.id, "not_found", "payment not found", None),
        Err(e) => school_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "payments.add" => Some(handle_payments_add(state, req)),
        "payments.list" => Some(handle_payments_list(state, req)),
        "payments.setStatus" => Some(handle_payments_set_status(state, req)),
        _ => None,
    }
}
