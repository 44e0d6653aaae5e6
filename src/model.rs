use serde::{Deserialize, Serialize};

use crate::error::{SchoolError, SchoolResult};

/// Academic track. A class subject or enrollment without a group is
/// "common" and is modelled as `Option<Group>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Group {
    Science,
    Commerce,
    Arts,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Science => "SCIENCE",
            Group::Commerce => "COMMERCE",
            Group::Arts => "ARTS",
        }
    }

    /// Parses user input. Blank, "all" and "none" select the common case.
    pub fn parse_optional(raw: Option<&str>) -> SchoolResult<Option<Group>> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "ALL" | "NONE" | "COMMON" => Ok(None),
            "SCIENCE" => Ok(Some(Group::Science)),
            "COMMERCE" => Ok(Some(Group::Commerce)),
            "ARTS" => Ok(Some(Group::Arts)),
            other => Err(SchoolError::validation(format!(
                "group must be one of SCIENCE, COMMERCE, ARTS (got {})",
                other
            ))),
        }
    }

    /// Reads a stored column. Unrecognised text is treated as common.
    pub fn from_column(raw: Option<String>) -> Option<Group> {
        Group::parse_optional(raw.as_deref()).ok().flatten()
    }
}

pub fn group_column(group: Option<Group>) -> Option<&'static str> {
    group.map(Group::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Pending => "PENDING",
        }
    }

    pub fn parse(raw: &str) -> SchoolResult<PaymentStatus> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PAID" => Ok(PaymentStatus::Paid),
            "PENDING" => Ok(PaymentStatus::Pending),
            other => Err(SchoolError::validation(format!(
                "status must be PAID or PENDING (got {})",
                other
            ))),
        }
    }

    /// Column default is PENDING, so anything unrecognised reads as pending.
    pub fn from_column(raw: &str) -> PaymentStatus {
        PaymentStatus::parse(raw).unwrap_or(PaymentStatus::Pending)
    }
}

/// Fee standing of one enrollment, derived from its payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStatus {
    Paid,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub phone: String,
    pub address: String,
    pub nid_dob: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub academic_year_id: String,
    pub class_id: String,
    pub section: String,
    pub group: Option<Group>,
    pub roll: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub enrollment_id: String,
    pub term: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub academic_year_id: String,
}
