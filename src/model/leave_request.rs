use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Paid,
    Sick,
    Unpaid,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Pending and approved requests hold their dates; rejected ones free them.
    pub fn blocks_dates(&self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day count
    pub days: u32,
    pub reason: String,
    pub status: LeaveStatus,
    pub admin_comment: Option<String>,
}

impl LeaveRequest {
    /// Closed-interval overlap: both ranges share at least one calendar day.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
}
