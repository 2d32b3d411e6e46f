use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    OnLeave,
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub check_out: Option<NaiveTime>,
    /// Hours between check-in and check-out, two decimals ("9.00")
    #[schema(example = "9.00")]
    pub work_hours: Option<String>,
    /// Hours beyond the standard workday, two decimals ("1.00")
    #[schema(example = "1.00")]
    pub extra_hours: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub work_hours: Option<String>,
    pub extra_hours: Option<String>,
    pub status: AttendanceStatus,
}

/// Store-side filter for attendance listings.
#[derive(Debug, Clone, Default)]
pub struct AttendanceQuery {
    pub employee_id: Option<u64>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}
