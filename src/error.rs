use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveType;

/// Every failure an HR operation can surface to the caller.
///
/// Business-rule rejections are deterministic, so nothing here is retried.
/// Store failures are logged where they happen and surface as 500s.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "No check-in found for today")]
    NoCheckInFound,

    #[display(fmt = "Check-out time is before check-in time")]
    CheckOutBeforeCheckIn,

    #[display(fmt = "Attendance record already exists for this employee and date")]
    DuplicateAttendance,

    #[display(fmt = "Username already taken")]
    DuplicateEmployee,

    #[display(fmt = "Invalid username: {}", _0)]
    InvalidUsername(&'static str),

    #[display(fmt = "Invalid range: {}", _0)]
    InvalidRange(String),

    #[display(fmt = "Reason must be at least {} characters", min_len)]
    InvalidReason { min_len: usize },

    #[display(fmt = "Leave request overlaps existing request #{}", existing_id)]
    Overlap { existing_id: u64 },

    #[display(
        fmt = "Insufficient {} leave balance: requested {} day(s), available {}",
        leave_type,
        requested,
        available
    )]
    InsufficientBalance {
        leave_type: LeaveType,
        requested: u32,
        available: u32,
    },

    #[display(fmt = "Leave request is not pending")]
    NotPending,

    #[display(fmt = "Leave request is still pending")]
    StillPending,

    #[display(fmt = "Payroll already exists for this employee and month")]
    DuplicatePayrollEntry,

    #[display(fmt = "{} must not be negative", _0)]
    NegativeAmount(&'static str),

    #[display(fmt = "{}", _0)]
    UnreasonableAmount(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "{}", _0)]
    Unauthorized(&'static str),

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl AppError {
    /// Stable machine-readable kind, used as the `error` field of responses.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AlreadyCheckedIn => "already_checked_in",
            AppError::AlreadyCheckedOut => "already_checked_out",
            AppError::NoCheckInFound => "no_check_in_found",
            AppError::CheckOutBeforeCheckIn => "check_out_before_check_in",
            AppError::DuplicateAttendance => "duplicate_attendance",
            AppError::DuplicateEmployee => "duplicate_employee",
            AppError::InvalidUsername(_) => "invalid_username",
            AppError::InvalidRange(_) => "invalid_range",
            AppError::InvalidReason { .. } => "invalid_reason",
            AppError::Overlap { .. } => "overlap",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::NotPending => "not_pending",
            AppError::StillPending => "still_pending",
            AppError::DuplicatePayrollEntry => "duplicate_payroll_entry",
            AppError::NegativeAmount(_) => "negative_amount",
            AppError::UnreasonableAmount(_) => "unreasonable_amount",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AlreadyCheckedIn
            | AppError::AlreadyCheckedOut
            | AppError::DuplicateAttendance
            | AppError::DuplicateEmployee
            | AppError::Overlap { .. }
            | AppError::NotPending
            | AppError::StillPending
            | AppError::DuplicatePayrollEntry => StatusCode::CONFLICT,
            AppError::NoCheckInFound
            | AppError::CheckOutBeforeCheckIn
            | AppError::InvalidUsername(_)
            | AppError::InvalidRange(_)
            | AppError::InvalidReason { .. }
            | AppError::InsufficientBalance { .. }
            | AppError::NegativeAmount(_)
            | AppError::UnreasonableAmount(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // never leak store details to the client
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(AppError::AlreadyCheckedIn.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotPending.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidRange("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidUsername("must not be empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Leave request").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("Admin only").status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn insufficient_balance_message_names_type_and_amounts() {
        let err = AppError::InsufficientBalance {
            leave_type: LeaveType::Sick,
            requested: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient sick leave balance: requested 5 day(s), available 2"
        );
        assert_eq!(err.kind(), "insufficient_balance");
    }

    #[test]
    fn internal_errors_hide_details() {
        let resp = AppError::Internal("bad row".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
