//! Leave workflow: `Pending -> {Approved, Rejected}`.
//!
//! Balance sufficiency is checked when a request is created and enforced a
//! second time, atomically, when it is approved. Between the two the days
//! are not reserved, so an approval can still fail with `InsufficientBalance`
//! if another approval consumed the balance first.

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::auth::auth::AuthUser;
use crate::config::HrPolicy;
use crate::error::{AppError, AppResult};
use crate::model::leave_request::{
    LeaveQuery, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::service::ledger::{self, Debit};
use crate::store::{HrStore, LeaveDecision, Page};

/// Inclusive day count of `start..=end`, bounded by the policy's maximum span.
pub fn span_days(start: NaiveDate, end: NaiveDate, max_span_days: u32) -> AppResult<u32> {
    if end < start {
        return Err(AppError::InvalidRange(format!(
            "end date {end} is before start date {start}"
        )));
    }
    let days = (end - start).num_days() + 1;
    if days > i64::from(max_span_days) {
        return Err(AppError::InvalidRange(format!(
            "{days} days exceeds the maximum of {max_span_days}"
        )));
    }
    Ok(days as u32)
}

pub fn validate_reason(reason: &str, min_len: usize) -> AppResult<()> {
    if reason.trim().chars().count() < min_len {
        return Err(AppError::InvalidReason { min_len });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[instrument(
    skip(store, policy, caller, application),
    fields(employee_id = caller.employee_id, user = %caller.username, leave_type = %application.leave_type)
)]
pub async fn create<S: HrStore>(
    store: &S,
    policy: &HrPolicy,
    caller: &AuthUser,
    application: LeaveApplication,
) -> AppResult<LeaveRequest> {
    let days = span_days(
        application.start_date,
        application.end_date,
        policy.max_leave_span_days,
    )?;
    validate_reason(&application.reason, policy.min_reason_len)?;

    let employee = store
        .employee(caller.employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    let blocking = store
        .blocking_leaves(employee.id, application.start_date, application.end_date)
        .await?;
    if let Some(existing) = blocking.iter().find(|l| {
        l.status.blocks_dates() && l.overlaps(application.start_date, application.end_date)
    }) {
        return Err(AppError::Overlap {
            existing_id: existing.id,
        });
    }

    ledger::ensure_sufficient(&employee, application.leave_type, days)?;

    let request = store
        .insert_leave(NewLeaveRequest {
            employee_id: employee.id,
            leave_type: application.leave_type,
            start_date: application.start_date,
            end_date: application.end_date,
            days,
            reason: application.reason.trim().to_string(),
        })
        .await?;

    info!(leave_id = request.id, days, "Leave request submitted");
    Ok(request)
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[instrument(skip(store, caller, comment), fields(admin = caller.employee_id))]
pub async fn approve<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    leave_id: u64,
    comment: Option<String>,
) -> AppResult<LeaveRequest> {
    caller.require_admin()?;

    let request = store
        .leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;
    if request.status != LeaveStatus::Pending {
        return Err(AppError::NotPending);
    }

    let debit = Debit::for_request(&request);
    if let Some(debit) = &debit {
        // fail fast on the current balance; the store re-checks atomically
        let mut employee = store
            .employee(request.employee_id)
            .await?
            .ok_or(AppError::NotFound("Employee"))?;
        if let Err(e) = ledger::apply(&mut employee, debit) {
            warn!(leave_id, employee_id = request.employee_id, "Balance no longer covers the request");
            return Err(e);
        }
    }

    let decision = LeaveDecision {
        status: LeaveStatus::Approved,
        comment: normalize_comment(comment),
        debit,
    };

    let approved = store.decide_leave(leave_id, decision).await.map_err(|e| {
        if let AppError::InsufficientBalance { .. } = e {
            warn!(leave_id, employee_id = request.employee_id, "Balance consumed since request was created");
        }
        e
    })?;

    info!(
        leave_id,
        employee_id = approved.employee_id,
        days = approved.days,
        "Leave approved"
    );
    Ok(approved)
}

#[instrument(skip(store, caller, comment), fields(admin = caller.employee_id))]
pub async fn reject<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    leave_id: u64,
    comment: Option<String>,
) -> AppResult<LeaveRequest> {
    caller.require_admin()?;

    let request = store
        .leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;
    if request.status != LeaveStatus::Pending {
        return Err(AppError::NotPending);
    }

    let rejected = store
        .decide_leave(
            leave_id,
            LeaveDecision {
                status: LeaveStatus::Rejected,
                comment: normalize_comment(comment),
                debit: None,
            },
        )
        .await?;

    info!(leave_id, employee_id = rejected.employee_id, "Leave rejected");
    Ok(rejected)
}

/// Rewrites the admin comment of an already decided request.
pub async fn comment<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    leave_id: u64,
    comment: Option<String>,
) -> AppResult<LeaveRequest> {
    caller.require_admin()?;

    let request = store
        .leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;
    if request.status == LeaveStatus::Pending {
        return Err(AppError::StillPending);
    }

    store
        .set_leave_comment(leave_id, normalize_comment(comment))
        .await
}

pub async fn get<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    leave_id: u64,
) -> AppResult<LeaveRequest> {
    let request = store
        .leave(leave_id)
        .await?
        .ok_or(AppError::NotFound("Leave request"))?;
    caller.require_owner_or_admin(request.employee_id)?;
    Ok(request)
}

pub async fn list<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    mut query: LeaveQuery,
    page: Page,
) -> AppResult<(Vec<LeaveRequest>, i64)> {
    query.employee_id = caller.scope(query.employee_id)?;
    store.list_leaves(&query, page).await
}
