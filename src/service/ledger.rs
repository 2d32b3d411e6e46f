//! Balance ledger: per-employee paid and sick leave counters.
//!
//! Checking lives here; the atomic debit itself is done by the store, as a
//! guarded update (`balance >= days`) in the same transaction as the approval.

use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveType};

/// Leave types that draw from a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Paid,
    Sick,
}

impl BalanceKind {
    /// `None` for unpaid leave, which is never checked nor debited.
    pub fn of(leave_type: LeaveType) -> Option<Self> {
        match leave_type {
            LeaveType::Paid => Some(BalanceKind::Paid),
            LeaveType::Sick => Some(BalanceKind::Sick),
            LeaveType::Unpaid => None,
        }
    }

    pub fn leave_type(self) -> LeaveType {
        match self {
            BalanceKind::Paid => LeaveType::Paid,
            BalanceKind::Sick => LeaveType::Sick,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            BalanceKind::Paid => "paid_leave_balance",
            BalanceKind::Sick => "sick_leave_balance",
        }
    }
}

/// Days to take from one employee's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debit {
    pub employee_id: u64,
    pub kind: BalanceKind,
    pub days: u32,
}

impl Debit {
    /// The debit approving `request` must apply.
    pub fn for_request(request: &LeaveRequest) -> Option<Self> {
        BalanceKind::of(request.leave_type).map(|kind| Debit {
            employee_id: request.employee_id,
            kind,
            days: request.days,
        })
    }

    pub fn insufficient(&self, available: u32) -> AppError {
        AppError::InsufficientBalance {
            leave_type: self.kind.leave_type(),
            requested: self.days,
            available,
        }
    }
}

pub fn available(employee: &Employee, kind: BalanceKind) -> u32 {
    match kind {
        BalanceKind::Paid => employee.paid_leave_balance,
        BalanceKind::Sick => employee.sick_leave_balance,
    }
}

pub fn has_sufficient_balance(employee: &Employee, leave_type: LeaveType, days: u32) -> bool {
    match BalanceKind::of(leave_type) {
        Some(kind) => available(employee, kind) >= days,
        None => true,
    }
}

/// Fails with `InsufficientBalance` unless the counter covers `days`.
pub fn ensure_sufficient(employee: &Employee, leave_type: LeaveType, days: u32) -> AppResult<()> {
    if has_sufficient_balance(employee, leave_type, days) {
        return Ok(());
    }
    Err(AppError::InsufficientBalance {
        leave_type,
        requested: days,
        available: BalanceKind::of(leave_type).map_or(0, |kind| available(employee, kind)),
    })
}

/// Subtracts the debit from an in-memory employee, refusing to go below zero.
pub fn apply(employee: &mut Employee, debit: &Debit) -> AppResult<()> {
    let counter = match debit.kind {
        BalanceKind::Paid => &mut employee.paid_leave_balance,
        BalanceKind::Sick => &mut employee.sick_leave_balance,
    };
    *counter = counter
        .checked_sub(debit.days)
        .ok_or_else(|| debit.insufficient(*counter))?;
    Ok(())
}
