//! Persistence seam for the HR rules.
//!
//! Services are generic over [`HrStore`]; production uses [`mysql::MySqlStore`],
//! the test suite an in-memory store. Every method is atomic on its own: the
//! methods that guard an invariant (unique attendance day, leave overlap,
//! pending-only transitions, non-negative balances) check and write under the
//! same lock or transaction.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::model::attendance::{Attendance, AttendanceQuery, NewAttendance};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::payroll::{NewPayroll, Payroll, PayrollQuery, SalaryComponents};
use crate::service::ledger::Debit;

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// 1-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub const DEFAULT_PER_PAGE: u32 = 10;
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// Terminal transition of a pending leave request.
#[derive(Debug, Clone)]
pub struct LeaveDecision {
    pub status: LeaveStatus,
    pub comment: Option<String>,
    /// Balance to consume together with the transition
    pub debit: Option<Debit>,
}

#[allow(async_fn_in_trait)]
pub trait HrStore {
    // ---- employees / balance ledger ----

    /// Fails with `DuplicateEmployee` when the username is taken.
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee>;

    async fn employee(&self, id: u64) -> AppResult<Option<Employee>>;

    async fn list_employees(&self, page: Page) -> AppResult<(Vec<Employee>, i64)>;

    // ---- attendance ----

    async fn attendance_on(&self, employee_id: u64, date: NaiveDate)
    -> AppResult<Option<Attendance>>;

    /// Fails with `DuplicateAttendance` when (employee, date) already exists.
    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<Attendance>;

    /// Sets check-out only while it is still empty, `AlreadyCheckedOut` otherwise.
    async fn record_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        work_hours: String,
        extra_hours: String,
    ) -> AppResult<Attendance>;

    /// `page = None` returns every matching record.
    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
        page: Option<Page>,
    ) -> AppResult<(Vec<Attendance>, i64)>;

    // ---- leave requests ----

    async fn leave(&self, id: u64) -> AppResult<Option<LeaveRequest>>;

    /// Pending or approved requests of the employee sharing a day with `start..=end`.
    async fn blocking_leaves(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<LeaveRequest>>;

    /// Inserts a pending request, re-checking overlap under the employee lock.
    async fn insert_leave(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest>;

    /// Applies the decision only if the request is still pending, debiting the
    /// ledger in the same transaction. Nothing changes on failure.
    async fn decide_leave(&self, id: u64, decision: LeaveDecision) -> AppResult<LeaveRequest>;

    async fn set_leave_comment(&self, id: u64, comment: Option<String>)
    -> AppResult<LeaveRequest>;

    async fn list_leaves(
        &self,
        query: &LeaveQuery,
        page: Page,
    ) -> AppResult<(Vec<LeaveRequest>, i64)>;

    // ---- payroll ----

    /// Fails with `DuplicatePayrollEntry` when (employee, month) already exists.
    async fn insert_payroll(&self, new: NewPayroll) -> AppResult<Payroll>;

    async fn payroll(&self, id: u64) -> AppResult<Option<Payroll>>;

    async fn update_payroll(
        &self,
        id: u64,
        components: SalaryComponents,
        net_salary: Decimal,
    ) -> AppResult<Payroll>;

    async fn list_payrolls(
        &self,
        query: &PayrollQuery,
        page: Page,
    ) -> AppResult<(Vec<Payroll>, i64)>;
}
