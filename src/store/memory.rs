//! In-memory `HrStore`; one mutex per call stands in for row locks.

use std::sync::{Mutex, MutexGuard};

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use super::{HrStore, LeaveDecision, Page};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, AttendanceQuery, NewAttendance};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::payroll::{NewPayroll, Payroll, PayrollQuery, SalaryComponents};
use crate::service::ledger;

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    attendance: Vec<Attendance>,
    leaves: Vec<LeaveRequest>,
    payrolls: Vec<Payroll>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

fn paginate<T: Clone>(items: Vec<T>, page: Option<Page>) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = match page {
        Some(p) => items
            .into_iter()
            .skip(p.offset() as usize)
            .take(p.per_page as usize)
            .collect(),
        None => items,
    };
    (items, total)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl HrStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee> {
        let mut s = self.lock();
        if s.employees.iter().any(|e| e.username == new.username) {
            return Err(AppError::DuplicateEmployee);
        }
        let employee = Employee {
            id: s.next_id(),
            username: new.username,
            email: new.email,
            role: new.role,
            department: new.department,
            designation: new.designation,
            joining_date: new.joining_date,
            paid_leave_balance: new.paid_leave_balance,
            sick_leave_balance: new.sick_leave_balance,
        };
        s.employees.push(employee.clone());
        Ok(employee)
    }

    async fn employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.lock().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_employees(&self, page: Page) -> AppResult<(Vec<Employee>, i64)> {
        Ok(paginate(self.lock().employees.clone(), Some(page)))
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        Ok(self
            .lock()
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<Attendance> {
        let mut s = self.lock();
        if s.attendance
            .iter()
            .any(|a| a.employee_id == new.employee_id && a.date == new.date)
        {
            return Err(AppError::DuplicateAttendance);
        }
        let record = Attendance {
            id: s.next_id(),
            employee_id: new.employee_id,
            date: new.date,
            check_in: new.check_in,
            check_out: new.check_out,
            work_hours: new.work_hours,
            extra_hours: new.extra_hours,
            status: new.status,
        };
        s.attendance.push(record.clone());
        Ok(record)
    }

    async fn record_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        work_hours: String,
        extra_hours: String,
    ) -> AppResult<Attendance> {
        let mut s = self.lock();
        let record = s
            .attendance
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound("Attendance record"))?;
        if record.check_out.is_some() {
            return Err(AppError::AlreadyCheckedOut);
        }
        record.check_out = Some(check_out);
        record.work_hours = Some(work_hours);
        record.extra_hours = Some(extra_hours);
        Ok(record.clone())
    }

    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
        page: Option<Page>,
    ) -> AppResult<(Vec<Attendance>, i64)> {
        let mut rows: Vec<Attendance> = self
            .lock()
            .attendance
            .iter()
            .filter(|a| query.employee_id.is_none_or(|id| a.employee_id == id))
            .filter(|a| query.date.is_none_or(|d| a.date == d))
            .filter(|a| query.status.is_none_or(|st| a.status == st))
            .filter(|a| query.year.is_none_or(|y| a.date.year() == y))
            .filter(|a| query.month.is_none_or(|m| a.date.month() == m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(paginate(rows, page))
    }

    async fn leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.lock().leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn blocking_leaves(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<LeaveRequest>> {
        Ok(self
            .lock()
            .leaves
            .iter()
            .filter(|l| {
                l.employee_id == employee_id && l.status.blocks_dates() && l.overlaps(start, end)
            })
            .cloned()
            .collect())
    }

    async fn insert_leave(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let mut s = self.lock();
        if let Some(existing) = s.leaves.iter().find(|l| {
            l.employee_id == new.employee_id
                && l.status.blocks_dates()
                && l.overlaps(new.start_date, new.end_date)
        }) {
            return Err(AppError::Overlap {
                existing_id: existing.id,
            });
        }
        let request = LeaveRequest {
            id: s.next_id(),
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            days: new.days,
            reason: new.reason,
            status: LeaveStatus::Pending,
            admin_comment: None,
        };
        s.leaves.push(request.clone());
        Ok(request)
    }

    async fn decide_leave(&self, id: u64, decision: LeaveDecision) -> AppResult<LeaveRequest> {
        let mut s = self.lock();
        let idx = s
            .leaves
            .iter()
            .position(|l| l.id == id)
            .ok_or(AppError::NotFound("Leave request"))?;
        if s.leaves[idx].status != LeaveStatus::Pending {
            return Err(AppError::NotPending);
        }

        if let Some(debit) = &decision.debit {
            let employee = s
                .employees
                .iter_mut()
                .find(|e| e.id == debit.employee_id)
                .ok_or(AppError::NotFound("Employee"))?;
            ledger::apply(employee, debit)?;
        }

        let request = &mut s.leaves[idx];
        request.status = decision.status;
        request.admin_comment = decision.comment;
        Ok(request.clone())
    }

    async fn set_leave_comment(
        &self,
        id: u64,
        comment: Option<String>,
    ) -> AppResult<LeaveRequest> {
        let mut s = self.lock();
        let request = s
            .leaves
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(AppError::NotFound("Leave request"))?;
        request.admin_comment = comment;
        Ok(request.clone())
    }

    async fn list_leaves(
        &self,
        query: &LeaveQuery,
        page: Page,
    ) -> AppResult<(Vec<LeaveRequest>, i64)> {
        let mut rows: Vec<LeaveRequest> = self
            .lock()
            .leaves
            .iter()
            .filter(|l| query.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| query.status.is_none_or(|st| l.status == st))
            .filter(|l| query.leave_type.is_none_or(|t| l.leave_type == t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(rows, Some(page)))
    }

    async fn insert_payroll(&self, new: NewPayroll) -> AppResult<Payroll> {
        let mut s = self.lock();
        if s.payrolls
            .iter()
            .any(|p| p.employee_id == new.employee_id && p.month == new.month)
        {
            return Err(AppError::DuplicatePayrollEntry);
        }
        let payroll = Payroll {
            id: s.next_id(),
            employee_id: new.employee_id,
            month: new.month,
            components: new.components,
            net_salary: new.net_salary,
        };
        s.payrolls.push(payroll.clone());
        Ok(payroll)
    }

    async fn payroll(&self, id: u64) -> AppResult<Option<Payroll>> {
        Ok(self.lock().payrolls.iter().find(|p| p.id == id).cloned())
    }

    async fn update_payroll(
        &self,
        id: u64,
        components: SalaryComponents,
        net_salary: Decimal,
    ) -> AppResult<Payroll> {
        let mut s = self.lock();
        let payroll = s
            .payrolls
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound("Payroll"))?;
        payroll.components = components;
        payroll.net_salary = net_salary;
        Ok(payroll.clone())
    }

    async fn list_payrolls(
        &self,
        query: &PayrollQuery,
        page: Page,
    ) -> AppResult<(Vec<Payroll>, i64)> {
        let mut rows: Vec<Payroll> = self
            .lock()
            .payrolls
            .iter()
            .filter(|p| query.employee_id.is_none_or(|id| p.employee_id == id))
            .filter(|p| query.month.is_none_or(|m| p.month == m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(paginate(rows, Some(page)))
    }
}
