use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::{error, info};

use super::{HrStore, LeaveDecision, Page};
use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, AttendanceQuery, AttendanceStatus, NewAttendance};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{
    LeaveQuery, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::model::payroll::{NewPayroll, Payroll, PayrollQuery, SalaryComponents};
use crate::model::role::Role;
use crate::service::ledger::Debit;
use crate::utils::db_utils::{Filter, SqlValue, bind_query_as, bind_scalar};

const EMPLOYEE_COLUMNS: &str = "id, username, email, role, department, designation, joining_date, \
     paid_leave_balance, sick_leave_balance";
const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, check_in, check_out, work_hours, extra_hours, status";
const LEAVE_COLUMNS: &str =
    "id, employee_id, leave_type, start_date, end_date, days, reason, status, admin_comment";
const PAYROLL_COLUMNS: &str = "id, employee_id, month, basic_salary, hra, standard_allowance, \
     other_allowances, pf, professional_tax, net_salary";

/// `HrStore` on MySQL. Uniqueness comes from the schema's unique keys,
/// per-employee serialization from `SELECT ... FOR UPDATE`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_enum<T: FromStr>(column: &str, raw: &str) -> AppResult<T> {
    T::from_str(raw).map_err(|_| AppError::Internal(format!("unexpected {column} value {raw:?}")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn log_db_error(e: sqlx::Error, what: &str) -> AppError {
    error!(error = %e, "{what} failed");
    AppError::Database(e)
}

// ---------- rows ----------

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    username: String,
    email: String,
    role: String,
    department: Option<String>,
    designation: Option<String>,
    joining_date: Option<NaiveDate>,
    paid_leave_balance: u32,
    sick_leave_balance: u32,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> AppResult<Self> {
        Ok(Employee {
            id: row.id,
            username: row.username,
            email: row.email,
            role: parse_enum::<Role>("role", &row.role)?,
            department: row.department,
            designation: row.designation,
            joining_date: row.joining_date,
            paid_leave_balance: row.paid_leave_balance,
            sick_leave_balance: row.sick_leave_balance,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    work_hours: Option<String>,
    extra_hours: Option<String>,
    status: String,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> AppResult<Self> {
        Ok(Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            work_hours: row.work_hours,
            extra_hours: row.extra_hours,
            status: parse_enum::<AttendanceStatus>("attendance status", &row.status)?,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: u32,
    reason: String,
    status: String,
    admin_comment: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> AppResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: parse_enum::<LeaveType>("leave type", &row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            days: row.days,
            reason: row.reason,
            status: parse_enum::<LeaveStatus>("leave status", &row.status)?,
            admin_comment: row.admin_comment,
        })
    }
}

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    month: NaiveDate,
    basic_salary: Decimal,
    hra: Decimal,
    standard_allowance: Decimal,
    other_allowances: Decimal,
    pf: Decimal,
    professional_tax: Decimal,
    net_salary: Decimal,
}

impl From<PayrollRow> for Payroll {
    fn from(row: PayrollRow) -> Self {
        Payroll {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            components: SalaryComponents {
                basic_salary: row.basic_salary,
                hra: row.hra,
                standard_allowance: row.standard_allowance,
                other_allowances: row.other_allowances,
                pf: row.pf,
                professional_tax: row.professional_tax,
            },
            net_salary: row.net_salary,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ---------- transactional helpers ----------

async fn lock_leave(tx: &mut Transaction<'_, MySql>, id: u64) -> AppResult<LeaveRequest> {
    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE");
    let row = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| log_db_error(e, "Lock leave request"))?
        .ok_or(AppError::NotFound("Leave request"))?;
    row.try_into()
}

/// Compare-and-swap on the balance column; rows_affected = 0 means too little left.
async fn debit_balance(tx: &mut Transaction<'_, MySql>, debit: &Debit) -> AppResult<()> {
    let column = debit.kind.column();
    let sql = format!("UPDATE employees SET {column} = {column} - ? WHERE id = ? AND {column} >= ?");
    let result = sqlx::query(&sql)
        .bind(debit.days)
        .bind(debit.employee_id)
        .bind(debit.days)
        .execute(&mut **tx)
        .await
        .map_err(|e| log_db_error(e, "Debit leave balance"))?;

    if result.rows_affected() == 0 {
        let sql = format!("SELECT {column} FROM employees WHERE id = ?");
        let available = sqlx::query_scalar::<_, u32>(&sql)
            .bind(debit.employee_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| log_db_error(e, "Fetch leave balance"))?
            .ok_or(AppError::NotFound("Employee"))?;
        return Err(debit.insufficient(available));
    }
    Ok(())
}

impl MySqlStore {
    async fn fetch_attendance(&self, id: u64) -> AppResult<Attendance> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch attendance record"))?
            .ok_or(AppError::NotFound("Attendance record"))?;
        row.try_into()
    }

    async fn fetch_leave(&self, id: u64) -> AppResult<LeaveRequest> {
        self.leave(id)
            .await?
            .ok_or(AppError::NotFound("Leave request"))
    }

    async fn fetch_payroll(&self, id: u64) -> AppResult<Payroll> {
        self.payroll(id).await?.ok_or(AppError::NotFound("Payroll"))
    }
}

impl HrStore for MySqlStore {
    async fn insert_employee(&self, new: NewEmployee) -> AppResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (username, email, role, department, designation, joining_date,
                 paid_leave_balance, sick_leave_balance)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(new.role.as_ref())
        .bind(&new.department)
        .bind(&new.designation)
        .bind(new.joining_date)
        .bind(new.paid_leave_balance)
        .bind(new.sick_leave_balance)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmployee
            } else {
                log_db_error(e, "Insert employee")
            }
        })?;

        let id = result.last_insert_id();
        info!(employee_id = id, username = %new.username, "Employee created");
        self.employee(id)
            .await?
            .ok_or(AppError::NotFound("Employee"))
    }

    async fn employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch employee"))?
            .map(Employee::try_from)
            .transpose()
    }

    async fn list_employees(&self, page: Page) -> AppResult<(Vec<Employee>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Count employees"))?;

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "List employees"))?;

        Ok((convert_all(rows)?, total))
    }

    async fn attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        let sql =
            format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch attendance"))?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn insert_attendance(&self, new: NewAttendance) -> AppResult<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in, check_out, work_hours, extra_hours, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.check_in)
        .bind(new.check_out)
        .bind(&new.work_hours)
        .bind(&new.extra_hours)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // uq_attendance_employee_date
            if is_unique_violation(&e) {
                AppError::DuplicateAttendance
            } else {
                log_db_error(e, "Insert attendance")
            }
        })?;

        self.fetch_attendance(result.last_insert_id()).await
    }

    async fn record_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        work_hours: String,
        extra_hours: String,
    ) -> AppResult<Attendance> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, work_hours = ?, extra_hours = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(&work_hours)
        .bind(&extra_hours)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| log_db_error(e, "Check-out"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyCheckedOut);
        }
        self.fetch_attendance(id).await
    }

    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
        page: Option<Page>,
    ) -> AppResult<(Vec<Attendance>, i64)> {
        let filter = Filter::new()
            .and("employee_id = ?", query.employee_id.map(SqlValue::U64))
            .and("date = ?", query.date.map(SqlValue::Date))
            .and("status = ?", query.status.map(|s| SqlValue::Str(s.to_string())))
            .and("YEAR(date) = ?", query.year.map(SqlValue::I32))
            .and("MONTH(date) = ?", query.month.map(SqlValue::U32));

        let count_sql = format!("SELECT COUNT(*) FROM attendance{}", filter.sql);
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &filter.values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Count attendance"))?;

        let mut data_sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance{} ORDER BY date DESC, id DESC",
            filter.sql
        );
        let mut values = filter.values;
        if let Some(page) = page {
            data_sql.push_str(" LIMIT ? OFFSET ?");
            values.push(SqlValue::U32(page.per_page));
            values.push(SqlValue::U64(page.offset()));
        }

        let rows = bind_query_as(sqlx::query_as::<_, AttendanceRow>(&data_sql), &values)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "List attendance"))?;

        Ok((convert_all(rows)?, total))
    }

    async fn leave(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch leave request"))?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn blocking_leaves(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND status IN ('pending', 'approved') \
             AND start_date <= ? AND end_date >= ? ORDER BY start_date"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch overlapping leaves"))?;
        convert_all(rows)
    }

    async fn insert_leave(&self, new: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| log_db_error(e, "Begin leave insert"))?;

        // serializes concurrent creates of the same employee
        sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(new.employee_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| log_db_error(e, "Lock employee"))?
            .ok_or(AppError::NotFound("Employee"))?;

        let existing = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT id FROM leave_requests
            WHERE employee_id = ?
            AND status IN ('pending', 'approved')
            AND start_date <= ? AND end_date >= ?
            LIMIT 1
            "#,
        )
        .bind(new.employee_id)
        .bind(new.end_date)
        .bind(new.start_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| log_db_error(e, "Check overlapping leaves"))?;

        if let Some(existing_id) = existing {
            return Err(AppError::Overlap { existing_id });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, days, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_ref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.days)
        .bind(&new.reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| log_db_error(e, "Insert leave request"))?;

        tx.commit()
            .await
            .map_err(|e| log_db_error(e, "Commit leave insert"))?;
        self.fetch_leave(result.last_insert_id()).await
    }

    async fn decide_leave(&self, id: u64, decision: LeaveDecision) -> AppResult<LeaveRequest> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| log_db_error(e, "Begin leave decision"))?;

        let request = lock_leave(&mut tx, id).await?;
        if request.status != LeaveStatus::Pending {
            return Err(AppError::NotPending);
        }

        if let Some(debit) = &decision.debit {
            debit_balance(&mut tx, debit).await?;
        }

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, admin_comment = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(decision.status.as_ref())
        .bind(&decision.comment)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| log_db_error(e, "Decide leave request"))?;

        // dropping the transaction on any error above rolls the debit back
        tx.commit()
            .await
            .map_err(|e| log_db_error(e, "Commit leave decision"))?;
        self.fetch_leave(id).await
    }

    async fn set_leave_comment(
        &self,
        id: u64,
        comment: Option<String>,
    ) -> AppResult<LeaveRequest> {
        let result = sqlx::query("UPDATE leave_requests SET admin_comment = ? WHERE id = ?")
            .bind(&comment)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Update leave comment"))?;

        // MySQL reports 0 affected rows for unchanged values, so look it up
        if result.rows_affected() == 0 && self.leave(id).await?.is_none() {
            return Err(AppError::NotFound("Leave request"));
        }
        self.fetch_leave(id).await
    }

    async fn list_leaves(
        &self,
        query: &LeaveQuery,
        page: Page,
    ) -> AppResult<(Vec<LeaveRequest>, i64)> {
        let filter = Filter::new()
            .and("employee_id = ?", query.employee_id.map(SqlValue::U64))
            .and("status = ?", query.status.map(|s| SqlValue::Str(s.to_string())))
            .and(
                "leave_type = ?",
                query.leave_type.map(|t| SqlValue::Str(t.to_string())),
            );

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", filter.sql);
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &filter.values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Count leave requests"))?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY id DESC LIMIT ? OFFSET ?",
            filter.sql
        );
        let rows = bind_query_as(sqlx::query_as::<_, LeaveRow>(&data_sql), &filter.values)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "List leave requests"))?;

        Ok((convert_all(rows)?, total))
    }

    async fn insert_payroll(&self, new: NewPayroll) -> AppResult<Payroll> {
        let c = &new.components;
        let result = sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, month, basic_salary, hra, standard_allowance,
                 other_allowances, pf, professional_tax, net_salary)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.month)
        .bind(c.basic_salary)
        .bind(c.hra)
        .bind(c.standard_allowance)
        .bind(c.other_allowances)
        .bind(c.pf)
        .bind(c.professional_tax)
        .bind(new.net_salary)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // uq_payroll_employee_month
            if is_unique_violation(&e) {
                AppError::DuplicatePayrollEntry
            } else {
                log_db_error(e, "Insert payroll")
            }
        })?;

        self.fetch_payroll(result.last_insert_id()).await
    }

    async fn payroll(&self, id: u64) -> AppResult<Option<Payroll>> {
        let sql = format!("SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ?");
        let row = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Fetch payroll"))?;
        Ok(row.map(Payroll::from))
    }

    async fn update_payroll(
        &self,
        id: u64,
        components: SalaryComponents,
        net_salary: Decimal,
    ) -> AppResult<Payroll> {
        let c = &components;
        sqlx::query(
            r#"
            UPDATE payroll
            SET basic_salary = ?, hra = ?, standard_allowance = ?, other_allowances = ?,
                pf = ?, professional_tax = ?, net_salary = ?
            WHERE id = ?
            "#,
        )
        .bind(c.basic_salary)
        .bind(c.hra)
        .bind(c.standard_allowance)
        .bind(c.other_allowances)
        .bind(c.pf)
        .bind(c.professional_tax)
        .bind(net_salary)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| log_db_error(e, "Update payroll"))?;

        self.fetch_payroll(id).await
    }

    async fn list_payrolls(
        &self,
        query: &PayrollQuery,
        page: Page,
    ) -> AppResult<(Vec<Payroll>, i64)> {
        let filter = Filter::new()
            .and("employee_id = ?", query.employee_id.map(SqlValue::U64))
            .and("month = ?", query.month.map(SqlValue::Date));

        let count_sql = format!("SELECT COUNT(*) FROM payroll{}", filter.sql);
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &filter.values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "Count payrolls"))?;

        let data_sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll{} ORDER BY month DESC, id DESC LIMIT ? OFFSET ?",
            filter.sql
        );
        let rows = bind_query_as(sqlx::query_as::<_, PayrollRow>(&data_sql), &filter.values)
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_db_error(e, "List payrolls"))?;

        Ok((rows.into_iter().map(Payroll::from).collect(), total))
    }
}
