use crate::api::attendance::{AttendanceListResponse, CreateAttendance};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::leave_request::{CreateLeave, LeaveComment, LeaveFilter, LeaveListResponse};
use crate::api::payroll::{CreatePayroll, PaginatedPayrollResponse, UpdatePayroll};
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::{Payroll, SalaryComponents};
use crate::model::role::Role;
use crate::service::attendance::MonthlySummary;
use crate::service::payroll::SalarySlip;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dayflow HRM API",
        version = "0.1.0",
        description = r#"
## Dayflow Human Resource Management

Employees check in and out, apply for leave and read their salary slips.
Admins see everyone, decide leave requests and maintain payroll.

### Rules enforced by the API
- One attendance record per employee and day; work and extra hours are computed at check-out
- Leave requests may not overlap a pending or approved request of the same employee
- Paid and sick leave are debited on approval and a balance never goes negative
- Only pending requests can be approved or rejected
- Salary components must be non-negative; PF is capped at 15% and HRA at 60% of basic salary

### Security
Every endpoint requires a **JWT Bearer** access token.

### Response Format
- JSON responses, errors as `{"error": "<kind>", "message": "..."}`
- Pagination on list endpoints (`page`, `per_page`, `total`)
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::comment_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::monthly_summary,
        crate::api::attendance::list_attendance,
        crate::api::attendance::create_attendance,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls
    ),
    components(
        schemas(
            Role,
            Employee,
            CreateEmployee,
            EmployeeListResponse,
            Attendance,
            AttendanceStatus,
            CreateAttendance,
            AttendanceListResponse,
            MonthlySummary,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            CreateLeave,
            LeaveComment,
            LeaveFilter,
            LeaveListResponse,
            SalaryComponents,
            Payroll,
            SalarySlip,
            CreatePayroll,
            UpdatePayroll,
            PaginatedPayrollResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the paths refer to.
pub struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/check-in",
            "/api/attendance/monthly-summary",
            "/api/leaves/{id}/approve",
            "/api/leaves/{id}/comment",
            "/api/payroll/{payroll_id}",
            "/api/employees",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
