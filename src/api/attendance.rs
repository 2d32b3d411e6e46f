use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::attendance::{Attendance, AttendanceQuery, AttendanceStatus},
    service::attendance::{self as tracker, ManualAttendance},
    store::{HrStore, Page},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryParams {
    /// 1..=12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Admin only; employees always get their own summary
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<u64>,
    #[param(value_type = Option<String>, example = "2026-01-15")]
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2026-01-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    #[serde(default = "default_status")]
    pub status: AttendanceStatus,
}

fn default_status() -> AttendanceStatus {
    AttendanceStatus::Present
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 22)]
    pub total: i64,
}

/// Check in for today
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in", body = Attendance),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "already_checked_in",
            "message": "Already checked in today"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    let record = tracker::check_in(store.get_ref(), &auth, Local::now().naive_local()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check out for today
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out; work and extra hours filled in", body = Attendance),
        (status = 400, description = "No check-in found for today", body = Object, example = json!({
            "error": "no_check_in_found",
            "message": "No check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already checked out today"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let record = tracker::check_out(
        store.get_ref(),
        &config.policy,
        &auth,
        Local::now().naive_local(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Monthly attendance summary
#[utoipa::path(
    get,
    path = "/api/attendance/monthly-summary",
    params(SummaryParams),
    responses(
        (status = 200, description = "Per-status day counts", body = tracker::MonthlySummary),
        (status = 400, description = "Month out of range"),
        (status = 403, description = "Summary of another employee requested by a non-admin")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_summary<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    params: web::Query<SummaryParams>,
) -> actix_web::Result<impl Responder> {
    let today = Local::now().date_naive();
    let summary = tracker::monthly_summary(
        store.get_ref(),
        &auth,
        params.month.unwrap_or(today.month()),
        params.year.unwrap_or(today.year()),
        params.employee_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    filter: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let filter = filter.into_inner();
    let page = Page::new(filter.page, filter.per_page);
    let query = AttendanceQuery {
        employee_id: filter.employee_id,
        date: filter.date,
        status: filter.status,
        year: filter.year,
        month: filter.month,
    };

    let (data, total) = tracker::list(store.get_ref(), &auth, query, page).await?;
    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Record attendance on behalf of an employee (admin)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Attendance),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee already has a record for that date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn create_attendance<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    config: web::Data<Config>,
    payload: web::Json<CreateAttendance>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let record = tracker::create_record(
        store.get_ref(),
        &config.policy,
        &auth,
        ManualAttendance {
            employee_id: payload.employee_id,
            date: payload.date,
            check_in: payload.check_in,
            check_out: payload.check_out,
            status: payload.status,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(record))
}
