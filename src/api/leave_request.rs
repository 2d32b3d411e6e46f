use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, LeaveType},
    service::leave::{self as workflow, LeaveApplication},
    store::{HrStore, Page},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "paid")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family wedding out of town")]
    pub reason: String,
}

/// Optional admin note attached to a decision or added afterwards.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LeaveComment {
    #[schema(example = "Enjoy the break")]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID (admins only)
    #[schema(example = 123)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Filter by leave type
    #[schema(example = "sick")]
    pub leave_type: Option<LeaveType>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted, status pending", body = LeaveRequest),
        (status = 400, description = "Invalid range, short reason or insufficient balance", body = Object,
         example = json!({
            "error": "insufficient_balance",
            "message": "Insufficient paid leave balance: requested 5 day(s), available 2"
         })
        ),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps an existing pending or approved request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let request = workflow::create(
        store.get_ref(),
        &config.policy,
        &auth,
        LeaveApplication {
            leave_type: payload.leave_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: payload.reason,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(request))
}

/// List leave requests
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave requests", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    filter: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let filter = filter.into_inner();
    let page = Page::new(filter.page, filter.per_page);
    let query = LeaveQuery {
        employee_id: filter.employee_id,
        status: filter.status,
        leave_type: filter.leave_type,
    };

    let (data, total) = workflow::list(store.get_ref(), &auth, query, page).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Get a leave request by ID
#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = workflow::get(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Approve a pending leave request (admin)
#[utoipa::path(
    post,
    path = "/api/leaves/{id}/approve",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    request_body = LeaveComment,
    responses(
        (status = 200, description = "Approved; paid and sick leave debited from the balance", body = LeaveRequest),
        (status = 400, description = "Balance no longer covers the request"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not pending", body = Object, example = json!({
            "error": "not_pending",
            "message": "Leave request is not pending"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
    body: Option<web::Json<LeaveComment>>,
) -> actix_web::Result<impl Responder> {
    let comment = body.map(|b| b.into_inner()).unwrap_or_default().comment;
    let request = workflow::approve(store.get_ref(), &auth, path.into_inner(), comment).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Reject a pending leave request (admin)
#[utoipa::path(
    post,
    path = "/api/leaves/{id}/reject",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    request_body = LeaveComment,
    responses(
        (status = 200, description = "Rejected; balance untouched", body = LeaveRequest),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
    body: Option<web::Json<LeaveComment>>,
) -> actix_web::Result<impl Responder> {
    let comment = body.map(|b| b.into_inner()).unwrap_or_default().comment;
    let request = workflow::reject(store.get_ref(), &auth, path.into_inner(), comment).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Set or clear the admin comment on a decided request (admin)
#[utoipa::path(
    put,
    path = "/api/leaves/{id}/comment",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    request_body = LeaveComment,
    responses(
        (status = 200, description = "Comment updated", body = LeaveRequest),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request is still pending; comment through approve or reject")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn comment_leave<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
    body: web::Json<LeaveComment>,
) -> actix_web::Result<impl Responder> {
    let request = workflow::comment(
        store.get_ref(),
        &auth,
        path.into_inner(),
        body.into_inner().comment,
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}
