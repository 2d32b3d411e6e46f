use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::{employee::Employee, role::Role},
    service::employee::{self as directory, Onboarding},
    store::{HrStore, Page},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[serde(default = "default_role")]
    #[schema(example = "employee")]
    pub role: Role,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Developer")]
    pub designation: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub joining_date: Option<NaiveDate>,
}

fn default_role() -> Role {
    Role::Employee
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 5)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created with the default leave accrual", body = Employee),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already taken", body = Object, example = json!({
            "error": "duplicate_employee",
            "message": "Username already taken"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let employee = directory::create(
        store.get_ref(),
        &config.policy,
        &auth,
        Onboarding {
            username: payload.username,
            email: payload.email,
            role: payload.role,
            department: payload.department,
            designation: payload.designation,
            joining_date: payload.joining_date,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let page = Page::new(query.page, query.per_page);
    let (data, total) = directory::list(store.get_ref(), &auth, page).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Get Employee by ID, including leave balances
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Another employee's profile"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "not_found",
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee = directory::get(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}
