use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::payroll::{PayrollQuery, SalaryComponents};
use crate::service::payroll::{self as calculator, PayrollEntry, PayrollPatch, SalarySlip};
use crate::store::{HrStore, Page};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Any day of the payroll month; stored as the first day
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[serde(flatten)]
    pub components: SalaryComponents,

    /// Omit to derive `gross - deductions`
    #[schema(value_type = Option<String>, example = "69967.00")]
    pub net_salary: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(value_type = Option<String>, example = "52000.00")]
    pub basic_salary: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "20800.00")]
    pub hra: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub standard_allowance: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub other_allowances: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "6240.00")]
    pub pf: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub professional_tax: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub net_salary: Option<Decimal>,
}

impl From<UpdatePayroll> for PayrollPatch {
    fn from(u: UpdatePayroll) -> Self {
        PayrollPatch {
            basic_salary: u.basic_salary,
            hra: u.hra,
            standard_allowance: u.standard_allowance,
            other_allowances: u.other_allowances,
            pf: u.pf,
            professional_tax: u.professional_tax,
            net_salary: u.net_salary,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PayrollFilter {
    #[param(example = 1)]
    pub page: Option<u32>,

    #[param(example = 10)]
    pub per_page: Option<u32>,

    #[param(example = 1001)]
    pub employee_id: Option<u64>,

    /// Any day of the month to filter on
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub month: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<SalarySlip>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = SalarySlip),
        (status = 400, description = "Negative or unreasonable amount", body = Object, example = json!({
            "error": "unreasonable_amount",
            "message": "Unreasonable amount: pf 9000 exceeds 15% of basic salary (7500.00)"
        })),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already exists for that employee and month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let slip = calculator::create(
        store.get_ref(),
        &auth,
        PayrollEntry {
            employee_id: payload.employee_id,
            month: payload.month,
            components: payload.components,
            net_salary: payload.net_salary,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(slip))
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated", body = SalarySlip),
        (status = 400, description = "Negative or unreasonable amount"),
        (status = 403),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
    payload: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    let slip = calculator::update(
        store.get_ref(),
        &auth,
        path.into_inner(),
        payload.into_inner().into(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(slip))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id" = u64, Path, description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Salary slip", body = SalarySlip),
        (status = 403),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let slip = calculator::get(store.get_ref(), &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(slip))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollFilter),
    responses(
        (status = 200, description = "Paginated salary slips", body = PaginatedPayrollResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls<S: HrStore + 'static>(
    auth: AuthUser,
    store: web::Data<S>,
    filter: web::Query<PayrollFilter>,
) -> actix_web::Result<impl Responder> {
    let filter = filter.into_inner();
    let page = Page::new(filter.page, filter.per_page);
    let query = PayrollQuery {
        employee_id: filter.employee_id,
        month: filter.month,
    };

    let (data, total) = calculator::list(store.get_ref(), &auth, query, page).await?;
    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}
