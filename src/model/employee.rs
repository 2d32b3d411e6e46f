use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "username": "jdoe",
        "email": "john.doe@company.com",
        "role": "employee",
        "department": "Engineering",
        "designation": "Developer",
        "joining_date": "2024-01-01",
        "paid_leave_balance": 24,
        "sick_leave_balance": 12
    })
)]
pub struct Employee {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,

    /// Remaining paid leave days
    pub paid_leave_balance: u32,

    /// Remaining sick leave days
    pub sick_leave_balance: u32,
}

/// Employee row before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub paid_leave_balance: u32,
    pub sick_leave_balance: u32,
}
