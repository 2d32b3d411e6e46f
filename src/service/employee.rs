use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::auth::auth::AuthUser;
use crate::config::HrPolicy;
use crate::error::{AppError, AppResult};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::role::Role;
use crate::store::{HrStore, Page};

#[derive(Debug, Clone)]
pub struct Onboarding {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<NaiveDate>,
}

/// Admin-only; new employees start with the policy's accrual.
#[instrument(skip(store, policy, caller, onboarding), fields(username = %onboarding.username))]
pub async fn create<S: HrStore>(
    store: &S,
    policy: &HrPolicy,
    caller: &AuthUser,
    onboarding: Onboarding,
) -> AppResult<Employee> {
    caller.require_admin()?;

    let username = onboarding.username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::InvalidUsername("must not be empty"));
    }

    let employee = store
        .insert_employee(NewEmployee {
            username,
            email: onboarding.email.trim().to_string(),
            role: onboarding.role,
            department: onboarding.department,
            designation: onboarding.designation,
            joining_date: onboarding.joining_date,
            paid_leave_balance: policy.default_paid_leave,
            sick_leave_balance: policy.default_sick_leave,
        })
        .await?;

    info!(employee_id = employee.id, admin = caller.employee_id, "Employee onboarded");
    Ok(employee)
}

pub async fn get<S: HrStore>(store: &S, caller: &AuthUser, id: u64) -> AppResult<Employee> {
    caller.require_owner_or_admin(id)?;
    store.employee(id).await?.ok_or(AppError::NotFound("Employee"))
}

pub async fn list<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    page: Page,
) -> AppResult<(Vec<Employee>, i64)> {
    caller.require_admin()?;
    store.list_employees(page).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::testing::{admin, employee};
    use crate::store::memory::MemoryStore;

    fn onboarding(username: &str) -> Onboarding {
        Onboarding {
            username: username.into(),
            email: format!("{username}@example.com"),
            role: Role::Employee,
            department: Some("Engineering".into()),
            designation: None,
            joining_date: None,
        }
    }

    #[actix_web::test]
    async fn new_employee_gets_default_accrual() {
        let store = MemoryStore::new();
        let e = create(&store, &HrPolicy::default(), &admin(1), onboarding("Asha"))
            .await
            .unwrap();
        assert_eq!(e.username, "asha");
        assert_eq!(e.paid_leave_balance, 24);
        assert_eq!(e.sick_leave_balance, 12);
    }

    #[actix_web::test]
    async fn duplicate_username_and_non_admin_are_refused() {
        let store = MemoryStore::new();
        let policy = HrPolicy::default();
        create(&store, &policy, &admin(1), onboarding("asha")).await.unwrap();

        assert!(matches!(
            create(&store, &policy, &admin(1), onboarding("ASHA")).await,
            Err(AppError::DuplicateEmployee)
        ));
        assert!(matches!(
            create(&store, &policy, &employee(5), onboarding("bo")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn blank_username_is_an_invalid_username() {
        let store = MemoryStore::new();
        let err = create(&store, &HrPolicy::default(), &admin(1), onboarding("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidUsername(_)));
        assert_eq!(err.kind(), "invalid_username");
    }

    #[actix_web::test]
    async fn employees_read_only_themselves() {
        let store = MemoryStore::new();
        let e = create(&store, &HrPolicy::default(), &admin(1), onboarding("asha"))
            .await
            .unwrap();

        assert!(get(&store, &employee(e.id), e.id).await.is_ok());
        assert!(matches!(
            get(&store, &employee(e.id + 1), e.id).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            get(&store, &admin(1), 4242).await,
            Err(AppError::NotFound(_))
        ));
        assert!(list(&store, &employee(e.id), Page::new(None, None)).await.is_err());
    }
}
