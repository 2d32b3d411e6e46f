//! Payroll calculator: validates salary components and derives gross pay and deductions.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::payroll::{NewPayroll, Payroll, PayrollQuery, SalaryComponents};
use crate::store::{HrStore, Page};

/// PF may not exceed 15% of basic salary.
pub fn max_pf_ratio() -> Decimal {
    Decimal::new(15, 2)
}

/// HRA may not exceed 60% of basic salary.
pub fn max_hra_ratio() -> Decimal {
    Decimal::new(60, 2)
}

/// Largest amount a `DECIMAL(12, 2)` column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Amounts must fit a `DECIMAL(12, 2)` column exactly.
fn check_amount(name: &'static str, amount: Decimal) -> AppResult<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::NegativeAmount(name));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::UnreasonableAmount(format!(
            "{name} {amount} has more than two decimal places"
        )));
    }
    if amount > max_amount() {
        return Err(AppError::UnreasonableAmount(format!(
            "{name} {amount} exceeds {}",
            max_amount()
        )));
    }
    Ok(())
}

pub fn validate(components: &SalaryComponents) -> AppResult<()> {
    let c = components;
    for (name, amount) in [
        ("basic_salary", c.basic_salary),
        ("hra", c.hra),
        ("standard_allowance", c.standard_allowance),
        ("other_allowances", c.other_allowances),
        ("pf", c.pf),
        ("professional_tax", c.professional_tax),
    ] {
        check_amount(name, amount)?;
    }

    let pf_cap = c.basic_salary * max_pf_ratio();
    if c.pf > pf_cap {
        return Err(AppError::UnreasonableAmount(format!(
            "pf {} exceeds 15% of basic salary ({})",
            c.pf, pf_cap
        )));
    }
    let hra_cap = c.basic_salary * max_hra_ratio();
    if c.hra > hra_cap {
        return Err(AppError::UnreasonableAmount(format!(
            "hra {} exceeds 60% of basic salary ({})",
            c.hra, hra_cap
        )));
    }
    Ok(())
}

/// Payroll months are keyed by their first day.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Resolves the net salary to store.
///
/// When the caller supplies one it is kept as given, even if it disagrees
/// with `gross - deductions`; the disagreement is logged and reported on the
/// slip instead of being corrected.
fn resolve_net_salary(components: &SalaryComponents, supplied: Option<Decimal>) -> AppResult<Decimal> {
    let derived = components.derived_net_salary();
    let net = match supplied {
        None => derived,
        Some(net) => {
            if net != derived {
                warn!(%net, %derived, "Supplied net salary differs from gross minus deductions");
            }
            net
        }
    };
    check_amount("net_salary", net)?;
    Ok(net)
}

/// A stored payroll record with its derived figures.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalarySlip {
    #[serde(flatten)]
    pub payroll: Payroll,
    #[schema(value_type = String, example = "76167.00")]
    pub gross_salary: Decimal,
    #[schema(value_type = String, example = "6200.00")]
    pub total_deductions: Decimal,
    /// `gross_salary - total_deductions`
    #[schema(value_type = String, example = "69967.00")]
    pub derived_net_salary: Decimal,
    /// False when the stored net salary was supplied and disagrees with the derivation
    pub net_salary_consistent: bool,
}

impl From<Payroll> for SalarySlip {
    fn from(payroll: Payroll) -> Self {
        let c = payroll.components;
        let derived = c.derived_net_salary();
        SalarySlip {
            gross_salary: c.gross_salary(),
            total_deductions: c.total_deductions(),
            derived_net_salary: derived,
            net_salary_consistent: payroll.net_salary == derived,
            payroll,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PayrollEntry {
    pub employee_id: u64,
    pub month: NaiveDate,
    pub components: SalaryComponents,
    pub net_salary: Option<Decimal>,
}

#[instrument(skip(store, caller, entry), fields(employee_id = entry.employee_id, month = %entry.month))]
pub async fn create<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    entry: PayrollEntry,
) -> AppResult<SalarySlip> {
    caller.require_admin()?;

    if store.employee(entry.employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee"));
    }

    validate(&entry.components)?;
    let net_salary = resolve_net_salary(&entry.components, entry.net_salary)?;

    let payroll = store
        .insert_payroll(NewPayroll {
            employee_id: entry.employee_id,
            month: month_start(entry.month),
            components: entry.components,
            net_salary,
        })
        .await?;

    info!(payroll_id = payroll.id, "Payroll created");
    Ok(payroll.into())
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct PayrollPatch {
    pub basic_salary: Option<Decimal>,
    pub hra: Option<Decimal>,
    pub standard_allowance: Option<Decimal>,
    pub other_allowances: Option<Decimal>,
    pub pf: Option<Decimal>,
    pub professional_tax: Option<Decimal>,
    pub net_salary: Option<Decimal>,
}

impl PayrollPatch {
    fn apply(&self, current: SalaryComponents) -> SalaryComponents {
        SalaryComponents {
            basic_salary: self.basic_salary.unwrap_or(current.basic_salary),
            hra: self.hra.unwrap_or(current.hra),
            standard_allowance: self.standard_allowance.unwrap_or(current.standard_allowance),
            other_allowances: self.other_allowances.unwrap_or(current.other_allowances),
            pf: self.pf.unwrap_or(current.pf),
            professional_tax: self.professional_tax.unwrap_or(current.professional_tax),
        }
    }
}

#[instrument(skip(store, caller, patch), fields(admin = caller.employee_id))]
pub async fn update<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    payroll_id: u64,
    patch: PayrollPatch,
) -> AppResult<SalarySlip> {
    caller.require_admin()?;

    let current = store
        .payroll(payroll_id)
        .await?
        .ok_or(AppError::NotFound("Payroll"))?;

    let components = patch.apply(current.components);
    validate(&components)?;

    // a stored net that matched the old components follows the new ones
    let supplied = match patch.net_salary {
        Some(net) => Some(net),
        None if current.net_salary == current.components.derived_net_salary() => None,
        None => Some(current.net_salary),
    };
    let net_salary = resolve_net_salary(&components, supplied)?;

    let payroll = store
        .update_payroll(payroll_id, components, net_salary)
        .await?;

    info!(payroll_id, "Payroll updated");
    Ok(payroll.into())
}

pub async fn get<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    payroll_id: u64,
) -> AppResult<SalarySlip> {
    let payroll = store
        .payroll(payroll_id)
        .await?
        .ok_or(AppError::NotFound("Payroll"))?;
    caller.require_owner_or_admin(payroll.employee_id)?;
    Ok(payroll.into())
}

pub async fn list<S: HrStore>(
    store: &S,
    caller: &AuthUser,
    mut query: PayrollQuery,
    page: Page,
) -> AppResult<(Vec<SalarySlip>, i64)> {
    query.employee_id = caller.scope(query.employee_id)?;
    query.month = query.month.map(month_start);
    let (rows, total) = store.list_payrolls(&query, page).await?;
    Ok((rows.into_iter().map(SalarySlip::from).collect(), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::testing::{admin, employee};
    use crate::model::employee::NewEmployee;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn components() -> SalaryComponents {
        SalaryComponents {
            basic_salary: dec("50000"),
            hra: dec("20000"),
            standard_allowance: dec("4167"),
            other_allowances: dec("2000"),
            pf: dec("6000"),
            professional_tax: dec("200"),
        }
    }

    async fn seed(store: &MemoryStore) -> u64 {
        store
            .insert_employee(NewEmployee {
                username: "asha".into(),
                email: "asha@example.com".into(),
                role: Role::Employee,
                department: None,
                designation: None,
                joining_date: None,
                paid_leave_balance: 24,
                sick_leave_balance: 12,
            })
            .await
            .unwrap()
            .id
    }

    fn entry(employee_id: u64, month: &str) -> PayrollEntry {
        PayrollEntry {
            employee_id,
            month: day(month),
            components: components(),
            net_salary: None,
        }
    }

    #[test]
    fn gross_and_deductions_are_sums() {
        let c = components();
        assert_eq!(c.gross_salary(), dec("76167"));
        assert_eq!(c.total_deductions(), dec("6200"));
        assert_eq!(c.derived_net_salary(), dec("69967"));
    }

    #[test]
    fn negative_component_is_rejected() {
        let mut c = components();
        c.other_allowances = dec("-1");
        assert!(matches!(validate(&c), Err(AppError::NegativeAmount("other_allowances"))));
    }

    #[test]
    fn pf_and_hra_are_capped_by_basic() {
        let mut c = components();
        c.pf = dec("7500");
        assert!(validate(&c).is_ok());
        c.pf = dec("7500.01");
        assert!(matches!(validate(&c), Err(AppError::UnreasonableAmount(_))));

        let mut c = components();
        c.hra = dec("30000.01");
        assert!(matches!(validate(&c), Err(AppError::UnreasonableAmount(_))));
    }

    #[test]
    fn sub_cent_and_oversized_amounts_are_rejected() {
        let mut c = components();
        c.basic_salary = dec("100.004");
        c.hra = dec("0.004");
        c.pf = dec("0");
        assert!(matches!(validate(&c), Err(AppError::UnreasonableAmount(_))));

        // trailing zeros are not extra precision
        let mut c = components();
        c.standard_allowance = dec("4167.0000");
        assert!(validate(&c).is_ok());

        let mut c = components();
        c.basic_salary = dec("10000000000.00");
        assert!(matches!(validate(&c), Err(AppError::UnreasonableAmount(_))));
    }

    #[actix_web::test]
    async fn supplied_net_must_fit_the_column() {
        let store = MemoryStore::new();
        let id = seed(&store).await;

        let mut e = entry(id, "2024-05-01");
        e.net_salary = Some(dec("69967.005"));
        assert!(matches!(
            create(&store, &admin(99), e).await,
            Err(AppError::UnreasonableAmount(_))
        ));

        let mut e = entry(id, "2024-05-01");
        e.net_salary = Some(dec("-1"));
        assert!(matches!(
            create(&store, &admin(99), e).await,
            Err(AppError::NegativeAmount("net_salary"))
        ));
        assert!(store.list_payrolls(&PayrollQuery::default(), Page::new(None, None)).await.unwrap().0.is_empty());
    }

    #[test]
    fn month_is_keyed_by_first_day() {
        assert_eq!(month_start(day("2024-02-29")), day("2024-02-01"));
    }

    #[actix_web::test]
    async fn create_derives_net_when_not_supplied() {
        let store = MemoryStore::new();
        let id = seed(&store).await;

        let slip = create(&store, &admin(99), entry(id, "2024-05-17")).await.unwrap();
        assert_eq!(slip.payroll.month, day("2024-05-01"));
        assert_eq!(slip.payroll.net_salary, dec("69967"));
        assert_eq!(slip.gross_salary, dec("76167"));
        assert!(slip.net_salary_consistent);
    }

    #[actix_web::test]
    async fn supplied_net_is_kept_and_flagged() {
        let store = MemoryStore::new();
        let id = seed(&store).await;

        let mut e = entry(id, "2024-05-01");
        e.net_salary = Some(dec("70000"));
        let slip = create(&store, &admin(99), e).await.unwrap();
        assert_eq!(slip.payroll.net_salary, dec("70000"));
        assert_eq!(slip.derived_net_salary, dec("69967"));
        assert!(!slip.net_salary_consistent);
    }

    #[actix_web::test]
    async fn duplicate_month_is_refused() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let boss = admin(99);

        create(&store, &boss, entry(id, "2024-05-01")).await.unwrap();
        let err = create(&store, &boss, entry(id, "2024-05-20")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicatePayrollEntry));
        assert!(create(&store, &boss, entry(id, "2024-06-01")).await.is_ok());
    }

    #[actix_web::test]
    async fn create_is_admin_only_and_needs_employee() {
        let store = MemoryStore::new();
        let id = seed(&store).await;

        assert!(matches!(
            create(&store, &employee(id), entry(id, "2024-05-01")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            create(&store, &admin(99), entry(4242, "2024-05-01")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn update_revalidates_and_rederives() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let boss = admin(99);

        let slip = create(&store, &boss, entry(id, "2024-05-01")).await.unwrap();
        let updated = update(
            &store,
            &boss,
            slip.payroll.id,
            PayrollPatch {
                other_allowances: Some(dec("3000")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.payroll.net_salary, dec("70967"));
        assert!(updated.net_salary_consistent);

        let err = update(
            &store,
            &boss,
            slip.payroll.id,
            PayrollPatch {
                basic_salary: Some(dec("10000")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::UnreasonableAmount(_)));

        let stored = store.payroll(slip.payroll.id).await.unwrap().unwrap();
        assert_eq!(stored.components.basic_salary, dec("50000"));
    }

    #[actix_web::test]
    async fn employees_see_only_their_slips() {
        let store = MemoryStore::new();
        let id = seed(&store).await;
        let boss = admin(99);

        let slip = create(&store, &boss, entry(id, "2024-05-01")).await.unwrap();
        assert!(get(&store, &employee(id), slip.payroll.id).await.is_ok());
        assert!(matches!(
            get(&store, &employee(id + 1), slip.payroll.id).await,
            Err(AppError::Unauthorized(_))
        ));

        let (rows, total) = list(&store, &employee(id), PayrollQuery::default(), Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].payroll.employee_id, id);
    }
}
