use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Salary components as stored for one (employee, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SalaryComponents {
    #[schema(value_type = String, example = "50000.00")]
    pub basic_salary: Decimal,
    #[schema(value_type = String, example = "20000.00")]
    pub hra: Decimal,
    #[schema(value_type = String, example = "4167.00")]
    pub standard_allowance: Decimal,
    #[schema(value_type = String, example = "2000.00")]
    pub other_allowances: Decimal,
    #[schema(value_type = String, example = "6000.00")]
    pub pf: Decimal,
    #[schema(value_type = String, example = "200.00")]
    pub professional_tax: Decimal,
}

impl SalaryComponents {
    pub fn gross_salary(&self) -> Decimal {
        self.basic_salary + self.hra + self.standard_allowance + self.other_allowances
    }

    pub fn total_deductions(&self) -> Decimal {
        self.pf + self.professional_tax
    }

    pub fn derived_net_salary(&self) -> Decimal {
        self.gross_salary() - self.total_deductions()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,
    /// First day of the payroll month
    pub month: NaiveDate,
    #[serde(flatten)]
    pub components: SalaryComponents,
    #[schema(value_type = String, example = "69967.00")]
    pub net_salary: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub month: NaiveDate,
    pub components: SalaryComponents,
    pub net_salary: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct PayrollQuery {
    pub employee_id: Option<u64>,
    pub month: Option<NaiveDate>,
}
