//! HR business rules, independent of HTTP and of the concrete store.

pub mod attendance;
pub mod employee;
pub mod ledger;
pub mod leave;
pub mod payroll;
