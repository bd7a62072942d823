pub mod amount;
pub mod category;
pub mod fiscal;
pub mod kpi;
pub mod rows;

pub use category::{AccountCategories, AccountCategory};
pub use fiscal::ReportingPeriod;
pub use kpi::{KpiReport, KpiValue};
