pub mod error;
pub mod google_auth;
pub mod metrics;
pub mod report;
pub mod sheets;

pub use error::ReportError;
pub use metrics::{get_metrics, init_metrics, record_fetch_duration, record_report};
pub use report::ReportService;
pub use sheets::{GoogleSheetsClient, SheetRows, SheetSource};
