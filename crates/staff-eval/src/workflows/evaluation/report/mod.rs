mod export;
mod summary;
pub mod views;

pub use export::ReportRow;
pub use summary::EvaluationReport;
