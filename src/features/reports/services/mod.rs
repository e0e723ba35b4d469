pub mod assembler;
mod report_service;
pub mod submission_flow;

pub use assembler::{assemble, AssemblyError, ReportForm};
pub(crate) use report_service::REPORT_COLUMNS;
pub use report_service::ReportService;
pub use submission_flow::{FlowError, SubmissionEvent, SubmissionState};
