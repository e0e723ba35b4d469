mod report;

pub use report::{Coordinates, NewReport, Report, ReportStatus};
