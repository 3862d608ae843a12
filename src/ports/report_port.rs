//! Report output port.

use crate::domain::error::LevelscanError;
use crate::domain::pipeline::BatchReport;

pub trait ReportPort {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), LevelscanError>;
}
