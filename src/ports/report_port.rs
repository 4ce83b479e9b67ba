//! Report generation port trait.

use crate::domain::analysis::AnalysisResult;
use crate::domain::error::ScreenerError;
use crate::domain::screener::{ScreenRun, ScreeningCriteria};
use std::path::Path;

/// Port for writing screening reports.
pub trait ReportPort {
    fn write_screen(
        &self,
        run: &ScreenRun,
        criteria: &ScreeningCriteria,
        output_dir: &Path,
    ) -> Result<(), ScreenerError>;

    /// Detail for a single instrument. The default writes nothing.
    fn write_instrument(
        &self,
        _result: &AnalysisResult,
        _output_dir: &Path,
    ) -> Result<(), ScreenerError> {
        Ok(())
    }
}
