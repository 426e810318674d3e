pub mod catalog;
pub mod column_map;
pub mod delimited;
pub mod error;
pub mod export;
pub mod input;
pub mod point_table;
pub mod projection;
pub mod session;
pub mod transform;

use std::path::Path;

pub use catalog::{CoordinateSystemCatalog, CoordinateSystemDefinition, SrsRecord, SystemKind};
pub use column_map::{ColumnRoleMapping, MatchOrder, PartialMapping};
pub use error::{ConvertError, MappingError, TransformError};
pub use point_table::{PointRecord, PointTable, TableOutcome};
pub use session::{BatchReport, Session};
pub use transform::{TransformResult, TransformStats, TransformStatus};

/// Summary of a whole-file conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub row_count: usize,
    pub transformed_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub validation_error_count: usize,
    pub success_rate_percent: f64,
}

impl ConversionReport {
    fn from_batch(row_count: usize, report: &BatchReport) -> Self {
        Self {
            row_count,
            transformed_count: report.results.len(),
            success_count: report.stats.success_count,
            error_count: report.stats.error_count,
            validation_error_count: report.validation_errors.len(),
            success_rate_percent: report.stats.success_rate_percent,
        }
    }
}

/// Parses delimited text, auto-maps columns, transforms every row from
/// `source` to `target` and renders the semicolon-separated result CSV.
pub fn convert_text_to_results_csv(
    text: &str,
    source: &str,
    target: &str,
) -> Result<(String, ConversionReport), ConvertError> {
    let mut session = Session::new();
    session.load_text(text)?;
    let row_count = session.table().map_or(0, PointTable::len);
    let report = session.transform(source, target)?;
    let csv = export::results_to_csv(&report.results, &report.source_name, &report.target_name)?;
    Ok((csv, ConversionReport::from_batch(row_count, &report)))
}

/// File-path variant of [`convert_text_to_results_csv`].
pub fn convert_file_to_results_csv(
    input: &Path,
    source: &str,
    target: &str,
) -> Result<(String, ConversionReport), ConvertError> {
    let text = input::read_input_file(input)?;
    convert_text_to_results_csv(&text, source, target)
}

/// Parses delimited text, auto-maps columns and re-exports the point
/// table in the plain `ID,<label>,X,Y` form.
pub fn export_text_to_points_csv(text: &str) -> Result<String, ConvertError> {
    let mut session = Session::new();
    let table = session.load_text(text)?;
    table.to_csv().map_err(|_| ConvertError::NoTable)
}
