use std::path::Path;

use crate::catalog::CoordinateSystemCatalog;
use crate::column_map::{self, MatchOrder, PartialMapping};
use crate::delimited::{self, RawTable};
use crate::error::ConvertError;
use crate::input;
use crate::point_table::PointTable;
use crate::transform::{
    self, BatchPoint, TransformEngine, TransformResult, TransformStats, TransformStatus,
    ValidationIssue,
};

/// Outcome of a whole-table transform request: per-row results for the
/// validated subset, the rows excluded beforehand, and the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub source_name: String,
    pub target_name: String,
    pub results: Vec<TransformResult>,
    pub validation_errors: Vec<ValidationIssue>,
    pub stats: TransformStats,
}

/// A parsed file waiting for its column mapping to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StagedTable {
    raw: RawTable,
    detected: PartialMapping,
}

/// Owns the catalog, the engine and the current table. All the state
/// the original kept in module-level globals lives here, one in-flight
/// operation at a time.
#[derive(Debug)]
pub struct Session {
    catalog: CoordinateSystemCatalog,
    engine: TransformEngine,
    staged: Option<StagedTable>,
    table: Option<PointTable>,
    match_order: MatchOrder,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            catalog: CoordinateSystemCatalog::with_builtin_systems(),
            engine: TransformEngine::new(),
            staged: None,
            table: None,
            match_order: MatchOrder::default(),
        }
    }

    pub fn with_match_order(match_order: MatchOrder) -> Self {
        Self {
            match_order,
            ..Self::new()
        }
    }

    pub fn catalog(&self) -> &CoordinateSystemCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CoordinateSystemCatalog {
        &mut self.catalog
    }

    pub fn table(&self) -> Option<&PointTable> {
        self.table.as_ref()
    }

    pub fn table_mut(&mut self) -> Option<&mut PointTable> {
        self.table.as_mut()
    }

    /// Parses text and auto-detects column roles. Any previously staged
    /// parse is discarded; the current table stays until a mapping is
    /// committed.
    pub fn stage_text(&mut self, text: &str) -> Result<&PartialMapping, ConvertError> {
        let raw = delimited::parse(text)?;
        let detected = column_map::auto_detect_with(&raw.headers, self.match_order);
        self.staged = Some(StagedTable { raw, detected });
        Ok(&self
            .staged
            .as_ref()
            .expect("staged table was just stored")
            .detected)
    }

    pub fn staged_headers(&self) -> Option<&[String]> {
        self.staged.as_ref().map(|staged| staged.raw.headers.as_slice())
    }

    /// Materializes the staged parse with the given mapping, replacing
    /// the current table. Roles left `None` fall back to the detected
    /// ones.
    pub fn commit_mapping(&mut self, overrides: PartialMapping) -> Result<&PointTable, ConvertError> {
        let staged = self.staged.take().ok_or(ConvertError::NoTable)?;

        let merged = PartialMapping {
            point_column: overrides.point_column.or(staged.detected.point_column),
            x_column: overrides.x_column.or(staged.detected.x_column),
            y_column: overrides.y_column.or(staged.detected.y_column),
        };
        let mapping = column_map::validate(&merged, &staged.raw.headers)?;

        self.table = Some(PointTable::from_mapped_rows(&staged.raw, &mapping));
        Ok(self.table.as_ref().expect("table was just stored"))
    }

    /// Parse, auto-detect and materialize in one step.
    pub fn load_text(&mut self, text: &str) -> Result<&PointTable, ConvertError> {
        self.stage_text(text)?;
        self.commit_mapping(PartialMapping::default())
    }

    /// Reads a file through the input boundary, then loads its text.
    pub fn load_file(&mut self, path: &Path) -> Result<&PointTable, ConvertError> {
        let text = input::read_input_file(path)?;
        self.load_text(&text)
    }

    /// Starts a fresh manual table with one blank record.
    pub fn create_empty_table(&mut self) -> &PointTable {
        self.staged = None;
        self.table = Some(PointTable::create_empty());
        self.table.as_ref().expect("table was just stored")
    }

    /// Transforms the current table. Identity requests (same catalog
    /// entry on both sides) skip the engine and echo the validated
    /// coordinates.
    pub fn transform(
        &mut self,
        source_name: &str,
        target_name: &str,
    ) -> Result<BatchReport, ConvertError> {
        let table = self.table.as_ref().ok_or(ConvertError::NoTable)?;
        let source = self.catalog.resolve(source_name)?.clone();
        let target = self.catalog.resolve(target_name)?.clone();

        let points = table
            .records()
            .iter()
            .map(|record| BatchPoint {
                id: record.id,
                label: record.label.clone(),
                x: record.x.clone(),
                y: record.y.clone(),
            })
            .collect::<Vec<_>>();

        let outcome = if source.id == target.id {
            identity_outcome(&points)
        } else {
            self.engine.transform_batch(&points, &source, &target)
        };

        let stats = transform::stats(&outcome.results);
        Ok(BatchReport {
            source_name: source.display_name,
            target_name: target.display_name,
            results: outcome.results,
            validation_errors: outcome.validation_errors,
            stats,
        })
    }
}

/// Same-system short-circuit: validation still applies, valid rows are
/// echoed as successes without touching the projection code.
fn identity_outcome(points: &[BatchPoint]) -> transform::BatchOutcome {
    let mut results = Vec::new();
    let mut validation_errors = Vec::new();

    for point in points {
        match (
            transform::parse_coordinate(&point.x),
            transform::parse_coordinate(&point.y),
        ) {
            (Some(x), Some(y)) => results.push(TransformResult {
                point_id: point.id,
                label: point.label.clone(),
                x_original: x,
                y_original: y,
                x_transformed: Some(x),
                y_transformed: Some(y),
                status: TransformStatus::Success,
                error_message: None,
            }),
            _ => validation_errors.push(ValidationIssue {
                point_id: point.id,
                label: point.label.clone(),
                message: "Пустые или некорректные координаты".to_string(),
            }),
        }
    }

    transform::BatchOutcome {
        results,
        validation_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::column_map::PartialMapping;
    use crate::error::{ConvertError, MappingError};
    use crate::transform::TransformStatus;

    const SAMPLE: &str = "Точка,X,Y\nA,37.617,55.755\nB,30.316,59.938\n";

    #[test]
    fn load_text_detects_and_materializes() {
        let mut session = Session::new();
        let table = session.load_text(SAMPLE).expect("load should succeed");
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].label, "A");
        assert_eq!(table.label_header(), "Точка");
    }

    #[test]
    fn mapping_overrides_take_precedence_over_detection() {
        let mut session = Session::new();
        session
            .stage_text("Имя,X,Y,Долгота\nA,1,2,3\n")
            .expect("stage should succeed");
        assert_eq!(
            session.staged_headers().expect("parse is staged"),
            ["Имя", "X", "Y", "Долгота"]
        );
        let table = session
            .commit_mapping(PartialMapping {
                point_column: Some("Имя".to_string()),
                x_column: Some("X".to_string()),
                y_column: None,
            })
            .expect("commit should succeed");
        assert_eq!(table.records()[0].x, "1");
    }

    #[test]
    fn commit_without_staged_parse_is_an_error() {
        let mut session = Session::new();
        let err = session
            .commit_mapping(PartialMapping::default())
            .expect_err("nothing staged");
        assert!(matches!(err, ConvertError::NoTable));
    }

    #[test]
    fn undetectable_columns_surface_a_mapping_error() {
        let mut session = Session::new();
        session
            .stage_text("alpha,beta,gamma\n1,2,3\n")
            .expect("stage should succeed");
        let err = session
            .commit_mapping(PartialMapping::default())
            .expect_err("no roles detected");
        assert!(matches!(
            err,
            ConvertError::Mapping(MappingError::MissingRole { .. })
        ));
    }

    #[test]
    fn reload_replaces_the_previous_table() {
        let mut session = Session::new();
        session.load_text(SAMPLE).expect("first load");
        session
            .load_text("Точка,X,Y\nC,1,2\n")
            .expect("second load");
        let table = session.table().expect("table present");
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].label, "C");
    }

    #[test]
    fn unknown_system_fails_only_that_request() {
        let mut session = Session::new();
        session.load_text(SAMPLE).expect("load should succeed");
        let err = session
            .transform("WGS 84", "Nonexistent")
            .expect_err("unknown target");
        assert!(matches!(err, ConvertError::UnknownSystem { name } if name == "Nonexistent"));
        // The session stays usable.
        assert!(session.transform("WGS 84", "СК-42").is_ok());
    }

    #[test]
    fn identity_transform_echoes_validated_points() {
        let mut session = Session::new();
        session
            .load_text("Точка,X,Y\nA,37.617,55.755\nB,oops,59.938\n")
            .expect("load should succeed");
        let report = session
            .transform("WGS 84", "EPSG:4326")
            .expect("identity transform");
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.validation_errors.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.status, TransformStatus::Success);
        assert!((result.x_transformed.expect("success") - 37.617).abs() < 1e-12);
    }

    #[test]
    fn manual_table_replaces_a_staged_parse() {
        let mut session = Session::new();
        session.stage_text(SAMPLE).expect("stage should succeed");
        session.create_empty_table();

        let table = session.table_mut().expect("table present");
        table.set_label(1, "база");
        table.set_x(1, "37,617");
        table.set_y(1, "55.755");

        let report = session
            .transform("WGS 84", "UTM 36N")
            .expect("manual table transforms");
        assert_eq!(report.stats.total, 1);
        assert_eq!(report.stats.success_count, 1);
    }

    #[test]
    fn transform_without_table_is_an_error() {
        let mut session = Session::new();
        let err = session
            .transform("WGS 84", "СК-42")
            .expect_err("no table loaded");
        assert!(matches!(err, ConvertError::NoTable));
    }

    #[test]
    fn geographic_to_projected_batch_succeeds() {
        let mut session = Session::new();
        session.load_text(SAMPLE).expect("load should succeed");
        let report = session
            .transform("WGS 84", "UTM 36N")
            .expect("batch transform");
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.success_count, 2);
        assert!((report.stats.success_rate_percent - 100.0).abs() < f64::EPSILON);
        let moscow = &report.results[0];
        let x = moscow.x_transformed.expect("success");
        // Moscow sits a zone east of UTM 36N's central meridian.
        assert!(x > 500_000.0, "easting {x} should be east of the CM");
    }
}
