use std::collections::HashMap;

use crate::catalog::{CoordinateSystemDefinition, SystemId};
use crate::error::TransformError;
use crate::projection::{self, ProjectionDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    Success,
    Error,
}

impl TransformStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    pub point_id: u32,
    pub label: String,
    pub x_original: f64,
    pub y_original: f64,
    pub x_transformed: Option<f64>,
    pub y_transformed: Option<f64>,
    pub status: TransformStatus,
    pub error_message: Option<String>,
}

/// Row rejected before the projection call: empty or non-numeric
/// coordinates. Counted apart from transform errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub point_id: u32,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub results: Vec<TransformResult>,
    pub validation_errors: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformStats {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub success_rate_percent: f64,
}

/// A point as handed to the batch: coordinates still raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPoint {
    pub id: u32,
    pub label: String,
    pub x: String,
    pub y: String,
}

/// Runs points through the projection primitive, memoizing the parsed
/// definition pair per (source, target) catalog identity.
#[derive(Debug, Default)]
pub struct TransformEngine {
    transformers: HashMap<(SystemId, SystemId), (ProjectionDef, ProjectionDef)>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform_one(
        &mut self,
        x: f64,
        y: f64,
        source: &CoordinateSystemDefinition,
        target: &CoordinateSystemDefinition,
    ) -> Result<(f64, f64), TransformError> {
        let (source_def, target_def) = self.transformer(source, target)?;
        projection::project(source_def, target_def, x, y)
    }

    pub fn transform_batch(
        &mut self,
        points: &[BatchPoint],
        source: &CoordinateSystemDefinition,
        target: &CoordinateSystemDefinition,
    ) -> BatchOutcome {
        let mut results = Vec::new();
        let mut validation_errors = Vec::new();

        for point in points {
            let (Some(x), Some(y)) = (parse_coordinate(&point.x), parse_coordinate(&point.y))
            else {
                validation_errors.push(ValidationIssue {
                    point_id: point.id,
                    label: point.label.clone(),
                    message: "Пустые или некорректные координаты".to_string(),
                });
                continue;
            };

            let result = match self.transform_one(x, y, source, target) {
                Ok((tx, ty)) => TransformResult {
                    point_id: point.id,
                    label: point.label.clone(),
                    x_original: x,
                    y_original: y,
                    x_transformed: Some(tx),
                    y_transformed: Some(ty),
                    status: TransformStatus::Success,
                    error_message: None,
                },
                Err(error) => TransformResult {
                    point_id: point.id,
                    label: point.label.clone(),
                    x_original: x,
                    y_original: y,
                    x_transformed: None,
                    y_transformed: None,
                    status: TransformStatus::Error,
                    error_message: Some(error.message),
                },
            };
            results.push(result);
        }

        tracing::debug!(
            transformed = results.len(),
            skipped = validation_errors.len(),
            source = source.display_name,
            target = target.display_name,
            "batch transform finished"
        );

        BatchOutcome {
            results,
            validation_errors,
        }
    }

    fn transformer(
        &mut self,
        source: &CoordinateSystemDefinition,
        target: &CoordinateSystemDefinition,
    ) -> Result<&(ProjectionDef, ProjectionDef), TransformError> {
        let key = (source.id.clone(), target.id.clone());
        if !self.transformers.contains_key(&key) {
            let source_def = ProjectionDef::parse(&source.projection_string)?;
            let target_def = ProjectionDef::parse(&target.projection_string)?;
            self.transformers
                .insert(key.clone(), (source_def, target_def));
        }
        Ok(&self.transformers[&key])
    }
}

/// Accepts a comma as decimal separator: the first comma is replaced
/// with a period before parsing. Empty text is not a coordinate.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replacen(',', ".", 1).parse::<f64>().ok()
}

pub fn stats(results: &[TransformResult]) -> TransformStats {
    let total = results.len();
    let success_count = results
        .iter()
        .filter(|result| result.status == TransformStatus::Success)
        .count();
    let error_count = total - success_count;
    let success_rate_percent = if total > 0 {
        round2(success_count as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    TransformStats {
        total,
        success_count,
        error_count,
        success_rate_percent,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
