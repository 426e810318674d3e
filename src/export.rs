use chrono::NaiveDate;
use csv::WriterBuilder;

use crate::error::ConvertError;
use crate::point_table::PointRecord;
use crate::transform::TransformResult;

/// Plain point export: `ID,<label header>,X,Y`, comma-separated, only
/// the label quoted (internal quotes doubled), `\n` line endings.
pub fn points_to_csv(label_header: &str, records: &[PointRecord]) -> String {
    let mut out = format!("ID,{label_header},X,Y\n");
    for record in records {
        let escaped = record.label.replace('"', "\"\"");
        out.push_str(&format!(
            "{},\"{}\",{},{}\n",
            record.id, escaped, record.x, record.y
        ));
    }
    out
}

/// Transform-result export: semicolon-separated with every field
/// quoted. The separator intentionally differs from the plain point
/// export; downstream consumers rely on both shapes.
pub fn results_to_csv(
    results: &[TransformResult],
    source_label: &str,
    target_label: &str,
) -> Result<String, ConvertError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::<u8>::new());

    writer.write_record([
        "ID",
        "Label",
        "SourceSystem",
        "X_original",
        "Y_original",
        "TargetSystem",
        "X_transformed",
        "Y_transformed",
        "Status",
    ])?;

    for result in results {
        writer.write_record([
            result.point_id.to_string(),
            result.label.clone(),
            source_label.to_string(),
            result.x_original.to_string(),
            result.y_original.to_string(),
            target_label.to_string(),
            optional_number(result.x_transformed),
            optional_number(result.y_transformed),
            result.status.as_str().to_string(),
        ])?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ConvertError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ConvertError::InvalidUtf8(error.to_string()))
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

pub fn points_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

pub fn results_filename(source_label: &str, target_label: &str, date: NaiveDate) -> String {
    format!(
        "{}_to_{}_{}.csv",
        sanitize_label(source_label),
        sanitize_label(target_label),
        date.format("%Y-%m-%d")
    )
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || matches!(ch, '/' | '\\' | ':') {
                '-'
            } else {
                ch
            }
        })
        .collect()
}
