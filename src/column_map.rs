use crate::error::MappingError;

/// The three semantic roles a header can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoleMapping {
    pub point_column: String,
    pub x_column: String,
    pub y_column: String,
}

/// Partially detected mapping. Roles the heuristics could not place stay
/// `None` and must be filled in by the caller before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMapping {
    pub point_column: Option<String>,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
}

/// When several headers match the same role. The original scanned in
/// header order and let the last match overwrite earlier ones; kept as
/// the default for compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchOrder {
    #[default]
    LastWins,
    FirstWins,
}

const POINT_KEYWORDS: [&str; 11] = [
    "точк",
    "назван",
    "name",
    "point",
    "ид",
    "id",
    "номер",
    "number",
    "label",
    "метка",
    "обозначение",
];

const X_EXACT: [&str; 2] = ["x", "xcoord"];
const X_KEYWORDS: [&str; 8] = [
    "координата x",
    "coord x",
    "ось x",
    "coordx",
    "longitude",
    "долгота",
    "lon",
    "x coordinate",
];

const Y_EXACT: [&str; 2] = ["y", "ycoord"];
const Y_KEYWORDS: [&str; 8] = [
    "координата y",
    "coord y",
    "ось y",
    "coordy",
    "latitude",
    "широта",
    "lat",
    "y coordinate",
];

fn matches_point(header: &str) -> bool {
    header == "точка" || POINT_KEYWORDS.iter().any(|kw| header.contains(kw))
}

fn matches_x(header: &str) -> bool {
    X_EXACT.contains(&header) || X_KEYWORDS.iter().any(|kw| header.contains(kw))
}

fn matches_y(header: &str) -> bool {
    Y_EXACT.contains(&header) || Y_KEYWORDS.iter().any(|kw| header.contains(kw))
}

pub fn auto_detect(headers: &[String]) -> PartialMapping {
    auto_detect_with(headers, MatchOrder::LastWins)
}

pub fn auto_detect_with(headers: &[String], order: MatchOrder) -> PartialMapping {
    let mut mapping = PartialMapping::default();

    for header in headers {
        let lowered = header.to_lowercase().trim().to_string();

        if matches_point(&lowered) {
            assign(&mut mapping.point_column, header, order);
        }
        if matches_x(&lowered) {
            assign(&mut mapping.x_column, header, order);
        }
        if matches_y(&lowered) {
            assign(&mut mapping.y_column, header, order);
        }
    }

    tracing::debug!(
        point = ?mapping.point_column,
        x = ?mapping.x_column,
        y = ?mapping.y_column,
        "auto-detected column roles"
    );

    mapping
}

fn assign(slot: &mut Option<String>, header: &str, order: MatchOrder) {
    match order {
        MatchOrder::LastWins => *slot = Some(header.to_string()),
        MatchOrder::FirstWins => {
            if slot.is_none() {
                *slot = Some(header.to_string());
            }
        }
    }
}

pub fn validate(
    mapping: &PartialMapping,
    headers: &[String],
) -> Result<ColumnRoleMapping, MappingError> {
    let point = required(&mapping.point_column, "point")?;
    let x = required(&mapping.x_column, "x")?;
    let y = required(&mapping.y_column, "y")?;

    if point == x || point == y {
        return Err(MappingError::DuplicateColumn {
            header: point.to_string(),
        });
    }
    if x == y {
        return Err(MappingError::DuplicateColumn {
            header: x.to_string(),
        });
    }

    for header in [point, x, y] {
        if !headers.iter().any(|h| h == header) {
            return Err(MappingError::UnknownColumn {
                header: header.to_string(),
            });
        }
    }

    Ok(ColumnRoleMapping {
        point_column: point.to_string(),
        x_column: x.to_string(),
        y_column: y.to_string(),
    })
}

fn required<'a>(
    slot: &'a Option<String>,
    role: &'static str,
) -> Result<&'a str, MappingError> {
    slot.as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(MappingError::MissingRole { role })
}
