use serde::Deserialize;

use crate::error::ConvertError;

/// Opaque catalog identifier, used as the structural half of the
/// transform memo key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemId(pub String);

impl SystemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    Geographic,
    Projected,
    Local,
}

impl SystemKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Geographic => "географическая",
            Self::Projected => "проекционная",
            Self::Local => "плоская прямоугольная",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSystemDefinition {
    pub id: SystemId,
    pub display_name: String,
    pub code: String,
    pub description: String,
    pub projection_string: String,
    pub kind: SystemKind,
    pub ellipsoid: String,
    pub datum: String,
    pub area_of_use: String,
}

/// Externally-sourced definition record, shaped like a spatial reference
/// database row. The producer of these records is out of scope; the
/// catalog only maps them.
#[derive(Debug, Clone, Deserialize)]
pub struct SrsRecord {
    pub srs_id: i64,
    pub description: Option<String>,
    pub projection_acronym: Option<String>,
    pub ellipsoid_acronym: Option<String>,
    pub parameters: Option<String>,
    pub auth_name: Option<String>,
    pub auth_id: Option<String>,
    #[serde(default)]
    pub is_geo: i64,
    #[serde(default)]
    pub deprecated: i64,
    pub wkt: Option<String>,
}

pub fn definition_from_srs_record(record: &SrsRecord) -> Option<CoordinateSystemDefinition> {
    if record.deprecated != 0 {
        return None;
    }

    let description = record.description.clone().unwrap_or_default();
    let (display_name, code) = match (&record.auth_name, &record.auth_id) {
        (Some(auth_name), Some(auth_id)) => (
            format!("{description} ({auth_name}:{auth_id})"),
            format!("{auth_name}:{auth_id}"),
        ),
        _ => (description.clone(), format!("DB:{}", record.srs_id)),
    };

    Some(CoordinateSystemDefinition {
        id: SystemId(format!("db_{}", record.srs_id)),
        display_name,
        code,
        description: format!(
            "Из базы данных - {}",
            record.projection_acronym.as_deref().unwrap_or("Неизвестная проекция")
        ),
        projection_string: record.parameters.clone().unwrap_or_default(),
        kind: if record.is_geo == 1 {
            SystemKind::Geographic
        } else {
            SystemKind::Projected
        },
        ellipsoid: record.ellipsoid_acronym.clone().unwrap_or_default(),
        datum: "Из базы данных".to_string(),
        area_of_use: "Из базы данных".to_string(),
    })
}

/// Named registry of coordinate reference systems. Seeded with the
/// built-in list, extensible at runtime from imported records.
#[derive(Debug, Clone)]
pub struct CoordinateSystemCatalog {
    systems: Vec<CoordinateSystemDefinition>,
}

impl Default for CoordinateSystemCatalog {
    fn default() -> Self {
        Self::with_builtin_systems()
    }
}

impl CoordinateSystemCatalog {
    pub fn empty() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    pub fn with_builtin_systems() -> Self {
        let mut catalog = Self::empty();
        for definition in builtin_systems() {
            catalog.register(definition);
        }
        catalog
    }

    pub fn register(&mut self, definition: CoordinateSystemDefinition) {
        self.systems.push(definition);
    }

    /// Registers every non-deprecated record. Returns how many were
    /// accepted.
    pub fn import_srs_records(&mut self, records: &[SrsRecord]) -> usize {
        let mut imported = 0;
        for record in records {
            if let Some(definition) = definition_from_srs_record(record) {
                self.register(definition);
                imported += 1;
            }
        }
        tracing::debug!(imported, total = records.len(), "srs records imported");
        imported
    }

    /// Case-insensitive exact match on display name or code.
    pub fn lookup(&self, name_or_code: &str) -> Option<&CoordinateSystemDefinition> {
        let query = name_or_code.trim().to_lowercase();
        self.systems.iter().find(|system| {
            system.display_name.to_lowercase() == query || system.code.to_lowercase() == query
        })
    }

    pub fn is_supported(&self, name_or_code: &str) -> bool {
        self.lookup(name_or_code).is_some()
    }

    pub fn all(&self) -> &[CoordinateSystemDefinition] {
        &self.systems
    }

    pub fn resolve(&self, name_or_code: &str) -> Result<&CoordinateSystemDefinition, ConvertError> {
        self.lookup(name_or_code)
            .ok_or_else(|| ConvertError::UnknownSystem {
                name: name_or_code.to_string(),
            })
    }

    /// Autocomplete-style substring search over name, code, description
    /// and kind label. Layered on top of `lookup`, not part of it.
    pub fn search(&self, query: &str) -> Vec<&CoordinateSystemDefinition> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.systems.iter().collect();
        }
        self.systems
            .iter()
            .filter(|system| {
                system.display_name.to_lowercase().contains(&query)
                    || system.code.to_lowercase().contains(&query)
                    || system.description.to_lowercase().contains(&query)
                    || system.kind.label().contains(&query)
            })
            .collect()
    }
}

fn builtin_systems() -> Vec<CoordinateSystemDefinition> {
    vec![
        CoordinateSystemDefinition {
            id: SystemId("wgs84".to_string()),
            display_name: "WGS 84".to_string(),
            code: "EPSG:4326".to_string(),
            description: "Всемирная геодезическая система 1984 года".to_string(),
            projection_string: "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs".to_string(),
            kind: SystemKind::Geographic,
            ellipsoid: "WGS 84".to_string(),
            datum: "WGS84".to_string(),
            area_of_use: "Весь мир".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("sk42".to_string()),
            display_name: "СК-42".to_string(),
            code: "EPSG:4284".to_string(),
            description: "Система координат 1942 года".to_string(),
            projection_string:
                "+proj=longlat +ellps=krass +towgs84=25,-141,-78.5,0,0.35,0.736,0 +no_defs"
                    .to_string(),
            kind: SystemKind::Geographic,
            ellipsoid: "Красовского".to_string(),
            datum: "Пулково 1942".to_string(),
            area_of_use: "СССР/Россия".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("pulkovo42".to_string()),
            display_name: "Пулково 1942".to_string(),
            code: "EPSG:4284".to_string(),
            description: "Пулковская система координат 1942 года".to_string(),
            projection_string:
                "+proj=longlat +ellps=krass +towgs84=25,-141,-78.5,0,0.35,0.736,0 +no_defs"
                    .to_string(),
            kind: SystemKind::Geographic,
            ellipsoid: "Красовского".to_string(),
            datum: "Пулково 1942".to_string(),
            area_of_use: "СССР/Россия".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("gauss".to_string()),
            display_name: "Гаусс-Крюгер".to_string(),
            code: "СК-42 ГК".to_string(),
            description: "Проекция Гаусса-Крюгера".to_string(),
            projection_string: "+proj=tmerc +lat_0=0 +lon_0=30 +k=1 +x_0=0 +y_0=0 +ellps=krass +towgs84=25,-141,-78.5,0,0.35,0.736,0 +units=m +no_defs".to_string(),
            kind: SystemKind::Projected,
            ellipsoid: "Красовского".to_string(),
            datum: "Пулково 1942".to_string(),
            area_of_use: "СССР/Россия".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("msk".to_string()),
            display_name: "МСК".to_string(),
            code: "Местная СК".to_string(),
            description: "Местная система координат".to_string(),
            projection_string: "+proj=tmerc +lat_0=55.6666666666667 +lon_0=37.5 +k=1 +x_0=0 +y_0=0 +ellps=krass +towgs84=25,-141,-78.5,0,0.35,0.736,0 +units=m +no_defs".to_string(),
            kind: SystemKind::Local,
            ellipsoid: "Красовского".to_string(),
            datum: "Местный".to_string(),
            area_of_use: "Локальная зона".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("utm36n".to_string()),
            display_name: "UTM 36N".to_string(),
            code: "EPSG:32636".to_string(),
            description: "Универсальная поперечная проекция Меркатора, зона 36".to_string(),
            projection_string:
                "+proj=utm +zone=36 +ellps=WGS84 +datum=WGS84 +units=m +no_defs".to_string(),
            kind: SystemKind::Projected,
            ellipsoid: "WGS 84".to_string(),
            datum: "WGS84".to_string(),
            area_of_use: "Зональная".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("webmercator".to_string()),
            display_name: "Web Mercator".to_string(),
            code: "EPSG:3857".to_string(),
            description: "Сферическая проекция Меркатора для веб-карт".to_string(),
            projection_string: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs".to_string(),
            kind: SystemKind::Projected,
            ellipsoid: "Сфера".to_string(),
            datum: "WGS84".to_string(),
            area_of_use: "Весь мир".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("nad83".to_string()),
            display_name: "NAD83".to_string(),
            code: "EPSG:4269".to_string(),
            description: "Североамериканская система 1983 года".to_string(),
            projection_string:
                "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs".to_string(),
            kind: SystemKind::Geographic,
            ellipsoid: "GRS 80".to_string(),
            datum: "NAD83".to_string(),
            area_of_use: "Северная Америка".to_string(),
        },
        CoordinateSystemDefinition {
            id: SystemId("ed50".to_string()),
            display_name: "ED50".to_string(),
            code: "EPSG:4230".to_string(),
            description: "Европейская система 1950 года".to_string(),
            projection_string:
                "+proj=longlat +ellps=intl +towgs84=-87,-98,-121,0,0,0,0 +no_defs".to_string(),
            kind: SystemKind::Geographic,
            ellipsoid: "International 1924".to_string(),
            datum: "European 1950".to_string(),
            area_of_use: "Европа".to_string(),
        },
    ]
}
