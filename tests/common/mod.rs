use std::path::{Path, PathBuf};

pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("fixture should be written");
    path
}

pub fn sample_points_csv() -> &'static str {
    "Точка,X,Y\nA,37.617,55.755\nB,30.316,59.938\n"
}

pub fn sample_srs_json() -> &'static str {
    r#"[
        {
            "srs_id": 2741,
            "description": "Pulkovo 1942 / Gauss-Kruger zone 7",
            "projection_acronym": "tmerc",
            "ellipsoid_acronym": "krass",
            "parameters": "+proj=tmerc +lat_0=0 +lon_0=39 +k=1 +x_0=7500000 +y_0=0 +ellps=krass +towgs84=25,-141,-78.5,0,0.35,0.736,0 +units=m +no_defs",
            "auth_name": "EPSG",
            "auth_id": "28407",
            "is_geo": 0,
            "deprecated": 0,
            "wkt": null
        },
        {
            "srs_id": 2742,
            "description": "Deprecated legacy zone",
            "projection_acronym": "tmerc",
            "ellipsoid_acronym": "krass",
            "parameters": "+proj=tmerc +lat_0=0 +lon_0=45 +k=1 +x_0=8500000 +y_0=0 +ellps=krass +units=m +no_defs",
            "auth_name": "EPSG",
            "auth_id": "28408",
            "is_geo": 0,
            "deprecated": 1,
            "wkt": null
        }
    ]"#
}
