//! Proj-string subset backing the transform engine: geographic,
//! transverse Mercator (incl. UTM), and spherical Mercator projections
//! with 7-parameter position-vector datum shifts.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use regex::Regex;

use crate::error::TransformError;

const ARCSEC_TO_RAD: f64 = PI / (180.0 * 3600.0);

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProjKind {
    LongLat,
    Tmerc,
    Merc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDef {
    kind: ProjKind,
    a: f64,
    e2: f64,
    lat0: f64,
    lon0: f64,
    k0: f64,
    x0: f64,
    y0: f64,
    towgs84: Option<[f64; 7]>,
    nodatum: bool,
}

struct EllipsoidParams {
    a: f64,
    rf: f64,
}

fn ellipsoid_by_acronym(acronym: &str) -> Option<EllipsoidParams> {
    match acronym {
        "WGS84" => Some(EllipsoidParams {
            a: 6_378_137.0,
            rf: 298.257_223_563,
        }),
        "krass" => Some(EllipsoidParams {
            a: 6_378_245.0,
            rf: 298.3,
        }),
        "GRS80" => Some(EllipsoidParams {
            a: 6_378_137.0,
            rf: 298.257_222_101,
        }),
        "intl" => Some(EllipsoidParams {
            a: 6_378_388.0,
            rf: 297.0,
        }),
        _ => None,
    }
}

impl ProjectionDef {
    pub fn parse(definition: &str) -> Result<Self, TransformError> {
        let token_re = Regex::new(r"\+([A-Za-z0-9_]+)(?:=(\S+))?")
            .expect("hardcoded proj token regex is valid");

        let mut proj = None;
        let mut a = None;
        let mut b = None;
        let mut ellps = None;
        let mut datum = None;
        let mut towgs84 = None;
        let mut lat0 = 0.0_f64;
        let mut lon0 = 0.0_f64;
        let mut k0 = 1.0_f64;
        let mut x0 = 0.0_f64;
        let mut y0 = 0.0_f64;
        let mut zone = None;
        let mut south = false;
        let mut nodatum = false;

        for capture in token_re.captures_iter(definition) {
            let key = capture.get(1).map_or("", |m| m.as_str());
            let value = capture.get(2).map(|m| m.as_str());
            match key {
                "proj" => proj = value.map(str::to_string),
                "a" => a = Some(parse_number(key, value)?),
                "b" => b = Some(parse_number(key, value)?),
                "ellps" => ellps = value.map(str::to_string),
                "datum" => datum = value.map(str::to_string),
                "towgs84" => towgs84 = Some(parse_towgs84(value)?),
                "lat_0" => lat0 = parse_number(key, value)?,
                "lon_0" => lon0 = parse_number(key, value)?,
                "k" | "k_0" => k0 = parse_number(key, value)?,
                "x_0" => x0 = parse_number(key, value)?,
                "y_0" => y0 = parse_number(key, value)?,
                "zone" => zone = Some(parse_number(key, value)?),
                "south" => south = true,
                // A null grid pins the coordinates to their ellipsoid:
                // no datum transform may be applied (Web Mercator).
                "nadgrids" => nodatum = value == Some("@null"),
                // units, no_defs, wktext, lat_ts and friends carry no
                // information for this projection subset.
                _ => {}
            }
        }

        let Some(proj) = proj else {
            return Err(TransformError::new(
                "projection definition has no +proj parameter",
            ));
        };

        let kind = match proj.as_str() {
            "longlat" | "latlong" => ProjKind::LongLat,
            "tmerc" => ProjKind::Tmerc,
            "utm" => ProjKind::Tmerc,
            "merc" => ProjKind::Merc,
            other => {
                return Err(TransformError::new(format!(
                    "unsupported projection '{other}'"
                )));
            }
        };

        if proj == "utm" {
            let Some(zone) = zone else {
                return Err(TransformError::new("utm projection requires +zone"));
            };
            if !(1.0..=60.0).contains(&zone) || zone.fract() != 0.0 {
                return Err(TransformError::new(format!("invalid utm zone {zone}")));
            }
            lon0 = 6.0 * zone - 183.0;
            k0 = 0.9996;
            x0 = 500_000.0;
            y0 = if south { 10_000_000.0 } else { 0.0 };
        }

        if datum.as_deref() == Some("WGS84") {
            ellps.get_or_insert_with(|| "WGS84".to_string());
            towgs84.get_or_insert([0.0; 7]);
        }

        let (a, e2) = match (a, b, ellps.as_deref()) {
            (Some(a), Some(b), _) => (a, 1.0 - (b * b) / (a * a)),
            (_, _, Some(acronym)) => {
                let Some(ellipsoid) = ellipsoid_by_acronym(acronym) else {
                    return Err(TransformError::new(format!(
                        "unknown ellipsoid '{acronym}'"
                    )));
                };
                let f = 1.0 / ellipsoid.rf;
                (ellipsoid.a, f * (2.0 - f))
            }
            (Some(a), None, None) => (a, 0.0),
            _ => {
                return Err(TransformError::new(
                    "projection definition has no ellipsoid",
                ));
            }
        };

        Ok(Self {
            kind,
            a,
            e2,
            lat0: lat0.to_radians(),
            lon0: lon0.to_radians(),
            k0,
            x0,
            y0,
            towgs84,
            nodatum,
        })
    }

    fn datum_matches(&self, other: &Self) -> bool {
        let own = self.towgs84.unwrap_or([0.0; 7]);
        let theirs = other.towgs84.unwrap_or([0.0; 7]);
        own == theirs && (self.a - other.a).abs() < 1e-6 && (self.e2 - other.e2).abs() < 1e-15
    }

    /// Projected (or degree) coordinates to geographic radians on this
    /// definition's datum.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        match self.kind {
            ProjKind::LongLat => {
                let lat = y.to_radians();
                if lat.abs() > FRAC_PI_2 + 1e-12 {
                    return Err(TransformError::new(format!(
                        "latitude {y} is out of range [-90, 90]"
                    )));
                }
                Ok((x.to_radians(), lat))
            }
            ProjKind::Merc => {
                let lon = adjust_lon(self.lon0 + (x - self.x0) / (self.a * self.k0));
                let lat = FRAC_PI_2 - 2.0 * ((-(y - self.y0) / (self.a * self.k0)).exp()).atan();
                Ok((lon, lat))
            }
            ProjKind::Tmerc => self.tmerc_inverse(x, y),
        }
    }

    /// Geographic radians on this definition's datum to projected (or
    /// degree) coordinates.
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), TransformError> {
        if lat.abs() > FRAC_PI_2 + 1e-12 {
            return Err(TransformError::new(format!(
                "latitude {} is out of range [-90, 90]",
                lat.to_degrees()
            )));
        }
        match self.kind {
            ProjKind::LongLat => Ok((lon.to_degrees(), lat.to_degrees())),
            ProjKind::Merc => {
                if lat.abs() >= FRAC_PI_2 - 1e-10 {
                    return Err(TransformError::new(
                        "latitude is out of range for the Mercator projection",
                    ));
                }
                let x = self.a * self.k0 * adjust_lon(lon - self.lon0);
                let y = self.a * self.k0 * (FRAC_PI_4 + lat / 2.0).tan().ln() + self.y0;
                Ok((x, y))
            }
            ProjKind::Tmerc => self.tmerc_forward(lon, lat),
        }
    }

    fn tmerc_forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), TransformError> {
        let delta_lon = adjust_lon(lon - self.lon0);
        if delta_lon.abs() > FRAC_PI_2 {
            return Err(TransformError::new(
                "point is too far from the central meridian",
            ));
        }

        let e2 = self.e2;
        let ep2 = e2 / (1.0 - e2);
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a_term = delta_lon * cos_lat;

        let m = self.meridian_arc(lat);
        let m0 = self.meridian_arc(self.lat0);

        let x = self.k0
            * n
            * (a_term
                + (1.0 - t + c) * a_term.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a_term.powi(5) / 120.0)
            + self.x0;
        let y = self.k0
            * (m - m0
                + n * tan_lat
                    * (a_term * a_term / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a_term.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2)
                            * a_term.powi(6)
                            / 720.0))
            + self.y0;

        Ok((x, y))
    }

    fn tmerc_inverse(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
        let e2 = self.e2;
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let m0 = self.meridian_arc(self.lat0);
        let m = m0 + (y - self.y0) / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        if phi1.abs() > FRAC_PI_2 {
            return Err(TransformError::new(
                "northing is out of range for the transverse Mercator projection",
            ));
        }

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = self.a / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = self.a * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = (x - self.x0) / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = adjust_lon(
            self.lon0
                + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                    + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                        * d.powi(5)
                        / 120.0)
                    / cos_phi1,
        );

        Ok((lon, lat))
    }

    fn meridian_arc(&self, lat: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }

    fn geodetic_to_geocentric(&self, lon: f64, lat: f64) -> (f64, f64, f64) {
        let sin_lat = lat.sin();
        let n = self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
        (
            n * lat.cos() * lon.cos(),
            n * lat.cos() * lon.sin(),
            n * (1.0 - self.e2) * sin_lat,
        )
    }

    fn geocentric_to_geodetic(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        let lon = y.atan2(x);
        let p = x.hypot(y);
        let mut lat = z.atan2(p * (1.0 - self.e2));
        for _ in 0..8 {
            let sin_lat = lat.sin();
            let n = self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt();
            lat = (z + self.e2 * n * sin_lat).atan2(p);
        }
        (lon, lat)
    }
}

/// Applies a position-vector 7-parameter shift toward WGS84.
fn helmert_to_wgs84(params: &[f64; 7], x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let [dx, dy, dz, rx, ry, rz, s] = *params;
    let rx = rx * ARCSEC_TO_RAD;
    let ry = ry * ARCSEC_TO_RAD;
    let rz = rz * ARCSEC_TO_RAD;
    let m = 1.0 + s * 1e-6;
    (
        m * (x - rz * y + ry * z) + dx,
        m * (rz * x + y - rx * z) + dy,
        m * (-ry * x + rx * y + z) + dz,
    )
}

fn helmert_from_wgs84(params: &[f64; 7], x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let [dx, dy, dz, rx, ry, rz, s] = *params;
    let rx = rx * ARCSEC_TO_RAD;
    let ry = ry * ARCSEC_TO_RAD;
    let rz = rz * ARCSEC_TO_RAD;
    let m = 1.0 + s * 1e-6;
    let x = (x - dx) / m;
    let y = (y - dy) / m;
    let z = (z - dz) / m;
    (x + rz * y - ry * z, -rz * x + y + rx * z, ry * x - rx * y + z)
}

fn adjust_lon(lon: f64) -> f64 {
    if lon.abs() <= PI {
        lon
    } else {
        lon - lon.signum() * 2.0 * PI
    }
}

fn parse_number(key: &str, value: Option<&str>) -> Result<f64, TransformError> {
    let Some(value) = value else {
        return Err(TransformError::new(format!("+{key} has no value")));
    };
    value
        .parse::<f64>()
        .map_err(|_| TransformError::new(format!("+{key} has a non-numeric value '{value}'")))
}

fn parse_towgs84(value: Option<&str>) -> Result<[f64; 7], TransformError> {
    let Some(value) = value else {
        return Err(TransformError::new("+towgs84 has no value"));
    };
    let numbers = value
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|_| {
                TransformError::new(format!("+towgs84 has a non-numeric component '{part}'"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut params = [0.0; 7];
    match numbers.len() {
        3 | 7 => {
            params[..numbers.len()].copy_from_slice(&numbers);
            Ok(params)
        }
        count => Err(TransformError::new(format!(
            "+towgs84 expects 3 or 7 parameters, got {count}"
        ))),
    }
}

/// The projection primitive: `(x, y)` in the source system to `(x, y)`
/// in the target system.
pub fn project(
    source: &ProjectionDef,
    target: &ProjectionDef,
    x: f64,
    y: f64,
) -> Result<(f64, f64), TransformError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(TransformError::new("coordinates must be finite numbers"));
    }

    let (lon, lat) = source.inverse(x, y)?;

    let (lon, lat) = if source.nodatum || target.nodatum || source.datum_matches(target) {
        (lon, lat)
    } else {
        let (gx, gy, gz) = source.geodetic_to_geocentric(lon, lat);
        let (gx, gy, gz) = match source.towgs84 {
            Some(params) => helmert_to_wgs84(&params, gx, gy, gz),
            None => (gx, gy, gz),
        };
        let (gx, gy, gz) = match target.towgs84 {
            Some(params) => helmert_from_wgs84(&params, gx, gy, gz),
            None => (gx, gy, gz),
        };
        target.geocentric_to_geodetic(gx, gy, gz)
    };

    target.forward(lon, lat)
}
