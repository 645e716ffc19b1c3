use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cartesian::Point2d;
use crate::error::MeridianTypesError;
use crate::geo::{GeoPoint2d, GeographicProjection, Projection};

/// Identifiers of the projections whose valid area is a disk rather than a rectangle.
pub const CIRCULAR_CRS: &[&str] = &["EPSG:3571"];

lazy_static! {
    static ref IDENTIFIER_RE: Regex =
        Regex::new(r"(?i)^\s*(?:EPSG\s*:\s*)?(\d+)\s*(?:-.*)?$").expect("valid regex");
    static ref WKT_AUTHORITY_RE: Regex =
        Regex::new(r#"(?i)(?:AUTHORITY|ID)\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("valid regex");
}

/// Shape of the valid area of a projection, used to draw the scene background and frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtentKind {
    /// Disk inscribed into the data extent.
    Circular,
    /// The data extent rectangle itself.
    Rectangular,
}

/// Returns the extent kind of a target CRS identifier.
///
/// Only the identifiers listed in [`CIRCULAR_CRS`] are circular. Anything else, including identifiers that cannot
/// be resolved, is rectangular.
pub fn classify_extent(identifier: &str) -> ExtentKind {
    let is_circular = match Crs::parse(identifier) {
        Ok(crs) => CIRCULAR_CRS.contains(&crs.identifier().as_str()),
        Err(_) => CIRCULAR_CRS.contains(&identifier.trim()),
    };

    if is_circular {
        ExtentKind::Circular
    } else {
        ExtentKind::Rectangular
    }
}

/// How coordinates of a CRS are produced from geographic ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrsKind {
    /// Longitude and latitude in degrees, stored as `x` and `y`.
    Geographic,
    /// Projected coordinates in meters.
    Projected {
        /// Operator definition understood by the [`geodesy`](https://docs.rs/geodesy) crate.
        definition: Cow<'static, str>,
    },
}

/// Coordinate reference system known to the engine.
///
/// Two CRSs are considered equal if their EPSG codes are equal.
#[derive(Debug, Clone)]
pub struct Crs {
    code: u32,
    name: Cow<'static, str>,
    kind: CrsKind,
}

const REGISTRY: &[(u32, &str, Option<&str>)] = &[
    (4326, "WGS 84", None),
    (4490, "CGCS2000", None),
    (4214, "Beijing 1954", None),
    (3857, "WGS 84 / Pseudo-Mercator", Some("webmerc")),
    (3395, "WGS 84 / World Mercator", Some("merc ellps=WGS84")),
    (
        3035,
        "ETRS89 / LAEA Europe",
        Some("laea lat_0=52 lon_0=10 x_0=4321000 y_0=3210000 ellps=GRS80"),
    ),
    (
        3571,
        "WGS 84 / North Pole LAEA Bering Sea",
        Some("laea lat_0=90 lon_0=180 ellps=WGS84"),
    ),
];

/// Codes offered to the user when choosing a target projection, in menu order.
const MENU: &[u32] = &[4326, 4490, 3571, 3035, 3395, 32649, 4214];

impl Crs {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Crs = Crs {
        code: 4326,
        name: Cow::Borrowed("WGS 84"),
        kind: CrsKind::Geographic,
    };

    /// Resolves an EPSG code into a known CRS.
    pub fn from_code(code: u32) -> Result<Self, MeridianTypesError> {
        if let Some((code, name, definition)) = REGISTRY.iter().find(|(c, _, _)| *c == code) {
            let kind = match definition {
                Some(definition) => CrsKind::Projected {
                    definition: Cow::Borrowed(definition),
                },
                None => CrsKind::Geographic,
            };
            return Ok(Self {
                code: *code,
                name: Cow::Borrowed(name),
                kind,
            });
        }

        let (zone, south) = match code {
            32601..=32660 => (code - 32600, false),
            32701..=32760 => (code - 32700, true),
            _ => return Err(MeridianTypesError::UnknownCrs(format!("EPSG:{code}"))),
        };

        let hemisphere = if south { "S" } else { "N" };
        let mut definition = format!("utm zone={zone} ellps=WGS84");
        if south {
            definition.push_str(" south");
        }

        Ok(Self {
            code,
            name: Cow::Owned(format!("WGS 84 / UTM zone {zone}{hemisphere}")),
            kind: CrsKind::Projected {
                definition: Cow::Owned(definition),
            },
        })
    }

    /// Parses a CRS identifier.
    ///
    /// Accepted forms are `EPSG:3035`, `epsg:3035`, a bare code `3035` and menu entries with a description
    /// suffix like `EPSG:3035 - ETRS89 / LAEA Europe`. The suffix is ignored.
    pub fn parse(identifier: &str) -> Result<Self, MeridianTypesError> {
        let code = IDENTIFIER_RE
            .captures(identifier)
            .and_then(|captures| captures.get(1))
            .and_then(|code| code.as_str().parse::<u32>().ok())
            .ok_or_else(|| MeridianTypesError::UnknownCrs(identifier.to_string()))?;

        Self::from_code(code).map_err(|_| MeridianTypesError::UnknownCrs(identifier.to_string()))
    }

    /// Resolves the CRS of a `.prj` file from its WKT text.
    ///
    /// The top-level authority clause of a WKT definition is the last one in the text, so the last
    /// `AUTHORITY["EPSG","..."]` or `ID["EPSG",...]` clause is used.
    pub fn from_prj_wkt(wkt: &str) -> Result<Self, MeridianTypesError> {
        let code = WKT_AUTHORITY_RE
            .captures_iter(wkt)
            .last()
            .and_then(|captures| captures.get(1))
            .and_then(|code| code.as_str().parse::<u32>().ok())
            .ok_or_else(|| {
                MeridianTypesError::UnknownCrs("WKT without an EPSG authority".to_string())
            })?;

        Self::from_code(code)
    }

    /// List of CRSs offered for the target projection choice.
    pub fn supported() -> Vec<Crs> {
        MENU.iter().filter_map(|code| Self::from_code(*code).ok()).collect()
    }

    /// EPSG code.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Human readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the CRS.
    pub fn kind(&self) -> &CrsKind {
        &self.kind
    }

    /// Canonical identifier, e.g. `EPSG:4326`.
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.code)
    }

    /// Menu entry text, e.g. `EPSG:4326 - WGS 84`. It can be parsed back with [`Crs::parse`].
    pub fn menu_entry(&self) -> String {
        format!("EPSG:{} - {}", self.code, self.name)
    }

    /// Returns true for longitude/latitude CRSs.
    pub fn is_geographic(&self) -> bool {
        self.kind == CrsKind::Geographic
    }

    /// Shape of the valid area of this CRS when used as a target.
    pub fn extent_kind(&self) -> ExtentKind {
        classify_extent(&self.identifier())
    }

    /// Returns the projection from geographic coordinates into the coordinates of this CRS.
    ///
    /// Returns `None` if the projection cannot be created (e.g. the crate is built without the `geodesy` feature
    /// and the CRS is not geographic).
    pub fn get_projection(&self) -> Option<Box<dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2d>>> {
        match &self.kind {
            CrsKind::Geographic => Some(Box::new(GeographicProjection)),
            #[cfg(feature = "geodesy")]
            CrsKind::Projected { definition } => {
                let projection = crate::geo::GeodesyProjection::new(definition)?;
                Some(Box::new(projection))
            }
            #[cfg(not(feature = "geodesy"))]
            CrsKind::Projected { .. } => None,
        }
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Crs {}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_identifiers() {
        assert_eq!(Crs::parse("EPSG:4326").expect("known").code(), 4326);
        assert_eq!(Crs::parse("epsg:3035").expect("known").code(), 3035);
        assert_eq!(Crs::parse(" 3857 ").expect("known").code(), 3857);
        assert_eq!(
            Crs::parse("EPSG:3571 - WGS 84 / North Pole LAEA Bering Sea")
                .expect("known")
                .code(),
            3571
        );

        assert_matches!(Crs::parse("EPSG:9999"), Err(MeridianTypesError::UnknownCrs(_)));
        assert_matches!(Crs::parse("not a crs"), Err(MeridianTypesError::UnknownCrs(_)));
        assert_matches!(Crs::parse(""), Err(MeridianTypesError::UnknownCrs(_)));
    }

    #[test]
    fn utm_zones() {
        let north = Crs::parse("EPSG:32649").expect("known");
        assert_eq!(north.name(), "WGS 84 / UTM zone 49N");
        assert_matches!(north.kind(), CrsKind::Projected { definition } if definition == "utm zone=49 ellps=WGS84");

        let south = Crs::parse("EPSG:32733").expect("known");
        assert_matches!(south.kind(), CrsKind::Projected { definition } if definition.ends_with(" south"));

        assert!(Crs::parse("EPSG:32661").is_err());
    }

    #[test]
    fn menu_entries_parse_back() {
        let supported = Crs::supported();
        assert_eq!(supported.len(), MENU.len());
        for crs in supported {
            assert_eq!(Crs::parse(&crs.menu_entry()).expect("parses"), crs);
        }
    }

    #[test]
    fn prj_wkt() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295],AUTHORITY["EPSG","4326"]]"#;
        assert_eq!(Crs::from_prj_wkt(wkt).expect("resolves"), Crs::WGS84);

        let wkt2 = r#"PROJCRS["ETRS89-extended / LAEA Europe",BASEGEOGCRS["ETRS89"],ID["EPSG",3035]]"#;
        assert_eq!(Crs::from_prj_wkt(wkt2).expect("resolves").code(), 3035);

        assert!(Crs::from_prj_wkt(r#"GEOGCS["GCS_WGS_1984"]"#).is_err());
    }

    #[test]
    fn extent_classification() {
        assert_eq!(classify_extent("EPSG:3571"), ExtentKind::Circular);
        assert_eq!(
            classify_extent("EPSG:3571 - WGS 84 / North Pole LAEA Bering Sea"),
            ExtentKind::Circular
        );
        assert_eq!(classify_extent("EPSG:4326"), ExtentKind::Rectangular);
        assert_eq!(classify_extent("EPSG:3035"), ExtentKind::Rectangular);
        assert_eq!(classify_extent("garbage"), ExtentKind::Rectangular);
    }

    #[test]
    fn geographic_projection_is_axis_swap() {
        let projection = Crs::WGS84.get_projection().expect("geographic");
        let point = projection
            .project(&GeoPoint2d::latlon(30.0, 110.0))
            .expect("projects");
        assert_eq!(point, Point2d::new(110.0, 30.0));
    }

    #[cfg(feature = "geodesy")]
    #[test]
    fn projected_round_trip() {
        use approx::assert_relative_eq;

        for code in [3857, 3395, 3035, 3571, 32649] {
            let crs = Crs::from_code(code).expect("known");
            let projection = crs.get_projection().expect("creates projection");
            let source = GeoPoint2d::latlon(50.5, 20.25);
            let projected = projection.project(&source).expect("projects");
            let back = projection.unproject(&projected).expect("unprojects");
            assert_relative_eq!(back.lat(), source.lat(), max_relative = 1e-6);
            assert_relative_eq!(back.lon(), source.lon(), max_relative = 1e-6);
        }
    }
}
