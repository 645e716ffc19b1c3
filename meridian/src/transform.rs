//! Conversion of dataset coordinates from the source CRS into the CRS of the scene.

use std::fmt::{Debug, Formatter};

use meridian_types::geo::{
    classify_extent, ChainProjection, Crs, ExtentKind, GeoPoint2d, IdentityProjection,
    InvertedProjection, Projection,
};
use meridian_types::{Geom, Point2d, Rect};

use crate::error::MeridianError;

/// Fraction of the extent span added on each side of the computed data extent.
pub const EXTENT_BUFFER: f64 = 0.001;

/// Coordinate transformation between two CRSs.
pub struct CrsTransform {
    source: Crs,
    target: Crs,
    projection: Box<dyn Projection<InPoint = Point2d, OutPoint = Point2d>>,
}

impl Debug for CrsTransform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsTransform")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl CrsTransform {
    /// Creates a transformation from `source` into `target` CRS.
    ///
    /// Equal CRSs and pairs of geographic CRSs produce an identity transformation: no datum shift is applied between
    /// geographic datums.
    pub fn new(source: &Crs, target: &Crs) -> Result<Self, MeridianError> {
        let projection: Box<dyn Projection<InPoint = Point2d, OutPoint = Point2d>> =
            if source == target || (source.is_geographic() && target.is_geographic()) {
                Box::new(IdentityProjection::new())
            } else {
                let source_projection = source.get_projection().ok_or_else(|| {
                    MeridianError::Projection(format!("cannot create projection for {source}"))
                })?;
                let target_projection = target.get_projection().ok_or_else(|| {
                    MeridianError::Projection(format!("cannot create projection for {target}"))
                })?;

                let chain: ChainProjection<Point2d, GeoPoint2d, Point2d> = ChainProjection::new(
                    Box::new(InvertedProjection::new(source_projection)),
                    target_projection,
                );
                Box::new(chain)
            };

        Ok(Self {
            source: source.clone(),
            target: target.clone(),
            projection,
        })
    }

    /// Source CRS.
    pub fn source(&self) -> &Crs {
        &self.source
    }

    /// Target CRS.
    pub fn target(&self) -> &Crs {
        &self.target
    }

    /// Transforms a single point. The result is not checked for being finite.
    pub fn apply(&self, point: &Point2d) -> Option<Point2d> {
        self.projection.project(point)
    }

    /// Transforms a point from the target CRS back into the source one.
    pub fn apply_inverse(&self, point: &Point2d) -> Option<Point2d> {
        self.projection.unproject(point)
    }

    /// Transforms every vertex of the geometry.
    pub fn apply_geometry(&self, geometry: &Geom) -> Option<Geom> {
        geometry.project(self.projection.as_ref())
    }
}

/// Holds the active source/target CRS pair of a session.
#[derive(Debug, Default)]
pub struct CrsTransformService {
    active: Option<CrsTransform>,
}

impl CrsTransformService {
    /// Creates a service without an active transformation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active transformation from CRS identifiers (`EPSG:4326`, `EPSG:3035 - ETRS89 / LAEA Europe`, ...).
    ///
    /// On error the previous transformation stays active.
    pub fn set_projection(&mut self, source: &str, target: &str) -> Result<(), MeridianError> {
        let source = Crs::parse(source)?;
        let target = Crs::parse(target)?;
        self.set_projection_crs(&source, &target)
    }

    /// Sets the active transformation. On error the previous transformation stays active.
    pub fn set_projection_crs(&mut self, source: &Crs, target: &Crs) -> Result<(), MeridianError> {
        let transform = CrsTransform::new(source, target)?;
        log::info!("Projection set: {source} -> {target}");
        self.active = Some(transform);
        Ok(())
    }

    /// Active transformation.
    pub fn active(&self) -> Result<&CrsTransform, MeridianError> {
        self.active
            .as_ref()
            .ok_or_else(|| MeridianError::Projection("projection is not set".into()))
    }

    /// Returns true if a transformation is configured.
    pub fn is_set(&self) -> bool {
        self.active.is_some()
    }

    /// Source CRS of the active transformation.
    pub fn source_crs(&self) -> Option<&Crs> {
        self.active.as_ref().map(CrsTransform::source)
    }

    /// Target CRS of the active transformation.
    pub fn target_crs(&self) -> Option<&Crs> {
        self.active.as_ref().map(CrsTransform::target)
    }

    /// Transforms a single point with the active transformation.
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), MeridianError> {
        let transform = self.active()?;
        let projected = transform.apply(&Point2d::new(x, y)).ok_or_else(|| {
            MeridianError::Projection(format!("cannot transform point ({x}, {y})"))
        })?;

        Ok((projected.x, projected.y))
    }

    /// Transforms every vertex of the geometry. `feature_index` is only used for error reporting.
    pub fn transform_geometry(
        &self,
        geometry: &Geom,
        feature_index: usize,
    ) -> Result<Geom, MeridianError> {
        self.active()?
            .apply_geometry(geometry)
            .ok_or(MeridianError::GeometryTransform { feature_index })
    }

    /// Creates a transformation from another source CRS (e.g. the CRS of the markers) into the active target CRS.
    pub fn transform_from(&self, source: &Crs) -> Result<CrsTransform, MeridianError> {
        CrsTransform::new(source, self.active()?.target())
    }

    /// Extent shape of the active target CRS. Without an active transformation the extent is rectangular.
    pub fn extent_kind(&self) -> ExtentKind {
        self.target_crs()
            .map(Crs::extent_kind)
            .unwrap_or(ExtentKind::Rectangular)
    }
}

/// Classifies the extent shape of a target CRS identifier.
pub fn classify_target_extent(target: &str) -> ExtentKind {
    classify_extent(target)
}

/// Bounding rectangle of all vertices of the given geometries, expanded by [`EXTENT_BUFFER`] of each span on every
/// side. Returns `None` if there are no vertices.
pub fn compute_extent<'a>(geometries: impl IntoIterator<Item = &'a Geom>) -> Option<Rect> {
    let rect: Option<Rect> = geometries
        .into_iter()
        .flat_map(|geom| {
            let polygons = geom.polygons().iter().filter_map(|p| p.bounding_rect());
            let lines = geom.lines().iter().filter_map(|l| l.bounding_rect());
            polygons.chain(lines)
        })
        .collect();

    rect.map(|r| r.expand_by_fraction(EXTENT_BUFFER))
}

/// Resolves a CRS identifier, falling back to WGS 84 if it cannot be resolved.
pub fn resolve_crs_or_default(identifier: &str) -> Crs {
    match Crs::parse(identifier) {
        Ok(crs) => crs,
        Err(err) => {
            log::warn!("{err}, falling back to {}", Crs::WGS84);
            Crs::WGS84
        }
    }
}

/// Resolves the CRS of a `.prj` file, falling back to WGS 84 if it cannot be resolved.
pub fn resolve_prj_or_default(wkt: &str) -> Crs {
    match Crs::from_prj_wkt(wkt) {
        Ok(crs) => crs,
        Err(err) => {
            log::warn!("{err}, falling back to {}", Crs::WGS84);
            Crs::WGS84
        }
    }
}
