//! [`MapSession`] ties the store, the transformation, the scene and the highlight set of one map view together.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use meridian_types::geo::Crs;
use meridian_types::Point2d;
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::MeridianError;
use crate::export::{self, ExportFormat, ExportOptions};
use crate::feature::Feature;
use crate::messenger::{AttributeSink, DummySink};
use crate::query;
use crate::scene::{LayerKind, PrimitiveId, RebuildReport, Scene, SceneStyle};
use crate::selection::{HighlightEngine, PickMode};
use crate::store::FeatureStore;
use crate::transform::{resolve_crs_or_default, resolve_prj_or_default, CrsTransformService};

/// Initial configuration of a [`MapSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Style of the scene.
    pub style: SceneStyle,
    /// Identifier of the CRS the scene is shown in.
    pub target_crs: String,
    /// Options used by [`MapSession::render`], [`MapSession::encode`] and [`MapSession::save`].
    pub export: ExportOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            style: SceneStyle::default(),
            target_crs: Crs::WGS84.identifier(),
            export: ExportOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Sets the scene style.
    pub fn with_style(mut self, style: SceneStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the initial target CRS.
    pub fn with_target_crs(mut self, target_crs: impl Into<String>) -> Self {
        self.target_crs = target_crs.into();
        self
    }

    /// Sets export options.
    pub fn with_export(mut self, export: ExportOptions) -> Self {
        self.export = export;
        self
    }
}

/// State of one map view: dataset, markers, projection, scene and selection.
///
/// All operations are synchronous. A host that uses the session from several threads must serialize the access
/// itself.
pub struct MapSession {
    store: FeatureStore,
    transform: CrsTransformService,
    scene: Scene,
    highlights: HighlightEngine,
    style: SceneStyle,
    target_crs: Crs,
    pick_mode: PickMode,
    export: ExportOptions,
    sink: Box<dyn AttributeSink>,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("target_crs", &self.target_crs)
            .field("features", &self.store.features().len())
            .field("markers", &self.store.markers().len())
            .field("primitives", &self.scene.primitive_count())
            .field("pick_mode", &self.pick_mode)
            .finish()
    }
}

impl Default for MapSession {
    fn default() -> Self {
        Self {
            store: FeatureStore::new(),
            transform: CrsTransformService::new(),
            scene: Scene::new(),
            highlights: HighlightEngine::new(),
            style: SceneStyle::default(),
            target_crs: Crs::WGS84,
            pick_mode: PickMode::default(),
            export: ExportOptions::default(),
            sink: Box::new(DummySink),
        }
    }
}

impl MapSession {
    /// Creates a session. Fails if the target CRS of the config is not supported.
    pub fn new(config: SessionConfig) -> Result<Self, MeridianError> {
        let target_crs = Crs::parse(&config.target_crs)?;
        Ok(Self {
            style: config.style,
            target_crs,
            export: config.export,
            ..Default::default()
        })
    }

    /// Sets the receiver of picked and queried attribute records.
    pub fn with_sink(mut self, sink: impl AttributeSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replaces the dataset and rebuilds the scene.
    ///
    /// An unknown `source_crs` falls back to `EPSG:4326`. If the attribute records have different fields, the
    /// previous dataset stays loaded and an error is returned.
    pub fn load_dataset(
        &mut self,
        features: Vec<Feature>,
        source_crs: &str,
    ) -> Result<RebuildReport, MeridianError> {
        let crs = resolve_crs_or_default(source_crs);
        self.install_dataset(features, crs)
    }

    /// Same as [`MapSession::load_dataset`], but the source CRS is given as the WKT text of a `.prj` file.
    pub fn load_dataset_with_prj(
        &mut self,
        features: Vec<Feature>,
        prj: &str,
    ) -> Result<RebuildReport, MeridianError> {
        let crs = resolve_prj_or_default(prj);
        self.install_dataset(features, crs)
    }

    fn install_dataset(
        &mut self,
        features: Vec<Feature>,
        crs: Crs,
    ) -> Result<RebuildReport, MeridianError> {
        let mut transform = CrsTransformService::new();
        transform.set_projection_crs(&crs, &self.target_crs)?;

        self.store.load(features, crs)?;
        self.transform = transform;
        self.rebuild()
    }

    /// Replaces the markers and rebuilds the marker layer.
    ///
    /// Marker coordinates are in `crs`, or in the dataset CRS if it is `None`. Unknown identifiers fall back to
    /// `EPSG:4326`. If the markers cannot be shown in the current projection, the previous markers stay loaded.
    pub fn load_markers(
        &mut self,
        points: Vec<(f64, f64)>,
        crs: Option<&str>,
    ) -> Result<RebuildReport, MeridianError> {
        let crs = match crs {
            Some(identifier) => resolve_crs_or_default(identifier),
            None => self.store.source_crs().clone(),
        };

        self.ensure_projection()?;
        let previous_markers = self.store.markers().to_vec();
        let previous_crs = self.store.marker_crs().clone();
        self.store.load_markers(
            points.into_iter().map(|(x, y)| Point2d::new(x, y)).collect(),
            crs,
        );

        self.rebuild_markers().inspect_err(|_| {
            self.store.load_markers(previous_markers, previous_crs);
        })
    }

    /// Shows the scene in another CRS.
    ///
    /// If the CRS is unknown or the transformation cannot be created, the session keeps the previous projection and
    /// scene.
    pub fn change_projection(&mut self, target_crs: &str) -> Result<RebuildReport, MeridianError> {
        let target = Crs::parse(target_crs)?;
        let mut transform = CrsTransformService::new();
        transform.set_projection_crs(self.store.source_crs(), &target)?;

        let report = self.scene.rebuild_all(&self.store, &transform, &self.style)?;
        self.highlights.forget();
        self.transform = transform;
        self.target_crs = target;
        log::info!("Scene reprojected into {}", self.target_crs);

        Ok(report)
    }

    /// Sets the marker scale (`1.0` is the nominal marker size) and rebuilds the marker layer.
    pub fn set_marker_scale(&mut self, scale: f64) -> Result<RebuildReport, MeridianError> {
        self.style.marker_scale = scale;
        self.ensure_projection()?;
        self.rebuild_markers()
    }

    /// Replaces the scene style and rebuilds the scene.
    pub fn set_style(&mut self, style: SceneStyle) -> Result<RebuildReport, MeridianError> {
        self.style = style;
        self.ensure_projection()?;
        self.rebuild()
    }

    /// Switches the pick mode. The current selection is cleared.
    pub fn set_pick_mode(&mut self, mode: PickMode) {
        self.highlights.clear_highlights(&mut self.scene);
        self.pick_mode = mode;
    }

    /// Picks the top-most polygon at the point given in the scene CRS. Does nothing unless the session is in
    /// [`PickMode::Point`].
    pub fn pick_point(&mut self, x: f64, y: f64) -> Option<PrimitiveId> {
        if self.pick_mode != PickMode::Point {
            log::debug!("Point pick ignored in {:?} mode", self.pick_mode);
            return None;
        }

        self.highlights.pick_point(
            &mut self.scene,
            &Point2d::new(x, y),
            &self.style,
            self.sink.as_ref(),
        )
    }

    /// Selects every primitive touching the rectangle given by two corners in the scene CRS. Does nothing unless
    /// the session is in [`PickMode::Region`].
    pub fn pick_region(&mut self, corner_a: (f64, f64), corner_b: (f64, f64)) -> Vec<PrimitiveId> {
        if self.pick_mode != PickMode::Region {
            log::debug!("Region pick ignored in {:?} mode", self.pick_mode);
            return vec![];
        }

        self.highlights.pick_region(
            &mut self.scene,
            Point2d::new(corner_a.0, corner_a.1),
            Point2d::new(corner_b.0, corner_b.1),
            &self.style,
            self.sink.as_ref(),
        )
    }

    /// Restores the style of all highlighted primitives.
    pub fn clear_highlights(&mut self) {
        self.highlights.clear_highlights(&mut self.scene);
    }

    /// Highlights fill polygons whose `field` equals `value`. See [`query::query`].
    pub fn query(&mut self, field: &str, value: &str) -> Vec<PrimitiveId> {
        query::query(
            &mut self.scene,
            &mut self.highlights,
            field,
            value,
            &self.style,
            self.sink.as_ref(),
        )
    }

    /// Sends the attribute records of all features to the sink and returns them.
    pub fn attribute_table(&self) -> Vec<Arc<Attributes>> {
        query::attribute_table(&self.store, self.sink.as_ref())
    }

    /// Removes the highlighted markers from the session. Returns the number of removed markers.
    pub fn delete_selected_markers(&mut self) -> Result<usize, MeridianError> {
        let indices: Vec<usize> = self
            .highlights
            .highlighted()
            .iter()
            .filter(|id| id.layer == LayerKind::Markers)
            .filter_map(|id| self.scene.primitive(*id))
            .filter_map(|primitive| primitive.source_index())
            .collect();
        if indices.is_empty() {
            return Ok(0);
        }

        self.highlights.clear_highlights(&mut self.scene);
        let removed = self.store.remove_markers(&indices);
        log::info!("Removed {removed} markers");
        self.rebuild_markers()?;

        Ok(removed)
    }

    /// Removes the dataset and the markers, and empties the scene.
    pub fn clear_dataset(&mut self) {
        self.store.clear();
        self.scene.clear_all();
        self.highlights.forget();
        self.sink.show_attributes(None);
        self.sink.show_table(&[]);
        log::info!("Dataset cleared");
    }

    /// Renders the scene with the session export options.
    pub fn render(&self) -> Result<RgbaImage, MeridianError> {
        export::render(&self.scene, &self.export)
    }

    /// Renders and encodes the scene with the session export options.
    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>, MeridianError> {
        export::encode(&self.scene, &self.export, format)
    }

    /// Renders the scene into a file. The format is taken from the file extension; unknown extensions produce PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MeridianError> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path).unwrap_or(ExportFormat::Png);
        export::save(&self.scene, path, &self.export, format)
    }

    /// Sets options used for rendering and export.
    pub fn set_export_options(&mut self, options: ExportOptions) {
        self.export = options;
    }

    /// Composed scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Dataset and markers.
    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// Active coordinate transformation.
    pub fn transform(&self) -> &CrsTransformService {
        &self.transform
    }

    /// Highlighted primitives.
    pub fn highlighted(&self) -> &[PrimitiveId] {
        self.highlights.highlighted()
    }

    /// Scene style.
    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    /// CRS the scene is shown in.
    pub fn target_crs(&self) -> &Crs {
        &self.target_crs
    }

    /// Current pick mode.
    pub fn pick_mode(&self) -> PickMode {
        self.pick_mode
    }

    fn ensure_projection(&mut self) -> Result<(), MeridianError> {
        if !self.transform.is_set() {
            self.transform
                .set_projection_crs(self.store.source_crs(), &self.target_crs)?;
        }

        Ok(())
    }

    fn rebuild(&mut self) -> Result<RebuildReport, MeridianError> {
        let report = self
            .scene
            .rebuild_all(&self.store, &self.transform, &self.style)?;
        self.highlights.forget();
        log_report(&report);
        Ok(report)
    }

    fn rebuild_markers(&mut self) -> Result<RebuildReport, MeridianError> {
        let report = self
            .scene
            .rebuild_markers_only(&self.store, &self.transform, &self.style)?;
        self.highlights.forget_layer(LayerKind::Markers);
        log_report(&report);
        Ok(report)
    }
}

fn log_report(report: &RebuildReport) {
    if !report.transform.is_clean() || report.skipped_primitives > 0 {
        log::warn!(
            "Scene rebuilt with losses: {:?}, {} primitives skipped",
            report.transform,
            report.skipped_primitives
        );
    } else {
        log::debug!("Scene rebuilt: {report:?}");
    }
}
