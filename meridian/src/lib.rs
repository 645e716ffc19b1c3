//! Meridian composes vector geographic data into a layered scene, reprojects it between coordinate reference systems,
//! resolves picks and attribute queries into highlights, and exports the scene as an image.
//!
//! # Quick start
//!
//! ```no_run
//! use meridian::{Attributes, ExportFormat, Feature, MapSession, SessionConfig};
//! use meridian::meridian_types::{Point2d, Polygon};
//!
//! let square = Polygon::new(
//!     vec![
//!         Point2d::new(0.0, 40.0),
//!         Point2d::new(10.0, 40.0),
//!         Point2d::new(10.0, 50.0),
//!         Point2d::new(0.0, 50.0),
//!     ],
//!     vec![],
//! );
//!
//! let mut session = MapSession::new(SessionConfig::default().with_target_crs("EPSG:3035")).unwrap();
//! session
//!     .load_dataset(vec![Feature::new(square, Attributes::new().with("name", "Square"))], "EPSG:4326")
//!     .unwrap();
//! session.save("square.png").unwrap();
//! ```
//!
//! # Main components
//!
//! * [`FeatureStore`](store::FeatureStore) owns the dataset features and markers exactly as they were ingested.
//! * [`CrsTransformService`](transform::CrsTransformService) converts them into the CRS the scene is shown in. The
//!   converted coordinates are never cached: every rebuild transforms the store again.
//! * [`Scene`](scene::Scene) is an ordered set of [`layers`](scene::LayerKind) of renderable primitives. It is
//!   rebuilt when the data, the projection or the style change.
//! * [`HighlightEngine`](selection::HighlightEngine) and [`query`] turn picks and attribute filters into highlighted
//!   primitives and report the matching records to an [`AttributeSink`].
//! * [`export`] renders the scene into PNG, JPEG or SVG.
//!
//! [`MapSession`] owns all of the above for one map view and is the usual entry point for a host application.

pub mod attributes;
mod color;
pub mod error;
pub mod export;
pub mod feature;
mod messenger;
pub mod query;
pub mod scene;
pub mod selection;
pub mod session;
pub mod store;
pub mod transform;

#[cfg(feature = "geojson")]
pub mod ingest;

pub use attributes::{AttributeValue, Attributes};
pub use color::Color;
pub use error::MeridianError;
pub use export::{ExportFormat, ExportOptions};
pub use feature::Feature;
pub use messenger::{AttributeSink, DummySink};
pub use scene::{Scene, SceneStyle};
pub use selection::PickMode;
pub use session::{MapSession, SessionConfig};

// Reexport meridian_types
pub use meridian_types;
