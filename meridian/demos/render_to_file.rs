//! This example shows how to draw a GeoJSON file into an image without any UI.
//!
//! Run it with the path to a `.geojson` file, optionally followed by the target CRS and the output file name:
//!
//! ```shell
//! cargo run --example render_to_file --features geojson -- countries.geojson "EPSG:3035" europe.png
//! ```
//!
//! Polygons and lines of the file are drawn as the dataset, points are drawn as markers.

use anyhow::{anyhow, Result};
use meridian::ingest::parse_geojson;
use meridian::{ExportOptions, MapSession, SessionConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let file_name = args.next().ok_or_else(|| {
        anyhow!("This example must be run with the name of the .geojson file to load")
    })?;
    let target_crs = args.next().unwrap_or_else(|| "EPSG:4326".to_string());
    let output = args.next().unwrap_or_else(|| "output_map.png".to_string());

    let dataset = parse_geojson(&std::fs::read_to_string(file_name)?)?;

    // GeoJSON data is always in WGS84.
    let config = SessionConfig::default()
        .with_target_crs(target_crs)
        .with_export(ExportOptions::default().with_size(1024, 1024));
    let mut session = MapSession::new(config)?;

    let report = session.load_dataset(dataset.features.clone(), "EPSG:4326")?;
    log::info!("Dataset drawn: {report:?}");

    if !dataset.markers.is_empty() {
        session.load_markers(dataset.marker_pairs(), None)?;
    }

    session.save(&output)?;
    log::info!("Map is saved to {output}");

    Ok(())
}
