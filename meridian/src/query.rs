//! Attribute queries over the fill polygons of the scene.

use std::sync::Arc;

use crate::attributes::Attributes;
use crate::messenger::AttributeSink;
use crate::scene::{HighlightKind, PrimitiveId, PrimitiveKind, Scene, SceneStyle};
use crate::selection::{records_of, HighlightEngine};
use crate::store::FeatureStore;

/// Returns fill polygons whose record has `field` with a [query text](crate::AttributeValue::query_text) exactly
/// equal to `value`, in draw order. Comparison is case-sensitive.
pub fn find_matches(scene: &Scene, field: &str, value: &str) -> Vec<PrimitiveId> {
    scene
        .iter_draw_order()
        .filter(|(_, primitive)| primitive.kind() == PrimitiveKind::FillPolygon)
        .filter(|(_, primitive)| {
            primitive
                .attributes()
                .and_then(|record| record.get(field))
                .is_some_and(|v| v.query_text() == value)
        })
        .map(|(id, _)| id)
        .collect()
}

/// Runs an attribute query and highlights the matches.
///
/// The previous highlight set is always cleared. If something matches, the sink receives the matched records as a
/// table and the first of them as the displayed record. Otherwise the sink is told that nothing matched. An empty
/// result is not an error.
pub fn query(
    scene: &mut Scene,
    highlights: &mut HighlightEngine,
    field: &str,
    value: &str,
    style: &SceneStyle,
    sink: &dyn AttributeSink,
) -> Vec<PrimitiveId> {
    highlights.clear_highlights(scene);

    let matches = find_matches(scene, field, value);
    if matches.is_empty() {
        log::info!("No features with {field} = {value:?}");
        sink.no_match(field, value);
        return matches;
    }

    for id in &matches {
        highlights.highlight(scene, *id, style, HighlightKind::Query);
    }

    let records = records_of(scene, &matches);
    log::info!("{} features with {field} = {value:?}", matches.len());
    sink.show_table(&records);
    sink.show_attributes(records.first().map(|r| r.as_ref()));

    matches
}

/// Attribute records of all features in ingestion order. The table is also sent to the sink.
pub fn attribute_table(store: &FeatureStore, sink: &dyn AttributeSink) -> Vec<Arc<Attributes>> {
    let records: Vec<_> = store
        .features()
        .iter()
        .map(|f| f.attributes().clone())
        .collect();
    sink.show_table(&records);

    records
}
