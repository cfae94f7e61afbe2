use std::collections::BTreeMap;

use foundation::geo::{GeoBounds, GeoQuad};
use serde_json::Value;

use crate::render::{LayerSpec, RenderSurface, SourceSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub spec: LayerSpec,
    pub filter: Option<Value>,
    pub zoom_range: Option<(f64, f64)>,
}

/// In-memory render surface for tests and headless reconciliation checks.
///
/// Mirrors the live renderer's contract: mutations on missing targets are
/// no-ops, and a source cannot be removed while sub-layers still reference
/// it.
#[derive(Debug, Default)]
pub struct MemorySurface {
    sources: BTreeMap<String, SourceSpec>,
    layers: BTreeMap<String, LayerState>,
    /// Insertion order of live layers, for draw-order assertions.
    layer_order: Vec<String>,
    pub fit_bounds_calls: Vec<GeoBounds>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerState> {
        self.layers.get(id)
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layer_order.iter().map(String::as_str).collect()
    }

    pub fn paint(&self, layer: &str, property: &str) -> Option<&Value> {
        self.layers.get(layer)?.spec.paint.get(property)
    }

    pub fn layout(&self, layer: &str, property: &str) -> Option<&Value> {
        self.layers.get(layer)?.spec.layout.get(property)
    }

    pub fn filter(&self, layer: &str) -> Option<&Value> {
        self.layers.get(layer)?.filter.as_ref()
    }

    fn layers_attached_to(&self, source: &str) -> bool {
        self.layers.values().any(|l| l.spec.source == source)
    }
}

impl RenderSurface for MemorySurface {
    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, spec: SourceSpec) {
        self.sources.insert(id.to_string(), spec);
    }

    fn remove_source(&mut self, id: &str) -> bool {
        if self.layers_attached_to(id) {
            return false;
        }
        self.sources.remove(id).is_some()
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    fn add_layer(&mut self, spec: LayerSpec) {
        // A layer without a live source never renders; mirror the renderer
        // by refusing it.
        if !self.sources.contains_key(&spec.source) {
            return;
        }
        if !self.layers.contains_key(&spec.id) {
            self.layer_order.push(spec.id.clone());
        }
        self.layers.insert(
            spec.id.clone(),
            LayerState {
                spec,
                filter: None,
                zoom_range: None,
            },
        );
    }

    fn remove_layer(&mut self, id: &str) -> bool {
        let removed = self.layers.remove(id).is_some();
        if removed {
            self.layer_order.retain(|existing| existing != id);
        }
        removed
    }

    fn set_paint(&mut self, layer: &str, property: &str, value: Value) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.spec.paint.insert(property.to_string(), value);
        }
    }

    fn set_layout(&mut self, layer: &str, property: &str, value: Value) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.spec.layout.insert(property.to_string(), value);
        }
    }

    fn set_filter(&mut self, layer: &str, filter: Option<Value>) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.filter = filter;
        }
    }

    fn set_zoom_range(&mut self, layer: &str, min: f64, max: f64) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.zoom_range = Some((min, max));
        }
    }

    fn source_tiles(&self, source: &str) -> Option<Vec<String>> {
        match self.sources.get(source)? {
            SourceSpec::VectorTiles { tiles } | SourceSpec::RasterTiles { tiles, .. } => {
                Some(tiles.clone())
            }
            _ => None,
        }
    }

    fn set_source_tiles(&mut self, source: &str, new_tiles: Vec<String>) {
        match self.sources.get_mut(source) {
            Some(SourceSpec::VectorTiles { tiles })
            | Some(SourceSpec::RasterTiles { tiles, .. }) => *tiles = new_tiles,
            _ => {}
        }
    }

    fn update_image(&mut self, source: &str, url: &str, coordinates: GeoQuad) {
        if let Some(SourceSpec::Image {
            url: existing_url,
            coordinates: existing_coords,
        }) = self.sources.get_mut(source)
        {
            *existing_url = url.to_string();
            *existing_coords = coordinates;
        }
    }

    fn set_video_coordinates(&mut self, source: &str, new_coordinates: GeoQuad) {
        if let Some(SourceSpec::Video { coordinates, .. }) = self.sources.get_mut(source) {
            *coordinates = new_coordinates;
        }
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.fit_bounds_calls.push(bounds);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{MemorySurface, RenderSurface};
    use crate::render::{LayerSpec, SourceSpec, SurfaceLayerKind};

    fn surface_with_layer() -> MemorySurface {
        let mut surface = MemorySurface::new();
        surface.add_source(
            "VectorTile_1",
            SourceSpec::VectorTiles {
                tiles: vec!["https://example.test/{z}/{x}/{y}".to_string()],
            },
        );
        surface.add_layer(LayerSpec::new(
            "Layer_1_fill",
            "VectorTile_1",
            SurfaceLayerKind::Fill,
        ));
        surface
    }

    #[test]
    fn source_removal_rejected_while_layers_attached() {
        let mut surface = surface_with_layer();
        assert!(!surface.remove_source("VectorTile_1"));
        assert!(surface.has_source("VectorTile_1"));

        assert!(surface.remove_layer("Layer_1_fill"));
        assert!(surface.remove_source("VectorTile_1"));
    }

    #[test]
    fn mutations_on_missing_targets_are_noops() {
        let mut surface = MemorySurface::new();
        surface.set_paint("nope", "fill-color", json!("#fff"));
        surface.set_filter("nope", None);
        assert!(!surface.remove_layer("nope"));
        assert!(!surface.remove_source("nope"));
    }

    #[test]
    fn layer_without_source_is_refused() {
        let mut surface = MemorySurface::new();
        surface.add_layer(LayerSpec::new(
            "Layer_1_fill",
            "VectorTile_1",
            SurfaceLayerKind::Fill,
        ));
        assert!(!surface.has_layer("Layer_1_fill"));
    }

    #[test]
    fn tile_urls_are_replaceable() {
        let mut surface = surface_with_layer();
        surface.set_source_tiles("VectorTile_1", vec!["https://other.test/{z}".to_string()]);
        assert_eq!(
            surface.source_tiles("VectorTile_1"),
            Some(vec!["https://other.test/{z}".to_string()])
        );
    }
}
