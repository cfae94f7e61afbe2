use std::collections::BTreeMap;

use foundation::geo::{GeoBounds, GeoQuad};
use serde_json::Value;

/// Data source backing one or more sub-layers.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    VectorTiles {
        tiles: Vec<String>,
    },
    RasterTiles {
        tiles: Vec<String>,
        tile_size: u32,
    },
    /// Single georeferenced image placed on a quad.
    Image {
        url: String,
        coordinates: GeoQuad,
    },
    /// Video placed on a quad that may move per frame.
    Video {
        urls: Vec<String>,
        coordinates: GeoQuad,
    },
}

/// Rendered sub-layer kind, matching the surface's layer type strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceLayerKind {
    Fill,
    FillExtrusion,
    Line,
    Circle,
    Symbol,
    Heatmap,
    Raster,
}

impl SurfaceLayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceLayerKind::Fill => "fill",
            SurfaceLayerKind::FillExtrusion => "fill-extrusion",
            SurfaceLayerKind::Line => "line",
            SurfaceLayerKind::Circle => "circle",
            SurfaceLayerKind::Symbol => "symbol",
            SurfaceLayerKind::Heatmap => "heatmap",
            SurfaceLayerKind::Raster => "raster",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: SurfaceLayerKind,
    /// Named layer within a vector tile source.
    pub source_layer: Option<String>,
    pub paint: BTreeMap<String, Value>,
    pub layout: BTreeMap<String, Value>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, source: impl Into<String>, kind: SurfaceLayerKind) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
            source_layer: None,
            paint: BTreeMap::new(),
            layout: BTreeMap::new(),
        }
    }

    pub fn source_layer(mut self, name: impl Into<String>) -> Self {
        self.source_layer = Some(name.into());
        self
    }

    pub fn paint(mut self, property: impl Into<String>, value: Value) -> Self {
        self.paint.insert(property.into(), value);
        self
    }

    pub fn layout(mut self, property: impl Into<String>, value: Value) -> Self {
        self.layout.insert(property.into(), value);
        self
    }
}

/// The reconcilers' seam to the map renderer.
///
/// Mutations targeting missing sources or layers are tolerated no-ops; the
/// `remove_*` methods report whether anything happened. Removing a source
/// that still has attached layers must fail (return `false`) rather than
/// cascade, so callers are forced to remove sub-layers first.
pub trait RenderSurface {
    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, spec: SourceSpec);
    fn remove_source(&mut self, id: &str) -> bool;

    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, spec: LayerSpec);
    fn remove_layer(&mut self, id: &str) -> bool;

    fn set_paint(&mut self, layer: &str, property: &str, value: Value);
    fn set_layout(&mut self, layer: &str, property: &str, value: Value);
    /// `None` detaches any applied filter.
    fn set_filter(&mut self, layer: &str, filter: Option<Value>);
    fn set_zoom_range(&mut self, layer: &str, min: f64, max: f64);

    fn source_tiles(&self, source: &str) -> Option<Vec<String>>;
    fn set_source_tiles(&mut self, source: &str, tiles: Vec<String>);
    /// Swaps the image of an image source in place, without re-adding it.
    fn update_image(&mut self, source: &str, url: &str, coordinates: GeoQuad);
    fn set_video_coordinates(&mut self, source: &str, coordinates: GeoQuad);

    fn fit_bounds(&mut self, bounds: GeoBounds);
}
