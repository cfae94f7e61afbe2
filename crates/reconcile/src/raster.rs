use std::collections::BTreeSet;

use catalog::layer::{MapLayer, RasterMapLayer};
use catalog::raster::{BandLimit, BandStyle, RasterBandStyle};
use foundation::ids::LayerId;
use serde_json::{Value, json};
use store::AppState;
use surface::{LayerSpec, RenderSurface, SourceSpec, SurfaceLayerKind};

use crate::names;
use crate::service::{ApiEndpoints, LayerService, ServiceError};

const TILE_SIZE: u32 = 256;
const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 22.0;

/// Reconciles raster tile layers: one tile source and one raster layer per
/// map layer. Band styling rides inside the tile URL, so style edits become
/// tile URL swaps.
#[derive(Debug, Default)]
pub struct RasterReconciler {
    previously_added: BTreeSet<LayerId>,
}

impl RasterReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(
        &mut self,
        state: &AppState,
        surface: &mut dyn RenderSurface,
        api: &ApiEndpoints,
    ) {
        let wanted: Vec<&RasterMapLayer> = state
            .selected_layers
            .iter()
            .filter_map(|layer| match layer {
                MapLayer::Raster(raster) if state.is_visible(layer.key()) => Some(raster),
                _ => None,
            })
            .collect();
        let wanted_ids: BTreeSet<LayerId> = wanted.iter().map(|layer| layer.id).collect();

        for stale in self.previously_added.difference(&wanted_ids) {
            surface.remove_layer(&names::raster_layer(*stale));
            if !surface.remove_source(&names::raster_source(*stale)) {
                tracing::debug!(layer = %stale, "raster source removal skipped");
            }
        }

        for layer in &wanted {
            let source = names::raster_source(layer.id);
            if surface.has_source(&source) {
                continue;
            }
            surface.add_source(
                &source,
                SourceSpec::RasterTiles {
                    tiles: vec![tile_url(api, layer)],
                    tile_size: TILE_SIZE,
                },
            );
            let name = names::raster_layer(layer.id);
            surface.add_layer(
                LayerSpec::new(&name, &source, SurfaceLayerKind::Raster)
                    .paint("raster-opacity", json!(1.0)),
            );
            surface.set_zoom_range(&name, MIN_ZOOM, MAX_ZOOM);
        }

        for layer in &wanted {
            self.update_layer(surface, api, layer);
        }

        self.previously_added = wanted_ids;
    }

    /// Re-applies opacity and band styling for one layer.
    pub fn update_layer(
        &self,
        surface: &mut dyn RenderSurface,
        api: &ApiEndpoints,
        layer: &RasterMapLayer,
    ) {
        let name = names::raster_layer(layer.id);
        if !surface.has_layer(&name) {
            return;
        }
        let opacity = layer
            .default_style
            .opacity
            .map(|value| json!(value))
            .unwrap_or(Value::Null);
        surface.set_paint(&name, "raster-opacity", opacity);
        if let Some(zoom) = &layer.default_style.zoom {
            surface.set_zoom_range(
                &name,
                zoom.min.unwrap_or(MIN_ZOOM),
                zoom.max.unwrap_or(MAX_ZOOM),
            );
        }
        self.update_band_styling(surface, api, layer);
    }

    /// Regenerates the tile URL from the current band styling and swaps the
    /// source tiles only when the URL actually changed. A tile swap drops the
    /// tile cache, so redundant swaps flicker.
    fn update_band_styling(
        &self,
        surface: &mut dyn RenderSurface,
        api: &ApiEndpoints,
        layer: &RasterMapLayer,
    ) {
        let source = names::raster_source(layer.id);
        let url = tile_url(api, layer);
        if surface.source_tiles(&source) != Some(vec![url.clone()]) {
            surface.set_source_tiles(&source, vec![url]);
        }
    }
}

fn tile_url(api: &ApiEndpoints, layer: &RasterMapLayer) -> String {
    let style = layer
        .default_style
        .large_image_style
        .clone()
        .unwrap_or_default();
    api.raster_tile_template(layer.id, &style)
}

/// Derives full-range band styling from backend metadata: every band enabled
/// over its native min/max, with a palette matching its color interpretation.
///
/// Replaces the layer's band styling in place; the caller follows up with an
/// update pass so the new tile URL takes effect.
pub fn auto_min_max(
    layer: &mut RasterMapLayer,
    service: &dyn LayerService,
) -> Result<(), ServiceError> {
    let metadata = service.raster_metadata(layer.id)?;
    let bands = metadata
        .bands
        .iter()
        .map(|(band, meta)| BandStyle {
            band: band.clone(),
            enabled: true,
            min: BandLimit::Min,
            max: BandLimit::Max,
            clamp: false,
            palette: interpretation_palette(&meta.interpretation),
        })
        .collect();
    layer.default_style.large_image_style = Some(RasterBandStyle { bands });
    Ok(())
}

fn interpretation_palette(interpretation: &str) -> Option<String> {
    match interpretation {
        "blue" => Some("#0000FF".to_string()),
        "red" => Some("#FF0000".to_string()),
        "green" => Some("#00FF00".to_string()),
        _ => None,
    }
}
