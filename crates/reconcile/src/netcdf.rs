use std::collections::BTreeSet;

use catalog::netcdf::Resampling;
use foundation::ids::{LayerId, LayerKey, LayerKind};
use serde_json::json;
use store::AppState;
use surface::{LayerSpec, RenderSurface, SourceSpec, SurfaceLayerKind};

use crate::names;
use crate::service::LayerService;

/// Reconciles NetCDF layers: one georeferenced image source per layer whose
/// image is swapped in place as the frame index moves.
///
/// Unlike the tile reconcilers this one keeps no private memory; the store's
/// `netcdf_working` map is the record of what has been materialized, so frame
/// data survives reconciler restarts and is fetched once per selection.
#[derive(Debug, Default)]
pub struct NetCdfReconciler;

impl NetCdfReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn toggle(
        &mut self,
        state: &mut AppState,
        surface: &mut dyn RenderSurface,
        service: &dyn LayerService,
    ) {
        let wanted: Vec<(LayerId, String)> = state
            .selected_of_kind(LayerKind::NetCdf)
            .iter()
            .filter(|layer| state.is_visible(layer.key()))
            .map(|layer| (layer.id(), layer.name().to_string()))
            .collect();
        let wanted_ids: BTreeSet<LayerId> = wanted.iter().map(|(id, _)| *id).collect();

        let stale: Vec<LayerId> = state
            .netcdf_working
            .keys()
            .filter(|id| !wanted_ids.contains(id))
            .copied()
            .collect();
        for id in stale {
            surface.remove_layer(&names::netcdf_layer(id));
            if !surface.remove_source(&names::netcdf_source(id)) {
                tracing::debug!(layer = %id, "netcdf source removal skipped");
            }
            state.remove_netcdf_working(id);
        }

        for (id, name) in wanted {
            if !state.netcdf_working.contains_key(&id) {
                let key = LayerKey::new(LayerKind::NetCdf, id);
                let epoch = state.begin_layer_fetch(key);
                let frames = match service.netcdf_frames(id) {
                    Ok(frames) => frames,
                    Err(err) => {
                        tracing::warn!(layer = %id, %err, "netcdf frame fetch failed");
                        continue;
                    }
                };
                if !state.fetch_is_current(key, epoch) {
                    tracing::debug!(layer = %id, "stale netcdf fetch dropped");
                    continue;
                }
                state.insert_netcdf_frames(id, frames, name);
            }
            self.materialize(state, surface, id);
        }
    }

    /// Adds the image source and raster layer for cached frame data, if not
    /// already present.
    fn materialize(&self, state: &AppState, surface: &mut dyn RenderSurface, id: LayerId) {
        let Some(working) = state.netcdf_working.get(&id) else {
            return;
        };
        let source = names::netcdf_source(id);
        if surface.has_source(&source) {
            return;
        }
        let quad = match working.frames.quad() {
            Ok(quad) => quad,
            Err(err) => {
                tracing::warn!(layer = %id, %err, "netcdf layer not rendered");
                return;
            }
        };
        let Some(url) = working.frames.image_at(working.current_index) else {
            tracing::warn!(layer = %id, "netcdf layer has no frame images");
            return;
        };
        surface.add_source(
            &source,
            SourceSpec::Image {
                url: url.to_string(),
                coordinates: quad,
            },
        );
        surface.add_layer(
            LayerSpec::new(names::netcdf_layer(id), &source, SurfaceLayerKind::Raster)
                .paint("raster-opacity", json!(working.opacity))
                .paint("raster-fade-duration", json!(0)),
        );
    }

    /// Advances playback to `index` by swapping the source image in place.
    /// An out-of-range index is logged and ignored.
    pub fn set_frame(
        &self,
        state: &mut AppState,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        index: usize,
    ) {
        let Some(working) = state.netcdf_working.get_mut(&id) else {
            return;
        };
        let Some(url) = working.frames.image_at(index).map(str::to_string) else {
            tracing::warn!(
                layer = %id,
                index,
                frames = working.frames.frame_count(),
                "netcdf frame index out of range"
            );
            return;
        };
        let quad = match working.frames.quad() {
            Ok(quad) => quad,
            Err(err) => {
                tracing::warn!(layer = %id, %err, "netcdf frame swap skipped");
                return;
            }
        };
        working.current_index = index;
        surface.update_image(&names::netcdf_source(id), &url, quad);
    }

    pub fn set_opacity(
        &self,
        state: &mut AppState,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        opacity: f64,
    ) {
        if let Some(working) = state.netcdf_working.get_mut(&id) {
            working.opacity = opacity;
            surface.set_paint(&names::netcdf_layer(id), "raster-opacity", json!(opacity));
        }
    }

    pub fn set_resampling(
        &self,
        state: &mut AppState,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        resampling: Resampling,
    ) {
        if let Some(working) = state.netcdf_working.get_mut(&id) {
            working.resampling = resampling;
            surface.set_paint(
                &names::netcdf_layer(id),
                "raster-resampling",
                json!(resampling.as_str()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog::layer::{MapLayer, NetCdfMapLayer};
    use catalog::netcdf::NetCdfFrames;
    use foundation::ids::LayerId;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use store::AppState;
    use surface::{MemorySurface, RenderSurface, SourceSpec};

    use crate::service::testing::StubService;

    use super::NetCdfReconciler;

    fn netcdf_layer(id: u64) -> MapLayer {
        MapLayer::NetCdf(NetCdfMapLayer {
            id: LayerId(id),
            name: format!("netcdf {id}"),
            dataset_id: None,
        })
    }

    fn frames() -> NetCdfFrames {
        serde_json::from_value(json!({
            "netCDFLayer": 3,
            "images": ["f0.png", "f1.png", "f2.png", "f3.png", "f4.png", "f5.png"],
            "parent_bounds": [[
                [-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0]
            ]]
        }))
        .unwrap()
    }

    fn stub() -> StubService {
        let mut service = StubService::default();
        service.netcdf.insert(LayerId(3), frames());
        service
    }

    #[test]
    fn frames_fetch_once_per_selection() {
        let mut state = AppState::new();
        state.toggle_layer_selection(netcdf_layer(3));
        let mut surface = MemorySurface::new();
        let mut reconciler = NetCdfReconciler::new();
        let service = stub();

        reconciler.toggle(&mut state, &mut surface, &service);
        reconciler.toggle(&mut state, &mut surface, &service);
        assert_eq!(service.calls.borrow().len(), 1);
        assert!(surface.has_source("NetCDFSource_3"));
        assert!(surface.has_layer("NetCDFLayer_3"));
    }

    #[test]
    fn fetch_failure_leaves_layer_unrendered() {
        let mut state = AppState::new();
        state.toggle_layer_selection(netcdf_layer(9));
        let mut surface = MemorySurface::new();
        let mut reconciler = NetCdfReconciler::new();

        reconciler.toggle(&mut state, &mut surface, &stub());
        assert!(!surface.has_source("NetCDFSource_9"));
        assert!(state.netcdf_working.is_empty());
    }

    #[test]
    fn frame_swap_keeps_placement() {
        let mut state = AppState::new();
        state.toggle_layer_selection(netcdf_layer(3));
        let mut surface = MemorySurface::new();
        let mut reconciler = NetCdfReconciler::new();
        reconciler.toggle(&mut state, &mut surface, &stub());

        reconciler.set_frame(&mut state, &mut surface, LayerId(3), 3);
        let Some(SourceSpec::Image { url, coordinates }) = surface.source("NetCDFSource_3") else {
            panic!("expected image source");
        };
        assert_eq!(url, "f3.png");
        let quad_at_3 = *coordinates;

        reconciler.set_frame(&mut state, &mut surface, LayerId(3), 5);
        let Some(SourceSpec::Image { url, coordinates }) = surface.source("NetCDFSource_3") else {
            panic!("expected image source");
        };
        assert_eq!(url, "f5.png");
        assert_eq!(*coordinates, quad_at_3);
        assert_eq!(state.netcdf_working[&LayerId(3)].current_index, 5);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut state = AppState::new();
        state.toggle_layer_selection(netcdf_layer(3));
        let mut surface = MemorySurface::new();
        let mut reconciler = NetCdfReconciler::new();
        reconciler.toggle(&mut state, &mut surface, &stub());

        reconciler.set_frame(&mut state, &mut surface, LayerId(3), 99);
        assert_eq!(state.netcdf_working[&LayerId(3)].current_index, 0);
        let Some(SourceSpec::Image { url, .. }) = surface.source("NetCDFSource_3") else {
            panic!("expected image source");
        };
        assert_eq!(url, "f0.png");
    }

    #[test]
    fn deselection_drops_working_state_and_surface_objects() {
        let mut state = AppState::new();
        state.toggle_layer_selection(netcdf_layer(3));
        let mut surface = MemorySurface::new();
        let mut reconciler = NetCdfReconciler::new();
        reconciler.toggle(&mut state, &mut surface, &stub());

        state.toggle_layer_selection(netcdf_layer(3));
        reconciler.toggle(&mut state, &mut surface, &stub());
        assert!(surface.source_ids().is_empty());
        assert!(state.netcdf_working.is_empty());
    }
}
