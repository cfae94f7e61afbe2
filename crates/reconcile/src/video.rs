use std::collections::{BTreeMap, BTreeSet};

use catalog::style::AnnotationType;
use catalog::video::VideoMetadata;
use foundation::ids::{LayerId, LayerKey, LayerKind};
use foundation::time::FrameClock;
use runtime::poller::{FramePoller, PollOutcome};
use serde_json::json;
use store::AppState;
use surface::{LayerSpec, RenderSurface, SourceSpec, SurfaceLayerKind};
use symbology::{Expr, geometry_guard};

use crate::names;
use crate::service::{ApiEndpoints, LayerService};
use crate::vector::{default_circle_radius, default_line_width};

/// Renderable feature classes of a full-motion-video layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FmvProperty {
    FlightPath,
    GroundFrame,
    GroundUnion,
    Video,
}

impl FmvProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            FmvProperty::FlightPath => "flight_path",
            FmvProperty::GroundFrame => "ground_frame",
            FmvProperty::GroundUnion => "ground_union",
            FmvProperty::Video => "video",
        }
    }
}

/// Vector sub-layers a video layer renders. No fill-extrusion or heatmap;
/// the footprint geometry is flat.
const VIDEO_SUB_TYPES: [AnnotationType; 4] = [
    AnnotationType::Circle,
    AnnotationType::Line,
    AnnotationType::Fill,
    AnnotationType::Text,
];

/// Per-layer playback and display state.
#[derive(Debug)]
pub struct VideoState {
    pub metadata: VideoMetadata,
    pub frame_id: u64,
    pub poller: FramePoller,
    pub opacity: f64,
    /// Keep the camera locked to the moving video footprint.
    pub lock_zoom: bool,
    pub zoom_multiplier: f64,
    /// Restrict ground frames to the current playback frame.
    pub filter_frame: bool,
    pub visible_properties: BTreeSet<FmvProperty>,
}

impl VideoState {
    fn new(metadata: VideoMetadata) -> Self {
        let poller = FramePoller::new(FrameClock::new(metadata.fps));
        Self {
            metadata,
            frame_id: 0,
            poller,
            opacity: 0.85,
            lock_zoom: false,
            zoom_multiplier: 2.0,
            filter_frame: true,
            visible_properties: [FmvProperty::FlightPath, FmvProperty::Video].into(),
        }
    }
}

/// Reconciles full-motion-video layers: a vector tile source for flight path
/// and ground footprints, plus a video source whose quad follows playback.
#[derive(Debug, Default)]
pub struct VideoReconciler {
    previously_added: BTreeSet<LayerId>,
    states: BTreeMap<LayerId, VideoState>,
}

impl VideoReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: LayerId) -> Option<&VideoState> {
        self.states.get(&id)
    }

    pub fn toggle(
        &mut self,
        state: &mut AppState,
        surface: &mut dyn RenderSurface,
        service: &dyn LayerService,
        api: &ApiEndpoints,
    ) {
        let wanted_ids: BTreeSet<LayerId> = state
            .selected_of_kind(LayerKind::Video)
            .iter()
            .filter(|layer| state.is_visible(layer.key()))
            .map(|layer| layer.id())
            .collect();

        for stale in self.previously_added.difference(&wanted_ids).copied().collect::<Vec<_>>() {
            // The poller reads the source it is attached to; cancel it before
            // anything is removed.
            if let Some(video_state) = self.states.get_mut(&stale) {
                video_state.poller.cancel();
            }
            for annotation in VIDEO_SUB_TYPES {
                surface.remove_layer(&names::video_sub_layer(stale, annotation));
            }
            surface.remove_layer(&names::video_layer(stale));
            if !surface.remove_source(&names::video_vector_source(stale)) {
                tracing::debug!(layer = %stale, "fmv vector source removal skipped");
            }
            if !surface.remove_source(&names::video_source(stale)) {
                tracing::debug!(layer = %stale, "fmv video source removal skipped");
            }
            self.states.remove(&stale);
        }

        for id in &wanted_ids {
            if !self.states.contains_key(id) {
                let key = LayerKey::new(LayerKind::Video, *id);
                let epoch = state.begin_layer_fetch(key);
                let metadata = match service.video_metadata(*id) {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        tracing::warn!(layer = %id, %err, "fmv metadata fetch failed");
                        continue;
                    }
                };
                if !state.fetch_is_current(key, epoch) {
                    tracing::debug!(layer = %id, "stale fmv fetch dropped");
                    continue;
                }
                self.states.insert(*id, VideoState::new(metadata));
            }
            self.materialize(surface, api, *id);
            self.apply_frame_filter(surface, *id);
            self.apply_video_layer(surface, *id);
        }

        self.previously_added = wanted_ids;
    }

    fn materialize(&self, surface: &mut dyn RenderSurface, api: &ApiEndpoints, id: LayerId) {
        let Some(video_state) = self.states.get(&id) else {
            return;
        };
        let vector_source = names::video_vector_source(id);
        if !surface.has_source(&vector_source) {
            surface.add_source(
                &vector_source,
                SourceSpec::VectorTiles {
                    tiles: vec![api.video_tile_template(id)],
                },
            );
            surface.add_layer(
                LayerSpec::new(
                    names::video_sub_layer(id, AnnotationType::Circle),
                    &vector_source,
                    SurfaceLayerKind::Circle,
                )
                .source_layer("default")
                .paint("circle-color", json!("black"))
                .paint("circle-radius", default_circle_radius())
                .paint("circle-opacity", json!(0.5))
                .paint("circle-stroke-width", json!(1))
                .paint("circle-stroke-color", json!("black")),
            );
            surface.add_layer(
                LayerSpec::new(
                    names::video_sub_layer(id, AnnotationType::Line),
                    &vector_source,
                    SurfaceLayerKind::Line,
                )
                .source_layer("default")
                .layout("line-join", json!("round"))
                .layout("line-cap", json!("round"))
                .paint("line-color", json!("black"))
                .paint("line-width", default_line_width()),
            );
            surface.add_layer(
                LayerSpec::new(
                    names::video_sub_layer(id, AnnotationType::Fill),
                    &vector_source,
                    SurfaceLayerKind::Fill,
                )
                .source_layer("default")
                .paint("fill-color", json!("blue"))
                .paint("fill-opacity", json!(0.8)),
            );
            surface.add_layer(
                LayerSpec::new(
                    names::video_sub_layer(id, AnnotationType::Text),
                    &vector_source,
                    SurfaceLayerKind::Symbol,
                )
                .source_layer("default")
                .layout("text-anchor", json!("center"))
                .layout("text-font", json!(["Roboto Regular"]))
                .layout("text-max-width", json!(5))
                .layout("text-size", json!(12))
                .layout("text-allow-overlap", json!(true))
                .paint("text-color", json!("black")),
            );
        }

        let video_source = names::video_source(id);
        if !surface.has_source(&video_source) {
            let Some(quad) = video_state.metadata.bounds_at_frame(0) else {
                tracing::warn!(layer = %id, "fmv layer has no frame bounds, video not rendered");
                return;
            };
            surface.add_source(
                &video_source,
                SourceSpec::Video {
                    urls: vec![video_state.metadata.video_url.clone()],
                    coordinates: quad,
                },
            );
            surface.add_layer(
                LayerSpec::new(names::video_layer(id), &video_source, SurfaceLayerKind::Raster)
                    .paint("raster-opacity", json!(1.0))
                    .paint("raster-fade-duration", json!(0)),
            );
        }
    }

    /// Seeks to `frame`: moves the video quad, optionally re-fits the camera,
    /// and narrows the ground-frame filter. Out-of-range frames are logged
    /// and ignored.
    pub fn set_frame(&mut self, surface: &mut dyn RenderSurface, id: LayerId, frame: u64) {
        let Some(video_state) = self.states.get_mut(&id) else {
            return;
        };
        if !video_state.metadata.contains_frame(frame) {
            tracing::warn!(
                layer = %id,
                frame,
                frames = video_state.metadata.frame_count,
                "fmv frame out of range"
            );
            return;
        }
        video_state.frame_id = frame;
        match video_state.metadata.bounds_at_frame(frame) {
            Some(quad) => {
                let lock_zoom = video_state.lock_zoom;
                let multiplier = video_state.zoom_multiplier;
                surface.set_video_coordinates(&names::video_source(id), quad);
                if lock_zoom {
                    surface.fit_bounds(quad.expanded_bounds(multiplier));
                }
            }
            None => {
                tracing::warn!(layer = %id, frame, "fmv frame has no bounds, quad not moved");
            }
        }
        self.apply_frame_filter(surface, id);
    }

    /// One animation tick for a playing video. Frame changes cascade into a
    /// seek; the poller stops itself on pause or end.
    pub fn tick(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        media_time: f64,
        paused: bool,
        ended: bool,
    ) -> PollOutcome {
        let Some(video_state) = self.states.get_mut(&id) else {
            return PollOutcome::Stopped;
        };
        let current = video_state.frame_id;
        match video_state.poller.tick(media_time, paused, ended) {
            PollOutcome::Frame(frame) => {
                if frame != current {
                    self.set_frame(surface, id, frame);
                }
                PollOutcome::Frame(frame)
            }
            PollOutcome::Stopped => PollOutcome::Stopped,
        }
    }

    pub fn start_playback(&mut self, id: LayerId) {
        if let Some(video_state) = self.states.get_mut(&id) {
            video_state.poller.start();
        }
    }

    pub fn set_lock_zoom(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        lock_zoom: bool,
    ) {
        let Some(video_state) = self.states.get_mut(&id) else {
            return;
        };
        video_state.lock_zoom = lock_zoom;
        if lock_zoom {
            let multiplier = video_state.zoom_multiplier;
            if let Some(quad) = video_state.metadata.bounds_at_frame(video_state.frame_id) {
                surface.fit_bounds(quad.expanded_bounds(multiplier));
            }
        }
    }

    pub fn set_filter_frame(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        filter_frame: bool,
    ) {
        if let Some(video_state) = self.states.get_mut(&id) {
            video_state.filter_frame = filter_frame;
        }
        self.apply_frame_filter(surface, id);
    }

    pub fn set_visible_properties(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        properties: BTreeSet<FmvProperty>,
    ) {
        if let Some(video_state) = self.states.get_mut(&id) {
            video_state.visible_properties = properties;
        }
        self.apply_frame_filter(surface, id);
        self.apply_video_layer(surface, id);
    }

    pub fn set_opacity(&mut self, surface: &mut dyn RenderSurface, id: LayerId, opacity: f64) {
        if let Some(video_state) = self.states.get_mut(&id) {
            video_state.opacity = opacity;
        }
        self.apply_video_layer(surface, id);
    }

    /// Composes and applies the per-frame feature filter across the vector
    /// sub-layers: ground frames narrowed to the current frame (union
    /// footprints always pass), restricted to the visible feature classes.
    fn apply_frame_filter(&self, surface: &mut dyn RenderSurface, id: LayerId) {
        let Some(video_state) = self.states.get(&id) else {
            return;
        };
        let mut base = Vec::new();
        if video_state.filter_frame {
            base.push(Expr::Any(vec![
                Expr::eq(
                    Expr::get("fmvType"),
                    Expr::lit(FmvProperty::GroundUnion.as_str()),
                ),
                Expr::eq(Expr::get("frameId"), Expr::lit(video_state.frame_id)),
            ]));
        }
        base.push(Expr::is_in(
            Expr::get("fmvType"),
            video_state
                .visible_properties
                .iter()
                .map(|property| json!(property.as_str()))
                .collect(),
        ));

        for annotation in VIDEO_SUB_TYPES {
            let name = names::video_sub_layer(id, annotation);
            if !surface.has_layer(&name) {
                continue;
            }
            let mut parts = base.clone();
            if annotation == AnnotationType::Circle {
                if let Some(guard) = geometry_guard(annotation) {
                    parts.push(guard);
                }
            }
            let filter = if parts.len() == 1 {
                parts.remove(0)
            } else {
                Expr::All(parts)
            };
            surface.set_filter(&name, Some(filter.to_json()));
        }
    }

    fn apply_video_layer(&self, surface: &mut dyn RenderSurface, id: LayerId) {
        let Some(video_state) = self.states.get(&id) else {
            return;
        };
        let name = names::video_layer(id);
        if !surface.has_layer(&name) {
            return;
        }
        let visible = video_state.visible_properties.contains(&FmvProperty::Video);
        surface.set_layout(
            &name,
            "visibility",
            json!(if visible { "visible" } else { "none" }),
        );
        surface.set_paint(&name, "raster-opacity", json!(video_state.opacity));
    }
}
