use std::collections::{BTreeMap, BTreeSet};

use catalog::layer::{MapLayer, VectorMapLayer};
use catalog::style::{AnnotationType, PropertyTarget, VectorLayerDisplay};
use foundation::ids::LayerId;
use serde_json::{Value, json};
use store::AppState;
use surface::{LayerSpec, RenderSurface, SourceSpec, SurfaceLayerKind};
use symbology::heatmap::{color_ramp, compile_weight, default_ramp};
use symbology::size::compile_size;
use symbology::{
    Expr, FilterUpdate, SelectionContext, compile_display_color, composed_filters, geometry_guard,
};

use crate::names;
use crate::service::ApiEndpoints;

/// Snapshot of the store's selection/hover state in the shape the color
/// compiler consumes.
pub fn selection_context(state: &AppState) -> SelectionContext {
    SelectionContext {
        selected_ids: state.selected_ids(),
        hovered_ids: state.hovered_features.clone(),
        hover_highlight: state.hover_highlight_active(),
        color_overrides: state
            .feature_color_mapping
            .iter()
            .map(|(id, color)| (*id, color.clone()))
            .collect(),
        overrides_enabled: state.feature_color_mapping_enabled,
    }
}

/// Default annotation color: selected features cyan, otherwise a color read
/// from well-known feature attributes, otherwise black.
fn default_color_expression(ctx: &SelectionContext) -> Value {
    let mut branches = vec![(
        Expr::is_in(
            Expr::get(symbology::FEATURE_ID_ATTRIBUTE),
            ctx.selected_ids.iter().map(|id| json!(id.0)).collect(),
        ),
        Expr::lit("cyan"),
    )];
    branches.push((
        Expr::has("colors"),
        Expr::Let {
            name: "firstColor".to_string(),
            value: Box::new(Expr::Slice {
                input: Box::new(Expr::get("colors")),
                start: 0,
                end: 7,
            }),
            body: Box::new(Expr::ToColor(Box::new(Expr::Var("firstColor".to_string())))),
        },
    ));
    branches.push((
        Expr::has("color"),
        Expr::Match {
            input: Box::new(Expr::get("color")),
            arms: vec![
                (json!("light blue"), Expr::lit("#ADD8E6")),
                (json!("dark blue"), Expr::lit("#00008B")),
            ],
            fallback: Box::new(Expr::get("color")),
        },
    ));
    Expr::Case {
        branches,
        fallback: Some(Box::new(Expr::lit("black"))),
    }
    .to_json()
}

pub(crate) fn default_circle_radius() -> Value {
    json!(["interpolate", ["linear"], ["zoom"], 5, 10, 7, 7, 10, 7, 14, 3])
}

pub(crate) fn default_line_width() -> Value {
    json!(["interpolate", ["linear"], ["zoom"], 5, 10, 7, 3, 10, 1, 14, 1])
}

fn extrusion_height() -> Value {
    json!([
        "interpolate",
        ["linear"],
        ["zoom"],
        0,
        0,
        12,
        ["*", ["get", "render_height"], 2]
    ])
}

/// Case expression for the text sub-layer's label field.
fn text_field(attribute: &str) -> Value {
    Expr::Case {
        branches: vec![(Expr::has(attribute), Expr::get(attribute))],
        fallback: Some(Box::new(Expr::lit("Default"))),
    }
    .to_json()
}

/// Reconciles vector tile layers: one tile source per layer, six fixed
/// sub-layers per source.
#[derive(Debug, Default)]
pub struct VectorReconciler {
    previously_added: BTreeSet<LayerId>,
    /// Last applied heatmap ramp per sub-layer, to detect ramp changes. The
    /// ramp can only be changed by re-adding the sub-layer, so redundant
    /// re-adds are worth avoiding.
    heatmap_ramps: BTreeMap<String, Value>,
}

impl VectorReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One reconciliation pass. Idempotent: a second call with unchanged
    /// state adds and removes nothing.
    pub fn toggle(
        &mut self,
        state: &AppState,
        surface: &mut dyn RenderSurface,
        api: &ApiEndpoints,
    ) {
        let wanted: Vec<&VectorMapLayer> = state
            .selected_layers
            .iter()
            .filter_map(|layer| match layer {
                MapLayer::Vector(vector) if state.is_visible(layer.key()) => Some(vector),
                _ => None,
            })
            .collect();
        let wanted_ids: BTreeSet<LayerId> = wanted.iter().map(|layer| layer.id).collect();

        // Removal is driven by this reconciler's own memory, never by
        // surface introspection; the surface may hold sources for other
        // owners. Sub-layers must go before their source.
        let stale: Vec<LayerId> = self
            .previously_added
            .difference(&wanted_ids)
            .copied()
            .collect();
        for id in stale {
            for annotation in AnnotationType::ALL {
                let name = names::vector_sub_layer(id, annotation);
                surface.remove_layer(&name);
                self.heatmap_ramps.remove(&name);
            }
            if !surface.remove_source(&names::vector_source(id)) {
                tracing::debug!(layer = %id, "vector source removal skipped");
            }
        }

        let ctx = selection_context(state);
        for layer in &wanted {
            // Presence is checked against the surface, not our memory, so a
            // restarted reconciler converges instead of double-adding.
            if surface.has_source(&names::vector_source(layer.id)) {
                continue;
            }
            self.add_layer(surface, api, layer, &ctx);
        }

        for layer in &wanted {
            self.update_layer(state, surface, layer);
        }

        self.previously_added = wanted_ids;
    }

    fn add_layer(
        &mut self,
        surface: &mut dyn RenderSurface,
        api: &ApiEndpoints,
        layer: &VectorMapLayer,
        ctx: &SelectionContext,
    ) {
        let source = names::vector_source(layer.id);
        surface.add_source(
            &source,
            SourceSpec::VectorTiles {
                tiles: vec![api.vector_tile_template(layer.id)],
            },
        );

        let default_color = default_color_expression(ctx);
        let circle = LayerSpec::new(
            names::vector_sub_layer(layer.id, AnnotationType::Circle),
            &source,
            SurfaceLayerKind::Circle,
        )
        .source_layer("default")
        .paint("circle-color", default_color.clone())
        .paint("circle-radius", default_circle_radius())
        .paint("circle-opacity", json!(0.5))
        .paint("circle-stroke-width", json!(1))
        .paint("circle-stroke-color", default_color.clone());
        let circle_name = circle.id.clone();
        surface.add_layer(circle);
        if !layer.default_style.draw_points() {
            if let Some(guard) = geometry_guard(AnnotationType::Circle) {
                surface.set_filter(&circle_name, Some(guard.to_json()));
            }
        }

        surface.add_layer(
            LayerSpec::new(
                names::vector_sub_layer(layer.id, AnnotationType::Line),
                &source,
                SurfaceLayerKind::Line,
            )
            .source_layer("default")
            .layout("line-join", json!("round"))
            .layout("line-cap", json!("round"))
            .paint("line-width", default_line_width()),
        );

        for (annotation, kind, color) in [
            (AnnotationType::Fill, SurfaceLayerKind::Fill, json!("blue")),
            (
                AnnotationType::FillExtrusion,
                SurfaceLayerKind::FillExtrusion,
                json!("#888888"),
            ),
        ] {
            let name = names::vector_sub_layer(layer.id, annotation);
            let mut spec = LayerSpec::new(&name, &source, kind).source_layer("default");
            let color_property = annotation
                .color_property()
                .unwrap_or("fill-color");
            spec = spec.paint(color_property, color);
            if annotation == AnnotationType::Fill {
                spec = spec.paint("fill-opacity", json!(0.8));
            } else {
                spec = spec.paint("fill-extrusion-height", extrusion_height());
            }
            surface.add_layer(spec);
            if let Some(guard) = geometry_guard(annotation) {
                surface.set_filter(&name, Some(guard.to_json()));
            }
        }

        surface.add_layer(
            LayerSpec::new(
                names::vector_sub_layer(layer.id, AnnotationType::Text),
                &source,
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

        let heatmap_name = names::vector_sub_layer(layer.id, AnnotationType::Heatmap);
        self.heatmap_ramps.remove(&heatmap_name);
        surface.add_layer(
            LayerSpec::new(&heatmap_name, &source, SurfaceLayerKind::Heatmap)
                .source_layer("default")
                .paint("heatmap-color", default_ramp().to_json()),
        );
    }

    /// Re-applies color, filters, and display properties for one layer.
    /// Missing sub-layers are skipped; the next pass retries.
    pub fn update_layer(
        &mut self,
        state: &AppState,
        surface: &mut dyn RenderSurface,
        layer: &VectorMapLayer,
    ) {
        self.apply_visibility(surface, layer);
        self.apply_colors(state, surface, layer);
        self.apply_filters(state, surface, layer);
        self.apply_props(surface, layer);
        self.apply_heatmap(surface, layer);
    }

    /// Sets per-sub-layer visibility from the style. Sub-types with no style
    /// entry, a `false` shorthand, or `enabled: false` do not render. A style
    /// with no entries at all leaves every sub-layer visible.
    fn apply_visibility(&self, surface: &mut dyn RenderSurface, layer: &VectorMapLayer) {
        if layer.default_style.layers.is_empty() {
            return;
        }
        for annotation in AnnotationType::ALL {
            let name = names::vector_sub_layer(layer.id, annotation);
            if !surface.has_layer(&name) {
                continue;
            }
            let visible = match layer.default_style.layers.get(&annotation) {
                None | Some(VectorLayerDisplay::Toggle(false)) => false,
                Some(VectorLayerDisplay::Toggle(true)) => true,
                Some(VectorLayerDisplay::Config(config)) => config.is_visible(),
            };
            surface.set_layout(
                &name,
                "visibility",
                json!(if visible { "visible" } else { "none" }),
            );
        }
    }

    fn apply_colors(
        &self,
        state: &AppState,
        surface: &mut dyn RenderSurface,
        layer: &VectorMapLayer,
    ) {
        let ctx = selection_context(state);
        for annotation in AnnotationType::ALL {
            let Some(property) = annotation.color_property() else {
                continue;
            };
            let Some(config) = layer.default_style.display_config(annotation) else {
                continue;
            };
            let name = names::vector_sub_layer(layer.id, annotation);
            if !surface.has_layer(&name) {
                continue;
            }
            if let Some(color) = compile_display_color(config, &ctx) {
                surface.set_paint(&name, property, color);
            }
        }
    }

    fn apply_filters(
        &self,
        state: &AppState,
        surface: &mut dyn RenderSurface,
        layer: &VectorMapLayer,
    ) {
        let color_filter = state.color_filter_for(layer.id);
        for (annotation, update) in composed_filters(&layer.default_style, color_filter) {
            let name = names::vector_sub_layer(layer.id, annotation);
            if !surface.has_layer(&name) {
                continue;
            }
            match update {
                FilterUpdate::Apply(expr) => surface.set_filter(&name, Some(expr.to_json())),
                FilterUpdate::Clear => surface.set_filter(&name, None),
            }
        }
    }

    fn apply_props(&self, surface: &mut dyn RenderSurface, layer: &VectorMapLayer) {
        for annotation in AnnotationType::ALL {
            let Some(config) = layer.default_style.display_config(annotation) else {
                continue;
            };
            let name = names::vector_sub_layer(layer.id, annotation);
            if !surface.has_layer(&name) {
                continue;
            }
            if let Some(zoom) = &config.zoom {
                surface.set_zoom_range(&name, zoom.min.unwrap_or(0.0), zoom.max.unwrap_or(24.0));
            }
            let opacity = config
                .opacity
                .map(|value| json!(value))
                .unwrap_or(Value::Null);
            surface.set_paint(&name, annotation.opacity_property(), opacity);
            if let (Some(size), Some((property, target))) =
                (&config.size, annotation.size_property())
            {
                let value = compile_size(size);
                match target {
                    PropertyTarget::Paint => surface.set_paint(&name, property, value),
                    PropertyTarget::Layout => surface.set_layout(&name, property, value),
                }
            }
            if annotation == AnnotationType::Text {
                if let Some(text) = &config.text {
                    surface.set_layout(&name, "text-field", text_field(&text.key));
                }
            }
        }
    }

    fn apply_heatmap(&mut self, surface: &mut dyn RenderSurface, layer: &VectorMapLayer) {
        let Some(config) = layer
            .default_style
            .display_config(AnnotationType::Heatmap)
        else {
            return;
        };
        let Some(heatmap) = &config.heatmap else {
            return;
        };
        if !config.filters_apply() {
            return;
        }
        let name = names::vector_sub_layer(layer.id, AnnotationType::Heatmap);
        if let Some(stops) = &heatmap.color {
            match color_ramp(stops) {
                Ok(ramp) => self.reapply_ramp(surface, layer.id, &name, ramp.to_json()),
                Err(err) => {
                    tracing::warn!(layer = %layer.id, %err, "invalid heatmap ramp color");
                }
            }
        }
        if !surface.has_layer(&name) {
            return;
        }
        if let Some(radius) = heatmap.radius {
            surface.set_paint(&name, "heatmap-radius", json!(radius));
        }
        if let Some(weight) = &heatmap.weight {
            surface.set_paint(&name, "heatmap-weight", compile_weight(weight));
        }
        if let Some(intensity) = &heatmap.intensity {
            surface.set_paint(&name, "heatmap-intensity", compile_weight(intensity));
        }
    }

    /// The surface cannot change a live heatmap ramp in place, so a changed
    /// ramp removes and re-adds the sub-layer.
    fn reapply_ramp(
        &mut self,
        surface: &mut dyn RenderSurface,
        id: LayerId,
        name: &str,
        ramp: Value,
    ) {
        if self.heatmap_ramps.get(name) == Some(&ramp) {
            return;
        }
        if surface.has_layer(name) {
            surface.remove_layer(name);
            surface.add_layer(
                LayerSpec::new(name, names::vector_source(id), SurfaceLayerKind::Heatmap)
                    .source_layer("default")
                    .paint("heatmap-color", ramp.clone()),
            );
        }
        self.heatmap_ramps.insert(name.to_string(), ramp);
    }
}
