use catalog::layer::MapLayer;
use catalog::style::{AnnotationType, Selectable};
use foundation::ids::{FeatureId, LayerId};
use serde_json::Value;
use store::{AppState, SelectedFeature};

use crate::names;

/// Milliseconds the popup stays mounted after the pointer leaves a feature,
/// long enough to travel from the feature into the popup itself.
pub const POPUP_GRACE_MS: u64 = 100;

/// Sub-layer types that receive pointer bindings. Text and heatmap layers
/// are never interactive.
const INTERACTIVE_SUB_TYPES: [AnnotationType; 4] = [
    AnnotationType::Line,
    AnnotationType::Circle,
    AnnotationType::Fill,
    AnnotationType::FillExtrusion,
];

/// What a click on a bound layer does to the feature selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickMode {
    /// Add to the current selection (idempotent per feature).
    Append,
    /// Replace the current selection with the clicked feature.
    Replace,
}

impl ClickMode {
    fn from_selectable(selectable: Selectable) -> Option<ClickMode> {
        match selectable {
            Selectable::No => None,
            Selectable::Multi => Some(ClickMode::Append),
            Selectable::Single => Some(ClickMode::Replace),
        }
    }
}

/// One pointer-event binding on a surface layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub layer: String,
    pub layer_id: LayerId,
    pub click: Option<ClickMode>,
    pub hoverable: bool,
}

/// A feature delivered by a pointer event, identified through its tile
/// properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerFeature {
    pub id: FeatureId,
    pub layer_id: LayerId,
    pub properties: Value,
}

/// Owns the pointer-event bindings over the surface's layers.
///
/// Rebinding always unbinds everything first: layer selection changes both
/// add and remove bound layers, and stale bindings on removed layers would
/// otherwise accumulate across selections.
#[derive(Debug, Default)]
pub struct InteractionBinder {
    bindings: Vec<Binding>,
}

impl InteractionBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Recomputes the full binding set from the current layer selection.
    pub fn rebind(&mut self, state: &AppState) {
        self.bindings.clear();
        for layer in &state.selected_layers {
            match layer {
                MapLayer::Vector(vector) => {
                    for annotation in INTERACTIVE_SUB_TYPES {
                        let Some(config) = vector.default_style.display_config(annotation) else {
                            continue;
                        };
                        let click = ClickMode::from_selectable(config.selectable);
                        if click.is_none() && !config.hoverable {
                            continue;
                        }
                        self.bindings.push(Binding {
                            layer: names::vector_sub_layer(vector.id, annotation),
                            layer_id: vector.id,
                            click,
                            hoverable: config.hoverable,
                        });
                    }
                }
                MapLayer::Raster(raster) => {
                    let click = ClickMode::from_selectable(raster.default_style.selectable);
                    if click.is_none() && !raster.default_style.hoverable {
                        continue;
                    }
                    self.bindings.push(Binding {
                        layer: names::raster_layer(raster.id),
                        layer_id: raster.id,
                        click,
                        hoverable: raster.default_style.hoverable,
                    });
                }
                MapLayer::NetCdf(_) | MapLayer::Video(_) => {}
            }
        }
    }

    fn binding_for(&self, layer: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.layer == layer)
    }

    /// Routes a click on a bound layer into the feature selection.
    pub fn handle_click(&self, state: &mut AppState, layer: &str, feature: PointerFeature) {
        let Some(binding) = self.binding_for(layer) else {
            return;
        };
        let Some(mode) = binding.click else {
            return;
        };
        let selected = SelectedFeature {
            id: feature.id,
            layer_id: feature.layer_id,
            properties: feature.properties,
        };
        match mode {
            ClickMode::Append => state.add_selected_feature(selected),
            ClickMode::Replace => {
                state.clear_selected_features();
                state.add_selected_feature(selected);
            }
        }
    }

    pub fn handle_mouse_move(&self, state: &mut AppState, layer: &str, id: FeatureId) {
        let Some(binding) = self.binding_for(layer) else {
            return;
        };
        if binding.hoverable {
            state.set_hovered_feature(id);
        }
    }

    pub fn handle_mouse_leave(&self, state: &mut AppState) {
        state.clear_hovered_features();
    }
}

/// Feature-popup lifecycle with a grace period.
///
/// Leaving a feature schedules the popup for removal instead of unmounting it
/// immediately; if the pointer reaches the popup before the grace period
/// expires, removal is deferred until the pointer leaves the popup too. The
/// caller owns the actual timer and reports expiry via [`grace_expired`].
///
/// [`grace_expired`]: PopupController::grace_expired
#[derive(Debug, Default)]
pub struct PopupController {
    mounted: Option<FeatureId>,
    grace_pending: bool,
    over_popup: bool,
    close_deferred: bool,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> Option<FeatureId> {
        self.mounted
    }

    /// Whether a grace timer should currently be running.
    pub fn grace_pending(&self) -> bool {
        self.grace_pending
    }

    /// Pointer entered a feature: mount its popup, cancel any pending close.
    pub fn feature_entered(&mut self, id: FeatureId) {
        self.mounted = Some(id);
        self.grace_pending = false;
        self.close_deferred = false;
    }

    /// Pointer left the feature: start the grace period. Returns the number
    /// of milliseconds the caller should wait before calling
    /// [`grace_expired`], or `None` when no popup is mounted.
    ///
    /// [`grace_expired`]: PopupController::grace_expired
    pub fn feature_left(&mut self) -> Option<u64> {
        if self.mounted.is_some() {
            self.grace_pending = true;
            Some(POPUP_GRACE_MS)
        } else {
            None
        }
    }

    /// The grace timer fired. Unmounts unless the pointer made it into the
    /// popup, in which case the close waits for the popup to be left.
    pub fn grace_expired(&mut self) {
        if !self.grace_pending {
            return;
        }
        self.grace_pending = false;
        if self.over_popup {
            self.close_deferred = true;
        } else {
            self.mounted = None;
        }
    }

    pub fn popup_entered(&mut self) {
        self.over_popup = true;
    }

    /// Pointer left the popup. A close deferred during the grace period
    /// fires now.
    pub fn popup_left(&mut self) {
        self.over_popup = false;
        if self.close_deferred {
            self.close_deferred = false;
            self.mounted = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog::layer::{MapLayer, RasterMapLayer, VectorMapLayer};
    use catalog::style::{
        AnnotationType, DisplayConfig, Selectable, VectorLayerDisplay, VectorStyle,
    };
    use foundation::ids::{FeatureId, LayerId};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use store::AppState;

    use super::{ClickMode, InteractionBinder, POPUP_GRACE_MS, PointerFeature, PopupController};

    fn vector_layer(id: u64, selectable: Selectable, hoverable: bool) -> MapLayer {
        let mut style = VectorStyle::default();
        style.layers.insert(
            AnnotationType::Circle,
            VectorLayerDisplay::Config(DisplayConfig {
                selectable,
                hoverable,
                ..Default::default()
            }),
        );
        MapLayer::Vector(VectorMapLayer {
            id: LayerId(id),
            name: format!("layer {id}"),
            dataset_id: None,
            default_style: style,
        })
    }

    fn feature(id: u64, layer: u64) -> PointerFeature {
        PointerFeature {
            id: FeatureId(id),
            layer_id: LayerId(layer),
            properties: json!({"vectorfeatureid": id}),
        }
    }

    #[test]
    fn rebind_replaces_prior_bindings() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1, Selectable::Multi, false));
        let mut binder = InteractionBinder::new();
        binder.rebind(&state);
        assert_eq!(binder.bindings().len(), 1);
        assert_eq!(binder.bindings()[0].layer, "Layer_1_circle");

        state.toggle_layer_selection(vector_layer(1, Selectable::Multi, false));
        state.toggle_layer_selection(vector_layer(2, Selectable::Single, true));
        binder.rebind(&state);
        assert_eq!(binder.bindings().len(), 1);
        assert_eq!(binder.bindings()[0].layer, "Layer_2_circle");
        assert_eq!(binder.bindings()[0].click, Some(ClickMode::Replace));
    }

    #[test]
    fn non_interactive_layers_get_no_bindings() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1, Selectable::No, false));
        let mut binder = InteractionBinder::new();
        binder.rebind(&state);
        assert!(binder.bindings().is_empty());
    }

    #[test]
    fn raster_bindings_come_from_raster_style() {
        let mut state = AppState::new();
        let mut layer = RasterMapLayer {
            id: LayerId(4),
            name: "raster".to_string(),
            dataset_id: None,
            default_style: Default::default(),
        };
        layer.default_style.hoverable = true;
        state.toggle_layer_selection(MapLayer::Raster(layer));

        let mut binder = InteractionBinder::new();
        binder.rebind(&state);
        assert_eq!(binder.bindings()[0].layer, "Layer_4_raster");
        assert_eq!(binder.bindings()[0].click, None);
        assert!(binder.bindings()[0].hoverable);
    }

    #[test]
    fn append_click_accumulates_and_is_idempotent() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1, Selectable::Multi, false));
        let mut binder = InteractionBinder::new();
        binder.rebind(&state);

        binder.handle_click(&mut state, "Layer_1_circle", feature(10, 1));
        binder.handle_click(&mut state, "Layer_1_circle", feature(11, 1));
        binder.handle_click(&mut state, "Layer_1_circle", feature(10, 1));
        assert_eq!(
            state.selected_ids(),
            vec![FeatureId(10), FeatureId(11)]
        );
    }

    #[test]
    fn single_select_click_replaces() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1, Selectable::Single, false));
        let mut binder = InteractionBinder::new();
        binder.rebind(&state);

        binder.handle_click(&mut state, "Layer_1_circle", feature(10, 1));
        binder.handle_click(&mut state, "Layer_1_circle", feature(11, 1));
        assert_eq!(state.selected_ids(), vec![FeatureId(11)]);
    }

    #[test]
    fn hover_only_routes_through_hoverable_bindings() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1, Selectable::Multi, false));
        state.toggle_layer_selection(vector_layer(2, Selectable::No, true));
        let mut binder = InteractionBinder::new();
        binder.rebind(&state);

        binder.handle_mouse_move(&mut state, "Layer_1_circle", FeatureId(10));
        assert!(state.hovered_features.is_empty());
        binder.handle_mouse_move(&mut state, "Layer_2_circle", FeatureId(10));
        assert_eq!(state.hovered_features, vec![FeatureId(10)]);
    }

    #[test]
    fn popup_unmounts_after_grace_when_pointer_goes_elsewhere() {
        let mut popup = PopupController::new();
        assert_eq!(popup.feature_left(), None);

        popup.feature_entered(FeatureId(1));
        assert_eq!(popup.feature_left(), Some(POPUP_GRACE_MS));
        assert!(popup.grace_pending());
        popup.grace_expired();
        assert_eq!(popup.mounted(), None);
    }

    #[test]
    fn reentering_feature_cancels_pending_close() {
        let mut popup = PopupController::new();
        popup.feature_entered(FeatureId(1));
        popup.feature_left();
        popup.feature_entered(FeatureId(1));
        assert!(!popup.grace_pending());
        popup.grace_expired();
        assert_eq!(popup.mounted(), Some(FeatureId(1)));
    }

    #[test]
    fn close_defers_while_pointer_is_over_popup() {
        let mut popup = PopupController::new();
        popup.feature_entered(FeatureId(1));
        popup.feature_left();
        popup.popup_entered();
        popup.grace_expired();
        assert_eq!(popup.mounted(), Some(FeatureId(1)));

        popup.popup_left();
        assert_eq!(popup.mounted(), None);
    }
}
