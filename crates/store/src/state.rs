use std::collections::{BTreeMap, BTreeSet};

use catalog::filter::{AnnotationScope, ColorFilter};
use catalog::layer::MapLayer;
use foundation::ids::{LayerId, LayerKey, LayerKind};
use runtime::epoch::{Epoch, EpochMap};
use runtime::event_bus::{EventBus, StoreEvent};
use runtime::invalidation::{Invalidation, InvalidationQueue};

use crate::netcdf::NetCdfWorking;
use crate::selection::SelectedFeature;
use crate::sidebar::SidebarState;

/// Central application state, shared by reference across reconcilers and UI
/// glue.
///
/// Single-threaded by design: mutations happen between reconciliation passes,
/// never during one. Mutators queue invalidations and emit change events;
/// recomputation is deferred until the scheduler drains the queue.
#[derive(Debug, Default)]
pub struct AppState {
    /// Layers the user has selected, in selection order.
    pub selected_layers: Vec<MapLayer>,
    /// Visibility membership, tracked by composite key since ids are only
    /// unique per kind.
    pub visible_layers: BTreeSet<LayerKey>,
    /// Per-layer NetCDF frame data and playback position, populated on first
    /// visible reconciliation.
    pub netcdf_working: BTreeMap<LayerId, NetCdfWorking>,

    pub selected_features: Vec<SelectedFeature>,
    pub hovered_features: Vec<foundation::ids::FeatureId>,

    pub color_filters: Vec<ColorFilter>,
    pub feature_color_mapping: BTreeMap<foundation::ids::FeatureId, String>,
    pub feature_color_mapping_enabled: bool,
    pub feature_graphs_visible: bool,

    pub sidebar: SidebarState,

    pub events: EventBus,
    pub invalidations: InvalidationQueue,
    /// Guards in-flight layer data fetches: a completion whose epoch has
    /// advanced is discarded instead of applied.
    pub fetch_epochs: EpochMap<LayerKey>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, key: LayerKey) -> bool {
        self.selected_layers.iter().any(|layer| layer.key() == key)
    }

    pub fn is_visible(&self, key: LayerKey) -> bool {
        self.visible_layers.contains(&key)
    }

    /// Selected layers of one kind, in selection order.
    pub fn selected_of_kind(&self, kind: LayerKind) -> Vec<&MapLayer> {
        self.selected_layers
            .iter()
            .filter(|layer| layer.kind() == kind)
            .collect()
    }

    /// Adds or removes a layer from the selection. Selection implies
    /// visibility; deselection clears visibility and any features selected
    /// from that layer.
    pub fn toggle_layer_selection(&mut self, layer: MapLayer) {
        let key = layer.key();
        if let Some(index) = self
            .selected_layers
            .iter()
            .position(|existing| existing.key() == key)
        {
            self.selected_layers.remove(index);
            self.set_layer_visibility(key, false);
            self.remove_features_of_layer(key.id);
        } else {
            self.selected_layers.push(layer);
            self.set_layer_visibility(key, true);
            self.invalidations.push(Invalidation::Rebind);
        }
        self.events.emit(StoreEvent::LayerSelectionChanged(key));
        self.invalidations.push(Invalidation::Reconcile(key.kind));
    }

    pub fn set_layer_visibility(&mut self, key: LayerKey, visible: bool) {
        let changed = if visible {
            self.visible_layers.insert(key)
        } else {
            self.visible_layers.remove(&key)
        };
        if changed {
            self.events.emit(StoreEvent::VisibilityChanged(key));
            self.invalidations.push(Invalidation::Reconcile(key.kind));
        }
    }

    /// Replaces a selected layer's style blob after a user edit, queueing a
    /// full restyle of that layer.
    pub fn replace_layer(&mut self, layer: MapLayer) {
        let key = layer.key();
        if let Some(existing) = self
            .selected_layers
            .iter_mut()
            .find(|existing| existing.key() == key)
        {
            *existing = layer;
            self.events.emit(StoreEvent::StyleEdited(key));
            self.invalidations.push(Invalidation::Recolor(key.id));
            self.invalidations.push(Invalidation::Refilter(key.id));
        }
    }

    pub fn color_filter_for(&self, layer_id: LayerId) -> Option<&ColorFilter> {
        self.color_filters
            .iter()
            .find(|filter| filter.layer_id == layer_id)
    }

    /// Toggles one excluded value on a `(layer, scope, key)` color filter.
    ///
    /// Toggling the same value twice restores the prior state; removing the
    /// last value removes the entry, so no filter ever holds an empty set.
    pub fn toggle_color_filter(
        &mut self,
        layer_id: LayerId,
        scope: AnnotationScope,
        key: &str,
        value: &str,
    ) {
        let found = self.color_filters.iter().position(|filter| {
            filter.layer_id == layer_id && filter.scope == scope && filter.key == key
        });
        match found {
            None => self.color_filters.push(ColorFilter {
                layer_id,
                scope,
                key: key.to_string(),
                values: [value.to_string()].into(),
            }),
            Some(index) => {
                let filter = &mut self.color_filters[index];
                if !filter.values.remove(value) {
                    filter.values.insert(value.to_string());
                } else if filter.values.is_empty() {
                    self.color_filters.remove(index);
                }
            }
        }
        self.events.emit(StoreEvent::ColorFilterChanged(layer_id));
        self.invalidations.push(Invalidation::Refilter(layer_id));
    }

    /// Begins a tracked fetch for a layer's auxiliary data (NetCDF frames,
    /// video metadata, raster metadata).
    pub fn begin_layer_fetch(&mut self, key: LayerKey) -> Epoch {
        self.fetch_epochs.begin(key)
    }

    /// Whether a completed fetch is still current. Stale completions are
    /// dropped by the caller.
    pub fn fetch_is_current(&self, key: LayerKey, epoch: Epoch) -> bool {
        self.fetch_epochs.is_current(&key, epoch)
    }

    /// Queues a recolor for every selected vector layer. Used when selection
    /// or hover state changes, since highlight branches are baked into each
    /// layer's color expression.
    pub(crate) fn invalidate_vector_colors(&mut self) {
        let ids: Vec<LayerId> = self
            .selected_layers
            .iter()
            .filter(|layer| layer.kind() == LayerKind::Vector)
            .map(|layer| layer.id())
            .collect();
        for id in ids {
            self.invalidations.push(Invalidation::Recolor(id));
        }
    }
}

#[cfg(test)]
pub(crate) fn test_vector_layer(id: u64) -> MapLayer {
    use catalog::layer::VectorMapLayer;

    MapLayer::Vector(VectorMapLayer {
        id: LayerId(id),
        name: format!("layer {id}"),
        dataset_id: None,
        default_style: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use catalog::filter::AnnotationScope;
    use foundation::ids::{LayerId, LayerKey, LayerKind};
    use pretty_assertions::assert_eq;
    use runtime::invalidation::Invalidation;

    use super::{AppState, test_vector_layer as vector_layer};

    #[test]
    fn selection_implies_visibility() {
        let mut state = AppState::new();
        let key = LayerKey::new(LayerKind::Vector, LayerId(7));
        state.toggle_layer_selection(vector_layer(7));
        assert!(state.is_selected(key));
        assert!(state.is_visible(key));

        state.toggle_layer_selection(vector_layer(7));
        assert!(!state.is_selected(key));
        assert!(!state.is_visible(key));
    }

    #[test]
    fn color_filter_toggle_is_an_involution() {
        let mut state = AppState::new();
        let before = state.color_filters.clone();
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "closed");
        assert_eq!(state.color_filters.len(), 1);
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "closed");
        assert_eq!(state.color_filters, before);
    }

    #[test]
    fn removing_last_value_removes_the_entry() {
        let mut state = AppState::new();
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "a");
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "b");
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "a");
        assert_eq!(state.color_filters.len(), 1);
        state.toggle_color_filter(LayerId(1), AnnotationScope::All, "status", "b");
        assert!(state.color_filters.is_empty());
    }

    #[test]
    fn mutations_queue_invalidations_not_recomputes() {
        let mut state = AppState::new();
        state.toggle_layer_selection(vector_layer(1));
        assert!(state
            .invalidations
            .contains(Invalidation::Reconcile(LayerKind::Vector)));

        // Repeated mutations do not grow the queue: deduped until drained.
        let len = state.invalidations.len();
        state.set_layer_visibility(LayerKey::new(LayerKind::Vector, LayerId(1)), true);
        assert_eq!(state.invalidations.len(), len);
    }

    #[test]
    fn stale_fetch_epochs_are_detected() {
        let mut state = AppState::new();
        let key = LayerKey::new(LayerKind::NetCdf, LayerId(3));
        let first = state.begin_layer_fetch(key);
        let second = state.begin_layer_fetch(key);
        assert!(!state.fetch_is_current(key, first));
        assert!(state.fetch_is_current(key, second));
    }
}
