use foundation::ids::{FeatureId, LayerId};
use runtime::event_bus::StoreEvent;
use serde_json::Value;

use crate::state::AppState;

/// A clicked feature held in the selection set. Never persisted; cleared
/// explicitly or when its layer is deselected.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFeature {
    pub id: FeatureId,
    pub layer_id: LayerId,
    pub properties: Value,
}

impl AppState {
    /// Inserts unless an entry with the same feature id already exists.
    pub fn add_selected_feature(&mut self, feature: SelectedFeature) {
        if self
            .selected_features
            .iter()
            .any(|existing| existing.id == feature.id)
        {
            return;
        }
        self.selected_features.push(feature);
        self.events.emit(StoreEvent::SelectionChanged);
        self.invalidate_vector_colors();
    }

    pub fn remove_selected_feature(&mut self, id: FeatureId) {
        let before = self.selected_features.len();
        self.selected_features.retain(|feature| feature.id != id);
        if self.selected_features.len() != before {
            self.events.emit(StoreEvent::SelectionChanged);
            self.invalidate_vector_colors();
        }
    }

    pub fn clear_selected_features(&mut self) {
        if !self.selected_features.is_empty() {
            self.selected_features.clear();
            self.events.emit(StoreEvent::SelectionChanged);
            self.invalidate_vector_colors();
        }
    }

    /// Drops selected features belonging to a deselected layer.
    pub(crate) fn remove_features_of_layer(&mut self, layer_id: LayerId) {
        let before = self.selected_features.len();
        self.selected_features
            .retain(|feature| feature.layer_id != layer_id);
        if self.selected_features.len() != before {
            self.events.emit(StoreEvent::SelectionChanged);
            self.invalidate_vector_colors();
        }
    }

    pub fn selected_ids(&self) -> Vec<FeatureId> {
        self.selected_features
            .iter()
            .map(|feature| feature.id)
            .collect()
    }

    /// Replaces the hovered set with a singleton; only one feature is hovered
    /// at a time.
    pub fn set_hovered_feature(&mut self, id: FeatureId) {
        if self.hovered_features.as_slice() == [id] {
            return;
        }
        self.hovered_features = vec![id];
        self.events.emit(StoreEvent::HoverChanged);
        self.invalidate_vector_colors();
    }

    pub fn remove_hovered_feature(&mut self, id: FeatureId) {
        self.remove_hovered_features(&[id]);
    }

    pub fn remove_hovered_features(&mut self, ids: &[FeatureId]) {
        let before = self.hovered_features.len();
        self.hovered_features.retain(|existing| !ids.contains(existing));
        if self.hovered_features.len() != before {
            self.events.emit(StoreEvent::HoverChanged);
            self.invalidate_vector_colors();
        }
    }

    pub fn clear_hovered_features(&mut self) {
        if !self.hovered_features.is_empty() {
            self.hovered_features.clear();
            self.events.emit(StoreEvent::HoverChanged);
            self.invalidate_vector_colors();
        }
    }

    pub fn set_feature_color(&mut self, id: FeatureId, color: String) {
        self.feature_color_mapping.insert(id, color);
        self.invalidate_vector_colors();
    }

    pub fn clear_feature_color_mapping(&mut self) {
        self.feature_color_mapping.clear();
        self.invalidate_vector_colors();
    }

    /// Hovered features are only highlighted while a detail sidebar view is
    /// open; otherwise hover state exists solely for popups.
    pub fn hover_highlight_active(&self) -> bool {
        self.feature_graphs_visible || self.sidebar.searchable_vectors_open()
    }
}

#[cfg(test)]
mod tests {
    use foundation::ids::{FeatureId, LayerId};
    use pretty_assertions::assert_eq;
    use runtime::invalidation::Invalidation;
    use serde_json::json;

    use crate::sidebar::SidebarCard;
    use crate::state::AppState;

    use super::SelectedFeature;

    fn feature(id: u64) -> SelectedFeature {
        SelectedFeature {
            id: FeatureId(id),
            layer_id: LayerId(7),
            properties: json!({ "vectorfeatureid": id }),
        }
    }

    #[test]
    fn add_is_idempotent_by_id() {
        let mut state = AppState::new();
        state.add_selected_feature(feature(42));
        state.add_selected_feature(feature(42));
        assert_eq!(state.selected_features.len(), 1);
        assert_eq!(state.selected_ids(), vec![FeatureId(42)]);

        state.remove_selected_feature(FeatureId(42));
        assert!(state.selected_features.is_empty());
    }

    #[test]
    fn hover_is_a_singleton() {
        let mut state = AppState::new();
        state.set_hovered_feature(FeatureId(1));
        state.set_hovered_feature(FeatureId(2));
        assert_eq!(state.hovered_features, vec![FeatureId(2)]);

        state.remove_hovered_feature(FeatureId(2));
        assert!(state.hovered_features.is_empty());
    }

    #[test]
    fn selection_mutation_queues_recolor_for_selected_vector_layers() {
        let mut state = AppState::new();
        state.toggle_layer_selection(crate::state::test_vector_layer(7));
        state.invalidations.drain();

        state.add_selected_feature(feature(1));
        assert!(state
            .invalidations
            .contains(Invalidation::Recolor(LayerId(7))));
    }

    #[test]
    fn hover_highlight_requires_open_sidebar() {
        let mut state = AppState::new();
        assert!(!state.hover_highlight_active());
        state.toggle_sidebar_card(SidebarCard::SearchableVectors);
        assert!(state.hover_highlight_active());
        state.toggle_sidebar_card(SidebarCard::SearchableVectors);
        assert!(!state.hover_highlight_active());
    }
}
