use foundation::ids::{LayerId, LayerKey};

/// Change notifications emitted by the application state store.
///
/// Consumers (reconcilers, UI bindings) drain the bus between passes; nothing
/// reacts synchronously to a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    SelectionChanged,
    HoverChanged,
    LayerSelectionChanged(LayerKey),
    VisibilityChanged(LayerKey),
    ColorFilterChanged(LayerId),
    StyleEdited(LayerKey),
    SidebarChanged,
    TimeRangeChanged,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, StoreEvent};

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.emit(StoreEvent::SelectionChanged);
        bus.emit(StoreEvent::HoverChanged);
        assert_eq!(
            bus.events(),
            &[StoreEvent::SelectionChanged, StoreEvent::HoverChanged]
        );
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(StoreEvent::SidebarChanged);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
