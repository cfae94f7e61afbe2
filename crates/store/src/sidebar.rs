use std::collections::BTreeMap;

use runtime::event_bus::StoreEvent;

use crate::state::AppState;

/// Sidebar detail views. At most one is active at a time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SidebarCard {
    Indicators,
    Charts,
    SearchableVectors,
}

impl SidebarCard {
    pub const ALL: [SidebarCard; 3] = [
        SidebarCard::Indicators,
        SidebarCard::Charts,
        SidebarCard::SearchableVectors,
    ];
}

/// Exclusive sidebar card state: enabling one card disables the rest, and
/// disabling the active card falls back to any remaining enabled card.
#[derive(Debug, Default)]
pub struct SidebarState {
    enabled: BTreeMap<SidebarCard, bool>,
    active: Option<SidebarCard>,
}

impl SidebarState {
    pub fn active(&self) -> Option<SidebarCard> {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn searchable_vectors_open(&self) -> bool {
        self.active == Some(SidebarCard::SearchableVectors)
    }

    pub fn toggle(&mut self, card: SidebarCard) {
        let now_enabled = !self.enabled.get(&card).copied().unwrap_or(false);
        self.enabled.insert(card, now_enabled);
        if now_enabled {
            self.active = Some(card);
            for other in SidebarCard::ALL {
                if other != card {
                    self.enabled.insert(other, false);
                }
            }
        } else {
            self.active = SidebarCard::ALL
                .into_iter()
                .find(|other| self.enabled.get(other).copied().unwrap_or(false));
        }
    }

    pub fn close(&mut self) {
        self.active = None;
        for card in SidebarCard::ALL {
            self.enabled.insert(card, false);
        }
    }
}

impl AppState {
    pub fn toggle_sidebar_card(&mut self, card: SidebarCard) {
        self.sidebar.toggle(card);
        self.events.emit(StoreEvent::SidebarChanged);
        // Hover highlighting is sidebar-gated, so colors need recomputing.
        self.invalidate_vector_colors();
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar.close();
        self.events.emit(StoreEvent::SidebarChanged);
        self.invalidate_vector_colors();
    }
}
