use foundation::ids::{LayerId, LayerKind};

/// Recompute work owed after store mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Re-run a kind's reconciliation pass (selection/visibility changed).
    Reconcile(LayerKind),
    /// Recompute paint expressions for one vector layer.
    Recolor(LayerId),
    /// Recompose and reapply filters for one vector layer.
    Refilter(LayerId),
    /// Rebind interaction handlers to the current sub-layer set.
    Rebind,
}

/// Deduplicating queue of pending recompute work.
///
/// Mutations push invalidations; a caller drains the queue once per pass and
/// acts on the batch. Pushing the same invalidation twice between drains is a
/// no-op, which is what keeps rapid hover/selection churn from triggering
/// recompute storms.
#[derive(Debug, Default)]
pub struct InvalidationQueue {
    pending: Vec<Invalidation>,
}

impl InvalidationQueue {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, invalidation: Invalidation) {
        if !self.pending.contains(&invalidation) {
            self.pending.push(invalidation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, invalidation: Invalidation) -> bool {
        self.pending.contains(&invalidation)
    }

    /// Takes the pending batch in insertion order.
    pub fn drain(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::{Invalidation, InvalidationQueue};
    use foundation::ids::{LayerId, LayerKind};

    #[test]
    fn deduplicates_between_drains() {
        let mut queue = InvalidationQueue::new();
        queue.push(Invalidation::Recolor(LayerId(7)));
        queue.push(Invalidation::Recolor(LayerId(7)));
        queue.push(Invalidation::Reconcile(LayerKind::Vector));
        assert_eq!(queue.len(), 2);

        let batch = queue.drain();
        assert_eq!(
            batch,
            vec![
                Invalidation::Recolor(LayerId(7)),
                Invalidation::Reconcile(LayerKind::Vector),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn push_after_drain_requeues() {
        let mut queue = InvalidationQueue::new();
        queue.push(Invalidation::Rebind);
        queue.drain();
        queue.push(Invalidation::Rebind);
        assert_eq!(queue.len(), 1);
    }
}
