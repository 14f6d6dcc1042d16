use std::collections::BTreeMap;

use crate::model::{ItemId, LayerHandle};

/// Next free corpus index per layer.
///
/// Cloned as a checkpoint when a block opens and restored when the block is
/// aborted, so skipped blocks leave no gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexCounters {
    next: BTreeMap<LayerHandle, u64>,
}

impl IndexCounters {
    pub fn allocate(&mut self, layer: LayerHandle) -> ItemId {
        let next = self.next.entry(layer).or_insert(0);
        let id = ItemId::new(layer, *next);
        *next += 1;
        id
    }

    pub fn set_next(&mut self, layer: LayerHandle, index: u64) {
        self.next.insert(layer, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_per_layer_and_restores() {
        let mut counters = IndexCounters::default();
        assert_eq!(counters.allocate(LayerHandle(0)).index, 0);
        assert_eq!(counters.allocate(LayerHandle(0)).index, 1);
        assert_eq!(counters.allocate(LayerHandle(1)).index, 0);

        let checkpoint = counters.clone();
        counters.allocate(LayerHandle(0));
        counters = checkpoint;

        assert_eq!(counters.allocate(LayerHandle(0)).index, 2);
    }
}
