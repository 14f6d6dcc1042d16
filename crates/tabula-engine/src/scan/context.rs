use crate::model::{Container, ImportOutput, ItemId};
use crate::resolver::ResolverContext;

/// The context the scanner hands to resolvers for one cell or boundary.
pub(super) struct ScanContext<'c> {
    pub raw: &'c str,
    pub item: Option<ItemId>,
    pub container: &'c Container,
    pub index: usize,
    pub output: &'c mut ImportOutput,
}

impl ResolverContext for ScanContext<'_> {
    fn raw_data(&self) -> &str {
        self.raw
    }

    fn item(&self) -> Option<ItemId> {
        self.item
    }

    fn container(&self) -> &Container {
        self.container
    }

    fn index(&self) -> usize {
        self.index
    }

    fn output(&mut self) -> &mut ImportOutput {
        self.output
    }
}
