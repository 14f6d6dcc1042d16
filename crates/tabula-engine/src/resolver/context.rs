use crate::model::{Container, ImportOutput, ItemId};
use crate::text::Span;

/// The cursor a resolver sees for one cell (or one block boundary).
pub trait ResolverContext {
    /// Text of the current cell.
    fn raw_data(&self) -> &str;
    /// The item the current row produced, if any.
    fn item(&self) -> Option<ItemId>;
    /// The still-open container of the current block.
    fn container(&self) -> &Container;
    /// Position of the current row within the block.
    fn index(&self) -> usize;
    /// Staging output of the current block.
    fn output(&mut self) -> &mut ImportOutput;
}

/// Forwards everything to a parent context except `raw_data`, which is
/// narrowed to a sub-span of the parent's cell text.
///
/// A proxy is two words on the stack; delegating resolvers create one per
/// forwarded value instead of copying item or container state.
pub struct ProxyContext<'p> {
    parent: &'p mut dyn ResolverContext,
    data: Span,
}

impl<'p> ProxyContext<'p> {
    /// `data` must be a span into `parent.raw_data()`.
    pub fn new(parent: &'p mut dyn ResolverContext, data: Span) -> Self {
        Self { parent, data }
    }
}

impl ResolverContext for ProxyContext<'_> {
    fn raw_data(&self) -> &str {
        self.data.slice(self.parent.raw_data())
    }

    fn item(&self) -> Option<ItemId> {
        self.parent.item()
    }

    fn container(&self) -> &Container {
        self.parent.container()
    }

    fn index(&self) -> usize {
        self.parent.index()
    }

    fn output(&mut self) -> &mut ImportOutput {
        self.parent.output()
    }
}
