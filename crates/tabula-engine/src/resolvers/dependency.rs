//! Dependency structures from per-row head pointers.
//!
//! Each row names the position of its head within the block (CoNLL `HEAD`
//! column). Heads can point forward, so edges are only completed once the
//! whole block is known:
//!
//! ```text
//! begin_batch ─► process × rows ─► end_batch ─► (next block)
//!   reset          store head +       resolve sources,
//!                  open edge          build + offer,
//!                                     reset used slots
//! ```

use crate::manifest::LayerKind;
use crate::model::{
    ContainerType, Edge, ItemId, LayerHandle, Member, Node, StructureBuilder, WriteSink,
};
use crate::resolver::{
    BatchResolver, PositionBuffer, ReadMode, Resolver, ResolverContext, ResolverError,
    ResolverSetup, options,
};

const OFFSET: &str = "offset";
const ROOT_LABEL: &str = "rootLabel";
const STRUCTURE_TYPE: &str = "structureType";

/// Initial slot count when the cache gives no hint.
const DEFAULT_CAPACITY: usize = 32;
/// Upper bound on rows per block.
const MAX_CAPACITY: usize = 1 << 20;

/// Where a row's incoming edge starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Head {
    /// No head recorded at this position.
    #[default]
    Undefined,
    /// Attached to the structure's virtual root.
    Root,
    /// Attached to the row at this position of the same block.
    Index(usize),
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    head: Head,
    edge: Option<Edge>,
}

pub struct DependencyStructureResolver {
    layer: Option<LayerHandle>,
    layer_id: String,
    offset: i64,
    root_label: String,
    structure_type: ContainerType,
    mode: ReadMode,
    slots: PositionBuffer<Slot>,
    builder: StructureBuilder,
    /// Edges with resolved sources for the block being finalized.
    resolved: Vec<Edge>,
}

impl DependencyStructureResolver {
    pub const TYPE: &'static str = "dependency";

    pub fn new() -> Self {
        Self {
            layer: None,
            layer_id: String::new(),
            offset: 1,
            root_label: "0".to_string(),
            structure_type: ContainerType::Tree,
            mode: ReadMode::Full,
            slots: PositionBuffer::new(0, MAX_CAPACITY),
            builder: StructureBuilder::new(),
            resolved: Vec::new(),
        }
    }

    /// The head recorded at `position` of the current block.
    pub fn head_at(&self, position: usize) -> Head {
        self.slots.get(position).map_or(Head::Undefined, |s| s.head)
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    fn parse_head(&self, raw: &str) -> Result<Head, ResolverError> {
        let raw = raw.trim();
        if raw == self.root_label {
            return Ok(Head::Root);
        }
        let value: i64 = raw.parse().map_err(|_| {
            ResolverError::content(
                &self.layer_id,
                raw,
                "head is neither an index nor the root label",
            )
        })?;
        let index = value
            .checked_sub(self.offset)
            .filter(|index| *index >= 0)
            .and_then(|index| usize::try_from(index).ok())
            .ok_or_else(|| {
                ResolverError::content(
                    &self.layer_id,
                    raw,
                    format!("head does not resolve to a position with offset {}", self.offset),
                )
            })?;
        Ok(Head::Index(index))
    }

    fn finalize(
        &mut self,
        ctx: &mut dyn ResolverContext,
        layer: LayerHandle,
    ) -> Result<(), ResolverError> {
        let container = ctx.container();
        let size = container.len();

        self.resolved.clear();
        for position in 0..size {
            let Some(slot) = self.slots.get(position).copied() else {
                break;
            };
            let source = match slot.head {
                Head::Undefined => continue,
                Head::Root => self.builder.root(),
                Head::Index(head) => match container.item_at(head) {
                    Some(item) => Node::Item(item),
                    None => {
                        return Err(ResolverError::content(
                            &self.layer_id,
                            (head as i64 + self.offset).to_string(),
                            format!("head of row {position} points past the block's {size} rows"),
                        ));
                    }
                },
            };
            let Some(mut edge) = slot.edge else {
                continue;
            };
            edge.source = Some(source);
            self.resolved.push(edge);
        }

        self.builder.add_nodes(container);
        self.builder.add_edges(&self.resolved, 0, self.resolved.len());
        self.builder.set_boundary_container(container.id);
        self.builder.set_base_container(container.id);
        self.builder.augmented(false);

        let index = container.id.index;
        let structure = self
            .builder
            .build(ItemId::new(layer, index), self.structure_type)
            .map_err(|source| ResolverError::Structure {
                layer: self.layer_id.clone(),
                source,
            })?;

        if self.mode == ReadMode::Full {
            ctx.output().sink(layer).offer(Member::Structure(structure), index);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.slots.reset();
        self.builder.clear();
        self.resolved.clear();
    }
}

impl Default for DependencyStructureResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for DependencyStructureResolver {
    fn prepare_for_reading(&mut self, setup: &ResolverSetup<'_>) -> Result<(), ResolverError> {
        let layer_id = setup.options.require(Self::TYPE, options::LAYER)?;
        let (handle, _) = setup.converter.require(layer_id, LayerKind::Structure)?;

        self.offset = setup.options.parse_or(OFFSET, 1i64)?;
        self.root_label = setup.options.string_or(ROOT_LABEL, "0");
        let structure_type = setup.options.string_or(STRUCTURE_TYPE, ContainerType::Tree.as_str());
        self.structure_type =
            ContainerType::parse(&structure_type).ok_or_else(|| ResolverError::InvalidOption {
                option: STRUCTURE_TYPE.to_string(),
                value: structure_type.clone(),
            })?;

        let capacity = setup.cache.size_hint(handle).unwrap_or(DEFAULT_CAPACITY);
        self.slots = PositionBuffer::new(capacity, MAX_CAPACITY);
        self.mode = setup.mode;
        self.layer = Some(handle);
        self.layer_id = layer_id.to_string();
        Ok(())
    }

    fn process(&mut self, ctx: &mut dyn ResolverContext) -> Result<Option<ItemId>, ResolverError> {
        if self.layer.is_none() {
            return Err(ResolverError::NotPrepared(Self::TYPE));
        }
        let head = self.parse_head(ctx.raw_data())?;
        let Some(item) = ctx.item() else {
            return Err(ResolverError::content(&self.layer_id, ctx.raw_data(), "no item for head"));
        };

        let edge = self.builder.new_edge(Node::Item(item));
        self.slots
            .set(ctx.index(), Slot { head, edge: Some(edge) })
            .map_err(|err| {
                ResolverError::content(&self.layer_id, ctx.raw_data(), err.to_string())
            })?;
        Ok(Some(item))
    }

    fn close(&mut self) {
        self.layer = None;
        self.slots.release();
        self.builder.release();
        self.resolved = Vec::new();
    }
}

impl BatchResolver for DependencyStructureResolver {
    fn begin_batch(&mut self, _ctx: &mut dyn ResolverContext) -> Result<(), ResolverError> {
        // Leftovers of a block aborted before its end_batch
        self.reset();
        Ok(())
    }

    fn end_batch(&mut self, ctx: &mut dyn ResolverContext) -> Result<(), ResolverError> {
        let layer = self.layer.ok_or(ResolverError::NotPrepared(Self::TYPE))?;
        let result = self.finalize(ctx, layer);
        self.reset();
        result
    }
}
