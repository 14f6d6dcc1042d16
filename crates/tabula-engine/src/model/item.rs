use serde::{Deserialize, Serialize};

use crate::text::Span;

use super::structure::Structure;

/// Compact handle for a declared layer, assigned by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LayerHandle(pub u16);

/// Identity of a member: its layer plus its corpus index within that layer.
///
/// Corpus indices are dense and sequential per layer across all files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId {
    pub layer: LayerHandle,
    pub index: u64,
}

impl ItemId {
    pub fn new(layer: LayerHandle, index: u64) -> Self {
        Self { layer, index }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    #[default]
    List,
    Span,
    Tree,
    Chain,
    Graph,
}

impl ContainerType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerType::List => "list",
            ContainerType::Span => "span",
            ContainerType::Tree => "tree",
            ContainerType::Chain => "chain",
            ContainerType::Graph => "graph",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "list" => Some(ContainerType::List),
            "span" => Some(ContainerType::Span),
            "tree" => Some(ContainerType::Tree),
            "chain" => Some(ContainerType::Chain),
            "graph" => Some(ContainerType::Graph),
            _ => None,
        }
    }
}

/// One row of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Byte span of the row in its source file.
    pub span: Span,
}

/// One block's row group (or a group of nested containers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: ItemId,
    pub container_type: ContainerType,
    pub items: Vec<ItemId>,
}

impl Container {
    pub fn new(id: ItemId, container_type: ContainerType) -> Self {
        Self {
            id,
            container_type,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_at(&self, position: usize) -> Option<ItemId> {
        self.items.get(position).copied()
    }

    /// Number of corpus positions between the first and last member, inclusive.
    pub fn span_size(&self) -> Option<u64> {
        span_size(&self.items)
    }
}

pub(crate) fn span_size(items: &[ItemId]) -> Option<u64> {
    let first = items.iter().map(|i| i.index).min()?;
    let last = items.iter().map(|i| i.index).max()?;
    Some(last - first + 1)
}

/// Anything a layer sink can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Item(Item),
    Container(Container),
    Structure(Structure),
}

impl Member {
    pub fn id(&self) -> ItemId {
        match self {
            Member::Item(item) => item.id,
            Member::Container(container) => container.id,
            Member::Structure(structure) => structure.id(),
        }
    }

    /// Child count, span size and type for container-like members.
    pub fn container_info(&self) -> Option<(usize, Option<u64>, ContainerType)> {
        match self {
            Member::Item(_) => None,
            Member::Container(c) => Some((c.len(), c.span_size(), c.container_type)),
            Member::Structure(s) => Some((s.node_count(), s.span_size(), s.structure_type())),
        }
    }
}
