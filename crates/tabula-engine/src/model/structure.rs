use thiserror::Error;

use super::item::{Container, ContainerType, ItemId, span_size};

/// An edge endpoint: a real item or the structure's virtual root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Root,
    Item(ItemId),
}

/// A directed edge `source -> target`. The source stays unset until the
/// whole block has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: Option<Node>,
    pub target: Node,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("structure has no base container")]
    MissingBaseContainer,
    #[error("edge to {target:?} has no source")]
    UnsetSource { target: Node },
}

/// An immutable graph over the items of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    id: ItemId,
    structure_type: ContainerType,
    base_container: ItemId,
    boundary_container: Option<ItemId>,
    augmented: bool,
    nodes: Vec<ItemId>,
    edges: Vec<Edge>,
}

impl Structure {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn structure_type(&self) -> ContainerType {
        self.structure_type
    }

    pub fn base_container(&self) -> ItemId {
        self.base_container
    }

    pub fn boundary_container(&self) -> Option<ItemId> {
        self.boundary_container
    }

    pub fn is_augmented(&self) -> bool {
        self.augmented
    }

    pub fn nodes(&self) -> &[ItemId] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn span_size(&self) -> Option<u64> {
        span_size(&self.nodes)
    }

    /// The source of the edge pointing at `item`, if any.
    pub fn parent(&self, item: ItemId) -> Option<Node> {
        self.edges
            .iter()
            .find(|e| e.target == Node::Item(item))
            .and_then(|e| e.source)
    }

    /// Targets of all edges leaving `node`, in edge order.
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.source == Some(node))
            .map(|e| e.target)
    }
}

/// Collects nodes and edges for one structure at a time.
///
/// `build` hands out the finished structure and leaves the builder empty, so
/// one builder serves a whole corpus scan.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    nodes: Vec<ItemId>,
    edges: Vec<Edge>,
    base_container: Option<ItemId>,
    boundary_container: Option<ItemId>,
    augmented: bool,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh edge pointing at `target` with its source left unset.
    pub fn new_edge(&self, target: Node) -> Edge {
        Edge {
            source: None,
            target,
        }
    }

    /// The virtual root of the structure under construction.
    pub fn root(&self) -> Node {
        Node::Root
    }

    /// Adds every member of `container` as a node.
    pub fn add_nodes(&mut self, container: &Container) {
        self.nodes.extend_from_slice(&container.items);
    }

    /// Adds `edges[from..to]`.
    pub fn add_edges(&mut self, edges: &[Edge], from: usize, to: usize) {
        self.edges.extend_from_slice(&edges[from..to]);
    }

    pub fn set_boundary_container(&mut self, container: ItemId) {
        self.boundary_container = Some(container);
    }

    pub fn set_base_container(&mut self, container: ItemId) {
        self.base_container = Some(container);
    }

    pub fn augmented(&mut self, augmented: bool) {
        self.augmented = augmented;
    }

    pub fn build(
        &mut self,
        id: ItemId,
        structure_type: ContainerType,
    ) -> Result<Structure, StructureError> {
        let result = self.assemble(id, structure_type);
        self.clear();
        result
    }

    fn assemble(
        &mut self,
        id: ItemId,
        structure_type: ContainerType,
    ) -> Result<Structure, StructureError> {
        let base_container = self
            .base_container
            .ok_or(StructureError::MissingBaseContainer)?;
        if let Some(edge) = self.edges.iter().find(|e| e.source.is_none()) {
            return Err(StructureError::UnsetSource {
                target: edge.target,
            });
        }

        Ok(Structure {
            id,
            structure_type,
            base_container,
            boundary_container: self.boundary_container,
            augmented: self.augmented,
            nodes: std::mem::take(&mut self.nodes),
            edges: std::mem::take(&mut self.edges),
        })
    }

    /// Drops any partially collected nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.base_container = None;
        self.boundary_container = None;
        self.augmented = false;
    }

    /// Like [`clear`](Self::clear) but also returns the allocations.
    pub fn release(&mut self) {
        self.clear();
        self.nodes = Vec::new();
        self.edges = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerHandle;

    fn id(index: u64) -> ItemId {
        ItemId::new(LayerHandle(1), index)
    }

    fn container() -> Container {
        let mut c = Container::new(ItemId::new(LayerHandle(0), 0), ContainerType::List);
        c.items = vec![id(0), id(1)];
        c
    }

    #[test]
    fn builds_and_resets() {
        let mut builder = StructureBuilder::new();
        let c = container();
        let mut root_edge = builder.new_edge(Node::Item(id(1)));
        root_edge.source = Some(builder.root());
        let mut child_edge = builder.new_edge(Node::Item(id(0)));
        child_edge.source = Some(Node::Item(id(1)));

        builder.add_nodes(&c);
        builder.add_edges(&[root_edge, child_edge], 0, 2);
        builder.set_base_container(c.id);
        builder.set_boundary_container(c.id);
        builder.augmented(false);
        let structure = builder.build(ItemId::new(LayerHandle(2), 0), ContainerType::Tree).unwrap();

        assert_eq!(structure.node_count(), 2);
        assert_eq!(structure.parent(id(0)), Some(Node::Item(id(1))));
        assert_eq!(structure.children(Node::Root).collect::<Vec<_>>(), vec![Node::Item(id(1))]);
        assert_eq!(structure.span_size(), Some(2));
        assert!(!structure.is_augmented());

        // Builder is empty again
        let err = builder.build(ItemId::new(LayerHandle(2), 1), ContainerType::Tree);
        assert_eq!(err.unwrap_err(), StructureError::MissingBaseContainer);
    }

    #[test]
    fn rejects_edges_without_source() {
        let mut builder = StructureBuilder::new();
        let edge = builder.new_edge(Node::Item(id(0)));
        builder.add_edges(&[edge], 0, 1);
        builder.set_base_container(container().id);

        let err = builder.build(ItemId::new(LayerHandle(2), 0), ContainerType::Tree);
        assert_eq!(
            err.unwrap_err(),
            StructureError::UnsetSource {
                target: Node::Item(id(0))
            }
        );
    }
}
