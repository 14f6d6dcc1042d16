use std::collections::BTreeMap;

use serde::Serialize;

use super::item::{ItemId, LayerHandle, Member};

/// Write-behind destination for the members of one layer.
pub trait WriteSink {
    fn offer(&mut self, member: Member, index: u64);
}

/// In-memory sink that keeps members in offer order, indexed by corpus
/// index. The first member offered at an index wins lookups.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayerBuffer {
    members: Vec<(u64, Member)>,
    positions: BTreeMap<u64, usize>,
}

impl WriteSink for LayerBuffer {
    fn offer(&mut self, member: Member, index: u64) {
        self.positions.entry(index).or_insert(self.members.len());
        self.members.push((index, member));
    }
}

impl LayerBuffer {
    pub fn members(&self) -> impl Iterator<Item = (u64, &Member)> {
        self.members.iter().map(|(index, member)| (*index, member))
    }

    pub fn get(&self, index: u64) -> Option<&Member> {
        let position = *self.positions.get(&index)?;
        self.members.get(position).map(|(_, member)| member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn absorb(&mut self, other: LayerBuffer) {
        for (index, member) in other.members {
            self.offer(member, index);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Annotation values of one annotation layer, keyed by item and key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnnotationStore {
    values: BTreeMap<(ItemId, String), Value>,
}

impl AnnotationStore {
    pub fn set(&mut self, item: ItemId, key: impl Into<String>, value: Value) {
        self.values.insert((item, key.into()), value);
    }

    pub fn get(&self, item: ItemId, key: &str) -> Option<&Value> {
        self.values.get(&(item, key.to_string()))
    }

    /// All `(key, value)` pairs stored for `item`, ordered by key.
    pub fn of_item(&self, item: ItemId) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .range((item, String::new())..)
            .take_while(move |((i, _), _)| *i == item)
            .map(|((_, key), value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn absorb(&mut self, other: AnnotationStore) {
        self.values.extend(other.values);
    }
}

/// Everything produced by an import: members per layer and annotations per
/// annotation layer.
///
/// The scanner stages each block in its own `ImportOutput` and absorbs it
/// into the parent only when the block commits.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportOutput {
    layers: BTreeMap<LayerHandle, LayerBuffer>,
    annotations: BTreeMap<LayerHandle, AnnotationStore>,
}

impl ImportOutput {
    pub fn sink(&mut self, layer: LayerHandle) -> &mut LayerBuffer {
        self.layers.entry(layer).or_default()
    }

    pub fn annotations_mut(&mut self, layer: LayerHandle) -> &mut AnnotationStore {
        self.annotations.entry(layer).or_default()
    }

    pub fn layer(&self, layer: LayerHandle) -> Option<&LayerBuffer> {
        self.layers.get(&layer)
    }

    pub fn annotations(&self, layer: LayerHandle) -> Option<&AnnotationStore> {
        self.annotations.get(&layer)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(LayerBuffer::is_empty)
            && self.annotations.values().all(AnnotationStore::is_empty)
    }

    pub fn absorb(&mut self, other: ImportOutput) {
        for (layer, buffer) in other.layers {
            self.sink(layer).absorb(buffer);
        }
        for (layer, store) in other.annotations {
            self.annotations_mut(layer).absorb(store);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::text::Span;

    fn id(index: u64) -> ItemId {
        ItemId::new(LayerHandle(0), index)
    }

    #[test]
    fn annotations_of_one_item_are_grouped() {
        let mut store = AnnotationStore::default();
        store.set(id(1), "pos", Value::String("NN".into()));
        store.set(id(0), "form", Value::String("The".into()));
        store.set(id(1), "form", Value::String("cat".into()));

        let keys: Vec<_> = store.of_item(id(1)).map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["form", "pos"]);
        assert_eq!(store.get(id(0), "form").and_then(Value::as_str), Some("The"));
    }

    fn item(index: u64) -> Member {
        Member::Item(Item {
            id: id(index),
            span: Span::new(index as usize, index as usize + 1),
        })
    }

    #[test]
    fn lookup_by_index_follows_absorbed_members() {
        let mut buffer = LayerBuffer::default();
        buffer.offer(item(4), 4);
        buffer.offer(item(2), 2);

        let mut staged = LayerBuffer::default();
        staged.offer(item(7), 7);
        staged.offer(item(2), 2);
        buffer.absorb(staged);

        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.get(7), Some(&item(7)));
        assert_eq!(buffer.get(4), Some(&item(4)));
        assert_eq!(buffer.get(2).map(Member::id), Some(id(2)));
        assert_eq!(buffer.get(3), None);
        let order: Vec<u64> = buffer.members().map(|(index, _)| index).collect();
        assert_eq!(order, vec![4, 2, 7, 2]);
    }

    #[test]
    fn absorb_merges_layers() {
        let mut main = ImportOutput::default();
        let mut staged = ImportOutput::default();
        staged.sink(LayerHandle(0)).offer(
            Member::Item(Item {
                id: id(0),
                span: Span::new(0, 3),
            }),
            0,
        );
        staged
            .annotations_mut(LayerHandle(1))
            .set(id(0), "form", Value::String("a".into()));
        assert!(main.is_empty());

        main.absorb(staged);

        assert_eq!(main.layer(LayerHandle(0)).map(LayerBuffer::len), Some(1));
        assert_eq!(main.annotations(LayerHandle(1)).map(AnnotationStore::len), Some(1));
        assert!(!main.is_empty());
    }
}
