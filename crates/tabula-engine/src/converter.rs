//! A validated schema together with the manifest it binds to.

use std::collections::BTreeMap;

use crate::manifest::{CorpusManifest, LayerKind, LayerManifest};
use crate::model::LayerHandle;
use crate::schema::{BlockSchema, SchemaError, TableSchema};

/// Resolves layer ids to handles and manifests for resolvers and the scanner.
#[derive(Debug, Clone)]
pub struct Converter {
    schema: TableSchema,
    manifest: CorpusManifest,
    handles: BTreeMap<String, LayerHandle>,
}

impl Converter {
    /// Validates `schema` and checks every layer it names against `manifest`.
    pub fn new(schema: TableSchema, manifest: CorpusManifest) -> Result<Self, SchemaError> {
        schema.validate()?;

        let mut handles = BTreeMap::new();
        for (idx, layer) in manifest.layers.iter().enumerate() {
            let handle = LayerHandle(idx as u16);
            if handles.insert(layer.id.clone(), handle).is_some() {
                return Err(SchemaError::DuplicateLayer(layer.id.clone()));
            }
        }

        let converter = Self {
            schema,
            manifest,
            handles,
        };
        converter.check_block(&converter.schema.root)?;
        Ok(converter)
    }

    fn check_block(&self, block: &BlockSchema) -> Result<(), SchemaError> {
        self.require(&block.layer, LayerKind::Item)?;
        if let Some(component) = &block.component_layer {
            self.require(component, LayerKind::Item)?;
        }
        for column in &block.columns {
            if let Some(layer) = &column.layer {
                self.lookup(layer)?;
            }
            for substitute in &column.substitutes {
                self.lookup(&substitute.layer)?;
            }
        }
        block.blocks.iter().try_for_each(|b| self.check_block(b))
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn manifest(&self) -> &CorpusManifest {
        &self.manifest
    }

    pub fn handle(&self, layer: &str) -> Option<LayerHandle> {
        self.handles.get(layer).copied()
    }

    pub fn lookup(&self, layer: &str) -> Result<(LayerHandle, &LayerManifest), SchemaError> {
        let handle = self
            .handle(layer)
            .ok_or_else(|| SchemaError::UnknownLayer(layer.to_string()))?;
        Ok((handle, &self.manifest.layers[handle.0 as usize]))
    }

    /// Like [`lookup`](Self::lookup) but also checks the layer kind.
    pub fn require(
        &self,
        layer: &str,
        kind: LayerKind,
    ) -> Result<(LayerHandle, &LayerManifest), SchemaError> {
        let (handle, manifest) = self.lookup(layer)?;
        if manifest.kind != kind {
            return Err(SchemaError::LayerKindMismatch {
                layer: layer.to_string(),
                expected: kind.as_str(),
                actual: manifest.kind.as_str(),
            });
        }
        Ok((handle, manifest))
    }

    /// Layers whose members the statistics analyzer observes, in handle order.
    pub fn member_layers(&self) -> impl Iterator<Item = (LayerHandle, &LayerManifest)> {
        self.manifest
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.kind != LayerKind::Annotation)
            .map(|(idx, l)| (LayerHandle(idx as u16), l))
    }
}
