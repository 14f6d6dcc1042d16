use crate::manifest::{LayerKind, ValueType};
use crate::model::{ItemId, LayerHandle};
use crate::resolver::{
    ReadMode, Resolver, ResolverContext, ResolverError, ResolverSetup, options,
};

/// Stores cell text as one annotation on the context item.
///
/// The value is converted to the type the annotation layer declares for the
/// key; undeclared keys are stored as strings.
pub struct AnnotationResolver {
    layer: Option<LayerHandle>,
    layer_id: String,
    key: String,
    value_type: ValueType,
    mode: ReadMode,
}

impl AnnotationResolver {
    pub const TYPE: &'static str = "annotation";

    pub fn new() -> Self {
        Self {
            layer: None,
            layer_id: String::new(),
            key: String::new(),
            value_type: ValueType::String,
            mode: ReadMode::Full,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for AnnotationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for AnnotationResolver {
    fn prepare_for_reading(&mut self, setup: &ResolverSetup<'_>) -> Result<(), ResolverError> {
        let layer_id = setup.options.require(Self::TYPE, options::LAYER)?;
        let key = setup.options.require(Self::TYPE, options::ANNOTATION_KEY)?;
        let (handle, manifest) = setup.converter.require(layer_id, LayerKind::Annotation)?;

        self.value_type = manifest
            .key(key)
            .map(|k| k.value_type)
            .unwrap_or_default();
        self.layer = Some(handle);
        self.layer_id = layer_id.to_string();
        self.key = key.to_string();
        self.mode = setup.mode;
        Ok(())
    }

    fn process(&mut self, ctx: &mut dyn ResolverContext) -> Result<Option<ItemId>, ResolverError> {
        let layer = self.layer.ok_or(ResolverError::NotPrepared(Self::TYPE))?;
        let raw = ctx.raw_data();
        let Some(value) = self.value_type.parse(raw) else {
            return Err(ResolverError::content(
                &self.layer_id,
                raw,
                format!("expected {} value for key '{}'", self.value_type.as_str(), self.key),
            ));
        };
        let Some(item) = ctx.item() else {
            return Err(ResolverError::content(
                &self.layer_id,
                raw,
                format!("no item to annotate with key '{}'", self.key),
            ));
        };

        if self.mode == ReadMode::Full {
            ctx.output()
                .annotations_mut(layer)
                .set(item, self.key.as_str(), value);
        }
        Ok(Some(item))
    }

    fn close(&mut self) {
        self.layer = None;
    }
}
