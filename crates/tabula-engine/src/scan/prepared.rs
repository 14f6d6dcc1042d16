//! Schema blocks with every resolver created and bound.

use crate::converter::Converter;
use crate::model::{ContainerType, LayerHandle};
use crate::resolver::options::{ANNOTATION_KEY, LAYER};
use crate::resolver::{
    CacheProvider, PreparedResolver, ReadMode, ResolverError, ResolverOptions, ResolverRegistry,
    ResolverSetup,
};
use crate::resolvers::AnnotationResolver;
use crate::schema::{AttributeSchema, BlockSchema, ColumnSchema, ResolverSchema, SchemaError};

use super::cells::Separator;
use super::error::ScanError;
use super::matcher::Matcher;

pub(super) struct PreparedColumn {
    pub name: String,
    pub ignore: bool,
    pub targets_container: bool,
    pub resolver: Option<PreparedResolver>,
}

pub(super) struct PreparedAttribute {
    pub matcher: Matcher,
    pub resolver: Option<PreparedResolver>,
}

pub(super) struct PreparedBlock {
    pub layer: LayerHandle,
    pub layer_id: String,
    pub component_layer: Option<LayerHandle>,
    pub container_type: ContainerType,
    pub begin: Option<PreparedAttribute>,
    pub end: Option<Matcher>,
    pub separator: Separator,
    pub no_entry_label: Option<String>,
    pub columns: Vec<PreparedColumn>,
    pub fallback: Option<PreparedColumn>,
    pub attributes: Vec<PreparedAttribute>,
    pub blocks: Vec<PreparedBlock>,
}

impl PreparedBlock {
    pub fn is_leaf(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Every bound resolver of this block (not of nested blocks) in batch
    /// order: columns, fallback, attributes, begin delimiter.
    pub fn resolvers_mut(&mut self) -> impl Iterator<Item = &mut PreparedResolver> {
        let columns = self
            .columns
            .iter_mut()
            .chain(self.fallback.iter_mut())
            .filter_map(|c| c.resolver.as_mut());
        let attributes = self
            .attributes
            .iter_mut()
            .chain(self.begin.iter_mut())
            .filter_map(|a| a.resolver.as_mut());
        columns.chain(attributes)
    }

    pub fn close(&mut self) {
        self.resolvers_mut().for_each(PreparedResolver::close);
        self.blocks.iter_mut().for_each(PreparedBlock::close);
    }
}

/// Builds [`PreparedBlock`]s, creating resolvers through the registry.
pub(super) struct Binder<'a> {
    pub converter: &'a Converter,
    pub registry: &'a ResolverRegistry,
    pub mode: ReadMode,
    pub cache: &'a dyn CacheProvider,
}

fn located<T, E: Into<ResolverError>>(
    result: Result<T, E>,
    location: impl FnOnce() -> String,
) -> Result<T, ScanError> {
    result.map_err(|err| ScanError::Prepare {
        location: location(),
        source: err.into(),
    })
}

impl Binder<'_> {
    pub fn block(&self, schema: &BlockSchema) -> Result<PreparedBlock, ScanError> {
        let name = || format!("block '{}'", schema.layer);

        let (layer, _) = located(self.converter.lookup(&schema.layer), name)?;
        let component_layer = schema
            .component_layer
            .as_deref()
            .map(|l| self.converter.lookup(l).map(|(handle, _)| handle))
            .transpose();
        let component_layer = located(component_layer, name)?;
        let separator = Separator::parse(&schema.separator).ok_or_else(|| {
            SchemaError::EmptySeparator {
                block: schema.layer.clone(),
            }
        });
        let separator = located(separator, name)?;

        let begin = schema
            .begin
            .as_ref()
            .map(|a| self.attribute(a, &schema.layer))
            .transpose()?;
        let end = schema
            .end
            .as_ref()
            .map(|a| located(Matcher::compile(a), name))
            .transpose()?;
        let columns = schema
            .positional_columns()
            .map(|c| self.column(c, &schema.layer))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = schema
            .fallback_column()
            .map(|c| self.column(c, &schema.layer))
            .transpose()?;
        let attributes = schema
            .attributes
            .iter()
            .map(|a| self.attribute(a, &schema.layer))
            .collect::<Result<Vec<_>, _>>()?;
        let blocks = schema
            .blocks
            .iter()
            .map(|b| self.block(b))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreparedBlock {
            layer,
            layer_id: schema.layer.clone(),
            component_layer,
            container_type: schema.container_type,
            begin,
            end,
            separator,
            no_entry_label: schema.no_entry_label.clone(),
            columns,
            fallback,
            attributes,
            blocks,
        })
    }

    fn column(&self, column: &ColumnSchema, block: &str) -> Result<PreparedColumn, ScanError> {
        let location = || format!("column '{}' of block '{block}'", column.name);
        let resolver = if column.ignore {
            None
        } else {
            let bound = self.bind(
                column.layer.as_deref(),
                column.annotation_key.as_deref(),
                column.resolver.as_ref(),
            );
            let unbound = || SchemaError::UnboundColumn {
                block: block.to_string(),
                column: column.name.clone(),
            };
            let bound = bound.and_then(|r| r.ok_or_else(|| unbound().into()));
            Some(located(bound, location)?)
        };

        Ok(PreparedColumn {
            name: column.name.clone(),
            ignore: column.ignore,
            targets_container: column.targets_container(),
            resolver,
        })
    }

    fn attribute(
        &self,
        attribute: &AttributeSchema,
        block: &str,
    ) -> Result<PreparedAttribute, ScanError> {
        let location = || format!("attribute '{}' of block '{block}'", attribute.pattern);
        let matcher = located(Matcher::compile(attribute), location)?;
        let resolver = located(
            self.bind(
                attribute.layer.as_deref(),
                attribute.annotation_key.as_deref(),
                attribute.resolver.as_ref(),
            ),
            location,
        )?;
        Ok(PreparedAttribute { matcher, resolver })
    }

    /// Explicit resolver first, else a plain annotation resolver when an
    /// annotation key is declared. `None` when there is no binding at all.
    fn bind(
        &self,
        layer: Option<&str>,
        annotation_key: Option<&str>,
        resolver: Option<&ResolverSchema>,
    ) -> Result<Option<PreparedResolver>, ResolverError> {
        let (kind, mut resolver_options) = match (resolver, annotation_key) {
            (Some(r), _) => (r.kind.as_str(), ResolverOptions::from(r.options.clone())),
            (None, Some(_)) => (AnnotationResolver::TYPE, ResolverOptions::new()),
            (None, None) => return Ok(None),
        };
        if let Some(layer) = layer
            && resolver_options.get(LAYER).is_none()
        {
            resolver_options.insert(LAYER, layer);
        }
        if let Some(key) = annotation_key
            && resolver_options.get(ANNOTATION_KEY).is_none()
        {
            resolver_options.insert(ANNOTATION_KEY, key);
        }

        let bound = self.registry.create(kind)?;
        let setup = ResolverSetup {
            converter: self.converter,
            mode: self.mode,
            cache: self.cache,
            options: &resolver_options,
        };
        PreparedResolver::prepare(bound, &setup).map(Some)
    }
}
