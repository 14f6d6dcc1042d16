use std::collections::HashMap;

use crate::manifest::LayerKind;
use crate::model::{ItemId, LayerHandle, Value};
use crate::resolver::{
    ProxyContext, ReadMode, Resolver, ResolverContext, ResolverError, ResolverOptions,
    ResolverSetup, options,
};
use crate::text::Span;

use super::AnnotationResolver;

const SEPARATOR: &str = "separator";
const ASSIGNMENT_SYMBOL: &str = "assignmentSymbol";
const ALLOW_UNKNOWN_KEYS: &str = "allowUnknownKeys";

/// Splits a cell like `Number=Sing|Person=3` into key/value assignments.
///
/// Keys declared by the annotation layer are forwarded to a nested
/// [`AnnotationResolver`] through a [`ProxyContext`]; other keys are stored
/// as raw strings when `allowUnknownKeys` is set and rejected otherwise.
pub struct PropertyListResolver {
    layer: Option<LayerHandle>,
    layer_id: String,
    separator: String,
    assignment_symbol: String,
    allow_unknown_keys: bool,
    mode: ReadMode,
    nested: HashMap<String, Box<dyn Resolver>>,
    /// `(key, value)` spans of the current cell, reused across rows.
    assignments: Vec<(Span, Span)>,
}

impl PropertyListResolver {
    pub const TYPE: &'static str = "property-list";

    pub fn new() -> Self {
        Self {
            layer: None,
            layer_id: String::new(),
            separator: "|".to_string(),
            assignment_symbol: "=".to_string(),
            allow_unknown_keys: false,
            mode: ReadMode::Full,
            nested: HashMap::new(),
            assignments: Vec::new(),
        }
    }

    pub fn nested_keys(&self) -> impl Iterator<Item = &str> {
        self.nested.keys().map(String::as_str)
    }

    /// Fills `self.assignments` from `raw`.
    ///
    /// A final assignment without trailing separator is kept; an empty tail
    /// after the last separator is dropped.
    fn split(&mut self, raw: &str) -> Result<(), ResolverError> {
        self.assignments.clear();
        let mut begin = 0;
        loop {
            let end = raw[begin..]
                .find(self.separator.as_str())
                .map_or(raw.len(), |i| begin + i);
            let part = &raw[begin..end];
            let last = end == raw.len();

            if part.is_empty() && last {
                break;
            }
            let Some(symbol) = part.find(self.assignment_symbol.as_str()) else {
                return Err(ResolverError::content(
                    &self.layer_id,
                    part,
                    format!("missing assignment symbol '{}'", self.assignment_symbol),
                ));
            };
            self.assignments.push((
                Span::new(begin, begin + symbol),
                Span::new(begin + symbol + self.assignment_symbol.len(), end),
            ));

            if last {
                break;
            }
            begin = end + self.separator.len();
        }
        Ok(())
    }
}

impl Default for PropertyListResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for PropertyListResolver {
    fn prepare_for_reading(&mut self, setup: &ResolverSetup<'_>) -> Result<(), ResolverError> {
        let layer_id = setup.options.require(Self::TYPE, options::LAYER)?;
        let (handle, manifest) = setup.converter.require(layer_id, LayerKind::Annotation)?;

        self.separator = setup.options.string_or(SEPARATOR, "|");
        self.assignment_symbol = setup.options.string_or(ASSIGNMENT_SYMBOL, "=");
        if self.separator.is_empty() || self.assignment_symbol.is_empty() {
            return Err(ResolverError::InvalidOption {
                option: format!("{SEPARATOR}/{ASSIGNMENT_SYMBOL}"),
                value: String::new(),
            });
        }
        self.allow_unknown_keys = setup.options.parse_or(ALLOW_UNKNOWN_KEYS, false)?;
        self.mode = setup.mode;

        for declared in &manifest.keys {
            let nested_options = ResolverOptions::new()
                .with(options::LAYER, layer_id)
                .with(options::ANNOTATION_KEY, declared.key.as_str());
            let mut nested = AnnotationResolver::new();
            nested.prepare_for_reading(&setup.with_options(&nested_options))?;
            self.nested.insert(declared.key.clone(), Box::new(nested));
        }

        self.layer = Some(handle);
        self.layer_id = layer_id.to_string();
        Ok(())
    }

    fn process(&mut self, ctx: &mut dyn ResolverContext) -> Result<Option<ItemId>, ResolverError> {
        let layer = self.layer.ok_or(ResolverError::NotPrepared(Self::TYPE))?;
        self.split(ctx.raw_data())?;
        let Some(item) = ctx.item() else {
            return Err(ResolverError::content(
                &self.layer_id,
                ctx.raw_data(),
                "no item to annotate",
            ));
        };

        for idx in 0..self.assignments.len() {
            let (key_span, value_span) = self.assignments[idx];
            let key = key_span.slice(ctx.raw_data());

            if let Some(nested) = self.nested.get_mut(key) {
                let mut proxy = ProxyContext::new(ctx, value_span);
                nested.process(&mut proxy)?;
            } else if self.allow_unknown_keys {
                if self.mode == ReadMode::Full {
                    let key = key.to_string();
                    let value = Value::String(value_span.slice(ctx.raw_data()).to_string());
                    ctx.output().annotations_mut(layer).set(item, key, value);
                }
            } else {
                return Err(ResolverError::UnknownKey {
                    layer: self.layer_id.clone(),
                    key: key.to_string(),
                });
            }
        }
        Ok(Some(item))
    }

    fn close(&mut self) {
        self.layer = None;
        for nested in self.nested.values_mut() {
            nested.close();
        }
        self.nested.clear();
        self.assignments.clear();
    }
}
