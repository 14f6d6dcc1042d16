//! Shared fixtures for unit tests.

use crate::converter::Converter;
use crate::manifest::{AnnotationKeyManifest, CorpusManifest, LayerManifest, ValueType};
use crate::model::{Container, ContainerType, ImportOutput, ItemId, LayerHandle};
use crate::resolver::{
    NoCache, ReadMode, Resolver, ResolverContext, ResolverError, ResolverOptions, ResolverSetup,
};
use crate::schema::{AttributeSchema, BlockSchema, ColumnSchema, ResolverSchema, TableSchema};

/// Layers: tokens, sentences, anno (form/lemma/pos), feats (Number, Person),
/// misc (no declared keys), syntax.
pub fn conll_manifest() -> CorpusManifest {
    CorpusManifest::new([
        LayerManifest::item("tokens"),
        LayerManifest::item("sentences"),
        LayerManifest::annotation(
            "anno",
            [
                AnnotationKeyManifest::new("form", ValueType::String),
                AnnotationKeyManifest::new("lemma", ValueType::String),
                AnnotationKeyManifest::new("pos", ValueType::String),
            ],
        ),
        LayerManifest::annotation(
            "feats",
            [
                AnnotationKeyManifest::new("Number", ValueType::String),
                AnnotationKeyManifest::new("Person", ValueType::Integer),
            ],
        ),
        LayerManifest::annotation("misc", Vec::new()),
        LayerManifest::structure("syntax"),
    ])
}

/// `ID FORM LEMMA POS FEATS HEAD`, sentences separated by blank lines.
pub fn conll_block() -> BlockSchema {
    let mut block = BlockSchema::new("sentences");
    block.component_layer = Some("tokens".into());
    block.end = Some(AttributeSchema::plain(""));
    block.no_entry_label = Some("_".into());
    block.columns = vec![
        ColumnSchema::ignored("ID"),
        ColumnSchema::annotation("FORM", "anno", "form"),
        ColumnSchema::annotation("LEMMA", "anno", "lemma"),
        ColumnSchema::annotation("POS", "anno", "pos"),
        ColumnSchema::resolved("FEATS", "feats", ResolverSchema::new("property-list")),
        ColumnSchema::resolved("HEAD", "syntax", ResolverSchema::new("dependency")),
    ];
    block
}

pub fn conll_schema() -> TableSchema {
    TableSchema {
        id: "conll-test".into(),
        description: None,
        root: conll_block(),
    }
}

pub fn conll_converter() -> Converter {
    Converter::new(conll_schema(), conll_manifest()).expect("test schema is valid")
}

pub fn prepare(
    resolver: &mut dyn Resolver,
    converter: &Converter,
    options: &ResolverOptions,
    mode: ReadMode,
) -> Result<(), ResolverError> {
    resolver.prepare_for_reading(&ResolverSetup {
        converter,
        mode,
        cache: &NoCache,
        options,
    })
}

/// A resolver context over a container of `rows` token items.
pub struct TestContext {
    pub raw: String,
    pub item: Option<ItemId>,
    pub container: Container,
    pub index: usize,
    pub output: ImportOutput,
}

impl TestContext {
    pub fn new(rows: usize) -> Self {
        let mut container = Container::new(ItemId::new(LayerHandle(1), 0), ContainerType::List);
        container.items = (0..rows as u64)
            .map(|i| ItemId::new(LayerHandle(0), 100 + i))
            .collect();
        Self {
            raw: String::new(),
            item: None,
            container,
            index: 0,
            output: ImportOutput::default(),
        }
    }

    /// Positions the context on `row` with cell text `raw`.
    pub fn at_row(mut self, row: usize, raw: &str) -> Self {
        self.raw = raw.to_string();
        self.index = row;
        self.item = self.container.item_at(row);
        self
    }
}

impl ResolverContext for TestContext {
    fn raw_data(&self) -> &str {
        &self.raw
    }

    fn item(&self) -> Option<ItemId> {
        self.item
    }

    fn container(&self) -> &Container {
        &self.container
    }

    fn index(&self) -> usize {
        self.index
    }

    fn output(&mut self) -> &mut ImportOutput {
        &mut self.output
    }
}
