use pretty_assertions::assert_eq;
use tabula_engine::{
    AnnotationKeyManifest, AttributeSchema, BlockSchema, ColumnSchema, Container, Converter,
    CorpusManifest, ErrorPolicy, ImportError, ImportOptions, ImportOutput, Importer, ItemId,
    LayerManifest, Member, Node, ResolverRegistry, ResolverSchema, Structure, TableSchema, Value,
    ValueType,
};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.conll",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn manifest() -> CorpusManifest {
    CorpusManifest::new([
        LayerManifest::item("tokens"),
        LayerManifest::item("sentences"),
        LayerManifest::item("documents"),
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

fn schema() -> TableSchema {
    let mut sentence = BlockSchema::new("sentences");
    sentence.component_layer = Some("tokens".into());
    sentence.end = Some(AttributeSchema::plain(""));
    sentence.no_entry_label = Some("_".into());
    sentence.attributes =
        vec![AttributeSchema::regex(r"^# text = (.*)$").annotated("misc", "text")];
    sentence.columns = vec![
        ColumnSchema::ignored("ID"),
        ColumnSchema::annotation("FORM", "anno", "form"),
        ColumnSchema::annotation("LEMMA", "anno", "lemma"),
        ColumnSchema::annotation("POS", "anno", "pos"),
        ColumnSchema::resolved("FEATS", "feats", ResolverSchema::new("property-list")),
        ColumnSchema::resolved(
            "HEAD",
            "syntax",
            ResolverSchema::new("dependency").with_option("offset", "1"),
        ),
    ];

    let mut document = BlockSchema::new("documents");
    document.begin =
        Some(AttributeSchema::regex(r"^#begin document \((.*)\)$").annotated("misc", "name"));
    document.end = Some(AttributeSchema::plain("#end document"));
    document.blocks = vec![sentence];

    TableSchema {
        id: "news".into(),
        description: Some("CoNLL sentences grouped into documents".into()),
        root: document,
    }
}

struct Corpus {
    converter: Converter,
}

impl Corpus {
    fn new() -> Self {
        Self {
            converter: Converter::new(schema(), manifest()).unwrap(),
        }
    }

    fn id(&self, layer: &str, index: u64) -> ItemId {
        ItemId::new(self.converter.handle(layer).unwrap(), index)
    }

    fn annotation<'o>(
        &self,
        output: &'o ImportOutput,
        layer: &str,
        item: ItemId,
        key: &str,
    ) -> Option<&'o Value> {
        output
            .annotations(self.converter.handle(layer)?)?
            .get(item, key)
    }

    fn member<'o>(&self, output: &'o ImportOutput, layer: &str, index: u64) -> &'o Member {
        output
            .layer(self.converter.handle(layer).unwrap())
            .and_then(|l| l.get(index))
            .unwrap()
    }

    fn container<'o>(&self, output: &'o ImportOutput, layer: &str, index: u64) -> &'o Container {
        match self.member(output, layer, index) {
            Member::Container(c) => c,
            other => panic!("expected a container, got {other:?}"),
        }
    }

    fn structure<'o>(&self, output: &'o ImportOutput, index: u64) -> &'o Structure {
        match self.member(output, "syntax", index) {
            Member::Structure(s) => s,
            other => panic!("expected a structure, got {other:?}"),
        }
    }

    fn form(&self, output: &ImportOutput, node: Node) -> String {
        match node {
            Node::Root => "ROOT".to_string(),
            Node::Item(id) => self
                .annotation(output, "anno", id, "form")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string(),
        }
    }
}

#[test]
fn documents_hold_sentences_with_their_attributes() {
    // Given a fixture with two documents and three sentences
    let corpus = Corpus::new();
    let registry = ResolverRegistry::default();
    let mut importer =
        Importer::new(&corpus.converter, &registry, ImportOptions::default()).unwrap();

    // When imported
    let report = importer.import_file(0, &fixture("news")).unwrap();
    let (output, _) = importer.finish();

    // Then documents contain sentences and line attributes land on containers
    assert_eq!(report.containers, 5);
    assert_eq!(report.members("tokens"), 10);
    assert_eq!(
        corpus.container(&output, "documents", 0).items,
        vec![corpus.id("sentences", 0), corpus.id("sentences", 1)]
    );
    assert_eq!(
        corpus.annotation(&output, "misc", corpus.id("documents", 1), "name"),
        Some(&Value::String("news-2".into()))
    );
    assert_eq!(
        corpus.annotation(&output, "misc", corpus.id("sentences", 1), "text"),
        Some(&Value::String("It slept .".into()))
    );
    assert_eq!(
        corpus.annotation(&output, "feats", corpus.id("tokens", 2), "Person"),
        Some(&Value::Integer(3))
    );
}

#[test]
fn dependency_edges_follow_heads() {
    let corpus = Corpus::new();
    let registry = ResolverRegistry::default();
    let mut importer =
        Importer::new(&corpus.converter, &registry, ImportOptions::default()).unwrap();
    importer.import_file(0, &fixture("news")).unwrap();
    let (output, _) = importer.finish();

    let structure = corpus.structure(&output, 0);
    let edges: Vec<String> = structure
        .edges()
        .iter()
        .map(|edge| {
            let source = edge.source.map_or("UNSET".to_string(), |s| corpus.form(&output, s));
            format!("{source} -> {}", corpus.form(&output, edge.target))
        })
        .collect();

    insta::assert_yaml_snapshot!(edges, @r"
    - cat -> The
    - sat -> cat
    - ROOT -> sat
    - sat -> .
    ");
    assert_eq!(structure.base_container(), corpus.id("sentences", 0));
}

#[test]
fn skipped_sentence_keeps_the_rest_of_the_file() {
    // Given a clean file followed by one with a malformed FEATS cell
    let corpus = Corpus::new();
    let registry = ResolverRegistry::default();
    let options = ImportOptions {
        policy: ErrorPolicy::SkipBlock,
        ..ImportOptions::default()
    };
    let mut importer = Importer::new(&corpus.converter, &registry, options).unwrap();

    // When both are imported with SkipBlock
    importer.import_file(0, &fixture("news")).unwrap();
    let report = importer.import_file(1, &fixture("broken")).unwrap();
    let (output, metadata) = importer.finish();

    // Then only the malformed sentence is missing and indices stay dense
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, Some(3));
    assert_eq!(report.layers["tokens"].begin, 10);
    assert_eq!(report.members("tokens"), 3);
    assert_eq!(
        corpus.container(&output, "documents", 2).items,
        vec![corpus.id("sentences", 3)]
    );
    assert_eq!(
        corpus.annotation(&output, "anno", corpus.id("tokens", 10), "form"),
        Some(&Value::String("Fish".into()))
    );

    let sentences = metadata.layer("sentences").unwrap();
    assert_eq!(sentences.size, 4);
    let counts = sentences.item_counts.unwrap();
    assert_eq!((counts.min, counts.max, counts.samples), (3, 4, 4));
    assert_eq!(metadata.layer("syntax").unwrap().container_types["tree"], 4);
}

#[test]
fn abort_policy_rejects_the_whole_file() {
    let corpus = Corpus::new();
    let registry = ResolverRegistry::default();
    let mut importer =
        Importer::new(&corpus.converter, &registry, ImportOptions::default()).unwrap();

    let err = importer.import_file(0, &fixture("broken")).unwrap_err();

    assert!(matches!(err, ImportError::File { file: 0, .. }));
    assert!(err.to_string().contains("Number"));
    assert!(importer.output().is_empty());
}
