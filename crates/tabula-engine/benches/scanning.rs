use criterion::{Criterion, criterion_group, criterion_main};
use tabula_engine::{
    AnnotationKeyManifest, AttributeSchema, BlockSchema, ColumnSchema, Converter, CorpusManifest,
    ImportOptions, Importer, LayerManifest, ResolverRegistry, ResolverSchema, TableSchema,
    ValueType,
};

fn converter() -> Converter {
    let manifest = CorpusManifest::new([
        LayerManifest::item("tokens"),
        LayerManifest::item("sentences"),
        LayerManifest::annotation(
            "anno",
            [
                AnnotationKeyManifest::new("form", ValueType::String),
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
        LayerManifest::structure("syntax"),
    ]);

    let mut block = BlockSchema::new("sentences");
    block.component_layer = Some("tokens".into());
    block.end = Some(AttributeSchema::plain(""));
    block.no_entry_label = Some("_".into());
    block.columns = vec![
        ColumnSchema::ignored("ID"),
        ColumnSchema::annotation("FORM", "anno", "form"),
        ColumnSchema::annotation("POS", "anno", "pos"),
        ColumnSchema::resolved("FEATS", "feats", ResolverSchema::new("property-list")),
        ColumnSchema::resolved("HEAD", "syntax", ResolverSchema::new("dependency")),
    ];
    let schema = TableSchema {
        id: "bench".into(),
        description: None,
        root: block,
    };
    Converter::new(schema, manifest).unwrap()
}

/// `sentences` sentences of `length` tokens, each attached to its predecessor.
fn generate_conll(sentences: usize, length: usize) -> String {
    let mut text = String::new();
    for _ in 0..sentences {
        for row in 1..=length {
            let feats = if row % 2 == 0 { "Number=Sing|Person=3" } else { "_" };
            text.push_str(&format!("{row}\tword{row}\tNN\t{feats}\t{}\n", row - 1));
        }
        text.push('\n');
    }
    text
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanning");
    group.sample_size(10);

    let converter = converter();
    let registry = ResolverRegistry::default();

    for (name, length) in [("short_sentences", 8), ("long_sentences", 120)] {
        let content = generate_conll(2_000 / length * 10, length);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut importer =
                    Importer::new(&converter, &registry, ImportOptions::default()).unwrap();
                let report = importer
                    .import_file(0, std::hint::black_box(&content))
                    .unwrap();
                std::hint::black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_import);
criterion_main!(benches);
