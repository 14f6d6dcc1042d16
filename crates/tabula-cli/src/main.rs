use anyhow::{Context, Result};
use std::{env, path::PathBuf, process};
use tabula_config::{ImportConfig, load_metadata, save_metadata};
use tabula_engine::{Converter, Importer, ResolverRegistry};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [--fresh] <import-config.toml>");
    eprintln!("  --fresh  ignore existing metadata and import every file again");
    process::exit(1);
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let (config_path, fresh) = match args.as_slice() {
        [_, path] => (PathBuf::from(path), false),
        [_, flag, path] if flag == "--fresh" => (PathBuf::from(path), true),
        _ => usage(args.first().map_or("tabula-cli", String::as_str)),
    };

    let config = match ImportConfig::load_from_path(&config_path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            eprintln!("Error: No config file at {}", config_path.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    log::info!("Loaded import config from {}", config_path.display());

    let converter = Converter::new(config.schema.clone(), config.manifest())
        .with_context(|| format!("Invalid schema '{}'", config.schema.id))?;
    let registry = ResolverRegistry::default();
    let mut importer = Importer::new(&converter, &registry, config.options())?;

    let metadata_path = config.metadata_file();
    if !fresh && let Some(metadata) = load_metadata(&metadata_path)? {
        importer = importer.resume(metadata);
        log::info!(
            "Resuming after {} recorded files from {}",
            importer.next_file(),
            metadata_path.display()
        );
    }

    let files = config.corpus_files()?;
    if importer.next_file() >= files.len() {
        log::info!("Nothing to import: all {} files are recorded", files.len());
    }

    for (index, file) in files.iter().enumerate().skip(importer.next_file()) {
        let text = config.read_corpus_file(file)?;
        let report = importer
            .import_file(index, &text)
            .with_context(|| format!("Failed to import {file}"))?;
        log::info!(
            "{file}: {} lines, {} containers, {} skipped",
            report.lines,
            report.containers,
            report.skipped.len()
        );
        // Persist after every file so an interrupted run can resume
        save_metadata(&metadata_path, importer.metadata())?;
    }

    let (_, metadata) = importer.finish();
    save_metadata(&metadata_path, &metadata)?;
    for (layer, meta) in &metadata.layers {
        log::info!("Layer '{layer}': {} members in {} files", meta.size, meta.files.len());
    }
    log::info!("Metadata written to {}", metadata_path.display());

    Ok(())
}
