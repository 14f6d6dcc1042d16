use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabula_engine::{
    CorpusManifest, CorpusMetadata, ErrorPolicy, ImportOptions, LayerManifest, ReadMode,
    TableSchema,
};
use thiserror::Error;

/// Metadata file name used when the config does not name one.
pub const DEFAULT_METADATA_FILE: &str = "tabula-metadata.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Failed to list files matching '{pattern}': {source}")]
    GlobError {
        pattern: String,
        source: glob::GlobError,
    },

    #[error("Corpus file not found: {0}")]
    CorpusFileNotFound(PathBuf),

    #[error("Corpus file {0} is outside the corpus root or not valid UTF-8")]
    InvalidCorpusPath(PathBuf),

    #[error("Failed to read corpus file {path}: {source}")]
    CorpusReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read metadata file at {path}: {source}")]
    MetadataReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse metadata file at {path}: {source}")]
    MetadataParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One import run: where the corpus lives, which files to read in which
/// order, and the schema and layers to read them with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub corpus_root: PathBuf,
    /// Paths or glob patterns relative to `corpus_root`. Files are imported
    /// in the order listed; matches of one pattern in sorted order.
    pub files: Vec<RelativePathBuf>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Validate content without storing structures or annotations.
    #[serde(default)]
    pub scan_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,
    pub layers: Vec<LayerManifest>,
    pub schema: TableSchema,
}

impl ImportConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: ImportConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Relative roots are taken from the config file's directory
        config.corpus_root = expand_path(&config.corpus_root).unwrap_or(config.corpus_root);
        if config.corpus_root.is_relative()
            && let Some(parent) = config_path.parent()
        {
            config.corpus_root = parent.join(&config.corpus_root);
        }
        config.metadata_path = config
            .metadata_path
            .map(|path| expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn manifest(&self) -> CorpusManifest {
        CorpusManifest::new(self.layers.iter().cloned())
    }

    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            policy: self.error_policy,
            mode: if self.scan_only {
                ReadMode::Scan
            } else {
                ReadMode::Full
            },
        }
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.metadata_path
            .clone()
            .unwrap_or_else(|| self.corpus_root.join(DEFAULT_METADATA_FILE))
    }

    /// Resolves `files` into the ordered list of corpus files. A file listed
    /// twice is imported once, at its first position.
    pub fn corpus_files(&self) -> Result<Vec<RelativePathBuf>, ConfigError> {
        let mut files: Vec<RelativePathBuf> = Vec::new();
        for entry in &self.files {
            for file in self.resolve_entry(entry)? {
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }
        Ok(files)
    }

    fn resolve_entry(&self, entry: &RelativePath) -> Result<Vec<RelativePathBuf>, ConfigError> {
        if !is_pattern(entry.as_str()) {
            let path = entry.to_path(&self.corpus_root);
            if !path.is_file() {
                return Err(ConfigError::CorpusFileNotFound(path));
            }
            return Ok(vec![entry.normalize()]);
        }

        let pattern = entry.to_path(&self.corpus_root).to_string_lossy().into_owned();
        let paths = glob::glob(&pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: entry.to_string(),
            source,
        })?;

        let mut files = Vec::new();
        for path in paths {
            let path = path.map_err(|source| ConfigError::GlobError {
                pattern: entry.to_string(),
                source,
            })?;
            if !path.is_file() {
                continue;
            }
            let relative = path
                .strip_prefix(&self.corpus_root)
                .ok()
                .and_then(|p| RelativePathBuf::from_path(p).ok())
                .ok_or_else(|| ConfigError::InvalidCorpusPath(path.clone()))?;
            files.push(relative);
        }
        files.sort();
        Ok(files)
    }

    pub fn read_corpus_file(&self, file: &RelativePath) -> Result<String, ConfigError> {
        let path = file.to_path(&self.corpus_root);
        std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::CorpusReadError { path, source })
    }
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

fn expand_path(path: &Path) -> Option<PathBuf> {
    let path_str = path.to_string_lossy();
    match shellexpand::full(&path_str) {
        Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
        Err(_) => None,
    }
}

/// Loads persisted metadata. `None` if the file does not exist yet.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Option<CorpusMetadata>, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::MetadataReadError {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::MetadataParseError {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_metadata<P: AsRef<Path>>(path: P, metadata: &CorpusMetadata) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(metadata)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tabula_engine::{ContainerType, LayerKind, PatternType, ValueType};
    use tempfile::TempDir;

    const CONFIG: &str = r#"
corpus_root = "corpus"
files = ["train/*.conll", "extra.conll"]
error_policy = "skip-block"

[[layers]]
id = "tokens"
kind = "item"

[[layers]]
id = "sentences"
kind = "item"

[[layers]]
id = "anno"
kind = "annotation"
keys = [{ key = "form" }, { key = "head", value_type = "integer" }]

[[layers]]
id = "syntax"
kind = "structure"

[schema]
id = "conll"

[schema.root]
layer = "sentences"
component_layer = "tokens"
no_entry_label = "_"
end = { pattern = "" }

[[schema.root.attributes]]
pattern = "^# text = (.*)$"
pattern_type = "regex"
layer = "anno"
annotation_key = "text"

[[schema.root.columns]]
name = "ID"
ignore = true

[[schema.root.columns]]
name = "FORM"
layer = "anno"
annotation_key = "form"

[[schema.root.columns]]
name = "HEAD"
layer = "syntax"
resolver = { type = "dependency", options = { offset = "1", rootLabel = "0" } }
"#;

    fn write_config(dir: &TempDir) -> PathBuf {
        let config_file = dir.path().join("import.toml");
        std::fs::write(&config_file, CONFIG).unwrap();
        config_file
    }

    fn touch(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "1\tThe\t0\n").unwrap();
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = ImportConfig::load_from_path(temp_dir.path().join("missing.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImportConfig::load_from_path(write_config(&temp_dir))
            .unwrap()
            .unwrap();

        assert_eq!(config.corpus_root, temp_dir.path().join("corpus"));
        assert_eq!(config.error_policy, ErrorPolicy::SkipBlock);
        assert_eq!(config.options().mode, ReadMode::Full);
        assert_eq!(config.layers[2].kind, LayerKind::Annotation);
        assert_eq!(config.layers[2].keys[1].value_type, ValueType::Integer);

        let root = &config.schema.root;
        assert_eq!(root.separator, "TAB");
        assert_eq!(root.container_type, ContainerType::List);
        assert_eq!(root.attributes[0].pattern_type, PatternType::Regex);
        assert!(root.columns[0].ignore);
        let resolver = root.columns[2].resolver.as_ref().unwrap();
        assert_eq!(resolver.kind, "dependency");
        assert_eq!(resolver.options.get("rootLabel").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("broken.toml");
        std::fs::write(&config_file, "corpus_root = 3").unwrap();

        let err = ImportConfig::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_corpus_root_with_env_var() {
        unsafe {
            env::set_var("TABULA_TEST_CORPUS", "/data/corpora");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("import.toml");
        std::fs::write(
            &config_file,
            CONFIG.replace(
                r#"corpus_root = "corpus""#,
                r#"corpus_root = "$TABULA_TEST_CORPUS/ud""#,
            ),
        )
        .unwrap();

        let config = ImportConfig::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.corpus_root, PathBuf::from("/data/corpora/ud"));
        unsafe {
            env::remove_var("TABULA_TEST_CORPUS");
        }
    }

    #[test]
    fn test_corpus_files_keep_listed_order() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImportConfig::load_from_path(write_config(&temp_dir))
            .unwrap()
            .unwrap();
        let corpus = temp_dir.path().join("corpus");
        touch(&corpus, "train/b.conll");
        touch(&corpus, "train/a.conll");
        touch(&corpus, "train/notes.txt");
        touch(&corpus, "extra.conll");

        let files = config.corpus_files().unwrap();

        assert_eq!(
            files,
            vec![
                RelativePathBuf::from("train/a.conll"),
                RelativePathBuf::from("train/b.conll"),
                RelativePathBuf::from("extra.conll"),
            ]
        );
        assert_eq!(
            config.read_corpus_file(&files[2]).unwrap(),
            "1\tThe\t0\n"
        );
    }

    #[test]
    fn test_missing_listed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImportConfig::load_from_path(write_config(&temp_dir))
            .unwrap()
            .unwrap();

        let err = config.corpus_files().unwrap_err();

        assert!(
            matches!(err, ConfigError::CorpusFileNotFound(ref p) if p.ends_with("extra.conll"))
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImportConfig::load_from_path(write_config(&temp_dir))
            .unwrap()
            .unwrap();
        let saved = temp_dir.path().join("nested/saved.toml");

        config.save_to_path(&saved).unwrap();
        let mut loaded = ImportConfig::load_from_path(&saved).unwrap().unwrap();
        loaded.corpus_root = config.corpus_root.clone();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_metadata_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("meta/metadata.toml");
        assert!(load_metadata(&path).unwrap().is_none());

        let mut metadata = CorpusMetadata::default();
        let layer = metadata.layer_mut("sentences");
        layer.size = 12;
        layer.container_types.insert("list".into(), 3);
        save_metadata(&path, &metadata).unwrap();

        let loaded = load_metadata(&path).unwrap().unwrap();
        assert_eq!(loaded, metadata);
    }

    #[test]
    fn test_default_metadata_file_is_in_corpus_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImportConfig::load_from_path(write_config(&temp_dir))
            .unwrap()
            .unwrap();

        assert_eq!(
            config.metadata_file(),
            temp_dir.path().join("corpus").join(DEFAULT_METADATA_FILE)
        );
    }
}
