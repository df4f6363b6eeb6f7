use crate::entry::Document;
use crate::error::BuildError;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Document formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` and `.yml` files are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Load and parse one configuration document. Every call re-reads the file.
pub fn load_document(path: &Path) -> Result<Document, BuildError> {
    info!("Loading document from: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = DocumentFormat::from_path(path);
    debug!("Parsing {:?} as {:?}", path, format);

    let parsed: Result<Document, String> = match format {
        DocumentFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| BuildError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Resolve a sub-document reference against the directory of the root document.
/// Absolute references are used as they are.
pub fn resolve_relative(root: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        return reference.to_path_buf();
    }
    match root.parent() {
        Some(dir) => dir.join(reference),
        None => reference.to_path_buf(),
    }
}
