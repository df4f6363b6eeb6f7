//! Build errors.

use crate::context::Stage;
use crate::domain::Domain;
use crate::model::ModelError;
use std::path::PathBuf;

/// Everything that can abort a scenario build
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot read document '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse document '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid {domain} document: {reason}")]
    InvalidDocument { domain: Domain, reason: String },

    #[error("no builder registered for ({domain}, \"{type_tag}\")")]
    NoBuilder { domain: Domain, type_tag: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("documents can only be loaded during the Config stage")]
    DocumentsSealed,

    #[error("no routing protocol list is being assembled")]
    NoRoutingAccumulator,

    #[error("install failed in stage {stage} on {domain}{}: {source}", location(.entry_index, .node_id, .link_id))]
    Stage {
        stage: Stage,
        domain: Domain,
        node_id: Option<u32>,
        link_id: Option<u32>,
        /// Position of the failing entry in its document's list
        entry_index: Option<usize>,
        #[source]
        source: Box<BuildError>,
    },
}

impl BuildError {
    pub fn missing(field: impl Into<String>) -> Self {
        BuildError::MissingField { field: field.into() }
    }

    pub fn invalid(field: impl Into<String>, reason: impl ToString) -> Self {
        BuildError::InvalidField {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// The innermost error, looking through stage annotations
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn location(entry_index: &Option<usize>, node_id: &Option<u32>, link_id: &Option<u32>) -> String {
    let mut parts = Vec::new();
    if let Some(index) = entry_index {
        parts.push(format!("entry {}", index));
    }
    if let Some(node) = node_id {
        parts.push(format!("node {}", node));
    }
    if let Some(link) = link_id {
        parts.push(format!("link {}", link));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}
