use std::path::{Path, PathBuf};

use revlog_capture::CaptureConfig;
use revlog_types::DocumentFields;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for a [`Revisions`](crate::Revisions) instance.
///
/// Every field has a default, so a TOML file only lists what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionsConfig {
    /// Entity type that roots an aggregate.
    pub root_type: String,
    /// Collection holding the content documents.
    pub collection: String,
    /// Field on non-root documents referencing their root.
    pub owner_field: String,
    /// Top-level fields ignored when deciding whether a change is recorded.
    pub volatile_fields: Vec<String>,
    /// Default number of entries returned by `history`.
    pub history_limit: usize,
    /// Directory for revision set files. In memory when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for RevisionsConfig {
    fn default() -> Self {
        Self {
            root_type: "course".into(),
            collection: "content".into(),
            owner_field: "_courseId".into(),
            volatile_fields: vec!["createdAt".into(), "updatedAt".into()],
            history_limit: 100,
            log_dir: None,
        }
    }
}

impl RevisionsConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn document_fields(&self) -> DocumentFields {
        DocumentFields {
            owner: self.owner_field.clone(),
            ..DocumentFields::default()
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            root_type: self.root_type.clone(),
            volatile_fields: self.volatile_fields.clone(),
            fields: self.document_fields(),
        }
    }
}
