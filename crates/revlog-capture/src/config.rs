use revlog_types::DocumentFields;
use serde::{Deserialize, Serialize};

/// Settings for change capture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Entity type that roots an aggregate.
    pub root_type: String,
    /// Top-level fields whose changes alone are not worth a revision.
    pub volatile_fields: Vec<String>,
    /// Identity fields of captured documents.
    pub fields: DocumentFields,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            root_type: "course".into(),
            volatile_fields: vec!["createdAt".into(), "updatedAt".into()],
            fields: DocumentFields::default(),
        }
    }
}
