//! The Stage entity: the unit a merge session recombines.
//!
//! Stages arrive from the host editor as JSON records. Only the fields the
//! merge engine touches are modelled explicitly; everything else on the
//! record (artefacts, risks, escalation paths) rides along in `extra` and is
//! written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque stage identifier, unique within a working set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where a stage came from. Carried through a merge, never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageOrigin {
    #[default]
    Generated,
    Custom,
    AiMerged,
}

impl StageOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            StageOrigin::Generated => "generated",
            StageOrigin::Custom => "custom",
            StageOrigin::AiMerged => "ai-merged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,

    /// Display label. Only the draft stage's name is editable in a session.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Ordered sub-steps; display order is execution order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_steps: Vec<String>,

    #[serde(default, alias = "source")]
    pub origin: StageOrigin,

    /// Set only on the stage being assembled in the current session.
    #[serde(default, alias = "isNew", skip_serializing_if = "is_false")]
    pub is_draft: bool,

    /// Host fields the merge engine does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Stage {
    pub fn new(id: impl Into<StageId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            sub_steps: Vec::new(),
            origin: StageOrigin::default(),
            is_draft: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sub_steps<I, S>(mut self, sub_steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_steps = sub_steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_origin(mut self, origin: StageOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Whether the description holds any non-whitespace text.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// A stage with a blank description and no sub-steps.
    pub fn is_empty(&self) -> bool {
        !self.has_description() && self.sub_steps.is_empty()
    }

    /// Label shown for the stage at `position` (0-based) in the working set.
    pub fn display_name(&self, position: usize) -> String {
        if self.name.trim().is_empty() {
            format!("Step {}", position + 1)
        } else {
            self.name.clone()
        }
    }
}
