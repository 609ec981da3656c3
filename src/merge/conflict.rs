//! Description collisions awaiting a user decision.

use serde::{Deserialize, Serialize};

use crate::types::StageId;

/// A description dropped onto a stage that already has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConflict {
    pub target_stage: StageId,
    pub incoming_text: String,
    pub source_stage: StageId,
}

impl PendingConflict {
    /// Destination description if the user picks `Append`.
    pub fn appended(&self, current: &str, separator: &str) -> String {
        format!("{current}{separator}{}", self.incoming_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictChoice {
    Replace,
    Append,
}

/// `Hidden` or `Visible(conflict)`. While visible, nothing else may mutate
/// the working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConflictGate {
    #[default]
    Hidden,
    Visible(PendingConflict),
}

impl ConflictGate {
    pub fn is_visible(&self) -> bool {
        matches!(self, ConflictGate::Visible(_))
    }

    pub fn pending(&self) -> Option<&PendingConflict> {
        match self {
            ConflictGate::Visible(conflict) => Some(conflict),
            ConflictGate::Hidden => None,
        }
    }

    pub fn open(&mut self, conflict: PendingConflict) {
        tracing::debug!(
            target_stage = %conflict.target_stage,
            source_stage = %conflict.source_stage,
            "Description conflict awaiting decision"
        );
        *self = ConflictGate::Visible(conflict);
    }

    /// Hide the gate, handing back the conflict it held.
    pub fn take(&mut self) -> Option<PendingConflict> {
        match std::mem::take(self) {
            ConflictGate::Visible(conflict) => Some(conflict),
            ConflictGate::Hidden => None,
        }
    }
}
