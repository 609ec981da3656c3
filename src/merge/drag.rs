//! Drag gesture state machine.
//!
//! `Idle -> Dragging -> Idle`. While dragging, the session tracks the drop
//! target currently under the pointer so views can highlight it and sub-step
//! drops know where to insert.

use serde::{Deserialize, Serialize};

use crate::types::{Stage, StageId};

/// What kind of content a payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Description,
    SubStep,
}

/// Content picked up by an active gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragPayload {
    Description {
        text: String,
        source_stage: StageId,
    },
    SubStep {
        text: String,
        source_stage: StageId,
        source_index: usize,
    },
}

impl DragPayload {
    /// Pick up a stage's description. `None` if the description is blank.
    pub fn description_of(stage: &Stage) -> Option<Self> {
        stage.has_description().then(|| DragPayload::Description {
            text: stage.description.clone(),
            source_stage: stage.id.clone(),
        })
    }

    /// Pick up the sub-step at `index`. `None` if there is no such item.
    pub fn sub_step_of(stage: &Stage, index: usize) -> Option<Self> {
        stage.sub_steps.get(index).map(|text| DragPayload::SubStep {
            text: text.clone(),
            source_stage: stage.id.clone(),
            source_index: index,
        })
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            DragPayload::Description { .. } => PayloadKind::Description,
            DragPayload::SubStep { .. } => PayloadKind::SubStep,
        }
    }

    pub fn source_stage(&self) -> &StageId {
        match self {
            DragPayload::Description { source_stage, .. }
            | DragPayload::SubStep { source_stage, .. } => source_stage,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DragPayload::Description { text, .. } | DragPayload::SubStep { text, .. } => text,
        }
    }
}

/// Zone a payload can be released onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    /// The stage's description area. Accepts descriptions only.
    StageBody { stage: StageId },
    /// The stage's sub-step list. Accepts sub-steps only; `insert_before`
    /// is set when hovering an existing item.
    SubStepList {
        stage: StageId,
        #[serde(default)]
        insert_before: Option<usize>,
    },
}

impl DropTarget {
    pub fn stage(&self) -> &StageId {
        match self {
            DropTarget::StageBody { stage } | DropTarget::SubStepList { stage, .. } => stage,
        }
    }

    pub fn accepts(&self, kind: PayloadKind) -> bool {
        matches!(
            (self, kind),
            (DropTarget::StageBody { .. }, PayloadKind::Description)
                | (DropTarget::SubStepList { .. }, PayloadKind::SubStep)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: DragPayload,
        hover: Option<DropTarget>,
    },
}

/// Tracks the single active gesture, if any.
#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn payload(&self) -> Option<&DragPayload> {
        match &self.state {
            DragState::Dragging { payload, .. } => Some(payload),
            DragState::Idle => None,
        }
    }

    pub fn hover(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging { hover, .. } => hover.as_ref(),
            DragState::Idle => None,
        }
    }

    /// Whether the hovered target would accept the payload if dropped now.
    pub fn hover_accepts_payload(&self) -> bool {
        match &self.state {
            DragState::Dragging {
                payload,
                hover: Some(target),
            } => target.accepts(payload.kind()),
            _ => false,
        }
    }

    /// Begin a gesture. Ignored (returns `false`) if one is already active.
    pub fn start(&mut self, payload: DragPayload) -> bool {
        if self.is_dragging() {
            tracing::warn!("Drag start while a gesture is active; ignoring");
            return false;
        }
        tracing::debug!(
            kind = ?payload.kind(),
            source = %payload.source_stage(),
            "Drag started"
        );
        self.state = DragState::Dragging {
            payload,
            hover: None,
        };
        true
    }

    /// Update the hover target. No effect while idle.
    pub fn over(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            *hover = target;
        }
    }

    /// Finish the gesture. Yields the payload and target for the resolver
    /// when there is a target; a drop on nothing is a cancelled gesture.
    pub fn end(&mut self, target: Option<DropTarget>) -> Option<(DragPayload, DropTarget)> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { payload, .. } => match target {
                Some(target) => Some((payload, target)),
                None => {
                    tracing::debug!("Drag ended without a target");
                    None
                }
            },
            DragState::Idle => None,
        }
    }

    /// Finish the gesture on whatever target is currently hovered.
    pub fn end_at_hover(&mut self) -> Option<(DragPayload, DropTarget)> {
        let target = self.hover().cloned();
        self.end(target)
    }

    /// Abandon the gesture without touching any stage.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            tracing::debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
    }
}
