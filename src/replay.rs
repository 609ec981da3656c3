//! Headless merge sessions driven by a scripted list of gestures.
//!
//! A script is a JSON array of steps, for example:
//!
//! ```json
//! [
//!   { "op": "pick_description", "stage": "a" },
//!   { "op": "end", "target": { "kind": "stage_body", "stage": "b" } },
//!   { "op": "wait", "ms": 500 },
//!   { "op": "request_commit" },
//!   { "op": "confirm_commit" }
//! ]
//! ```
//!
//! Time only moves on `wait`, so prune checks fire deterministically.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::merge::{
    CollectingHost, ConflictChoice, DragPayload, DropTarget, ExitReason, ManualClock, MergeError,
    MergeOptions, MergeSession, MoveOutcome,
};
use crate::types::{Stage, StageId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Start dragging the named stage's description.
    PickDescription { stage: StageId },
    /// Start dragging one of the named stage's sub-steps.
    PickSubStep { stage: StageId, index: usize },
    /// Start dragging an explicit payload.
    Start { payload: DragPayload },
    Over {
        #[serde(default)]
        target: Option<DropTarget>,
    },
    /// Drop on `target`, or on the hovered target when omitted.
    End {
        #[serde(default)]
        target: Option<DropTarget>,
    },
    Cancel,
    ResolveConflict { choice: ConflictChoice },
    CancelConflict,
    CreateDraft,
    RenameDraft { name: String },
    DeleteDraft,
    /// Advance the clock and run due prune checks.
    Wait { ms: u64 },
    RequestCommit,
    ConfirmCommit,
    CancelCommit,
    Exit,
}

/// Load a script from a JSON file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse script {}", path.display()))
}

/// What happened during a replay.
#[derive(Debug)]
pub struct ReplayReport {
    /// Final stage list, if the script committed.
    pub saved: Option<Vec<Stage>>,
    /// How the session ended; `None` if the script left it open.
    pub exit: Option<ExitReason>,
    /// Result of every drop and conflict decision, in order.
    pub outcomes: Vec<MoveOutcome>,
    /// Stages pruned by `wait` steps.
    pub pruned: Vec<StageId>,
}

/// Run `steps` against a fresh session over `stages`.
///
/// Steps the session refuses (a second draft, a commit while a conflict is
/// open) are logged and skipped; a step naming a stage or sub-step that does
/// not exist aborts the replay.
pub fn replay(stages: &[Stage], steps: &[ScriptStep], options: MergeOptions) -> Result<ReplayReport> {
    let clock = ManualClock::new();
    let mut session = MergeSession::with_clock(
        stages,
        options,
        CollectingHost::default(),
        Box::new(clock.clone()),
    );
    let mut outcomes = Vec::new();
    let mut pruned = Vec::new();

    for (n, step) in steps.iter().enumerate() {
        if !session.is_active() {
            tracing::warn!(step = n, "Session already ended; ignoring remaining steps");
            break;
        }

        let refused: Option<MergeError> = match step {
            ScriptStep::PickDescription { stage } => {
                let source = session
                    .working_set()
                    .get(stage)
                    .with_context(|| format!("step {n}: unknown stage '{stage}'"))?;
                let Some(payload) = DragPayload::description_of(source) else {
                    bail!("step {n}: stage '{stage}' has no description");
                };
                session.begin_drag(payload);
                None
            }
            ScriptStep::PickSubStep { stage, index } => {
                let source = session
                    .working_set()
                    .get(stage)
                    .with_context(|| format!("step {n}: unknown stage '{stage}'"))?;
                let Some(payload) = DragPayload::sub_step_of(source, *index) else {
                    bail!("step {n}: stage '{stage}' has no sub-step {index}");
                };
                session.begin_drag(payload);
                None
            }
            ScriptStep::Start { payload } => {
                session.begin_drag(payload.clone());
                None
            }
            ScriptStep::Over { target } => {
                session.drag_over(target.clone());
                None
            }
            ScriptStep::End { target } => {
                let outcome = match target {
                    Some(target) => session.end_drag(Some(target.clone())),
                    None => session.end_drag_at_hover(),
                };
                outcomes.push(outcome);
                None
            }
            ScriptStep::Cancel => {
                session.cancel_drag();
                None
            }
            ScriptStep::ResolveConflict { choice } => {
                outcomes.push(session.resolve_conflict(*choice));
                None
            }
            ScriptStep::CancelConflict => {
                session.cancel_conflict();
                None
            }
            ScriptStep::CreateDraft => session.create_draft_stage().err(),
            ScriptStep::RenameDraft { name } => session.rename_draft_stage(name).err(),
            ScriptStep::DeleteDraft => session.delete_draft_stage().err(),
            ScriptStep::Wait { ms } => {
                clock.advance(Duration::from_millis(*ms));
                pruned.extend(session.tick());
                None
            }
            ScriptStep::RequestCommit => session.request_commit().err(),
            ScriptStep::ConfirmCommit => session.confirm_commit().err(),
            ScriptStep::CancelCommit => {
                session.cancel_commit_request();
                None
            }
            ScriptStep::Exit => session.exit_without_saving().err(),
        };

        if let Some(err) = refused {
            tracing::warn!(step = n, error = %err, "Step refused");
        }
    }

    let host = session.into_host();
    Ok(ReplayReport {
        saved: host.saved,
        exit: host.exit,
        outcomes,
        pruned,
    })
}
