//! A manual merge session: the working set, the active gesture, the
//! conflict gate, pending prune checks, and the commit/discard flow, behind
//! one owner.
//!
//! Hosts drive the session from their event loop: gesture events go through
//! `begin_drag` / `drag_over` / `end_drag` / `cancel_drag`, and `tick` must
//! be called regularly so emptied stages get pruned once their settle window
//! passes. Results leave the session only through [`MergeHost`].

use std::time::Duration;

use super::conflict::{ConflictChoice, ConflictGate, PendingConflict};
use super::drag::{DragPayload, DragSession, DropTarget};
use super::error::MergeError;
use super::pruning::{Clock, PruneScheduler, SystemClock};
use super::resolver::{self, IgnoreReason, MoveOutcome};
use super::working_set::WorkingSet;
use crate::config::MergeConfig;
use crate::types::{Stage, StageId};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Committed,
    Discarded,
}

/// Receives the outcome of a merge session.
pub trait MergeHost {
    /// Called once, on confirmed commit, with the final stage list.
    fn on_save(&mut self, stages: Vec<Stage>);

    /// Called once when the session ends, after `on_save` for a commit.
    fn on_exit(&mut self, reason: ExitReason);
}

/// Host that keeps what the session hands back, for callers that read the
/// result after the session ends.
#[derive(Debug, Default)]
pub struct CollectingHost {
    pub saved: Option<Vec<Stage>>,
    pub exit: Option<ExitReason>,
}

impl MergeHost for CollectingHost {
    fn on_save(&mut self, stages: Vec<Stage>) {
        self.saved = Some(stages);
    }

    fn on_exit(&mut self, reason: ExitReason) {
        self.exit = Some(reason);
    }
}

/// Shown before a commit is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    /// Stages the commit would hand back.
    pub stage_count: usize,
    /// Stages the session started with.
    pub original_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Editing,
    ConfirmingCommit(CommitSummary),
    Ended(ExitReason),
}

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub settle_window: Duration,
    pub append_separator: String,
    pub draft_default_name: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from(&MergeConfig::default())
    }
}

impl From<&MergeConfig> for MergeOptions {
    fn from(config: &MergeConfig) -> Self {
        Self {
            settle_window: Duration::from_millis(config.settle_window_ms),
            append_separator: config.append_separator.clone(),
            draft_default_name: config.draft_default_name.clone(),
        }
    }
}

pub struct MergeSession<H: MergeHost> {
    working_set: WorkingSet,
    drag: DragSession,
    conflict: ConflictGate,
    // Owned by the session: dropping the session drops every pending check.
    pruning: PruneScheduler,
    phase: SessionPhase,
    options: MergeOptions,
    clock: Box<dyn Clock>,
    host: H,
}

impl<H: MergeHost> MergeSession<H> {
    pub fn new(stages: &[Stage], options: MergeOptions, host: H) -> Self {
        Self::with_clock(stages, options, host, Box::new(SystemClock))
    }

    pub fn with_clock(
        stages: &[Stage],
        options: MergeOptions,
        host: H,
        clock: Box<dyn Clock>,
    ) -> Self {
        tracing::info!(stages = stages.len(), "Merge session started");
        Self {
            working_set: WorkingSet::new(stages),
            drag: DragSession::new(),
            conflict: ConflictGate::default(),
            pruning: PruneScheduler::new(options.settle_window),
            phase: SessionPhase::Editing,
            options,
            clock,
            host,
        }
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn pending_conflict(&self) -> Option<&PendingConflict> {
        self.conflict.pending()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, SessionPhase::Ended(_))
    }

    pub fn is_prune_scheduled(&self, stage: &StageId) -> bool {
        self.pruning.is_scheduled(stage)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Editing with no decision pending.
    fn is_editable(&self) -> bool {
        self.phase == SessionPhase::Editing && !self.conflict.is_visible()
    }

    fn ensure_editable(&self) -> Result<(), MergeError> {
        match self.phase {
            SessionPhase::Ended(_) => Err(MergeError::SessionEnded),
            _ if self.conflict.is_visible() => Err(MergeError::ConflictPending),
            SessionPhase::ConfirmingCommit(_) => Err(MergeError::CommitInProgress),
            SessionPhase::Editing => Ok(()),
        }
    }

    // ── Draft stage ─────────────────────────────────────────────────────

    pub fn create_draft_stage(&mut self) -> Result<StageId, MergeError> {
        self.ensure_editable()?;
        let name = self.options.draft_default_name.clone();
        let draft = self.working_set.create_draft_stage(&name)?;
        Ok(draft.id.clone())
    }

    pub fn rename_draft_stage(&mut self, name: &str) -> Result<(), MergeError> {
        self.ensure_editable()?;
        self.working_set.rename_draft_stage(name)
    }

    pub fn delete_draft_stage(&mut self) -> Result<Stage, MergeError> {
        self.ensure_editable()?;
        self.working_set.delete_draft_stage()
    }

    // ── Gestures ────────────────────────────────────────────────────────

    /// Pick up `payload`. Refused while a decision is pending or the
    /// session is not editing.
    pub fn begin_drag(&mut self, payload: DragPayload) -> bool {
        if !self.is_editable() {
            tracing::debug!("Drag refused outside editing");
            return false;
        }
        self.drag.start(payload)
    }

    pub fn drag_over(&mut self, target: Option<DropTarget>) {
        self.drag.over(target);
    }

    /// Release the active gesture over `target`.
    pub fn end_drag(&mut self, target: Option<DropTarget>) -> MoveOutcome {
        match self.drag.end(target) {
            Some((payload, target)) => self.apply_drop(payload, target),
            None => MoveOutcome::Ignored(IgnoreReason::NoTarget),
        }
    }

    /// Release the active gesture over the hovered target.
    pub fn end_drag_at_hover(&mut self) -> MoveOutcome {
        match self.drag.end_at_hover() {
            Some((payload, target)) => self.apply_drop(payload, target),
            None => MoveOutcome::Ignored(IgnoreReason::NoTarget),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    fn apply_drop(&mut self, payload: DragPayload, target: DropTarget) -> MoveOutcome {
        if !self.is_editable() {
            return MoveOutcome::Ignored(IgnoreReason::Blocked);
        }
        let outcome = resolver::resolve(&mut self.working_set, payload, Some(target));
        if let MoveOutcome::Conflict(conflict) = &outcome {
            self.conflict.open(conflict.clone());
        }
        self.after_move(&outcome);
        outcome
    }

    // ── Conflict gate ───────────────────────────────────────────────────

    pub fn resolve_conflict(&mut self, choice: ConflictChoice) -> MoveOutcome {
        let Some(conflict) = self.conflict.take() else {
            return MoveOutcome::Ignored(IgnoreReason::NoPendingConflict);
        };
        let outcome = resolver::resolve_conflict(
            &mut self.working_set,
            &conflict,
            choice,
            &self.options.append_separator,
        );
        self.after_move(&outcome);
        outcome
    }

    /// Dismiss the conflict. Both stages keep their pre-drop content.
    pub fn cancel_conflict(&mut self) {
        if let Some(conflict) = self.conflict.take() {
            tracing::debug!(
                target_stage = %conflict.target_stage,
                "Description conflict cancelled"
            );
        }
    }

    fn after_move(&mut self, outcome: &MoveOutcome) {
        if let Some(destination) = outcome.destination() {
            if self.pruning.cancel(destination) {
                tracing::debug!(stage = %destination, "Refilled stage kept");
            }
        }
        if let Some(source) = outcome.source() {
            let emptied = self
                .working_set
                .get(source)
                .is_some_and(|s| s.is_empty() && !s.is_draft);
            if emptied {
                self.pruning.schedule(source.clone(), self.clock.now());
            }
        }
    }

    // ── Pruning ─────────────────────────────────────────────────────────

    /// Run prune checks whose settle window has passed. Returns the ids of
    /// stages actually removed.
    pub fn tick(&mut self) -> Vec<StageId> {
        if !self.is_active() {
            return Vec::new();
        }
        let due = self.pruning.take_due(self.clock.now());
        self.prune(due)
    }

    /// Run every pending prune check now.
    fn flush_pruning(&mut self) -> Vec<StageId> {
        let pending = self.pruning.drain();
        self.prune(pending)
    }

    fn prune(&mut self, candidates: Vec<StageId>) -> Vec<StageId> {
        candidates
            .into_iter()
            .filter(|id| {
                let removed = self.working_set.remove_if_empty(id);
                if removed {
                    tracing::info!(stage = %id, "Pruned empty stage");
                }
                removed
            })
            .collect()
    }

    // ── Commit / discard ────────────────────────────────────────────────

    /// Open the commit summary. Pending prune checks run first so the
    /// summary matches what a commit would return.
    pub fn request_commit(&mut self) -> Result<CommitSummary, MergeError> {
        self.ensure_editable()?;
        self.drag.cancel();
        self.flush_pruning();

        let summary = CommitSummary {
            stage_count: self.working_set.commit().len(),
            original_count: self.working_set.original_count(),
        };
        self.phase = SessionPhase::ConfirmingCommit(summary);
        Ok(summary)
    }

    /// Back out of the commit summary without changing anything.
    pub fn cancel_commit_request(&mut self) {
        if matches!(self.phase, SessionPhase::ConfirmingCommit(_)) {
            self.phase = SessionPhase::Editing;
        }
    }

    /// Hand the final stage list to the host and end the session.
    pub fn confirm_commit(&mut self) -> Result<(), MergeError> {
        match self.phase {
            SessionPhase::ConfirmingCommit(_) => {}
            SessionPhase::Ended(_) => return Err(MergeError::SessionEnded),
            SessionPhase::Editing => return Err(MergeError::CommitNotRequested),
        }

        self.flush_pruning();
        let stages = self.working_set.commit();
        tracing::info!(
            stages = stages.len(),
            original = self.working_set.original_count(),
            "Merge committed"
        );

        self.end(ExitReason::Committed);
        self.host.on_save(stages);
        self.host.on_exit(ExitReason::Committed);
        Ok(())
    }

    /// Leave without saving. Available at any point while the session is
    /// active, including with a decision pending.
    pub fn exit_without_saving(&mut self) -> Result<(), MergeError> {
        if !self.is_active() {
            return Err(MergeError::SessionEnded);
        }
        tracing::info!("Merge discarded");
        self.end(ExitReason::Discarded);
        self.host.on_exit(ExitReason::Discarded);
        Ok(())
    }

    fn end(&mut self, reason: ExitReason) {
        self.drag.cancel();
        self.conflict.take();
        self.pruning.cancel_all();
        self.phase = SessionPhase::Ended(reason);
        std::mem::replace(&mut self.working_set, WorkingSet::new(&[])).discard();
    }
}
