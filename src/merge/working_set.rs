//! The working set: a private, mutable copy of the caller's stages plus at
//! most one draft stage.
//!
//! The caller's slice is read once in [`WorkingSet::new`] and never aliased.
//! Results leave only through [`WorkingSet::commit`].

use uuid::Uuid;

use super::error::MergeError;
use crate::types::{Stage, StageId, StageOrigin};

#[derive(Debug, Clone)]
pub struct WorkingSet {
    stages: Vec<Stage>,
    draft: Option<Stage>,
    original_count: usize,
}

impl WorkingSet {
    /// Deep-copy the caller's stages into a fresh working set with no draft.
    pub fn new(stages: &[Stage]) -> Self {
        let stages: Vec<Stage> = stages
            .iter()
            .cloned()
            .map(|mut stage| {
                stage.is_draft = false;
                stage
            })
            .collect();

        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.id == stage.id) {
                tracing::warn!(stage = %stage.id, "Duplicate stage id in merge input");
            }
        }

        Self {
            original_count: stages.len(),
            stages,
            draft: None,
        }
    }

    /// Stages other than the draft, in display order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn draft(&self) -> Option<&Stage> {
        self.draft.as_ref()
    }

    pub fn has_draft(&self) -> bool {
        self.draft.is_some()
    }

    /// Number of stages the caller supplied.
    pub fn original_count(&self) -> usize {
        self.original_count
    }

    /// Working stages plus the draft, if one exists.
    pub fn total_len(&self) -> usize {
        self.stages.len() + usize::from(self.draft.is_some())
    }

    /// All stages in display order, draft last.
    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().chain(self.draft.iter())
    }

    pub fn get(&self, id: &StageId) -> Option<&Stage> {
        self.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_draft(&self, id: &StageId) -> bool {
        self.draft.as_ref().is_some_and(|d| &d.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &StageId) -> Option<&mut Stage> {
        if self.is_draft(id) {
            return self.draft.as_mut();
        }
        self.stages.iter_mut().find(|s| &s.id == id)
    }

    fn position(&self, id: &StageId) -> Option<usize> {
        self.stages.iter().position(|s| &s.id == id)
    }

    /// Borrow two distinct stages mutably at once, in argument order.
    ///
    /// Returns `None` when the ids are equal or either stage is missing.
    pub(crate) fn pair_mut(
        &mut self,
        first: &StageId,
        second: &StageId,
    ) -> Option<(&mut Stage, &mut Stage)> {
        if first == second {
            return None;
        }

        if self.is_draft(first) {
            let idx = self.position(second)?;
            let draft = self.draft.as_mut()?;
            return Some((draft, &mut self.stages[idx]));
        }
        if self.is_draft(second) {
            let idx = self.position(first)?;
            let draft = self.draft.as_mut()?;
            return Some((&mut self.stages[idx], draft));
        }

        let i = self.position(first)?;
        let j = self.position(second)?;
        if i < j {
            let (lo, hi) = self.stages.split_at_mut(j);
            Some((&mut lo[i], &mut hi[0]))
        } else {
            let (lo, hi) = self.stages.split_at_mut(i);
            Some((&mut hi[0], &mut lo[j]))
        }
    }

    /// Start assembling a new stage. Only one draft may exist at a time.
    pub fn create_draft_stage(&mut self, default_name: &str) -> Result<&Stage, MergeError> {
        if let Some(existing) = &self.draft {
            return Err(MergeError::DraftAlreadyExists(existing.id.clone()));
        }

        let mut draft = Stage::new(format!("new-stage-{}", Uuid::new_v4()), default_name)
            .with_origin(StageOrigin::Custom);
        draft.is_draft = true;

        tracing::debug!(stage = %draft.id, "Created draft stage");
        Ok(self.draft.insert(draft))
    }

    pub fn rename_draft_stage(&mut self, name: &str) -> Result<(), MergeError> {
        let draft = self.draft.as_mut().ok_or(MergeError::NoDraftStage)?;
        draft.name = name.to_string();
        Ok(())
    }

    /// Remove the draft stage along with whatever content it held.
    pub fn delete_draft_stage(&mut self) -> Result<Stage, MergeError> {
        let draft = self.draft.take().ok_or(MergeError::NoDraftStage)?;
        tracing::debug!(
            stage = %draft.id,
            sub_steps = draft.sub_steps.len(),
            "Deleted draft stage"
        );
        Ok(draft)
    }

    /// Remove a non-draft stage if it is empty right now.
    ///
    /// Returns `true` if the stage was removed.
    pub(crate) fn remove_if_empty(&mut self, id: &StageId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        if !self.stages[idx].is_empty() {
            return false;
        }
        self.stages.remove(idx);
        true
    }

    /// Final stage list: working stages, followed by the draft if it holds
    /// any content.
    pub fn commit(&self) -> Vec<Stage> {
        let mut result = self.stages.clone();
        if let Some(draft) = self.draft.as_ref().filter(|d| !d.is_empty()) {
            let mut committed = draft.clone();
            committed.is_draft = false;
            result.push(committed);
        }
        result
    }

    /// Abandon the session. Nothing is returned to the caller.
    pub fn discard(self) {
        tracing::debug!(stages = self.stages.len(), "Discarded working set");
    }
}
