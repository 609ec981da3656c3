//! Applies completed drag gestures to the working set.
//!
//! Every transfer validates first and writes second: the source and the
//! destination are looked up, the payload is checked against the source's
//! current content, and only then are both sides updated. There is no
//! fallible step between removing content from the source and adding it to
//! the destination.

use super::conflict::{ConflictChoice, PendingConflict};
use super::drag::{DragPayload, DropTarget};
use super::working_set::WorkingSet;
use crate::types::StageId;

/// Why a gesture left the working set untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Released over nothing, or the gesture was cancelled.
    NoTarget,
    /// The target does not accept this kind of payload.
    KindMismatch,
    /// A description dropped back onto its own stage.
    SameStage,
    UnknownStage(StageId),
    /// The source no longer holds the dragged content where the payload
    /// says it was.
    StalePayload,
    NoPendingConflict,
    /// Refused because a conflict decision or the commit summary is open.
    Blocked,
}

/// What a gesture did to the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Reordered {
        stage: StageId,
        from: usize,
        to: usize,
    },
    DescriptionMoved {
        from: StageId,
        to: StageId,
    },
    SubStepMoved {
        from: StageId,
        to: StageId,
        index: usize,
    },
    /// Destination already has a description; nothing changed yet.
    Conflict(PendingConflict),
    Ignored(IgnoreReason),
}

impl MoveOutcome {
    /// Stage content was taken from, for transfers.
    pub fn source(&self) -> Option<&StageId> {
        match self {
            MoveOutcome::DescriptionMoved { from, .. } | MoveOutcome::SubStepMoved { from, .. } => {
                Some(from)
            }
            _ => None,
        }
    }

    /// Stage that received content, for transfers.
    pub fn destination(&self) -> Option<&StageId> {
        match self {
            MoveOutcome::DescriptionMoved { to, .. } | MoveOutcome::SubStepMoved { to, .. } => {
                Some(to)
            }
            _ => None,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            MoveOutcome::Reordered { .. }
                | MoveOutcome::DescriptionMoved { .. }
                | MoveOutcome::SubStepMoved { .. }
        )
    }
}

/// Classify and apply a drop of `payload` onto `target`.
pub fn resolve(
    working_set: &mut WorkingSet,
    payload: DragPayload,
    target: Option<DropTarget>,
) -> MoveOutcome {
    let Some(target) = target else {
        return MoveOutcome::Ignored(IgnoreReason::NoTarget);
    };
    if !target.accepts(payload.kind()) {
        return MoveOutcome::Ignored(IgnoreReason::KindMismatch);
    }

    let outcome = match (payload, target) {
        (
            DragPayload::SubStep {
                text,
                source_stage,
                source_index,
            },
            DropTarget::SubStepList {
                stage,
                insert_before,
            },
        ) => {
            if stage == source_stage {
                reorder_sub_step(working_set, &stage, &text, source_index, insert_before)
            } else {
                transfer_sub_step(
                    working_set,
                    &source_stage,
                    &stage,
                    &text,
                    source_index,
                    insert_before,
                )
            }
        }
        (DragPayload::Description { text, source_stage }, DropTarget::StageBody { stage }) => {
            drop_description(working_set, source_stage, stage, text)
        }
        _ => MoveOutcome::Ignored(IgnoreReason::KindMismatch),
    };

    match &outcome {
        MoveOutcome::Ignored(reason) => tracing::debug!(?reason, "Drop ignored"),
        MoveOutcome::Conflict(_) => {}
        applied => tracing::debug!(outcome = ?applied, "Drop applied"),
    }
    outcome
}

/// Apply the user's decision on a pending description conflict.
pub fn resolve_conflict(
    working_set: &mut WorkingSet,
    conflict: &PendingConflict,
    choice: ConflictChoice,
    separator: &str,
) -> MoveOutcome {
    let Some((source, target)) =
        working_set.pair_mut(&conflict.source_stage, &conflict.target_stage)
    else {
        return MoveOutcome::Ignored(missing_stage(
            working_set,
            &conflict.source_stage,
            &conflict.target_stage,
        ));
    };
    if source.description != conflict.incoming_text {
        return MoveOutcome::Ignored(IgnoreReason::StalePayload);
    }

    let merged = match choice {
        ConflictChoice::Replace => conflict.incoming_text.clone(),
        ConflictChoice::Append if target.has_description() => {
            conflict.appended(&target.description, separator)
        }
        ConflictChoice::Append => conflict.incoming_text.clone(),
    };

    target.description = merged;
    source.description.clear();

    tracing::debug!(
        ?choice,
        from = %conflict.source_stage,
        to = %conflict.target_stage,
        "Description conflict resolved"
    );
    MoveOutcome::DescriptionMoved {
        from: conflict.source_stage.clone(),
        to: conflict.target_stage.clone(),
    }
}

fn reorder_sub_step(
    working_set: &mut WorkingSet,
    stage_id: &StageId,
    text: &str,
    from: usize,
    insert_before: Option<usize>,
) -> MoveOutcome {
    let Some(stage) = working_set.get_mut(stage_id) else {
        return MoveOutcome::Ignored(IgnoreReason::UnknownStage(stage_id.clone()));
    };
    if stage.sub_steps.get(from).map(String::as_str) != Some(text) {
        return MoveOutcome::Ignored(IgnoreReason::StalePayload);
    }

    let last = stage.sub_steps.len() - 1;
    let to = insert_before.map_or(last, |i| i.min(last));
    let item = stage.sub_steps.remove(from);
    stage.sub_steps.insert(to, item);

    MoveOutcome::Reordered {
        stage: stage_id.clone(),
        from,
        to,
    }
}

fn transfer_sub_step(
    working_set: &mut WorkingSet,
    source_id: &StageId,
    target_id: &StageId,
    text: &str,
    source_index: usize,
    insert_before: Option<usize>,
) -> MoveOutcome {
    let Some((source, target)) = working_set.pair_mut(source_id, target_id) else {
        return MoveOutcome::Ignored(missing_stage(working_set, source_id, target_id));
    };
    if source.sub_steps.get(source_index).map(String::as_str) != Some(text) {
        return MoveOutcome::Ignored(IgnoreReason::StalePayload);
    }

    let index = insert_before.map_or(target.sub_steps.len(), |i| i.min(target.sub_steps.len()));
    let item = source.sub_steps.remove(source_index);
    target.sub_steps.insert(index, item);

    MoveOutcome::SubStepMoved {
        from: source_id.clone(),
        to: target_id.clone(),
        index,
    }
}

fn drop_description(
    working_set: &mut WorkingSet,
    source_id: StageId,
    target_id: StageId,
    text: String,
) -> MoveOutcome {
    if source_id == target_id {
        return MoveOutcome::Ignored(IgnoreReason::SameStage);
    }
    let Some((source, target)) = working_set.pair_mut(&source_id, &target_id) else {
        return MoveOutcome::Ignored(missing_stage(working_set, &source_id, &target_id));
    };
    if source.description != text || !source.has_description() {
        return MoveOutcome::Ignored(IgnoreReason::StalePayload);
    }

    if target.has_description() {
        return MoveOutcome::Conflict(PendingConflict {
            target_stage: target_id,
            incoming_text: text,
            source_stage: source_id,
        });
    }

    target.description = text;
    source.description.clear();

    MoveOutcome::DescriptionMoved {
        from: source_id,
        to: target_id,
    }
}

fn missing_stage(working_set: &WorkingSet, first: &StageId, second: &StageId) -> IgnoreReason {
    if working_set.contains(first) {
        IgnoreReason::UnknownStage(second.clone())
    } else {
        IgnoreReason::UnknownStage(first.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    fn plan_and_empty() -> WorkingSet {
        WorkingSet::new(&[
            Stage::new("a", "A")
                .with_description("Plan")
                .with_sub_steps(["Define scope", "Allocate budget"]),
            Stage::new("b", "B"),
        ])
    }

    fn sub_step(stage: &str, index: usize, text: &str) -> DragPayload {
        DragPayload::SubStep {
            text: text.to_string(),
            source_stage: stage.into(),
            source_index: index,
        }
    }

    fn description(stage: &str, text: &str) -> DragPayload {
        DragPayload::Description {
            text: text.to_string(),
            source_stage: stage.into(),
        }
    }

    fn list(stage: &str, insert_before: Option<usize>) -> Option<DropTarget> {
        Some(DropTarget::SubStepList {
            stage: stage.into(),
            insert_before,
        })
    }

    fn body(stage: &str) -> Option<DropTarget> {
        Some(DropTarget::StageBody {
            stage: stage.into(),
        })
    }

    fn stage<'a>(ws: &'a WorkingSet, id: &str) -> &'a Stage {
        ws.get(&id.into()).unwrap()
    }

    #[test]
    fn test_reorder_moves_item_within_stage() {
        let mut ws = WorkingSet::new(&[Stage::new("a", "A").with_sub_steps(["1", "2", "3", "4"])]);

        let outcome = resolve(&mut ws, sub_step("a", 0, "1"), list("a", Some(2)));
        assert_eq!(
            outcome,
            MoveOutcome::Reordered {
                stage: "a".into(),
                from: 0,
                to: 2
            }
        );
        assert_eq!(stage(&ws, "a").sub_steps, ["2", "3", "1", "4"]);

        resolve(&mut ws, sub_step("a", 3, "4"), list("a", Some(0)));
        assert_eq!(stage(&ws, "a").sub_steps, ["4", "2", "3", "1"]);
    }

    #[test]
    fn test_reorder_without_index_moves_to_end() {
        let mut ws = WorkingSet::new(&[Stage::new("a", "A").with_sub_steps(["1", "2", "3"])]);

        resolve(&mut ws, sub_step("a", 0, "1"), list("a", None));
        assert_eq!(stage(&ws, "a").sub_steps, ["2", "3", "1"]);

        resolve(&mut ws, sub_step("a", 0, "2"), list("a", Some(99)));
        assert_eq!(stage(&ws, "a").sub_steps, ["3", "1", "2"]);
    }

    #[test]
    fn test_reorder_keeps_membership() {
        let mut ws = WorkingSet::new(&[Stage::new("a", "A").with_sub_steps(["x", "y", "z", "y"])]);
        let mut before = stage(&ws, "a").sub_steps.clone();

        resolve(&mut ws, sub_step("a", 1, "y"), list("a", Some(3)));
        let mut after = stage(&ws, "a").sub_steps.clone();

        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_description_moves_to_empty_stage() {
        let mut ws = plan_and_empty();

        let outcome = resolve(&mut ws, description("a", "Plan"), body("b"));
        assert_eq!(
            outcome,
            MoveOutcome::DescriptionMoved {
                from: "a".into(),
                to: "b".into()
            }
        );
        assert_eq!(stage(&ws, "b").description, "Plan");
        assert_eq!(stage(&ws, "a").description, "");
        assert_eq!(outcome.source(), Some(&StageId::from("a")));
        assert_eq!(outcome.destination(), Some(&StageId::from("b")));
    }

    #[test]
    fn test_description_onto_described_stage_raises_conflict() {
        let mut ws = WorkingSet::new(&[
            Stage::new("a", "A").with_description("X"),
            Stage::new("b", "B").with_description("Y"),
        ]);

        let outcome = resolve(&mut ws, description("a", "X"), body("b"));
        assert_eq!(
            outcome,
            MoveOutcome::Conflict(PendingConflict {
                target_stage: "b".into(),
                incoming_text: "X".to_string(),
                source_stage: "a".into(),
            })
        );
        assert_eq!(stage(&ws, "a").description, "X");
        assert_eq!(stage(&ws, "b").description, "Y");
    }

    #[test]
    fn test_conflict_replace_and_append() {
        let described = || {
            WorkingSet::new(&[
                Stage::new("a", "A").with_description("X"),
                Stage::new("b", "B").with_description("Y"),
            ])
        };
        let conflict = PendingConflict {
            target_stage: "b".into(),
            incoming_text: "X".to_string(),
            source_stage: "a".into(),
        };

        let mut ws = described();
        resolve_conflict(&mut ws, &conflict, ConflictChoice::Replace, "\n\n");
        assert_eq!(stage(&ws, "b").description, "X");
        assert_eq!(stage(&ws, "a").description, "");

        let mut ws = described();
        let outcome = resolve_conflict(&mut ws, &conflict, ConflictChoice::Append, "\n\n");
        assert!(outcome.is_mutation());
        assert_eq!(stage(&ws, "b").description, "Y\n\nX");
        assert_eq!(stage(&ws, "a").description, "");
    }

    #[test]
    fn test_conflict_with_stale_source_is_ignored() {
        let mut ws = WorkingSet::new(&[
            Stage::new("a", "A").with_description("changed"),
            Stage::new("b", "B").with_description("Y"),
        ]);
        let conflict = PendingConflict {
            target_stage: "b".into(),
            incoming_text: "X".to_string(),
            source_stage: "a".into(),
        };

        let outcome = resolve_conflict(&mut ws, &conflict, ConflictChoice::Replace, "\n\n");
        assert_eq!(outcome, MoveOutcome::Ignored(IgnoreReason::StalePayload));
        assert_eq!(stage(&ws, "b").description, "Y");
    }

    #[test]
    fn test_sub_step_transfer_inserts_and_removes() {
        let mut ws = plan_and_empty();

        let outcome = resolve(&mut ws, sub_step("a", 0, "Define scope"), list("b", None));
        assert_eq!(
            outcome,
            MoveOutcome::SubStepMoved {
                from: "a".into(),
                to: "b".into(),
                index: 0
            }
        );
        assert_eq!(stage(&ws, "b").sub_steps, ["Define scope"]);
        assert_eq!(stage(&ws, "a").sub_steps, ["Allocate budget"]);

        resolve(&mut ws, sub_step("a", 0, "Allocate budget"), list("b", Some(0)));
        assert_eq!(stage(&ws, "b").sub_steps, ["Allocate budget", "Define scope"]);
        assert!(stage(&ws, "a").sub_steps.is_empty());
    }

    #[test]
    fn test_sub_step_transfer_clamps_insert_index() {
        let mut ws = plan_and_empty();
        let outcome = resolve(&mut ws, sub_step("a", 1, "Allocate budget"), list("b", Some(7)));
        assert_eq!(
            outcome,
            MoveOutcome::SubStepMoved {
                from: "a".into(),
                to: "b".into(),
                index: 0
            }
        );
    }

    #[test]
    fn test_transfers_into_and_out_of_draft() {
        let mut ws = plan_and_empty();
        let draft = ws.create_draft_stage("New").unwrap().id.clone();
        let draft_target = Some(DropTarget::StageBody {
            stage: draft.clone(),
        });

        resolve(&mut ws, description("a", "Plan"), draft_target);
        assert_eq!(ws.draft().unwrap().description, "Plan");

        let back = DragPayload::Description {
            text: "Plan".to_string(),
            source_stage: draft.clone(),
        };
        resolve(&mut ws, back, body("b"));
        assert_eq!(stage(&ws, "b").description, "Plan");
        assert!(ws.draft().unwrap().description.is_empty());
    }

    #[test]
    fn test_degenerate_drops_are_ignored() {
        let mut ws = plan_and_empty();
        let snapshot = ws.commit();

        let cases = [
            (description("a", "Plan"), None, IgnoreReason::NoTarget),
            (
                sub_step("a", 0, "Define scope"),
                body("b"),
                IgnoreReason::KindMismatch,
            ),
            (description("a", "Plan"), list("b", None), IgnoreReason::KindMismatch),
            (description("a", "Plan"), body("a"), IgnoreReason::SameStage),
            (
                description("a", "Plan"),
                body("zzz"),
                IgnoreReason::UnknownStage("zzz".into()),
            ),
            (
                sub_step("a", 5, "Define scope"),
                list("b", None),
                IgnoreReason::StalePayload,
            ),
            (
                sub_step("a", 1, "Define scope"),
                list("a", Some(0)),
                IgnoreReason::StalePayload,
            ),
        ];

        for (payload, target, reason) in cases {
            assert_eq!(
                resolve(&mut ws, payload, target),
                MoveOutcome::Ignored(reason)
            );
        }
        assert_eq!(ws.commit(), snapshot);
    }
}
