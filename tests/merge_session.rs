//! End-to-end behaviour of a merge session through the public API.

use std::time::Duration;

use stagemerge::merge::{
    CollectingHost, ConflictChoice, DragPayload, DropTarget, ExitReason, IgnoreReason,
    ManualClock, MergeOptions, MergeSession, MoveOutcome,
};
use stagemerge::types::{Stage, StageId};

fn session(stages: &[Stage]) -> (MergeSession<CollectingHost>, ManualClock) {
    let clock = ManualClock::new();
    let session = MergeSession::with_clock(
        stages,
        MergeOptions::default(),
        CollectingHost::default(),
        Box::new(clock.clone()),
    );
    (session, clock)
}

fn stage<'a>(session: &'a MergeSession<CollectingHost>, id: &str) -> &'a Stage {
    session.working_set().get(&StageId::from(id)).unwrap()
}

fn move_description(session: &mut MergeSession<CollectingHost>, from: &str, to: &str) -> MoveOutcome {
    let payload = DragPayload::description_of(stage(session, from)).unwrap();
    assert!(session.begin_drag(payload));
    session.end_drag(Some(DropTarget::StageBody { stage: to.into() }))
}

fn move_sub_step(
    session: &mut MergeSession<CollectingHost>,
    from: &str,
    index: usize,
    to: &str,
    insert_before: Option<usize>,
) -> MoveOutcome {
    let payload = DragPayload::sub_step_of(stage(session, from), index).unwrap();
    assert!(session.begin_drag(payload));
    session.end_drag(Some(DropTarget::SubStepList {
        stage: to.into(),
        insert_before,
    }))
}

/// Every description and sub-step text across the working set, sorted.
fn content(session: &MergeSession<CollectingHost>) -> Vec<String> {
    let mut all: Vec<String> = session
        .working_set()
        .iter()
        .flat_map(|s| {
            let description = s.has_description().then(|| s.description.clone());
            description.into_iter().chain(s.sub_steps.iter().cloned())
        })
        .collect();
    all.sort();
    all
}

fn three_stages() -> Vec<Stage> {
    vec![
        Stage::new("s1", "Discover")
            .with_description("Research")
            .with_sub_steps(["Interview users", "Read tickets", "Map journeys"]),
        Stage::new("s2", "Build")
            .with_description("Implement")
            .with_sub_steps(["Write code"]),
        Stage::new("s3", "Ship").with_sub_steps(["Release"]),
    ]
}

#[test]
fn transfers_conserve_content() {
    let (mut session, _) = session(&three_stages());
    let before = content(&session);

    move_sub_step(&mut session, "s1", 0, "s2", Some(0));
    move_sub_step(&mut session, "s3", 0, "s1", None);
    move_description(&mut session, "s1", "s3");
    session.create_draft_stage().unwrap();
    let draft = session.working_set().draft().unwrap().id.clone();
    move_sub_step(&mut session, "s2", 1, draft.as_str(), None);

    assert_eq!(content(&session), before);
    assert_eq!(stage(&session, "s2").sub_steps, ["Interview users"]);
    assert_eq!(stage(&session, "s3").description, "Research");
    assert!(!session.is_prune_scheduled(&"s3".into()));
}

#[test]
fn reorder_only_permutes_one_stage() {
    let (mut session, _) = session(&three_stages());
    let others_before: Vec<Stage> = session.working_set().stages()[1..].to_vec();

    let outcome = move_sub_step(&mut session, "s1", 0, "s1", Some(2));
    assert_eq!(
        outcome,
        MoveOutcome::Reordered {
            stage: "s1".into(),
            from: 0,
            to: 2
        }
    );
    assert_eq!(
        stage(&session, "s1").sub_steps,
        ["Read tickets", "Map journeys", "Interview users"]
    );
    assert_eq!(&session.working_set().stages()[1..], others_before.as_slice());
    assert!(!session.is_prune_scheduled(&"s1".into()));
}

#[test]
fn cancelled_gesture_changes_nothing() {
    let (mut session, _) = session(&three_stages());
    let payload = DragPayload::sub_step_of(stage(&session, "s1"), 1).unwrap();
    session.begin_drag(payload);
    session.drag_over(Some(DropTarget::SubStepList {
        stage: "s2".into(),
        insert_before: None,
    }));
    session.cancel_drag();

    assert_eq!(
        session.end_drag_at_hover(),
        MoveOutcome::Ignored(IgnoreReason::NoTarget)
    );
    assert_eq!(session.working_set().stages(), three_stages().as_slice());
}

#[test]
fn mismatched_target_is_ignored() {
    let (mut session, _) = session(&three_stages());
    let payload = DragPayload::description_of(stage(&session, "s1")).unwrap();
    session.begin_drag(payload);
    let outcome = session.end_drag(Some(DropTarget::SubStepList {
        stage: "s3".into(),
        insert_before: None,
    }));

    assert_eq!(outcome, MoveOutcome::Ignored(IgnoreReason::KindMismatch));
    assert_eq!(session.working_set().stages(), three_stages().as_slice());
}

#[test]
fn conflict_replace_and_append() {
    let stages = vec![
        Stage::new("a", "A").with_description("X").with_sub_steps(["keep"]),
        Stage::new("b", "B").with_description("Y"),
    ];

    let (mut replaced, _) = session(&stages);
    assert!(matches!(
        move_description(&mut replaced, "a", "b"),
        MoveOutcome::Conflict(_)
    ));
    // Nothing moves until the decision is made.
    assert_eq!(replaced.working_set().stages(), stages.as_slice());
    replaced.resolve_conflict(ConflictChoice::Replace);
    assert_eq!(stage(&replaced, "b").description, "X");
    assert_eq!(stage(&replaced, "a").description, "");

    let (mut appended, _) = session(&stages);
    move_description(&mut appended, "a", "b");
    appended.resolve_conflict(ConflictChoice::Append);
    assert_eq!(stage(&appended, "b").description, "Y\n\nX");
    assert_eq!(stage(&appended, "a").description, "");

    let (mut cancelled, _) = session(&stages);
    move_description(&mut cancelled, "a", "b");
    cancelled.cancel_conflict();
    assert_eq!(cancelled.working_set().stages(), stages.as_slice());
}

#[test]
fn emptied_stage_pruned_after_settle_window() {
    let stages = vec![
        Stage::new("a", "A").with_sub_steps(["only"]),
        Stage::new("b", "B").with_description("Target"),
    ];
    let (mut session, clock) = session(&stages);

    move_sub_step(&mut session, "a", 0, "b", None);
    assert!(session.working_set().contains(&"a".into()));

    clock.advance(Duration::from_millis(299));
    assert!(session.tick().is_empty());

    clock.advance(Duration::from_millis(1));
    assert_eq!(session.tick(), vec![StageId::from("a")]);
    assert!(!session.working_set().contains(&"a".into()));
}

#[test]
fn emptied_draft_is_never_pruned() {
    let (mut session, clock) = session(&three_stages());
    session.create_draft_stage().unwrap();
    let draft = session.working_set().draft().unwrap().id.clone();

    move_sub_step(&mut session, "s1", 0, draft.as_str(), None);
    move_sub_step(&mut session, draft.as_str(), 0, "s1", None);
    assert!(session.working_set().draft().unwrap().is_empty());

    clock.advance(Duration::from_secs(5));
    assert!(session.tick().is_empty());
    assert!(session.working_set().has_draft());
}

#[test]
fn commit_appends_non_empty_draft() {
    let stages = vec![Stage::new("s1", "One").with_sub_steps(["a", "b"])];

    let (mut with_content, _) = session(&stages);
    with_content.create_draft_stage().unwrap();
    with_content.rename_draft_stage("Merged").unwrap();
    let draft = with_content.working_set().draft().unwrap().id.clone();
    move_sub_step(&mut with_content, "s1", 1, draft.as_str(), None);
    with_content.request_commit().unwrap();
    with_content.confirm_commit().unwrap();

    let saved = with_content.into_host().saved.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].id, StageId::from("s1"));
    assert_eq!(saved[1].name, "Merged");
    assert_eq!(saved[1].sub_steps, ["b"]);
    assert!(!saved[1].is_draft);

    let (mut empty_draft, _) = session(&stages);
    empty_draft.create_draft_stage().unwrap();
    let summary = empty_draft.request_commit().unwrap();
    assert_eq!(summary.stage_count, 1);
    empty_draft.confirm_commit().unwrap();
    assert_eq!(empty_draft.into_host().saved.unwrap(), stages);
}

#[test]
fn discard_leaves_input_untouched() {
    let stages = three_stages();
    let (mut session, _) = session(&stages);

    move_description(&mut session, "s1", "s3");
    session.create_draft_stage().unwrap();
    session.exit_without_saving().unwrap();

    let host = session.into_host();
    assert_eq!(host.exit, Some(ExitReason::Discarded));
    assert!(host.saved.is_none());
    assert_eq!(stages, three_stages());
}

#[test]
fn plan_scenario_collapses_to_one_stage() {
    let stages = vec![
        Stage::new("a", "A")
            .with_description("Plan")
            .with_sub_steps(["Define scope"]),
        Stage::new("b", "B"),
    ];
    let (mut session, clock) = session(&stages);

    assert_eq!(
        move_description(&mut session, "a", "b"),
        MoveOutcome::DescriptionMoved {
            from: "a".into(),
            to: "b".into()
        }
    );
    assert!(!session.is_prune_scheduled(&"a".into()));

    move_sub_step(&mut session, "a", 0, "b", None);
    assert!(session.is_prune_scheduled(&"a".into()));

    clock.advance(Duration::from_millis(300));
    session.tick();

    session.request_commit().unwrap();
    session.confirm_commit().unwrap();
    let saved = session.into_host().saved.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, StageId::from("b"));
    assert_eq!(saved[0].description, "Plan");
    assert_eq!(saved[0].sub_steps, ["Define scope"]);
}
