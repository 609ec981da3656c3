//! Manual merge engine.
//!
//! Lets a user recombine a set of stages by dragging descriptions and
//! sub-steps between them, optionally assembling one new draft stage, and
//! then commit or discard the whole edit in one step.

mod conflict;
mod drag;
mod error;
mod pruning;
mod resolver;
mod session;
mod working_set;

pub use conflict::{ConflictChoice, ConflictGate, PendingConflict};
pub use drag::{DragPayload, DragSession, DragState, DropTarget, PayloadKind};
pub use error::MergeError;
pub use pruning::{Clock, ManualClock, PruneScheduler, SystemClock};
pub use resolver::{resolve, resolve_conflict, IgnoreReason, MoveOutcome};
pub use session::{
    CollectingHost, CommitSummary, ExitReason, MergeHost, MergeOptions, MergeSession, SessionPhase,
};
pub use working_set::WorkingSet;
