//! Entity types shared between the merge engine and its hosts.

mod stage;

pub use stage::{Stage, StageId, StageOrigin};
