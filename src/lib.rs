//! histedit: reorder, squash, and delete commits on the current branch.
//!
//! An edit is carried out in three steps: refs are resolved to fixed commit
//! ids, the edit is turned into a replay plan, and the plan is replayed onto
//! the branch with resets and cherry-picks.
//!
//! # Architecture
//!
//! - **Graph**: Commit identities, ranges, and the read-only [`CommitGraph`] accessor
//! - **Git**: The `git`-backed accessor and workspace
//! - **Edit**: Pure planning for move, squash, and delete
//! - **Replay**: Destructive execution of a plan, with post-replay verification
//! - **Log**: The branch overview shown when no edit is requested

pub mod config;
pub mod edit;
pub mod git;
pub mod graph;
pub mod log;
pub mod replay;
pub mod style;

#[cfg(test)]
mod memory;

pub use config::Config;
pub use edit::{Edit, EditPlan, Request};
pub use git::Git;
pub use graph::{CommitGraph, CommitId, CommitRange};
pub use replay::{ReplayOptions, ReplayOutcome, Workspace, apply};
