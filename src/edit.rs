//! History edits and the plans that implement them.
//!
//! Planning is pure: an [`Edit`] reads ranges from a [`CommitGraph`] and
//! produces an [`EditPlan`] without touching the repository. Every range is
//! resolved before [`crate::replay::apply`] performs its first reset, so an
//! invalid request never leaves a half-rewritten branch behind.
//!
//! Replay order is always oldest first. Applying a commit before its logical
//! predecessors would patch a tree that lacks the context it was written
//! against.

use std::fmt;

use crate::graph::{CommitGraph, CommitId, CommitRange, Error};

/// A structural history edit with every endpoint already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Move `(start, end]` so it directly follows `root`.
    Move {
        root: CommitId,
        start: CommitId,
        end: CommitId,
    },

    /// Fold `(start, end]` into `start`, keeping `start`'s message.
    Squash { start: CommitId, end: CommitId },

    /// Drop `target` and replay everything after it.
    Delete { target: CommitId },
}

/// An edit as requested on the command line, before any ref is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Move `first` (or `first..=last`) to follow `root`.
    Move {
        root: String,
        first: String,
        last: Option<String>,
    },

    /// With only `first`, fold it into its parent. With `last`, fold
    /// `(first, last]` into `first`.
    Squash { first: String, last: Option<String> },

    Delete { target: String },
}

impl Request {
    /// Resolve every ref to a fixed commit so later rewrites cannot shift
    /// what a relative expression like `HEAD~2` points at.
    pub fn resolve<G: CommitGraph + ?Sized>(&self, graph: &G) -> Result<Edit, Error> {
        match self {
            Request::Move { root, first, last } => {
                let root = graph.resolve(root)?;
                let first = graph.resolve(first)?;
                let start = graph.parent(&first)?;
                let end = match last {
                    Some(last) => graph.resolve(last)?,
                    None => first,
                };
                Ok(Edit::Move { root, start, end })
            }
            Request::Squash { first, last: None } => {
                let end = graph.resolve(first)?;
                let start = graph.parent(&end)?;
                Ok(Edit::Squash { start, end })
            }
            Request::Squash {
                first,
                last: Some(last),
            } => Ok(Edit::Squash {
                start: graph.resolve(first)?,
                end: graph.resolve(last)?,
            }),
            Request::Delete { target } => Ok(Edit::Delete {
                target: graph.resolve(target)?,
            }),
        }
    }
}

impl Edit {
    /// Compute the plan that carries out this edit on a branch whose tip is `tip`.
    pub fn plan<G: CommitGraph + ?Sized>(&self, graph: &G, tip: &CommitId) -> Result<EditPlan, Error> {
        match self {
            Edit::Move { root, start, end } => {
                let moved = graph.range_between(start, end)?;
                let displaced = graph.range_between(root, start)?;
                let tail = graph.range_between(end, tip)?;
                Ok(move_plan(root, moved, displaced, tail, tip))
            }
            Edit::Squash { start, end } => {
                let absorbed = graph.range_between(start, end)?;
                let tail = graph.range_between(end, tip)?;
                Ok(squash_plan(start, end, absorbed, tail, tip))
            }
            Edit::Delete { target } => {
                let parent = graph.parent(target)?;
                let tail = graph.range_between(target, tip)?;
                Ok(delete_plan(parent, target, tail, tip))
            }
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Move { root, start, end } => {
                write!(f, "move ({start}, {end}] to follow {root}")
            }
            Edit::Squash { start, end } => write!(f, "squash ({start}, {end}] into {start}"),
            Edit::Delete { target } => write!(f, "delete {target}"),
        }
    }
}

/// The moved block, then the block it displaced, then the untouched tail.
///
/// Swapping the adjacent blocks `(root, start]` and `(start, end]` this way
/// needs only a linear replay from `root`.
pub fn move_plan(
    root: &CommitId,
    moved: CommitRange,
    displaced: CommitRange,
    tail: CommitRange,
    tip: &CommitId,
) -> EditPlan {
    let sequence = moved
        .into_iter()
        .chain(displaced)
        .chain(tail)
        .collect();
    EditPlan {
        base: root.clone(),
        collapse: None,
        sequence,
        tip: tip.clone(),
        expect: Expectation::SameTree,
    }
}

/// Reset to `end`, collapse back onto `start`, then replay the tail.
pub fn squash_plan(
    start: &CommitId,
    end: &CommitId,
    absorbed: CommitRange,
    tail: CommitRange,
    tip: &CommitId,
) -> EditPlan {
    EditPlan {
        base: end.clone(),
        collapse: Some(Collapse {
            into: start.clone(),
            absorbed,
        }),
        sequence: tail.into_vec(),
        tip: tip.clone(),
        expect: Expectation::SameTree,
    }
}

/// Reset to the target's parent and replay everything after the target.
pub fn delete_plan(parent: CommitId, target: &CommitId, tail: CommitRange, tip: &CommitId) -> EditPlan {
    EditPlan {
        base: parent.clone(),
        collapse: None,
        sequence: tail.into_vec(),
        tip: tip.clone(),
        expect: Expectation::Without {
            parent,
            dropped: target.clone(),
        },
    }
}

/// The replay recipe for one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// Commit the branch is hard-reset to before anything is replayed.
    pub base: CommitId,

    /// Squash step run right after the reset.
    pub collapse: Option<Collapse>,

    /// Commits to cherry-pick, oldest first.
    pub sequence: Vec<CommitId>,

    /// Branch tip before the edit.
    pub tip: CommitId,

    /// What the final tree must look like.
    pub expect: Expectation,
}

/// Soft-reset to `into` and amend it with everything the reset unstaged.
///
/// Once the amend lands, the amended commit is the base the rest of the
/// sequence replays onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collapse {
    pub into: CommitId,
    pub absorbed: CommitRange,
}

/// The tree a successful replay must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Identical to the pre-edit tip's tree.
    SameTree,

    /// Differs from the pre-edit tip only in paths `dropped` changed relative to `parent`.
    Without { parent: CommitId, dropped: CommitId },
}

impl EditPlan {
    /// Number of commits the replay will create, counting the amend.
    pub fn len(&self) -> usize {
        self.sequence.len() + usize::from(self.collapse.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for EditPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "reset --hard {}", self.base)?;
        if let Some(collapse) = &self.collapse {
            writeln!(f, "reset --soft {}", collapse.into)?;
            write!(f, "amend {}", collapse.into)?;
            for absorbed in &collapse.absorbed {
                write!(f, " +{absorbed}")?;
            }
            writeln!(f)?;
        }
        for commit in &self.sequence {
            writeln!(f, "pick {commit}")?;
        }
        Ok(())
    }
}
