//! Replay an [`EditPlan`] onto the working branch.
//!
//! Replay is destructive: the branch is hard-reset to the plan's base and the
//! sequence is cherry-picked back on top. A conflict stops the replay where
//! it is. Nothing is rolled back, so the operator can inspect the partial
//! state and decide whether to continue or abort.

use thiserror::Error;

use crate::edit::{EditPlan, Expectation};
use crate::graph::{self, CommitGraph, CommitId, TreeId};

/// The mutating operations a replay needs on top of graph reads.
pub trait Workspace: CommitGraph {
    /// Whether the index and working tree match `HEAD`.
    fn is_clean(&self) -> Result<bool, graph::Error>;

    /// Move the branch, index, and working tree to `to`.
    fn reset_hard(&mut self, to: &CommitId) -> Result<(), graph::Error>;

    /// Move only the branch pointer, keeping the working tree content staged.
    fn reset_soft(&mut self, to: &CommitId) -> Result<(), graph::Error>;

    /// Rewrite `HEAD` with the staged content, keeping its message.
    fn amend(&mut self) -> Result<CommitId, graph::Error>;

    /// Apply `commit`'s change-set as a new commit on top of `HEAD`.
    fn cherry_pick(&mut self, commit: &CommitId) -> Result<Pick, graph::Error>;

    fn tree(&self, commit: &CommitId) -> Result<TreeId, graph::Error>;

    /// Paths whose content differs between two commits. A rename reports
    /// both its source and destination path.
    fn changed_paths(&self, from: &CommitId, to: &CommitId) -> Result<Vec<String>, graph::Error>;
}

/// Result of a single cherry-pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// The change applied cleanly as this new commit.
    Applied(CommitId),

    /// The change did not apply; these paths are unmerged.
    Conflict { paths: Vec<String> },
}

/// Knobs for [`apply`].
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Check the final tree against the plan's expectation.
    pub verify: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

/// What a successful replay produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// The branch tip after replay.
    pub tip: CommitId,

    /// `(original, replacement)` for every commit the replay recreated, in replay order.
    pub rewritten: Vec<(CommitId, CommitId)>,
}

impl ReplayOutcome {
    /// The commit that now stands in for `original`.
    pub fn replacement(&self, original: &CommitId) -> Option<&CommitId> {
        self.rewritten
            .iter()
            .find(|(old, _)| old == original)
            .map(|(_, new)| new)
    }
}

/// Carry out `plan` against the workspace.
///
/// The working tree must be clean: the first step is a hard reset, which
/// would discard local modifications.
pub fn apply<W: Workspace + ?Sized>(
    workspace: &mut W,
    plan: &EditPlan,
    options: &ReplayOptions,
) -> Result<ReplayOutcome, Error> {
    if !workspace.is_clean()? {
        return Err(Error::DirtyWorkingTree);
    }

    // Read everything the post-replay check needs before history moves.
    let target = match &plan.expect {
        Expectation::SameTree => Target::Tree(workspace.tree(&plan.tip)?),
        Expectation::Without { parent, dropped } => {
            Target::Confined(workspace.changed_paths(parent, dropped)?)
        }
    };

    tracing::info!(base = %plan.base, commits = plan.len(), "resetting branch");
    workspace.reset_hard(&plan.base)?;

    let mut rewritten = Vec::with_capacity(plan.len());
    if let Some(collapse) = &plan.collapse {
        workspace.reset_soft(&collapse.into)?;
        let amended = workspace.amend()?;
        tracing::info!(
            into = %collapse.into,
            absorbed = collapse.absorbed.len(),
            amended = %amended,
            "squashed"
        );
        rewritten.push((collapse.into.clone(), amended.clone()));
        for absorbed in &collapse.absorbed {
            rewritten.push((absorbed.clone(), amended.clone()));
        }
    }

    let total = plan.sequence.len();
    for (index, commit) in plan.sequence.iter().enumerate() {
        let position = index + 1;
        match workspace.cherry_pick(commit)? {
            Pick::Applied(new) => {
                tracing::info!("[{position}/{total}] {commit} -> {new}");
                rewritten.push((commit.clone(), new));
            }
            Pick::Conflict { paths } => {
                return Err(Error::ReplayConflict {
                    commit: commit.clone(),
                    position,
                    total,
                    paths,
                });
            }
        }
    }

    let tip = workspace.head()?;
    if options.verify {
        verify(workspace, plan, &tip, target)?;
    } else {
        tracing::debug!("skipping tree verification");
    }

    Ok(ReplayOutcome { tip, rewritten })
}

/// The post-replay check, captured before the reset.
enum Target {
    Tree(TreeId),
    Confined(Vec<String>),
}

fn verify<W: Workspace + ?Sized>(
    workspace: &W,
    plan: &EditPlan,
    tip: &CommitId,
    target: Target,
) -> Result<(), Error> {
    match target {
        Target::Tree(expected) => {
            let actual = workspace.tree(tip)?;
            if actual != expected {
                return Err(Error::TreeMismatch {
                    tip: tip.clone(),
                    expected,
                    actual,
                });
            }
        }
        Target::Confined(allowed) => {
            let paths: Vec<String> = workspace
                .changed_paths(&plan.tip, tip)?
                .into_iter()
                .filter(|path| !allowed.contains(path))
                .collect();
            if !paths.is_empty() {
                return Err(Error::UnexpectedChanges {
                    tip: tip.clone(),
                    paths,
                });
            }
        }
    }
    tracing::debug!(%tip, "replayed tree verified");
    Ok(())
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while replaying a plan.
#[derive(Debug, Error)]
pub enum Error {
    #[error("working tree has uncommitted changes; commit or stash them before rewriting history")]
    DirtyWorkingTree,

    #[error(
        "replaying {commit} ({position}/{total}) conflicts in {}; the branch is left mid-replay for inspection",
        .paths.join(", ")
    )]
    ReplayConflict {
        commit: CommitId,
        position: usize,
        total: usize,
        paths: Vec<String>,
    },

    #[error("replayed tip {tip} has tree {actual}, expected {expected}")]
    TreeMismatch {
        tip: CommitId,
        expected: TreeId,
        actual: TreeId,
    },

    #[error("replayed tip {tip} changed paths the deleted commit never touched: {}", .paths.join(", "))]
    UnexpectedChanges { tip: CommitId, paths: Vec<String> },

    #[error(transparent)]
    Graph(#[from] graph::Error),
}
