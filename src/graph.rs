//! Commit graph access: identities, ranges, and the read-only accessor trait.
//!
//! Everything the history editor knows about a repository comes through
//! [`CommitGraph`]. The git-backed implementation lives in [`crate::git`];
//! [`crate::memory`] provides an in-memory graph for tests.

use std::fmt;

/// A commit identity (a full object hash for git-backed repositories).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The abbreviated form used in progress and error messages.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// A tree identity, used to compare the content of two commits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeId(String);

impl TreeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..8.min(self.0.len())])
    }
}

/// Commits on the ancestry path `(earlier, later]`, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRange {
    commits: Vec<CommitId>,
}

impl CommitRange {
    /// Build a range from commits already ordered oldest first.
    pub fn from_oldest_first(commits: Vec<CommitId>) -> Self {
        Self { commits }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommitId> {
        self.commits.iter()
    }

    pub fn contains(&self, commit: &CommitId) -> bool {
        self.commits.contains(commit)
    }

    pub fn as_slice(&self) -> &[CommitId] {
        &self.commits
    }

    pub fn into_vec(self) -> Vec<CommitId> {
        self.commits
    }
}

impl<'a> IntoIterator for &'a CommitRange {
    type Item = &'a CommitId;
    type IntoIter = std::slice::Iter<'a, CommitId>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}

impl IntoIterator for CommitRange {
    type Item = CommitId;
    type IntoIter = std::vec::IntoIter<CommitId>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.into_iter()
    }
}

/// Read-only view of a linear commit history.
pub trait CommitGraph {
    /// Resolve a symbolic reference (`HEAD`, a branch, `X~2`, a hash) to a commit.
    fn resolve(&self, reference: &str) -> Result<CommitId, Error>;

    /// The first parent of `commit`.
    fn parent(&self, commit: &CommitId) -> Result<CommitId, Error>;

    /// Commits on the linear ancestry path from `earlier` (exclusive) to
    /// `later` (inclusive), oldest first.
    ///
    /// Fails with [`Error::InvalidRange`] when `earlier` is not a first-parent
    /// ancestor of `later` or when a merge sits on the path.
    fn range_between(&self, earlier: &CommitId, later: &CommitId) -> Result<CommitRange, Error>;

    /// The commit currently checked out.
    fn head(&self) -> Result<CommitId, Error> {
        self.resolve("HEAD")
    }
}

/// Errors from resolving references and walking history.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{0}' does not name a commit")]
    UnresolvedRef(String),

    #[error("commit {0} is a root commit and has no parent")]
    NoParent(CommitId),

    #[error("{earlier} is not a linear ancestor of {later}")]
    InvalidRange { earlier: CommitId, later: CommitId },

    #[error(transparent)]
    Git(#[from] crate::git::Error),
}
