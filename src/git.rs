//! Git repository operations.
//!
//! Every operation shells out to the `git` binary from the repository root.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::graph::{self, CommitGraph, CommitId, CommitRange, TreeId};
use crate::replay::{Pick, Workspace};

/// Field and record separators for [`Git::log`]. Control characters never
/// appear in names or messages, so the output splits unambiguously.
pub const FIELD_SEPARATOR: char = '\x1f';
pub const RECORD_SEPARATOR: char = '\x1e';

/// A git repository handle that provides common operations.
pub struct Git {
    root: PathBuf,
}

impl Git {
    /// Find the git repository root starting from the given directory.
    pub fn discover(start: &Path) -> Result<Self, Error> {
        let start_dir = if start.as_os_str().is_empty() {
            Path::new(".")
        } else {
            start
        };

        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start_dir)
            .output()
            .map_err(|e| Error::Exec(format!("git rev-parse: {e}")))?;

        if !output.status.success() {
            return Err(Error::NotARepo(start_dir.display().to_string()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a branch or ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.probe(&["rev-parse", "--verify", "--quiet", refname])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Whether the index and working tree match `HEAD`. Untracked files
    /// survive a hard reset, so they do not count.
    pub fn is_clean(&self) -> Result<bool, Error> {
        let status = self.run_output(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(status.trim().is_empty())
    }

    /// Raw log records for `upstream..HEAD`, newest first.
    ///
    /// Each record carries the abbreviated hash, author name, subject, and
    /// body, joined by [`FIELD_SEPARATOR`] and terminated by [`RECORD_SEPARATOR`].
    pub fn log(&self, upstream: &str) -> Result<String, Error> {
        let range = format!("{upstream}..HEAD");
        self.run_output(&[
            "--no-pager",
            "log",
            "--format=%h%x1f%an%x1f%s%x1f%b%x1e",
            &range,
        ])
    }

    /// Parents of a commit, first parent first.
    fn parents(&self, commit: &CommitId) -> Result<Vec<CommitId>, Error> {
        let line = self.run_output(&["rev-list", "--parents", "-n", "1", commit.as_str()])?;
        Ok(line
            .split_whitespace()
            .skip(1)
            .map(CommitId::new)
            .collect())
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Run a git command that produces no output we care about.
    fn run(&self, args: &[&str]) -> Result<(), Error> {
        self.run_output(args).map(|_| ())
    }

    /// Run a git command and capture its stdout.
    fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        let output = self.probe(args)?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::Failed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Run a git command and hand back its raw output, whatever the exit status.
    fn probe(&self, args: &[&str]) -> Result<Output, Error> {
        tracing::debug!(command = %args.join(" "), "git");
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))
    }
}

impl CommitGraph for Git {
    fn resolve(&self, reference: &str) -> Result<CommitId, graph::Error> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.probe(&["rev-parse", "--verify", "--quiet", &spec])?;
        if !output.status.success() {
            return Err(graph::Error::UnresolvedRef(reference.to_string()));
        }
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(CommitId::new(hash))
    }

    fn parent(&self, commit: &CommitId) -> Result<CommitId, graph::Error> {
        self.parents(commit)?
            .into_iter()
            .next()
            .ok_or_else(|| graph::Error::NoParent(commit.clone()))
    }

    fn range_between(&self, earlier: &CommitId, later: &CommitId) -> Result<CommitRange, graph::Error> {
        if earlier == later {
            return Ok(CommitRange::empty());
        }

        let invalid = || graph::Error::InvalidRange {
            earlier: earlier.clone(),
            later: later.clone(),
        };

        let span = format!("{earlier}..{later}", earlier = earlier.as_str(), later = later.as_str());
        let listing = self.run_output(&["rev-list", "--ancestry-path", "--reverse", "--parents", &span])?;

        // Each line is `<commit> <parent>...`; a linear path means every
        // commit has exactly one parent and it is the previous entry.
        let mut previous = earlier.clone();
        let mut commits = Vec::new();
        for line in listing.lines() {
            let mut fields = line.split_whitespace().map(CommitId::new);
            let Some(commit) = fields.next() else {
                continue;
            };
            let parents: Vec<CommitId> = fields.collect();
            if parents.len() != 1 || parents[0] != previous {
                return Err(invalid());
            }
            previous = commit.clone();
            commits.push(commit);
        }

        if commits.last() != Some(later) {
            return Err(invalid());
        }
        Ok(CommitRange::from_oldest_first(commits))
    }
}

impl Workspace for Git {
    fn is_clean(&self) -> Result<bool, graph::Error> {
        Ok(Git::is_clean(self)?)
    }

    fn reset_hard(&mut self, to: &CommitId) -> Result<(), graph::Error> {
        Ok(self.run(&["reset", "--hard", "--quiet", to.as_str()])?)
    }

    fn reset_soft(&mut self, to: &CommitId) -> Result<(), graph::Error> {
        Ok(self.run(&["reset", "--soft", "--quiet", to.as_str()])?)
    }

    fn amend(&mut self) -> Result<CommitId, graph::Error> {
        self.run(&["commit", "--amend", "--no-edit", "--allow-empty", "--quiet"])?;
        self.head()
    }

    fn cherry_pick(&mut self, commit: &CommitId) -> Result<Pick, graph::Error> {
        let output = self.probe(&[
            "cherry-pick",
            "--allow-empty",
            "--keep-redundant-commits",
            commit.as_str(),
        ])?;
        if output.status.success() {
            return Ok(Pick::Applied(self.head()?));
        }

        let unmerged = self.run_output(&["diff", "--name-only", "--diff-filter=U"])?;
        let paths: Vec<String> = unmerged.lines().map(str::to_string).collect();
        if paths.is_empty() {
            return Err(Error::Failed {
                command: format!("git cherry-pick {}", commit.as_str()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(Pick::Conflict { paths })
    }

    fn tree(&self, commit: &CommitId) -> Result<TreeId, graph::Error> {
        let spec = format!("{}^{{tree}}", commit.as_str());
        let tree = self.run_output(&["rev-parse", &spec])?;
        Ok(TreeId::new(tree.trim()))
    }

    fn changed_paths(&self, from: &CommitId, to: &CommitId) -> Result<Vec<String>, graph::Error> {
        // Renames list both sides, so a reverted rename still names the original path.
        let names = self.run_output(&[
            "diff",
            "--name-only",
            "--no-renames",
            from.as_str(),
            to.as_str(),
        ])?;
        Ok(names.lines().map(str::to_string).collect())
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("not a git repository (searched from '{0}')")]
    NotARepo(String),

    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}
