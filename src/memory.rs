//! An in-memory commit graph for exercising edits and replays without git.
//!
//! Trees are flat `path -> content` maps. A cherry-pick applies the picked
//! commit's per-path changes and reports a conflict when a path no longer
//! holds the content the change was made against.

use std::collections::{BTreeMap, HashMap};

use crate::graph::{CommitGraph, CommitId, CommitRange, Error, TreeId};
use crate::replay::{Pick, Workspace};

type Tree = BTreeMap<String, String>;

struct Node {
    parent: Option<CommitId>,
    message: String,
    tree: Tree,
}

#[derive(Default)]
pub struct MemoryRepo {
    nodes: HashMap<CommitId, Node>,
    labels: HashMap<String, CommitId>,
    head: Option<CommitId>,
    worktree: Tree,
    minted: u64,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `files` on top of `HEAD`, using `label` as both the message and a ref name.
    pub fn commit(&mut self, label: &str, files: &[(&str, &str)]) -> CommitId {
        let mut tree = self.head_tree();
        for (path, content) in files {
            tree.insert(path.to_string(), content.to_string());
        }
        let id = self.mint(self.head.clone(), label.to_string(), tree.clone());
        self.head = Some(id.clone());
        self.worktree = tree;
        self.labels.insert(label.to_string(), id.clone());
        id
    }

    /// The commit a label was created as.
    pub fn id(&self, label: &str) -> CommitId {
        self.labels
            .get(label)
            .cloned()
            .unwrap_or_else(|| panic!("no commit labelled {label}"))
    }

    /// Modify the working tree without committing.
    pub fn write_file(&mut self, path: &str, content: &str) {
        self.worktree.insert(path.to_string(), content.to_string());
    }

    pub fn message(&self, commit: &CommitId) -> &str {
        &self.nodes[commit].message
    }

    /// Messages from the root to `HEAD`.
    pub fn messages(&self) -> Vec<&str> {
        self.history().iter().map(|c| self.message(c)).collect()
    }

    /// Commits from the root to `HEAD`, oldest first.
    pub fn history(&self) -> Vec<CommitId> {
        let mut commits = Vec::new();
        let mut cursor = self.head.clone();
        while let Some(commit) = cursor {
            cursor = self.nodes[&commit].parent.clone();
            commits.push(commit);
        }
        commits.reverse();
        commits
    }

    /// Content of `path` in the `HEAD` tree.
    pub fn file(&self, path: &str) -> Option<&str> {
        let head = self.head.as_ref()?;
        self.nodes[head].tree.get(path).map(String::as_str)
    }

    fn head_tree(&self) -> Tree {
        self.head
            .as_ref()
            .map(|h| self.nodes[h].tree.clone())
            .unwrap_or_default()
    }

    fn mint(&mut self, parent: Option<CommitId>, message: String, tree: Tree) -> CommitId {
        self.minted += 1;
        let id = CommitId::new(format!("{:040x}", self.minted));
        self.nodes.insert(
            id.clone(),
            Node {
                parent,
                message,
                tree,
            },
        );
        id
    }

    fn node(&self, commit: &CommitId) -> Result<&Node, Error> {
        self.nodes
            .get(commit)
            .ok_or_else(|| Error::UnresolvedRef(commit.as_str().to_string()))
    }

    fn tree_of(&self, commit: Option<&CommitId>) -> Result<Tree, Error> {
        match commit {
            Some(commit) => Ok(self.node(commit)?.tree.clone()),
            None => Ok(Tree::new()),
        }
    }
}

/// Per-path `(before, after)` contents between two trees.
fn changes(before: &Tree, after: &Tree) -> Vec<(String, Option<String>, Option<String>)> {
    let mut paths: Vec<&String> = before.keys().chain(after.keys()).collect();
    paths.sort();
    paths.dedup();
    paths
        .into_iter()
        .filter(|p| before.get(*p) != after.get(*p))
        .map(|p| (p.clone(), before.get(p).cloned(), after.get(p).cloned()))
        .collect()
}

impl CommitGraph for MemoryRepo {
    fn resolve(&self, reference: &str) -> Result<CommitId, Error> {
        let unresolved = || Error::UnresolvedRef(reference.to_string());
        let split = reference.find(['~', '^']).unwrap_or(reference.len());
        let (name, mut suffix) = reference.split_at(split);

        let mut commit = match name {
            "HEAD" => self.head.clone().ok_or_else(unresolved)?,
            _ => match self.labels.get(name) {
                Some(id) => id.clone(),
                None if self.nodes.contains_key(&CommitId::new(name)) => CommitId::new(name),
                None => return Err(unresolved()),
            },
        };

        while !suffix.is_empty() {
            let (steps, rest): (usize, &str) = if let Some(rest) = suffix.strip_prefix('^') {
                (1, rest)
            } else if let Some(rest) = suffix.strip_prefix('~') {
                let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                let steps = if digits == 0 {
                    1
                } else {
                    rest[..digits].parse().map_err(|_| unresolved())?
                };
                (steps, &rest[digits..])
            } else {
                return Err(unresolved());
            };
            for _ in 0..steps {
                commit = self.node(&commit)?.parent.clone().ok_or_else(unresolved)?;
            }
            suffix = rest;
        }
        Ok(commit)
    }

    fn parent(&self, commit: &CommitId) -> Result<CommitId, Error> {
        self.node(commit)?
            .parent
            .clone()
            .ok_or_else(|| Error::NoParent(commit.clone()))
    }

    fn range_between(&self, earlier: &CommitId, later: &CommitId) -> Result<CommitRange, Error> {
        let mut commits = Vec::new();
        let mut cursor = Some(later.clone());
        while let Some(commit) = cursor {
            if &commit == earlier {
                commits.reverse();
                return Ok(CommitRange::from_oldest_first(commits));
            }
            cursor = self.node(&commit)?.parent.clone();
            commits.push(commit);
        }
        Err(Error::InvalidRange {
            earlier: earlier.clone(),
            later: later.clone(),
        })
    }
}

impl Workspace for MemoryRepo {
    fn is_clean(&self) -> Result<bool, Error> {
        Ok(self.worktree == self.head_tree())
    }

    fn reset_hard(&mut self, to: &CommitId) -> Result<(), Error> {
        self.worktree = self.node(to)?.tree.clone();
        self.head = Some(to.clone());
        Ok(())
    }

    fn reset_soft(&mut self, to: &CommitId) -> Result<(), Error> {
        self.node(to)?;
        self.head = Some(to.clone());
        Ok(())
    }

    fn amend(&mut self) -> Result<CommitId, Error> {
        let head = self.head()?;
        let node = self.node(&head)?;
        let (parent, message) = (node.parent.clone(), node.message.clone());
        let amended = self.mint(parent, message, self.worktree.clone());
        self.head = Some(amended.clone());
        Ok(amended)
    }

    fn cherry_pick(&mut self, commit: &CommitId) -> Result<Pick, Error> {
        let node = self.node(commit)?;
        let message = node.message.clone();
        let after = node.tree.clone();
        let before = self.tree_of(node.parent.as_ref())?;

        let mut tree = self.head_tree();
        let mut conflicts = Vec::new();
        for (path, from, to) in changes(&before, &after) {
            let current = tree.get(&path).cloned();
            if current != from && current != to {
                conflicts.push(path);
                continue;
            }
            match to {
                Some(content) => tree.insert(path, content),
                None => tree.remove(&path),
            };
        }
        if !conflicts.is_empty() {
            return Ok(Pick::Conflict { paths: conflicts });
        }

        let picked = self.mint(self.head.clone(), message, tree.clone());
        self.head = Some(picked.clone());
        self.worktree = tree;
        Ok(Pick::Applied(picked))
    }

    fn tree(&self, commit: &CommitId) -> Result<TreeId, Error> {
        Ok(TreeId::new(format!("{:?}", self.node(commit)?.tree)))
    }

    fn changed_paths(&self, from: &CommitId, to: &CommitId) -> Result<Vec<String>, Error> {
        let before = self.tree_of(Some(from))?;
        let after = self.tree_of(Some(to))?;
        Ok(changes(&before, &after)
            .into_iter()
            .map(|(path, _, _)| path)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_refs() {
        let mut repo = MemoryRepo::new();
        let a = repo.commit("a", &[("a", "1")]);
        let b = repo.commit("b", &[("b", "1")]);
        repo.commit("c", &[("c", "1")]);

        assert_eq!(repo.resolve("HEAD~2").unwrap(), a);
        assert_eq!(repo.resolve("c^").unwrap(), b);
        assert_eq!(repo.resolve("c^^").unwrap(), a);
        assert_eq!(repo.resolve(a.as_str()).unwrap(), a);
        assert!(matches!(repo.resolve("a^"), Err(Error::UnresolvedRef(_))));
    }

    #[test]
    fn range_between_is_oldest_first_and_half_open() {
        let mut repo = MemoryRepo::new();
        let a = repo.commit("a", &[("a", "1")]);
        let b = repo.commit("b", &[("b", "1")]);
        let c = repo.commit("c", &[("c", "1")]);

        let range = repo.range_between(&a, &c).unwrap();
        assert_eq!(range.as_slice(), [b, c.clone()].as_slice());
        assert!(repo.range_between(&c, &c).unwrap().is_empty());
        assert!(matches!(
            repo.range_between(&c, &a),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn cherry_pick_conflicts_on_diverged_content() {
        let mut repo = MemoryRepo::new();
        let a = repo.commit("a", &[("f", "1")]);
        let b = repo.commit("b", &[("f", "2")]);
        repo.commit("c", &[("f", "3")]);

        repo.reset_hard(&a).unwrap();
        repo.write_file("f", "other");
        repo.amend().unwrap();
        assert_eq!(
            repo.cherry_pick(&b).unwrap(),
            Pick::Conflict {
                paths: vec!["f".to_string()]
            }
        );
    }
}
