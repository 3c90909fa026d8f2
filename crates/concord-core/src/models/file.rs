//! File model - an ordered sequence of lines.

use crate::error::{Error, Result};
use crate::models::Line;
use concord_consensus::{Proposal, ProposalId, Scope, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A file within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct File {
    /// Identifier, unique within the project (`<name>_<suffix>`)
    pub id: String,

    /// Human-readable name, unique within the project
    pub name: String,

    /// Users who authored content or approved a change to this file
    pub contributors: BTreeSet<UserId>,

    /// File-scoped proposals awaiting a vote
    #[serde(default)]
    pub pending: BTreeMap<ProposalId, Proposal>,

    /// Lines in order
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl File {
    /// Create an empty file. The creator is its first contributor.
    pub fn new(id: String, name: String, creator: UserId) -> Self {
        Self {
            id,
            name,
            contributors: BTreeSet::from([creator]),
            pending: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    /// Insert a line at `index`, clamped into `[0, len]`.
    ///
    /// Returns the position the line landed at.
    pub fn insert_line(&mut self, index: i64, content: impl Into<String>, author: UserId) -> usize {
        let position = index.clamp(0, self.lines.len() as i64) as usize;
        self.contributors.insert(author.clone());
        self.lines.insert(position, Line::new(content, author));
        position
    }

    /// Get a line by position.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Get a mutable line by position.
    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    /// Attach a proposal to the file itself. Only file-scoped proposals are accepted.
    pub fn propose(&mut self, id: ProposalId, proposal: Proposal) -> Result<()> {
        if proposal.scope() != Scope::File {
            return Err(Error::InvalidProposal(format!(
                "{} proposal cannot target a file",
                proposal.kind()
            )));
        }
        self.pending.insert(id, proposal);
        Ok(())
    }

    /// Apply an approved edit to the line at `index`.
    pub fn apply_edit(&mut self, index: usize, content: impl Into<String>, proposer: UserId) -> Result<()> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("line {} in file {}", index, self.name)))?;
        line.apply_edit(content, proposer.clone());
        self.contributors.insert(proposer);
        Ok(())
    }

    /// Remove the line at `index` after an approved deletion.
    ///
    /// The line's pending proposals go with it.
    pub fn remove_line(&mut self, index: usize, proposer: UserId) -> Result<Line> {
        if index >= self.lines.len() {
            return Err(Error::NotFound(format!("line {} in file {}", index, self.name)));
        }
        let line = self.lines.remove(index);
        self.contributors.insert(proposer);
        Ok(line)
    }

    /// Line contents in order.
    pub fn contents(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.content.clone()).collect()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the file has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
