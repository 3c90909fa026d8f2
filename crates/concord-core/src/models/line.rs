//! Line model - the unit of content and of voting.

use crate::error::{Error, Result};
use concord_consensus::{Proposal, ProposalId, Scope, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single line of a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    /// Text content
    pub content: String,

    /// Users who authored the current content
    pub contributors: BTreeSet<UserId>,

    /// Edit and delete proposals awaiting a vote, by voting artifact
    #[serde(default)]
    pub pending: BTreeMap<ProposalId, Proposal>,
}

impl Line {
    /// Create a new line authored by `author`.
    pub fn new(content: impl Into<String>, author: UserId) -> Self {
        Self {
            content: content.into(),
            contributors: BTreeSet::from([author]),
            pending: BTreeMap::new(),
        }
    }

    /// Attach a proposal. Only line-scoped proposals are accepted.
    pub fn propose(&mut self, id: ProposalId, proposal: Proposal) -> Result<()> {
        if proposal.scope() != Scope::Line {
            return Err(Error::InvalidProposal(format!(
                "{} proposal cannot target a line",
                proposal.kind()
            )));
        }
        self.pending.insert(id, proposal);
        Ok(())
    }

    /// Replace the content with an approved edit.
    ///
    /// Every pending proposal on this line was made against the old content
    /// and is dropped along with it.
    pub fn apply_edit(&mut self, content: impl Into<String>, proposer: UserId) {
        self.content = content.into();
        self.pending.clear();
        self.contributors.insert(proposer);
    }
}
