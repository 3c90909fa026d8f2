//! Evaluating a vote tally against a contributor set.
//!
//! Approval is decided purely by who said yes among the people whose work
//! the proposal would change. The verdict is a function of
//! (proposal kind, contributors, yes voters); arrival order, the proposer's
//! identity and disapproving votes never enter it.

use crate::proposal::{Proposal, ProposalId, ProposalKind, UserId};
use crate::threshold::{delete_approved, edit_approved, required_votes, votes_needed};
use std::collections::BTreeSet;

/// One vote-tally event delivered by the voting layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    /// The voting artifact (and proposal) the tally belongs to
    pub proposal: ProposalId,
    /// Users who approved
    pub yes: BTreeSet<UserId>,
    /// Users who disapproved. Recorded, never counted.
    pub no: BTreeSet<UserId>,
}

impl VoteTally {
    pub fn new(
        proposal: ProposalId,
        yes: impl IntoIterator<Item = UserId>,
        no: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            proposal,
            yes: yes.into_iter().collect(),
            no: no.into_iter().collect(),
        }
    }
}

/// Verdict on a proposal for one tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// Enough contributors approved; apply the proposal
    Approved { yes: usize, required: usize },
    /// Not yet; the proposal stays pending
    Insufficient { yes: usize, needed: usize },
}

impl Approval {
    pub fn is_approved(&self) -> bool {
        matches!(self, Approval::Approved { .. })
    }
}

/// Evaluate `tally` for `proposal` against the relevant contributor set.
///
/// Only yes votes from members of `contributors` count.
pub fn evaluate(
    proposal: &Proposal,
    contributors: &BTreeSet<UserId>,
    tally: &VoteTally,
) -> Approval {
    let yes = tally.yes.intersection(contributors).count();
    let total = contributors.len();
    let kind = proposal.kind();

    let approved = match kind {
        ProposalKind::Edit => edit_approved(yes, total),
        ProposalKind::DeleteLine | ProposalKind::DeleteFile => delete_approved(yes, total),
    };

    if approved {
        Approval::Approved {
            yes,
            required: required_votes(kind, total),
        }
    } else {
        Approval::Insufficient {
            yes,
            needed: votes_needed(kind, yes, total),
        }
    }
}
