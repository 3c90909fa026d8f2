//! Contributor-Threshold Consensus
//!
//! Changes to a shared document are not applied by whoever asks first.
//! Additions go straight in, but anything that rewrites or removes existing
//! work is **proposed** and waits for the people who wrote that work to agree.
//!
//! # Core Insight
//!
//! Only contributors count. A vote from someone who never touched a line
//! carries no weight on that line. The relevant contributor set is the one
//! owned by the proposal's direct target:
//!
//! - [`Proposal::Edit`] and [`Proposal::DeleteLine`] → the Line's contributors
//! - [`Proposal::DeleteFile`] → the File's contributors
//!
//! # Thresholds
//!
//! - Edit: `yes ≥ 0.8 × contributors` (exact rational comparison)
//! - Delete: `yes = contributors` (unanimity)
//!
//! Disapproving votes are carried in the [`VoteTally`] but never decide
//! anything. There is no veto.
//!
//! This is single-process approval counting, not a replicated protocol:
//! one tally is evaluated at a time against the current contributor sets.

mod approval;
mod proposal;
mod threshold;

pub use approval::{evaluate, Approval, VoteTally};
pub use proposal::{Proposal, ProposalId, ProposalKind, Scope, UserId};
pub use threshold::{delete_approved, edit_approved, required_votes, votes_needed};
