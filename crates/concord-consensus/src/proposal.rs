//! Proposed changes and the identities attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chat-platform user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the external voting artifact that tallies a proposal.
///
/// Issued by the voting layer, not by us, and assumed unique across every
/// project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A pending change awaiting contributor approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    /// Replace a line's content.
    Edit {
        proposer: UserId,
        new_content: String,
    },
    /// Remove a line.
    DeleteLine { proposer: UserId },
    /// Remove a whole file.
    DeleteFile { proposer: UserId },
}

/// Discriminant of [`Proposal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalKind {
    Edit,
    DeleteLine,
    DeleteFile,
}

/// What a proposal attaches to, and whose contributors vote on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Line,
    File,
}

impl Proposal {
    pub fn edit(proposer: UserId, new_content: impl Into<String>) -> Self {
        Proposal::Edit {
            proposer,
            new_content: new_content.into(),
        }
    }

    pub fn delete_line(proposer: UserId) -> Self {
        Proposal::DeleteLine { proposer }
    }

    pub fn delete_file(proposer: UserId) -> Self {
        Proposal::DeleteFile { proposer }
    }

    pub fn kind(&self) -> ProposalKind {
        match self {
            Proposal::Edit { .. } => ProposalKind::Edit,
            Proposal::DeleteLine { .. } => ProposalKind::DeleteLine,
            Proposal::DeleteFile { .. } => ProposalKind::DeleteFile,
        }
    }

    pub fn proposer(&self) -> &UserId {
        match self {
            Proposal::Edit { proposer, .. }
            | Proposal::DeleteLine { proposer }
            | Proposal::DeleteFile { proposer } => proposer,
        }
    }

    /// The entity this proposal must be attached to.
    pub fn scope(&self) -> Scope {
        self.kind().scope()
    }
}

impl ProposalKind {
    pub fn scope(self) -> Scope {
        match self {
            ProposalKind::Edit | ProposalKind::DeleteLine => Scope::Line,
            ProposalKind::DeleteFile => Scope::File,
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalKind::Edit => "edit",
            ProposalKind::DeleteLine => "delete_line",
            ProposalKind::DeleteFile => "delete_file",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Line => f.write_str("line"),
            Scope::File => f.write_str("file"),
        }
    }
}
