//! Concord Core - Collaborative Documents by Contributor Vote
//!
//! A group of users builds line-oriented text files together. Anyone may add
//! a line; rewriting or removing somebody's work goes through a proposal that
//! the affected contributors vote on.
//!
//! # Architecture
//!
//! - **Models**: [`Project`] → [`File`] → [`Line`], plus per-user [`Focus`]
//! - **Ident**: collision-free identifiers and path-safe name validation
//! - **Storage**: one JSON document per Project manifest and per File
//! - **Store**: loaded projects indexed by name and by channel
//! - **Engine**: the request/vote-tally boundary, including locating,
//!   evaluating and applying proposals
//!
//! # Example
//!
//! ```no_run
//! use concord_core::{Engine, Storage, Store, UserId};
//!
//! fn main() -> concord_core::Result<()> {
//!     let storage = Storage::open("./concord-data")?;
//!     let mut engine = Engine::new(Store::load(storage)?);
//!
//!     let alice = UserId::from("alice");
//!     let project = engine.create_project("novel", "channel-1", &alice)?;
//!     let main = engine.current(&project, &alice)?;
//!     engine.append_line(&main, 0, "It was a dark and stormy night.", &alice)?;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod ident;
pub mod models;
pub mod storage;
pub mod store;

pub use concord_consensus::{Approval, Proposal, ProposalId, ProposalKind, UserId, VoteTally};
pub use engine::{Engine, FileRef, LineRef, Located, Outcome, Target};
pub use error::{Error, Result};
pub use ident::{is_name_valid, new_identifier};
pub use models::{File, Focus, Line, Project};
pub use storage::Storage;
pub use store::{ProjectKey, Store};
