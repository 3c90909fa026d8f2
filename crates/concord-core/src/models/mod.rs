//! Document models for Concord.
//!
//! # Core Types
//!
//! - [`Project`] - one per channel, owning an ordered list of files
//! - [`File`] - an ordered sequence of lines plus its contributors
//! - [`Line`] - content, contributors and the proposals pending against it
//!
//! # Supporting Types
//!
//! - [`Focus`] - which file each user is currently editing

mod file;
mod focus;
mod line;
mod project;

pub use file::File;
pub use focus::Focus;
pub use line::Line;
pub use project::{Project, MAIN_FILE};
