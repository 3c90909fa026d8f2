//! Project model - one collaborative document set per channel.

use crate::error::{Error, Result};
use crate::models::{File, Focus};
use concord_consensus::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the file every project starts with.
pub const MAIN_FILE: &str = "main";

/// A project bound to one chat channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Unique identifier (`<name>_<suffix>`)
    id: String,

    /// Display name, unique across all projects
    name: String,

    /// Channel association, unique across all projects
    channel: String,

    /// Files in creation order
    files: Vec<File>,

    /// Which file each user is editing
    #[serde(default)]
    focus: Focus,
}

impl Project {
    /// Create a project with no files.
    pub fn new(id: String, name: String, channel: String) -> Self {
        Self {
            id,
            name,
            channel,
            files: Vec::new(),
            focus: Focus::new(),
        }
    }

    /// Rebuild a project from persisted parts.
    ///
    /// Focus is persisted by file name; entries naming a file that no longer
    /// exists are dropped.
    pub fn restore(
        id: String,
        name: String,
        channel: String,
        files: Vec<File>,
        focus_by_name: BTreeMap<UserId, String>,
    ) -> Self {
        let mut project = Self {
            id,
            name,
            channel,
            files,
            focus: Focus::new(),
        };
        for (user, file_name) in focus_by_name {
            let restored = project.set_focus(user.clone(), &file_name).map(|_| ());
            if let Err(e) = restored {
                tracing::warn!(project = %project.id(), %user, "dropping focus: {}", e);
            }
        }
        project
    }

    /// Unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel association.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Files in order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Get a file by identifier.
    pub fn file(&self, id: &str) -> Option<&File> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Get a mutable file by identifier.
    pub fn file_mut(&mut self, id: &str) -> Option<&mut File> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    /// Get a file by name.
    pub fn file_by_name(&self, name: &str) -> Option<&File> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Add a file. Both its name and identifier must be unused in this project.
    pub fn add_file(&mut self, file: File) -> Result<()> {
        if self.file_by_name(&file.name).is_some() {
            return Err(Error::Duplicate(format!(
                "file {:?} in project {}",
                file.name, self.name
            )));
        }
        if self.file(&file.id).is_some() {
            return Err(Error::Duplicate(format!("file id {}", file.id)));
        }
        self.files.push(file);
        Ok(())
    }

    /// Remove a file and clear it from every user's focus.
    pub fn remove_file(&mut self, id: &str) -> Option<File> {
        let position = self.files.iter().position(|f| f.id == id)?;
        let cleared = self.focus.clear_file(id);
        if cleared > 0 {
            tracing::debug!(project = %self.id, file = id, cleared, "cleared focus");
        }
        Some(self.files.remove(position))
    }

    /// Focus `user` on the file called `file_name`.
    pub fn set_focus(&mut self, user: UserId, file_name: &str) -> Result<&File> {
        let position = self
            .files
            .iter()
            .position(|f| f.name == file_name)
            .ok_or_else(|| {
                Error::NotFound(format!("file {:?} in project {}", file_name, self.name))
            })?;
        let file = &self.files[position];
        self.focus.set(user, file.id.clone());
        Ok(file)
    }

    /// The file `user` is currently editing.
    pub fn current(&self, user: &UserId) -> Option<&File> {
        self.focus.get(user).and_then(|id| self.file(id))
    }

    /// The focus map.
    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    /// Focus as persisted: user → file name.
    pub fn focus_by_name(&self) -> BTreeMap<UserId, String> {
        self.focus
            .iter()
            .filter_map(|(user, id)| self.file(id).map(|f| (user.clone(), f.name.clone())))
            .collect()
    }
}
