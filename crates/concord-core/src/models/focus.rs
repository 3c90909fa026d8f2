//! Per-user focus: the file each user is currently editing.

use concord_consensus::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map of user → focused file identifier within one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Focus {
    entries: BTreeMap<UserId, String>,
}

impl Focus {
    /// Create an empty focus map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `user` at `file_id`, replacing any previous focus.
    pub fn set(&mut self, user: UserId, file_id: String) {
        self.entries.insert(user, file_id);
    }

    /// The file `user` is focused on.
    pub fn get(&self, user: &UserId) -> Option<&str> {
        self.entries.get(user).map(String::as_str)
    }

    /// Drop every entry pointing at `file_id`. Returns how many were cleared.
    pub fn clear_file(&mut self, file_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, f| f != file_id);
        before - self.entries.len()
    }

    /// Iterate over (user, file id) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &str)> {
        self.entries.iter().map(|(u, f)| (u, f.as_str()))
    }

    /// Number of users with a focus.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody has a focus.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
