//! Loaded projects, indexed by name and by channel.
//!
//! The store is built once with [`Store::load`] and written back with
//! [`Store::flush`] on shutdown. In between, every mutation persists the
//! affected document through [`Store::save_file`] or [`Store::save_project`].

use crate::error::{Error, Result};
use crate::models::Project;
use crate::storage::Storage;
use std::collections::{BTreeMap, HashMap};

/// Which unique key a project lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKey<'a> {
    /// Display name
    Name(&'a str),
    /// Channel association
    Channel(&'a str),
}

impl std::fmt::Display for ProjectKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectKey::Name(name) => write!(f, "project {:?}", name),
            ProjectKey::Channel(channel) => write!(f, "project for channel {}", channel),
        }
    }
}

/// In-memory project set backed by [`Storage`].
#[derive(Debug)]
pub struct Store {
    storage: Storage,
    projects: BTreeMap<String, Project>,
    by_name: HashMap<String, String>,
    by_channel: HashMap<String, String>,
}

impl Store {
    /// An empty store over `storage`, ignoring anything already persisted.
    pub fn empty(storage: Storage) -> Self {
        Self {
            storage,
            projects: BTreeMap::new(),
            by_name: HashMap::new(),
            by_channel: HashMap::new(),
        }
    }

    /// Load every persisted project.
    ///
    /// A project whose name or channel collides with one already loaded is
    /// logged and skipped.
    pub fn load(storage: Storage) -> Result<Self> {
        let projects = storage.load_projects()?;
        let mut store = Self::empty(storage);
        for project in projects {
            let id = project.id().to_string();
            if let Err(e) = store.insert(project) {
                tracing::warn!(project = %id, "skipping project: {}", e);
            }
        }
        tracing::info!(projects = store.len(), "store loaded");
        Ok(store)
    }

    /// The persistence backend.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Check whether a key is bound.
    pub fn contains(&self, key: ProjectKey<'_>) -> bool {
        match key {
            ProjectKey::Name(name) => self.by_name.contains_key(name),
            ProjectKey::Channel(channel) => self.by_channel.contains_key(channel),
        }
    }

    /// Check whether an identifier is bound.
    pub fn contains_id(&self, id: &str) -> bool {
        self.projects.contains_key(id)
    }

    /// Add a project. Fails if its name, channel or identifier is taken.
    pub fn insert(&mut self, project: Project) -> Result<()> {
        if self.contains(ProjectKey::Name(project.name())) {
            return Err(Error::Duplicate(format!("project name {:?}", project.name())));
        }
        if self.contains(ProjectKey::Channel(project.channel())) {
            return Err(Error::Duplicate(format!(
                "project for channel {}",
                project.channel()
            )));
        }
        if self.contains_id(project.id()) {
            return Err(Error::Duplicate(format!("project id {}", project.id())));
        }

        self.by_name.insert(project.name().to_string(), project.id().to_string());
        self.by_channel
            .insert(project.channel().to_string(), project.id().to_string());
        self.projects.insert(project.id().to_string(), project);
        Ok(())
    }

    /// Look a project up by name or by channel.
    pub fn lookup(&self, key: ProjectKey<'_>) -> Result<&Project> {
        let id = match key {
            ProjectKey::Name(name) => self.by_name.get(name),
            ProjectKey::Channel(channel) => self.by_channel.get(channel),
        };
        id.and_then(|id| self.projects.get(id))
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Get a project by identifier.
    pub fn get(&self, id: &str) -> Result<&Project> {
        self.projects
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("project {}", id)))
    }

    /// Get a mutable project by identifier.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Project> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("project {}", id)))
    }

    /// All projects, ordered by identifier.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Write one file document.
    pub fn save_file(&self, project_id: &str, file_id: &str) -> Result<()> {
        let project = self.get(project_id)?;
        let file = project
            .file(file_id)
            .ok_or_else(|| Error::NotFound(format!("file {} in project {}", file_id, project.name())))?;
        self.storage.put_file(project_id, file)
    }

    /// Write a project manifest and all of its files.
    pub fn save_project(&self, project_id: &str) -> Result<()> {
        self.storage.put_project(self.get(project_id)?)
    }

    /// Write every project. Keeps going past failures and returns the first.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for project in self.projects.values() {
            if let Err(e) = self.storage.put_project(project) {
                tracing::error!(project = %project.id(), "flush failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(projects = self.len(), "store flushed");
                Ok(())
            }
        }
    }

    /// Number of projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::File;
    use concord_consensus::UserId;
    use tempfile::tempdir;

    fn project(id: &str, name: &str, channel: &str) -> Project {
        let mut p = Project::new(id.into(), name.into(), channel.into());
        p.add_file(File::new("main_aaaaaaaa".into(), "main".into(), UserId::from("alice")))
            .unwrap();
        p
    }

    #[test]
    fn lookup_by_either_key_resolves_same_project() {
        let dir = tempdir().unwrap();
        let mut store = Store::empty(Storage::open(dir.path()).unwrap());
        store.insert(project("novel_abcdefgh", "novel", "chan-1")).unwrap();

        let by_name = store.lookup(ProjectKey::Name("novel")).unwrap();
        let by_channel = store.lookup(ProjectKey::Channel("chan-1")).unwrap();
        assert_eq!(by_name.id(), by_channel.id());

        // keys are not interchangeable
        assert!(matches!(
            store.lookup(ProjectKey::Name("chan-1")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn insert_rejects_either_duplicate_key() {
        let dir = tempdir().unwrap();
        let mut store = Store::empty(Storage::open(dir.path()).unwrap());
        store.insert(project("novel_abcdefgh", "novel", "chan-1")).unwrap();

        let same_name = store.insert(project("novel_zzzzzzzz", "novel", "chan-2"));
        assert!(matches!(same_name, Err(Error::Duplicate(_))));

        let same_channel = store.insert(project("poems_zzzzzzzz", "poems", "chan-1"));
        assert!(matches!(same_channel, Err(Error::Duplicate(_))));

        assert_eq!(store.len(), 1);
        assert!(!store.contains(ProjectKey::Name("poems")));
        assert!(!store.contains(ProjectKey::Channel("chan-2")));
    }

    #[test]
    fn flush_then_load() {
        let dir = tempdir().unwrap();
        let mut store = Store::empty(Storage::open(dir.path()).unwrap());
        store.insert(project("novel_abcdefgh", "novel", "chan-1")).unwrap();
        store.insert(project("poems_abcdefgh", "poems", "chan-2")).unwrap();
        store.flush().unwrap();

        let reloaded = Store::load(Storage::open(dir.path()).unwrap()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.lookup(ProjectKey::Channel("chan-2")).unwrap(),
            store.lookup(ProjectKey::Channel("chan-2")).unwrap()
        );
    }

    #[test]
    fn load_skips_conflicting_channel() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        storage.put_project(&project("a_aaaaaaaa", "a", "chan-1")).unwrap();
        storage.put_project(&project("b_bbbbbbbb", "b", "chan-1")).unwrap();

        let store = Store::load(storage).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup(ProjectKey::Channel("chan-1")).unwrap().name(), "a");
    }
}
