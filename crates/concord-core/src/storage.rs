//! Persistent storage as JSON documents on the filesystem.
//!
//! ```text
//! <root>/projects/<project_id>/project.json         manifest
//! <root>/projects/<project_id>/files/<file_id>.json one document per file
//! ```
//!
//! Identifiers may contain `/`, so both levels are discovered recursively.
//! Every document is written to a temp file and renamed over the target.

use crate::error::{Error, Result};
use crate::models::{File, Project};
use concord_consensus::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

const PROJECTS_DIR: &str = "projects";
const MANIFEST: &str = "project.json";
const FILES_DIR: &str = "files";
const DOCUMENT_EXT: &str = "json";

/// Persisted form of a project without its files.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    id: String,
    name: String,
    channel: String,
    /// File identifiers in order
    #[serde(default)]
    files: Vec<String>,
    /// User → file name
    #[serde(default)]
    focus: BTreeMap<UserId, String>,
}

impl Manifest {
    fn of(project: &Project) -> Self {
        Self {
            id: project.id().to_string(),
            name: project.name().to_string(),
            channel: project.channel().to_string(),
            files: project.files().iter().map(|f| f.id.clone()).collect(),
            focus: project.focus_by_name(),
        }
    }
}

/// Storage backend for Concord data.
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(PROJECTS_DIR))?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id)
    }

    fn file_path(&self, project_id: &str, file_id: &str) -> PathBuf {
        self.project_dir(project_id)
            .join(FILES_DIR)
            .join(format!("{}.{}", file_id, DOCUMENT_EXT))
    }

    /// Whether anything already occupies the path of `project_id`.
    pub fn project_exists(&self, project_id: &str) -> bool {
        self.project_dir(project_id).exists()
    }

    /// Whether anything already occupies the path of `file_id`.
    pub fn file_exists(&self, project_id: &str, file_id: &str) -> bool {
        self.file_path(project_id, file_id).exists()
    }

    /// Whether `name` would place a project directory inside an existing one.
    pub fn nests_in_project(&self, name: &str) -> bool {
        Path::new(name)
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| self.projects_dir().join(a).join(MANIFEST).is_file())
    }

    // --- Projects ---

    /// Store a project: every file document, then the manifest.
    pub fn put_project(&self, project: &Project) -> Result<()> {
        for file in project.files() {
            self.put_file(project.id(), file)?;
        }
        let value = serde_json::to_vec_pretty(&Manifest::of(project))?;
        write_atomic(&self.project_dir(project.id()).join(MANIFEST), &value)
    }

    /// Load every project. Unreadable projects and files are logged and skipped.
    pub fn load_projects(&self) -> Result<Vec<Project>> {
        let mut dirs = Vec::new();
        find_project_dirs(&self.projects_dir(), &mut dirs)?;
        dirs.sort();

        let mut projects = Vec::new();
        for dir in dirs {
            match self.load_project(&dir) {
                Ok(project) => projects.push(project),
                Err(e) => tracing::warn!("skipping project at {:?}: {}", dir, e),
            }
        }
        Ok(projects)
    }

    fn load_project(&self, dir: &Path) -> Result<Project> {
        let data = std::fs::read(dir.join(MANIFEST))?;
        let manifest: Manifest = serde_json::from_slice(&data)?;

        if self.project_dir(&manifest.id) != dir {
            return Err(Error::Storage(format!(
                "manifest id {} does not match its location",
                manifest.id
            )));
        }

        let mut files = Vec::new();
        for file_id in &manifest.files {
            match self.get_file(&manifest.id, file_id) {
                Ok(file) => files.push(file),
                Err(e) => tracing::warn!(project = %manifest.id, file = %file_id, "skipping file: {}", e),
            }
        }

        let listed: BTreeSet<&String> = manifest.files.iter().collect();
        for orphan in self.list_file_ids(&manifest.id)? {
            if !listed.contains(&orphan) {
                tracing::warn!(project = %manifest.id, file = %orphan, "ignoring unlisted file document");
            }
        }

        Ok(Project::restore(
            manifest.id,
            manifest.name,
            manifest.channel,
            files,
            manifest.focus,
        ))
    }

    // --- Files ---

    /// Store a single file document.
    pub fn put_file(&self, project_id: &str, file: &File) -> Result<()> {
        let value = serde_json::to_vec_pretty(file)?;
        write_atomic(&self.file_path(project_id, &file.id), &value)
    }

    /// Get a file document by identifier.
    pub fn get_file(&self, project_id: &str, file_id: &str) -> Result<File> {
        let path = self.file_path(project_id, file_id);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("file document {:?}", path)))
            }
            Err(e) => return Err(e.into()),
        };
        let file: File = serde_json::from_slice(&data)?;
        if file.id != file_id {
            return Err(Error::Storage(format!(
                "file document {:?} holds id {}",
                path, file.id
            )));
        }
        Ok(file)
    }

    /// Delete a file document. Missing documents are not an error.
    pub fn delete_file(&self, project_id: &str, file_id: &str) -> Result<()> {
        match std::fs::remove_file(self.file_path(project_id, file_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Identifiers of every file document under a project.
    pub fn list_file_ids(&self, project_id: &str) -> Result<Vec<String>> {
        let files_dir = self.project_dir(project_id).join(FILES_DIR);
        let mut paths = Vec::new();
        if files_dir.is_dir() {
            find_documents(&files_dir, &mut paths)?;
        }

        let mut ids: Vec<String> = paths
            .iter()
            .filter_map(|p| p.strip_prefix(&files_dir).ok())
            .filter_map(|rel| rel.with_extension("").to_str().map(|s| s.replace('\\', "/")))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Collect directories holding a manifest, without descending into them.
fn find_project_dirs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if path.join(MANIFEST).is_file() {
            out.push(path);
        } else {
            find_project_dirs(&path, out)?;
        }
    }
    Ok(())
}

fn find_documents(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            find_documents(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXT) {
            out.push(path);
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}
