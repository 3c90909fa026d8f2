//! Request and vote-tally handling.
//!
//! The engine owns the [`Store`] and is driven one event at a time: a
//! creation or mutation request, or a [`VoteTally`] from the voting layer.
//! Entities are addressed with plain handles ([`FileRef`], [`LineRef`]) that
//! are valid until the next mutating event.
//!
//! # Proposal lifecycle
//!
//! ```text
//! Pending ──tally approves──▶ Applied    (removed by apply)
//! Pending ──tally short─────▶ Pending    (waits for the next tally)
//! Pending ──other applied───▶ Discarded  (same line, removed unevaluated)
//! ```

use crate::error::{Error, Result};
use crate::ident::{is_name_valid, new_identifier};
use crate::models::{File, Line, Project, MAIN_FILE};
use crate::store::{ProjectKey, Store};
use concord_consensus::{evaluate, Approval, Proposal, ProposalId, Scope, UserId, VoteTally};

/// Handle to a file within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub project: String,
    pub file: String,
}

/// Handle to a line by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineRef {
    pub file: FileRef,
    pub index: usize,
}

/// What a proposal is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Line(LineRef),
    File(FileRef),
}

impl Target {
    fn scope(&self) -> Scope {
        match self {
            Target::Line(_) => Scope::Line,
            Target::File(_) => Scope::File,
        }
    }

    fn file_ref(&self) -> &FileRef {
        match self {
            Target::Line(line) => &line.file,
            Target::File(file) => file,
        }
    }
}

/// A pending proposal and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub target: Target,
    pub proposal: Proposal,
}

/// Result of handling a vote tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The proposal was approved and applied
    Applied,
    /// Not enough contributors approved; still pending
    Pending { yes: usize, needed: usize },
}

impl Outcome {
    pub fn applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// The consensus engine.
#[derive(Debug)]
pub struct Engine {
    store: Store,
}

impl Engine {
    /// Create an engine over a loaded store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Write everything back to storage.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Look a project up by name or channel.
    pub fn project(&self, key: ProjectKey<'_>) -> Result<&Project> {
        self.store.lookup(key)
    }

    // --- Creation ---

    /// Create a project bound to `channel`, with an empty `main` file.
    ///
    /// The creator becomes the main file's first contributor and is focused
    /// on it. Returns the project identifier.
    pub fn create_project(&mut self, name: &str, channel: &str, creator: &UserId) -> Result<String> {
        if !is_name_valid(name) || self.store.storage().nests_in_project(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        if self.store.contains(ProjectKey::Name(name)) {
            return Err(Error::Duplicate(format!("project name {:?}", name)));
        }
        if self.store.contains(ProjectKey::Channel(channel)) {
            return Err(Error::Duplicate(format!("project for channel {}", channel)));
        }

        let store = &self.store;
        let id = new_identifier(name, |c| {
            store.contains_id(c) || store.storage().project_exists(c)
        });
        let file_id = new_identifier(MAIN_FILE, |_| false);

        let mut project = Project::new(id.clone(), name.to_string(), channel.to_string());
        project.add_file(File::new(file_id, MAIN_FILE.to_string(), creator.clone()))?;
        project.set_focus(creator.clone(), MAIN_FILE)?;

        // bind only once the project is on disk
        self.store.storage().put_project(&project)?;
        self.store.insert(project)?;
        tracing::info!(project = %id, %channel, "project created");
        Ok(id)
    }

    /// Create an empty file and focus its creator on it.
    pub fn create_file(&mut self, project_id: &str, name: &str, creator: &UserId) -> Result<FileRef> {
        if !is_name_valid(name) {
            return Err(Error::InvalidName(name.to_string()));
        }

        let project = self.store.get(project_id)?;
        if project.file_by_name(name).is_some() {
            return Err(Error::Duplicate(format!(
                "file {:?} in project {}",
                name, project.name()
            )));
        }
        let storage = self.store.storage();
        let file_id = new_identifier(name, |c| {
            project.file(c).is_some() || storage.file_exists(project_id, c)
        });

        let project = self.store.get_mut(project_id)?;
        let previous_focus = project.current(creator).map(|f| f.name.clone());
        project.add_file(File::new(file_id.clone(), name.to_string(), creator.clone()))?;
        project.set_focus(creator.clone(), name)?;

        if let Err(e) = self.store.save_project(project_id) {
            self.unwind_file(project_id, &file_id, creator, previous_focus);
            return Err(e);
        }
        tracing::info!(project = %project_id, file = %file_id, "file created");
        Ok(FileRef {
            project: project_id.to_string(),
            file: file_id,
        })
    }

    /// Drop a file whose creation could not be persisted.
    fn unwind_file(
        &mut self,
        project_id: &str,
        file_id: &str,
        creator: &UserId,
        previous_focus: Option<String>,
    ) {
        if let Ok(project) = self.store.get_mut(project_id) {
            project.remove_file(file_id);
            if let Some(previous) = previous_focus {
                let _ = project.set_focus(creator.clone(), &previous);
            }
        }
        if let Err(e) = self.store.storage().delete_file(project_id, file_id) {
            tracing::warn!(project = %project_id, file = %file_id, "leftover file document: {}", e);
        }
    }

    /// Insert a line at `index`, clamped into `[0, len]`. No vote needed.
    pub fn append_line(
        &mut self,
        file: &FileRef,
        index: i64,
        content: &str,
        author: &UserId,
    ) -> Result<LineRef> {
        let position = self
            .file_mut(file)?
            .insert_line(index, content, author.clone());
        self.store.save_file(&file.project, &file.file)?;
        tracing::debug!(file = %file.file, position, %author, "line added");
        Ok(LineRef {
            file: file.clone(),
            index: position,
        })
    }

    // --- Focus ---

    /// Focus `user` on the file called `file_name`.
    pub fn focus(&mut self, project_id: &str, user: &UserId, file_name: &str) -> Result<FileRef> {
        let file_id = self
            .store
            .get_mut(project_id)?
            .set_focus(user.clone(), file_name)?
            .id
            .clone();
        self.store.save_project(project_id)?;
        Ok(FileRef {
            project: project_id.to_string(),
            file: file_id,
        })
    }

    /// The file `user` is currently editing.
    pub fn current(&self, project_id: &str, user: &UserId) -> Result<FileRef> {
        let project = self.store.get(project_id)?;
        let file = project
            .current(user)
            .ok_or_else(|| Error::NotFound(format!("focused file for {} in {}", user, project.name())))?;
        Ok(FileRef {
            project: project_id.to_string(),
            file: file.id.clone(),
        })
    }

    // --- Reading ---

    /// Get a file.
    pub fn file(&self, file: &FileRef) -> Result<&File> {
        let project = self.store.get(&file.project)?;
        project
            .file(&file.file)
            .ok_or_else(|| Error::NotFound(format!("file {} in project {}", file.file, project.name())))
    }

    /// Get a line.
    pub fn line(&self, line: &LineRef) -> Result<&Line> {
        let file = self.file(&line.file)?;
        file.line(line.index)
            .ok_or_else(|| Error::NotFound(format!("line {} in file {}", line.index, file.name)))
    }

    /// Handle for the line at `index` of `file`.
    pub fn line_ref(&self, file: &FileRef, index: usize) -> Result<LineRef> {
        let line = LineRef {
            file: file.clone(),
            index,
        };
        self.line(&line)?;
        Ok(line)
    }

    /// Handle for the file called `name`.
    pub fn file_ref(&self, project_id: &str, name: &str) -> Result<FileRef> {
        let project = self.store.get(project_id)?;
        let file = project
            .file_by_name(name)
            .ok_or_else(|| Error::NotFound(format!("file {:?} in project {}", name, project.name())))?;
        Ok(FileRef {
            project: project_id.to_string(),
            file: file.id.clone(),
        })
    }

    /// File names in project order.
    pub fn list_files(&self, project_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .get(project_id)?
            .files()
            .iter()
            .map(|f| f.name.clone())
            .collect())
    }

    /// Line contents of the file called `name`.
    pub fn view_file(&self, project_id: &str, name: &str) -> Result<Vec<String>> {
        let file = self.file(&self.file_ref(project_id, name)?)?;
        Ok(file.contents())
    }

    fn file_mut(&mut self, file: &FileRef) -> Result<&mut File> {
        let project = self.store.get_mut(&file.project)?;
        let name = project.name().to_string();
        project
            .file_mut(&file.file)
            .ok_or_else(|| Error::NotFound(format!("file {} in project {}", file.file, name)))
    }

    // --- Proposals ---

    /// Propose replacing a line's content.
    pub fn propose_edit(
        &mut self,
        line: &LineRef,
        id: ProposalId,
        author: &UserId,
        new_content: &str,
    ) -> Result<()> {
        self.propose(
            &Target::Line(line.clone()),
            id,
            Proposal::edit(author.clone(), new_content),
        )
    }

    /// Propose removing a line.
    pub fn propose_delete_line(&mut self, line: &LineRef, id: ProposalId, author: &UserId) -> Result<()> {
        self.propose(
            &Target::Line(line.clone()),
            id,
            Proposal::delete_line(author.clone()),
        )
    }

    /// Propose removing a whole file.
    pub fn propose_delete_file(&mut self, file: &FileRef, id: ProposalId, author: &UserId) -> Result<()> {
        self.propose(
            &Target::File(file.clone()),
            id,
            Proposal::delete_file(author.clone()),
        )
    }

    /// Attach `proposal` to `target` under `id`. Never evaluates.
    ///
    /// Proposal identifiers must be unique across every project.
    pub fn propose(&mut self, target: &Target, id: ProposalId, proposal: Proposal) -> Result<()> {
        if proposal.scope() != target.scope() {
            return Err(Error::InvalidProposal(format!(
                "{} proposal cannot target a {}",
                proposal.kind(),
                target.scope()
            )));
        }
        if self.locate(&id).is_ok() {
            return Err(Error::InvalidProposal(format!("{} is already pending", id)));
        }

        let kind = proposal.kind();
        match target {
            Target::Line(line) => {
                let file = self.file_mut(&line.file)?;
                let name = file.name.clone();
                file.line_mut(line.index)
                    .ok_or_else(|| Error::NotFound(format!("line {} in file {}", line.index, name)))?
                    .propose(id.clone(), proposal)?;
            }
            Target::File(file) => self.file_mut(file)?.propose(id.clone(), proposal)?,
        }

        let file = target.file_ref();
        self.store.save_file(&file.project, &file.file)?;
        tracing::debug!(proposal = %id, %kind, file = %file.file, "proposal attached");
        Ok(())
    }

    /// Find the pending proposal `id` anywhere in the store.
    pub fn locate(&self, id: &ProposalId) -> Result<Located> {
        for project in self.store.projects() {
            for file in project.files() {
                let file_ref = FileRef {
                    project: project.id().to_string(),
                    file: file.id.clone(),
                };
                if let Some(proposal) = file.pending.get(id) {
                    return Ok(Located {
                        target: Target::File(file_ref),
                        proposal: proposal.clone(),
                    });
                }
                for (index, line) in file.lines.iter().enumerate() {
                    if let Some(proposal) = line.pending.get(id) {
                        return Ok(Located {
                            target: Target::Line(LineRef {
                                file: file_ref,
                                index,
                            }),
                            proposal: proposal.clone(),
                        });
                    }
                }
            }
        }
        Err(Error::NotFound(format!("proposal {}", id)))
    }

    /// Evaluate `tally` for a located proposal against its target's contributors.
    pub fn evaluate(&self, located: &Located, tally: &VoteTally) -> Result<Approval> {
        let contributors = match &located.target {
            Target::Line(line) => &self.line(line)?.contributors,
            Target::File(file) => &self.file(file)?.contributors,
        };
        Ok(evaluate(&located.proposal, contributors, tally))
    }

    /// Handle one vote-tally event: locate, evaluate, and apply if approved.
    pub fn on_vote_tally(&mut self, tally: &VoteTally) -> Result<Outcome> {
        let located = self.locate(&tally.proposal)?;
        match self.evaluate(&located, tally)? {
            Approval::Approved { yes, required } => {
                tracing::info!(
                    proposal = %tally.proposal,
                    kind = %located.proposal.kind(),
                    yes,
                    required,
                    "proposal approved"
                );
                self.apply(located)?;
                Ok(Outcome::Applied)
            }
            Approval::Insufficient { yes, needed } => {
                tracing::debug!(proposal = %tally.proposal, yes, needed, "proposal still pending");
                Ok(Outcome::Pending { yes, needed })
            }
        }
    }

    /// Apply an approved proposal and persist the affected document.
    fn apply(&mut self, located: Located) -> Result<()> {
        match (located.target, located.proposal) {
            (Target::Line(line), Proposal::Edit { proposer, new_content }) => {
                self.file_mut(&line.file)?
                    .apply_edit(line.index, new_content, proposer)?;
                self.store.save_file(&line.file.project, &line.file.file)
            }
            (Target::Line(line), Proposal::DeleteLine { proposer }) => {
                self.file_mut(&line.file)?.remove_line(line.index, proposer)?;
                self.store.save_file(&line.file.project, &line.file.file)
            }
            (Target::File(file), Proposal::DeleteFile { .. }) => {
                let project = self.store.get_mut(&file.project)?;
                project
                    .remove_file(&file.file)
                    .ok_or_else(|| Error::NotFound(format!("file {}", file.file)))?;
                self.store.save_project(&file.project)?;
                self.store.storage().delete_file(&file.project, &file.file)
            }
            (target, proposal) => Err(Error::InvalidProposal(format!(
                "{} proposal attached to a {}",
                proposal.kind(),
                target.scope()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::{tempdir, TempDir};

    fn user(name: &str) -> UserId {
        UserId::from(name)
    }

    fn users(names: &[&str]) -> Vec<UserId> {
        names.iter().map(|n| user(n)).collect()
    }

    fn tally(id: &str, yes: &[&str], no: &[&str]) -> VoteTally {
        VoteTally::new(ProposalId::from(id), users(yes), users(no))
    }

    fn engine() -> (TempDir, Engine) {
        let dir = tempdir().unwrap();
        let store = Store::load(Storage::open(dir.path()).unwrap()).unwrap();
        (dir, Engine::new(store))
    }

    /// A project whose main file has one line written by every name in `authors`.
    fn shared_line(engine: &mut Engine, authors: &[&str]) -> LineRef {
        let project = engine.create_project("novel", "chan-1", &user(authors[0])).unwrap();
        let main = engine.current(&project, &user(authors[0])).unwrap();
        let line = engine.append_line(&main, 0, "original", &user(authors[0])).unwrap();

        // co-authors join the line through approved edits
        for (i, author) in authors.iter().enumerate().skip(1) {
            let id = format!("join-{}", i);
            engine
                .propose_edit(&line, ProposalId::from(id.as_str()), &user(author), "original")
                .unwrap();
            let yes: Vec<&str> = authors[..i].to_vec();
            assert!(engine.on_vote_tally(&tally(&id, &yes, &[])).unwrap().applied());
        }
        assert_eq!(engine.line(&line).unwrap().contributors.len(), authors.len());
        line
    }

    #[test]
    fn create_project_with_main_file() {
        let (_dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();

        assert!(id.starts_with("novel_"));
        assert_eq!(engine.list_files(&id).unwrap(), vec!["main"]);
        let main = engine.current(&id, &user("alice")).unwrap();
        assert!(engine.file(&main).unwrap().contributors.contains(&user("alice")));

        let by_channel = engine.project(ProjectKey::Channel("chan-1")).unwrap();
        let by_name = engine.project(ProjectKey::Name("novel")).unwrap();
        assert_eq!(by_channel.id(), by_name.id());
    }

    #[test]
    fn create_project_duplicates() {
        let (_dir, mut engine) = engine();
        engine.create_project("novel", "chan-1", &user("alice")).unwrap();

        assert!(matches!(
            engine.create_project("novel", "chan-2", &user("bob")),
            Err(Error::Duplicate(_))
        ));
        assert!(matches!(
            engine.create_project("poems", "chan-1", &user("bob")),
            Err(Error::Duplicate(_))
        ));
    }

    #[test]
    fn create_rejects_unsafe_names() {
        let (_dir, mut engine) = engine();
        assert!(matches!(
            engine.create_project("../escape", "chan-1", &user("alice")),
            Err(Error::InvalidName(_))
        ));

        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        assert!(matches!(
            engine.create_file(&id, "notes/", &user("alice")),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            engine.create_project(&format!("{}/inner", id), "chan-2", &user("alice")),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn create_file_and_focus() {
        let (_dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();

        let notes = engine.create_file(&id, "notes", &user("bob")).unwrap();
        assert_eq!(engine.current(&id, &user("bob")).unwrap(), notes);
        assert!(matches!(
            engine.create_file(&id, "notes", &user("carol")),
            Err(Error::Duplicate(_))
        ));

        let main = engine.focus(&id, &user("bob"), "main").unwrap();
        assert_eq!(engine.current(&id, &user("bob")).unwrap(), main);
        assert!(matches!(
            engine.focus(&id, &user("bob"), "missing"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            engine.current(&id, &user("dave")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn append_line_clamps_index() {
        let (_dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        let main = engine.current(&id, &user("alice")).unwrap();

        engine.append_line(&main, 0, "b", &user("alice")).unwrap();
        assert_eq!(engine.append_line(&main, 42, "c", &user("alice")).unwrap().index, 1);
        assert_eq!(engine.append_line(&main, -5, "a", &user("bob")).unwrap().index, 0);

        assert_eq!(engine.view_file(&id, "main").unwrap(), vec!["a", "b", "c"]);
        assert!(engine.file(&main).unwrap().contributors.contains(&user("bob")));
    }

    #[test]
    fn edit_threshold_four_of_five() {
        let (_dir, mut engine) = engine();
        let line = shared_line(&mut engine, &["a", "b", "c", "d", "e"]);

        engine
            .propose_edit(&line, ProposalId::from("poll"), &user("a"), "rewritten")
            .unwrap();

        let outcome = engine.on_vote_tally(&tally("poll", &["a", "b", "c"], &[])).unwrap();
        assert_eq!(outcome, Outcome::Pending { yes: 3, needed: 1 });
        assert_eq!(engine.line(&line).unwrap().content, "original");

        let outcome = engine
            .on_vote_tally(&tally("poll", &["a", "b", "c", "d"], &["e"]))
            .unwrap();
        assert!(outcome.applied());
        assert_eq!(engine.line(&line).unwrap().content, "rewritten");
        assert!(matches!(
            engine.locate(&ProposalId::from("poll")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn delete_line_needs_everyone() {
        let (_dir, mut engine) = engine();
        let line = shared_line(&mut engine, &["a", "b", "c"]);

        engine
            .propose_delete_line(&line, ProposalId::from("del"), &user("z"))
            .unwrap();

        let outcome = engine.on_vote_tally(&tally("del", &["a", "b", "z"], &[])).unwrap();
        assert!(!outcome.applied());

        assert!(engine.on_vote_tally(&tally("del", &["a", "b", "c"], &[])).unwrap().applied());
        let file = engine.file(&line.file).unwrap();
        assert!(file.is_empty());
        assert!(file.contributors.contains(&user("z")));
    }

    #[test]
    fn applied_edit_discards_competing_proposals() {
        let (_dir, mut engine) = engine();
        let line = shared_line(&mut engine, &["a"]);

        engine
            .propose_edit(&line, ProposalId::from("first"), &user("b"), "one")
            .unwrap();
        engine
            .propose_edit(&line, ProposalId::from("second"), &user("c"), "two")
            .unwrap();
        engine
            .propose_delete_line(&line, ProposalId::from("third"), &user("d"))
            .unwrap();

        assert!(engine.on_vote_tally(&tally("first", &["a"], &[])).unwrap().applied());

        let current = engine.line(&line).unwrap();
        assert_eq!(current.content, "one");
        assert!(current.pending.is_empty());
        assert!(current.contributors.contains(&user("b")));
        assert!(matches!(
            engine.on_vote_tally(&tally("second", &["a", "b"], &[])),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn deleting_file_clears_focus() {
        let (_dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        let notes = engine.create_file(&id, "notes", &user("alice")).unwrap();
        engine.focus(&id, &user("bob"), "notes").unwrap();
        engine.focus(&id, &user("carol"), "main").unwrap();

        engine
            .propose_delete_file(&notes, ProposalId::from("rm"), &user("bob"))
            .unwrap();
        assert!(engine.on_vote_tally(&tally("rm", &["alice"], &[])).unwrap().applied());

        assert_eq!(engine.list_files(&id).unwrap(), vec!["main"]);
        assert!(engine.current(&id, &user("alice")).is_err());
        assert!(engine.current(&id, &user("bob")).is_err());
        assert!(engine.current(&id, &user("carol")).is_ok());
        assert!(!engine.store().storage().file_exists(&id, &notes.file));
    }

    #[test]
    fn proposal_must_fit_target() {
        let (_dir, mut engine) = engine();
        let line = shared_line(&mut engine, &["a"]);

        let err = engine
            .propose(
                &Target::Line(line.clone()),
                ProposalId::from("x"),
                Proposal::delete_file(user("a")),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProposal(_)));

        engine
            .propose_delete_line(&line, ProposalId::from("x"), &user("a"))
            .unwrap();
        let again = engine.propose_edit(&line, ProposalId::from("x"), &user("a"), "y");
        assert!(matches!(again, Err(Error::InvalidProposal(_))));
    }

    #[test]
    fn unknown_tally_is_not_found() {
        let (_dir, mut engine) = engine();
        assert!(matches!(
            engine.on_vote_tally(&tally("nope", &["a"], &[])),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn pending_proposals_survive_restart() {
        let dir = tempdir().unwrap();
        let line = {
            let store = Store::load(Storage::open(dir.path()).unwrap()).unwrap();
            let mut engine = Engine::new(store);
            let line = shared_line(&mut engine, &["a", "b"]);
            engine
                .propose_edit(&line, ProposalId::from("later"), &user("c"), "after restart")
                .unwrap();
            line
        };

        let store = Store::load(Storage::open(dir.path()).unwrap()).unwrap();
        let mut engine = Engine::new(store);
        assert!(engine.on_vote_tally(&tally("later", &["a", "b"], &[])).unwrap().applied());
        assert_eq!(engine.line(&line).unwrap().content, "after restart");
    }

    #[test]
    fn failed_project_write_leaves_channel_free() {
        let (_dir, mut engine) = engine();
        let long = "a".repeat(300);

        let err = engine.create_project(&long, "chan-1", &user("alice")).unwrap_err();
        assert_eq!(err.kind(), "storage");
        assert!(engine.store().is_empty());
        assert!(matches!(
            engine.project(ProjectKey::Channel("chan-1")),
            Err(Error::NotFound(_))
        ));

        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        assert_eq!(engine.list_files(&id).unwrap(), vec!["main"]);
        engine.flush().unwrap();
    }

    #[test]
    fn failed_file_write_unwinds_file_and_focus() {
        let (dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        let main = engine.current(&id, &user("alice")).unwrap();

        let err = engine.create_file(&id, &"b".repeat(300), &user("alice")).unwrap_err();
        assert_eq!(err.kind(), "storage");
        assert_eq!(engine.list_files(&id).unwrap(), vec!["main"]);
        assert_eq!(engine.current(&id, &user("alice")).unwrap(), main);

        let err = engine.create_file(&id, &"c".repeat(300), &user("bob")).unwrap_err();
        assert_eq!(err.kind(), "storage");
        assert!(matches!(engine.current(&id, &user("bob")), Err(Error::NotFound(_))));

        engine.flush().unwrap();
        let store = Store::load(Storage::open(dir.path()).unwrap()).unwrap();
        assert_eq!(Engine::new(store).list_files(&id).unwrap(), vec!["main"]);
    }

    #[test]
    fn failed_apply_write_keeps_edit_in_memory() {
        let (dir, mut engine) = engine();
        let id = engine.create_project("novel", "chan-1", &user("alice")).unwrap();
        let main = engine.current(&id, &user("alice")).unwrap();
        let line = engine.append_line(&main, 0, "draft", &user("alice")).unwrap();

        // a directory where the document belongs makes the rename fail
        let doc = dir
            .path()
            .join("projects")
            .join(&main.project)
            .join("files")
            .join(format!("{}.json", main.file));
        std::fs::remove_file(&doc).unwrap();
        std::fs::create_dir(&doc).unwrap();

        engine
            .propose_edit(&line, ProposalId::from("p1"), &user("alice"), "final")
            .unwrap();
        let err = engine.on_vote_tally(&tally("p1", &["alice"], &[])).unwrap_err();
        assert_eq!(err.kind(), "storage");

        let applied = engine.line(&line).unwrap();
        assert_eq!(applied.content, "final");
        assert!(applied.pending.is_empty());
        assert!(matches!(
            engine.on_vote_tally(&tally("p1", &["alice"], &[])),
            Err(Error::NotFound(_))
        ));
    }
}
