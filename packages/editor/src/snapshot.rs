//! # Project Snapshot Controller
//!
//! Saves an editing session back into the project collection when the user
//! leaves the editor.

use bigo_common::{KeyValueStore, Project, ProjectRepository, SourceBundle, Upserted};

use crate::preview::PreviewSurface;
use crate::session::EditSession;

pub struct SnapshotController;

impl SnapshotController {
    /// Upsert `project` with `buffers` and `project_name`, then clear
    /// `project` to the empty sentinel
    ///
    /// Never blocks the exit: a corrupt collection is read as empty by the
    /// repository, and a failed write is logged and reported as `None`.
    pub fn exit<S: KeyValueStore>(
        repository: &mut ProjectRepository<S>,
        project: &mut Project,
        buffers: &SourceBundle,
        project_name: &str,
    ) -> Option<Upserted> {
        let record = Project {
            id: project.id.clone(),
            kind: project.kind,
            project_name: project_name.to_string(),
            source: buffers.clone(),
        };

        let outcome = match repository.upsert(&record) {
            Ok(outcome) => {
                tracing::info!("[SnapshotController] saved {} ({:?})", record.id, outcome);
                Some(outcome)
            }
            Err(err) => {
                tracing::error!("[SnapshotController] could not save {}: {}", record.id, err);
                None
            }
        };

        *project = Project::empty();
        outcome
    }

    /// Close `session` and save it over `active`
    pub fn exit_session<S: KeyValueStore, P: PreviewSurface>(
        repository: &mut ProjectRepository<S>,
        active: &mut Project,
        session: EditSession<P>,
    ) -> Option<Upserted> {
        let snapshot = session.close();
        if !active.is_empty() && active.id != snapshot.id {
            tracing::warn!(
                "[SnapshotController] session {} does not match active project {}",
                snapshot.id,
                active.id
            );
        }

        // The session is authoritative for id and kind
        active.id = snapshot.id.clone();
        active.kind = snapshot.kind;
        Self::exit(repository, active, &snapshot.source, &snapshot.project_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigo_common::{MemoryStore, ProjectKind, StorageError, StorageResult, PROJECTS_KEY};

    /// A store whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_exit_inserts_then_updates() {
        let mut repository = ProjectRepository::new(MemoryStore::new());
        let original = Project::new(ProjectKind::Vanilla);

        let mut active = original.clone();
        let buffers = SourceBundle::new("<p>1</p>", "", "one()");
        assert_eq!(
            SnapshotController::exit(&mut repository, &mut active, &buffers, "First"),
            Some(Upserted::Inserted)
        );
        assert!(active.is_empty());

        let mut active = original.clone();
        let buffers = SourceBundle::new("<p>2</p>", "", "two()");
        assert_eq!(
            SnapshotController::exit(&mut repository, &mut active, &buffers, "Second"),
            Some(Upserted::Updated)
        );

        let all = repository.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].project_name, "Second");
        assert_eq!(all[0].source, buffers);
    }

    #[test]
    fn test_exit_over_corrupt_collection_appends() {
        let store = MemoryStore::new().with_entry(PROJECTS_KEY, "not json at all");
        let mut repository = ProjectRepository::new(store);
        let mut active = Project::new(ProjectKind::React);
        let id = active.id.clone();

        let outcome =
            SnapshotController::exit(&mut repository, &mut active, &SourceBundle::default(), "x");
        assert_eq!(outcome, Some(Upserted::Inserted));
        assert_eq!(repository.load_all().len(), 1);
        assert!(repository.find(&id).is_some());
    }

    #[test]
    fn test_failed_write_still_exits() {
        let mut repository = ProjectRepository::new(ReadOnlyStore);
        let mut active = Project::new(ProjectKind::Vanilla);

        let outcome =
            SnapshotController::exit(&mut repository, &mut active, &SourceBundle::default(), "x");
        assert_eq!(outcome, None);
        assert!(active.is_empty());
    }
}
