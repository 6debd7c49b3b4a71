//! # Playground
//!
//! The explicit context that replaces a global "current project": it owns
//! the project collection and the active project, and tells the navigation
//! layer where to go after every lifecycle action.

use std::fmt;

use bigo_common::{KeyValueStore, Project, ProjectKind, ProjectRepository, Upserted};

use crate::config::PlaygroundConfig;
use crate::errors::EditorError;
use crate::preview::{PreviewSurface, SandboxRenderer};
use crate::session::EditSession;
use crate::snapshot::SnapshotController;

/// Where the navigation layer should be
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    VanillaEditor { id: String },
    ReactEditor { id: String },
}

impl Route {
    /// Route for `project`; the empty sentinel goes to the landing view
    pub fn for_project(project: &Project) -> Self {
        if project.is_empty() {
            return Route::Landing;
        }
        let id = project.id.clone();
        match project.kind {
            ProjectKind::React => Route::ReactEditor { id },
            ProjectKind::Vanilla => Route::VanillaEditor { id },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::VanillaEditor { id } => format!("/editor/{}", id),
            Route::ReactEditor { id } => format!("/react/{}", id),
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::Landing);
        }
        if let Some(id) = trimmed.strip_prefix("/editor/") {
            return (!id.is_empty() && !id.contains('/'))
                .then(|| Route::VanillaEditor { id: id.to_string() });
        }
        if let Some(id) = trimmed.strip_prefix("/react/") {
            return (!id.is_empty() && !id.contains('/'))
                .then(|| Route::ReactEditor { id: id.to_string() });
        }
        None
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Route::Landing => None,
            Route::VanillaEditor { id } | Route::ReactEditor { id } => Some(id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub struct Playground<S> {
    config: PlaygroundConfig,
    repository: ProjectRepository<S>,
    active: Project,
}

impl<S: KeyValueStore> Playground<S> {
    pub fn new(store: S, config: PlaygroundConfig) -> Self {
        let repository = ProjectRepository::with_key(store, config.storage_key.clone());
        Self {
            config,
            repository,
            active: Project::empty(),
        }
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn repository(&self) -> &ProjectRepository<S> {
        &self.repository
    }

    pub fn active(&self) -> &Project {
        &self.active
    }

    /// Saved projects, for the gallery
    pub fn projects(&self) -> Vec<Project> {
        self.repository.load_all()
    }

    /// Start a new project from the `kind` template
    ///
    /// Nothing is saved until the editor is exited.
    pub fn create(&mut self, kind: ProjectKind) -> Route {
        self.active = Project::new(kind);
        tracing::info!("[Playground] created {} project {}", kind, self.active.id);
        self.route()
    }

    /// Make the saved project `id` active
    ///
    /// An id that is not in the collection clears the active project and
    /// routes to the landing view.
    pub fn open(&mut self, id: &str) -> Route {
        match self.repository.find(id) {
            Some(project) => self.active = project,
            None => {
                tracing::warn!("[Playground] no saved project {}", id);
                self.active = Project::empty();
            }
        }
        self.route()
    }

    /// Remove a saved project; returns whether it existed
    pub fn delete(&mut self, id: &str) -> Result<bool, EditorError> {
        let removed = self.repository.delete(id)?;
        if removed && self.active.id == id {
            self.active = Project::empty();
        }
        Ok(removed)
    }

    pub fn route(&self) -> Route {
        Route::for_project(&self.active)
    }

    /// Open an edit session on the active project with the configured sandbox
    pub fn start_session(&self) -> Result<EditSession, EditorError> {
        self.start_session_with(SandboxRenderer::new(self.config.sandbox_policy()))
    }

    pub fn start_session_with<P: PreviewSurface>(
        &self,
        surface: P,
    ) -> Result<EditSession<P>, EditorError> {
        if self.active.is_empty() {
            return Err(EditorError::NoActiveProject);
        }
        Ok(EditSession::open(self.active.clone(), &self.config, surface))
    }

    /// Save `session` and leave the editor
    pub fn exit<P: PreviewSurface>(&mut self, session: EditSession<P>) -> (Route, Option<Upserted>) {
        let outcome = SnapshotController::exit_session(&mut self.repository, &mut self.active, session);
        (self.route(), outcome)
    }
}
