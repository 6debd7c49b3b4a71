//! # Edit Session
//!
//! One open project in one editor view.
//!
//! An EditSession owns the three buffers, the focus selector, the preview
//! pipeline and the surface it renders to. It is created from a project
//! record and turned back into one by [`EditSession::snapshot`]; dropping it
//! drops the pending transform with it.

use std::time::Duration;

use bigo_common::{Project, ProjectKind, SourceBundle};
use bigo_compiler_html::DocumentOptions;
use bigo_transform::TransformResult;

use crate::config::PlaygroundConfig;
use crate::focus::{Focus, Pane, WidgetBinding};
use crate::pipeline::PreviewPipeline;
use crate::preview::{PreviewSurface, SandboxRenderer};

#[derive(Debug)]
pub struct EditSession<P = SandboxRenderer> {
    id: String,
    kind: ProjectKind,
    project_name: String,
    buffers: SourceBundle,
    focus: Focus,
    pipeline: PreviewPipeline,
    surface: P,
}

impl<P: PreviewSurface> EditSession<P> {
    /// Open `project` with the configured quiet period and runtime scripts
    pub fn open(project: Project, config: &PlaygroundConfig, surface: P) -> Self {
        Self::open_with(project, config.debounce(), config.document_options(), surface)
    }

    /// Open `project`, transforming its JS immediately and rendering once
    pub fn open_with(
        project: Project,
        delay: Duration,
        document_options: DocumentOptions,
        surface: P,
    ) -> Self {
        let Project {
            id,
            kind,
            project_name,
            source,
        } = project;

        let mut session = Self {
            id,
            kind,
            project_name,
            buffers: source,
            focus: Focus::new(kind),
            pipeline: PreviewPipeline::new(kind.dialect(), delay, document_options),
            surface,
        };

        tracing::info!("[EditSession] opened {} ({})", session.id, kind);
        session.pipeline.run(&session.buffers.js);
        session.render();
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = name.into();
    }

    pub fn buffers(&self) -> &SourceBundle {
        &self.buffers
    }

    /// Currently focused pane
    pub fn pane(&self) -> Pane {
        self.focus.pane()
    }

    /// What the shared widget should currently show
    pub fn binding(&self) -> WidgetBinding {
        self.focus.binding(&self.buffers)
    }

    /// Bind the shared widget to `pane`
    pub fn focus(&mut self, pane: Pane) -> WidgetBinding {
        self.focus.select(pane, &self.buffers)
    }

    /// Apply a change emitted by the shared widget
    ///
    /// HTML and CSS edits re-render straight away with the last transform
    /// result. JS edits re-arm the debounced transform and render nothing
    /// until it settles.
    pub fn edit(&mut self, value: Option<String>) {
        match self.focus.route(&mut self.buffers, value) {
            Some(Pane::Js) => self.pipeline.source_changed(),
            Some(Pane::Html | Pane::Css) => self.render(),
            None => {}
        }
    }

    /// Whether a JS transform is waiting for its quiet period
    pub fn is_pending(&self) -> bool {
        self.pipeline.is_pending()
    }

    /// Wait for the pending transform, run it on the current JS buffer and
    /// re-render
    ///
    /// Cancel-safe, and pends forever when nothing is pending.
    pub async fn settle(&mut self) -> &TransformResult {
        let request = self.pipeline.next_due().await;
        tracing::debug!(
            "[EditSession] settling revision {} of {}",
            request.revision,
            self.id
        );
        self.pipeline.run(&self.buffers.js);
        self.render();
        self.pipeline.last_result()
    }

    pub fn last_result(&self) -> &TransformResult {
        self.pipeline.last_result()
    }

    /// Transforms run since the session opened, including the initial one
    pub fn transform_count(&self) -> u64 {
        self.pipeline.transform_count()
    }

    /// The document the surface is currently showing
    pub fn document(&self) -> String {
        self.pipeline.assemble(&self.buffers)
    }

    pub fn surface(&self) -> &P {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut P {
        &mut self.surface
    }

    /// The session as a project record
    pub fn snapshot(&self) -> Project {
        Project {
            id: self.id.clone(),
            kind: self.kind,
            project_name: self.project_name.clone(),
            source: self.buffers.clone(),
        }
    }

    /// End the session, dropping any pending transform
    pub fn close(mut self) -> Project {
        if self.pipeline.cancel() {
            tracing::debug!("[EditSession] dropped pending transform for {}", self.id);
        }
        tracing::info!("[EditSession] closed {}", self.id);
        self.snapshot()
    }

    fn render(&mut self) {
        let document = self.pipeline.assemble(&self.buffers);
        self.surface.render(document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        documents: Vec<String>,
    }

    impl PreviewSurface for Recorder {
        fn render(&mut self, document: String) -> u64 {
            self.documents.push(document);
            self.documents.len() as u64
        }
    }

    fn open(project: Project) -> EditSession<Recorder> {
        EditSession::open(project, &PlaygroundConfig::default(), Recorder::default())
    }

    #[test]
    fn test_open_renders_once() {
        let session = open(Project::new(ProjectKind::Vanilla));
        assert_eq!(session.surface().documents.len(), 1);
        assert_eq!(session.transform_count(), 1);
        assert_eq!(session.pane(), Pane::Html);
        assert!(session.surface().documents[0].contains("Start coding now"));
    }

    #[test]
    fn test_markup_edits_render_immediately() {
        let mut session = open(Project::new(ProjectKind::Vanilla));
        session.edit(Some("<h2>changed</h2>".to_string()));
        session.focus(Pane::Css);
        session.edit(Some("h2 { color: teal }".to_string()));

        let documents = &session.surface().documents;
        assert_eq!(documents.len(), 3);
        assert!(documents[2].contains("<h2>changed</h2>"));
        assert!(documents[2].contains("h2 { color: teal }"));
        assert_eq!(session.transform_count(), 1);
    }

    #[test]
    fn test_none_edit_is_ignored() {
        let mut session = open(Project::new(ProjectKind::Vanilla));
        let before = session.buffers().clone();
        session.edit(None);
        assert_eq!(session.buffers(), &before);
        assert_eq!(session.surface().documents.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_js_edit_waits_for_settle() {
        let mut session = open(Project::new(ProjectKind::Vanilla));
        session.focus(Pane::Js);
        session.edit(Some("let x = 2 ** 8;".to_string()));

        assert!(session.is_pending());
        assert_eq!(session.surface().documents.len(), 1);

        let result = session.settle().await;
        assert!(result.as_ref().unwrap().code.contains("Math.pow(2, 8)"));
        assert_eq!(session.transform_count(), 2);
        assert_eq!(session.surface().documents.len(), 2);
    }

    #[test]
    fn test_snapshot_and_close() {
        let project = Project::new(ProjectKind::React);
        let mut session = open(project.clone());
        session.set_project_name("Counter");
        session.focus(Pane::Css);
        session.edit(Some("body {}".to_string()));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.id, project.id);
        assert_eq!(snapshot.kind, ProjectKind::React);
        assert_eq!(snapshot.project_name, "Counter");
        assert_eq!(snapshot.source.css, "body {}");
        assert_eq!(snapshot.source.js, project.source.js);

        assert_eq!(session.close(), snapshot);
    }
}
