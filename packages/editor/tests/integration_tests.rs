//! Integration tests for the edit → debounce → transform → preview loop

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bigo_common::{FileStore, MemoryStore, ProjectKind, SourceBundle};
use bigo_editor::{
    EditSession, Pane, Playground, PlaygroundConfig, PreviewSurface, Route, SandboxRenderer,
};
use tokio::time::Instant;

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

/// Keeps what was shown reachable after the session is gone
#[derive(Debug, Clone, Default)]
struct SharedRecorder {
    documents: Arc<Mutex<Vec<String>>>,
}

impl PreviewSurface for SharedRecorder {
    fn render(&mut self, document: String) -> u64 {
        let mut documents = self.documents.lock().unwrap();
        documents.push(document);
        documents.len() as u64
    }
}

fn react_session() -> EditSession<Recorder> {
    let mut playground = Playground::new(MemoryStore::new(), PlaygroundConfig::default());
    playground.create(ProjectKind::React);
    playground.start_session_with(Recorder::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_transforms_once_with_last_content() {
    let mut session = react_session();
    session.focus(Pane::Js);
    let opened = session.transform_count();
    let start = Instant::now();

    for i in 0..10 {
        session.edit(Some(format!("const n = {} ** 2;", i)));
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(session.transform_count(), opened);
    }

    let result = session.settle().await;
    assert!(result.as_ref().unwrap().code.contains("Math.pow(9, 2)"));
    assert_eq!(session.transform_count(), opened + 1);
    // Fires one quiet period after the last edit
    assert!(start.elapsed() >= Duration::from_millis(9 * 1999 + 2000));

    let nothing = tokio::time::timeout(Duration::from_secs(30), session.settle()).await;
    assert!(nothing.is_err());
    assert_eq!(session.transform_count(), opened + 1);
}

#[tokio::test(start_paused = true)]
async fn test_work_reads_buffer_at_fire_time() {
    let mut session = react_session();
    session.focus(Pane::Js);
    session.edit(Some("const a = 1;".to_string()));

    // A markup edit in the quiet period does not disturb the pending JS
    session.focus(Pane::Html);
    session.edit(Some("<main></main>".to_string()));
    session.focus(Pane::Js);
    session.edit(Some("const b = 2;".to_string()));

    let code = session.settle().await.as_ref().unwrap().code.clone();
    assert!(code.contains("const b = 2;"));
    assert!(!code.contains("const a"));
}

#[tokio::test(start_paused = true)]
async fn test_react_template_previews_compiled_jsx() {
    let mut session = react_session();
    assert_eq!(session.buffers().html, "<div id='root'></div>");

    // Re-save the template unchanged to go through one debounce cycle
    let js = session.buffers().js.clone();
    session.focus(Pane::Js);
    session.edit(Some(js));
    assert!(session.settle().await.is_ok());

    let document = session.surface().documents.last().unwrap();
    assert!(document.contains("React.createElement(\"div\", null, \"Hello World, Start Coding Now!\")"));
    assert!(document.contains("React.createElement(App, null)"));
    assert!(!document.contains("<App />"));
    assert!(document.contains("react-dom.production.min.js"));
}

#[tokio::test(start_paused = true)]
async fn test_error_stays_in_preview_and_editing_continues() {
    let mut session = react_session();
    session.focus(Pane::Js);
    session.edit(Some("function {".to_string()));
    assert!(session.settle().await.is_err());

    let document = session.surface().documents.last().unwrap().clone();
    assert!(document.contains("Unexpected token (1:9)"));
    assert!(!document.contains("id='root'"));

    session.edit(Some("function ok() {}".to_string()));
    assert!(session.settle().await.is_ok());
    assert!(session.surface().documents.last().unwrap().contains("id='root'"));
}

#[test]
fn test_focus_isolation_across_session() {
    let mut session = react_session();
    let before = session.buffers().clone();

    session.focus(Pane::Css);
    session.edit(Some("#root { padding: 8px }".to_string()));

    let after = session.buffers();
    assert_eq!(after.css, "#root { padding: 8px }");
    assert_eq!(after.html, before.html);
    assert_eq!(after.js, before.js);
    assert_eq!(session.binding().content, "#root { padding: 8px }");
}

#[tokio::test(start_paused = true)]
async fn test_close_drops_pending_transform() {
    let shown = SharedRecorder::default();
    let mut playground = Playground::new(MemoryStore::new(), PlaygroundConfig::default());
    playground.create(ProjectKind::React);
    let mut session = playground.start_session_with(shown.clone()).unwrap();

    session.focus(Pane::Js);
    session.edit(Some("const late = true;".to_string()));
    assert!(session.is_pending());
    assert_eq!(session.transform_count(), 1);

    let project = session.close();
    tokio::time::advance(Duration::from_secs(10)).await;

    assert_eq!(project.source.js, "const late = true;");
    // Only the frame rendered on open, never one for the dropped edit
    let documents = shown.documents.lock().unwrap();
    assert_eq!(documents.len(), 1);
    assert!(!documents[0].contains("const late"));
}

#[test]
fn test_save_reload_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = PlaygroundConfig::default();

    let mut playground = Playground::new(FileStore::new(dir.path()), config.clone());
    playground.create(ProjectKind::Vanilla);
    let id = playground.active().id.clone();

    let mut session = playground.start_session().unwrap();
    session.set_project_name("Landing page");
    session.edit(Some("<h1>Welcome</h1>".to_string()));
    session.focus(Pane::Css);
    session.edit(Some("h1 { font-size: 3rem }".to_string()));
    let expected = session.buffers().clone();

    let (route, _) = playground.exit(session);
    assert_eq!(route, Route::Landing);

    // Exiting again with the same id updates in place
    playground.open(&id);
    let session = playground.start_session().unwrap();
    playground.exit(session);

    let mut reopened = Playground::new(FileStore::new(dir.path()), config);
    assert_eq!(reopened.projects().len(), 1);
    assert_eq!(reopened.open(&id), Route::VanillaEditor { id: id.clone() });
    assert_eq!(reopened.active().project_name, "Landing page");
    assert_eq!(reopened.active().source, expected);
}

#[test]
fn test_default_session_publishes_sandboxed_frames() {
    let mut playground = Playground::new(MemoryStore::new(), PlaygroundConfig::default());
    playground.create(ProjectKind::Vanilla);

    let session: EditSession<SandboxRenderer> = playground.start_session().unwrap();
    let frame = session.surface().current().unwrap();

    assert_eq!(frame.generation, 1);
    assert!(frame.markup.starts_with("<iframe"));
    assert!(frame.markup.contains("sandbox=\"allow-scripts\""));
    assert_eq!(frame.document, session.document());
    assert_ne!(session.buffers(), &SourceBundle::default());
}
