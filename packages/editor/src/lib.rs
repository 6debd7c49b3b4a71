//! # BigO Editor
//!
//! Live preview and project lifecycle for the playground.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ widget: one shared text editor              │
//! └─────────────────────────────────────────────┘
//!                     ↓ edit(Some(text))
//! ┌─────────────────────────────────────────────┐
//! │ session: Focus routes the edit to a buffer  │
//! │  - HTML/CSS: re-render now                  │
//! │  - JS: arm the 2s debounced transform       │
//! └─────────────────────────────────────────────┘
//!                     ↓ settle()
//! ┌─────────────────────────────────────────────┐
//! │ transform → assemble → sandboxed iframe     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bigo_common::{MemoryStore, ProjectKind};
//! use bigo_editor::{Pane, Playground, PlaygroundConfig};
//!
//! let mut playground = Playground::new(MemoryStore::new(), PlaygroundConfig::default());
//! playground.create(ProjectKind::React);
//!
//! let mut session = playground.start_session()?;
//! session.focus(Pane::Js);
//! session.edit(Some("ReactDOM.createRoot(root).render(<h1>Hi</h1>)".into()));
//! session.settle().await;
//!
//! let route = playground.exit(session).0;
//! ```

mod config;
mod debounce;
mod errors;
mod focus;
mod pipeline;
mod playground;
mod preview;
mod session;
mod snapshot;

pub use config::{PlaygroundConfig, DEFAULT_CONFIG_NAME};
pub use debounce::{Debouncer, DEFAULT_DELAY};
pub use errors::EditorError;
pub use focus::{Focus, Pane, WidgetBinding};
pub use pipeline::{PreviewPipeline, TransformRequest};
pub use playground::{Playground, Route};
pub use preview::{PreviewSurface, RenderedFrame, SandboxPolicy, SandboxRenderer};
pub use session::EditSession;
pub use snapshot::SnapshotController;

// Re-export common types for convenience
pub use bigo_common::{Project, ProjectKind, SourceBundle};
pub use bigo_transform::{Dialect, TransformResult};
