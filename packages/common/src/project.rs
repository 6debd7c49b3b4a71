use std::fmt;

use bigo_transform::Dialect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which editor a project opens in
///
/// Persisted as the `type` string. Anything other than `"react"` loads as
/// [`ProjectKind::Vanilla`], which is also where navigation sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectKind {
    #[default]
    Vanilla,
    React,
}

impl ProjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectKind::Vanilla => "vanilla",
            ProjectKind::React => "react",
        }
    }

    /// Dialect the project's JS buffer is transformed with
    pub fn dialect(self) -> Dialect {
        match self {
            ProjectKind::React => Dialect::Jsx,
            ProjectKind::Vanilla => Dialect::EsNext,
        }
    }
}

impl From<String> for ProjectKind {
    fn from(value: String) -> Self {
        ProjectKind::from(value.as_str())
    }
}

impl From<&str> for ProjectKind {
    fn from(value: &str) -> Self {
        match value {
            "react" => ProjectKind::React,
            _ => ProjectKind::Vanilla,
        }
    }
}

impl From<ProjectKind> for String {
    fn from(kind: ProjectKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three editable buffers of a project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceBundle {
    pub html: String,
    pub css: String,
    pub js: String,
}

impl SourceBundle {
    pub fn new(html: impl Into<String>, css: impl Into<String>, js: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            js: js.into(),
        }
    }

    /// Starter buffers for a freshly created project
    pub fn template(kind: ProjectKind) -> Self {
        match kind {
            ProjectKind::React => Self::new(
                "<div id='root'></div>",
                "",
                "function App(){\r\n    return <div>Hello World, Start Coding Now!</div>\r\n}\r\n\r\nReactDOM.createRoot(document.getElementById('root')).render(<App />)\r\n",
            ),
            ProjectKind::Vanilla => Self::new(
                "<body><div>Start coding now</div></body>",
                "",
                "//js goes here",
            ),
        }
    }
}

/// A saved playground project
///
/// Serializes to the persisted record shape
/// `{id, type, projectName, codes: {html, css, js}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ProjectKind,
    #[serde(rename = "projectName", default)]
    pub project_name: String,
    #[serde(rename = "codes", default)]
    pub source: SourceBundle,
}

impl Project {
    /// A new project with a fresh v4 id and the starter template
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            project_name: String::new(),
            source: SourceBundle::template(kind),
        }
    }

    /// The "no active project" sentinel
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_shape() {
        let project = Project {
            id: "p1".to_string(),
            kind: ProjectKind::React,
            project_name: "Demo".to_string(),
            source: SourceBundle::new("<b>", "b{}", "x()"),
        };

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "p1",
                "type": "react",
                "projectName": "Demo",
                "codes": { "html": "<b>", "css": "b{}", "js": "x()" }
            })
        );
    }

    #[test]
    fn test_unknown_type_loads_as_vanilla() {
        let project: Project =
            serde_json::from_str(r#"{"id":"a","type":"svelte","projectName":"x","codes":{}}"#)
                .unwrap();
        assert_eq!(project.kind, ProjectKind::Vanilla);
        assert_eq!(project.source, SourceBundle::default());
    }

    #[test]
    fn test_new_project_uses_template_and_fresh_id() {
        let a = Project::new(ProjectKind::React);
        let b = Project::new(ProjectKind::React);
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.source.html, "<div id='root'></div>");
        assert!(a.source.js.contains("ReactDOM.createRoot"));
        assert!(a.project_name.is_empty());
    }

    #[test]
    fn test_vanilla_template() {
        let bundle = SourceBundle::template(ProjectKind::Vanilla);
        assert_eq!(bundle.html, "<body><div>Start coding now</div></body>");
        assert_eq!(bundle.css, "");
        assert_eq!(bundle.js, "//js goes here");
    }

    #[test]
    fn test_dialect_for_kind() {
        assert_eq!(ProjectKind::React.dialect(), Dialect::Jsx);
        assert_eq!(ProjectKind::Vanilla.dialect(), Dialect::EsNext);
        assert_eq!(ProjectKind::from("svelte").dialect(), Dialect::EsNext);
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(Project::empty().is_empty());
        assert!(!Project::new(ProjectKind::Vanilla).is_empty());
    }
}
