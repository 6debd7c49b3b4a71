use bigo_common::{
    KeyValueStore, Project, ProjectKind, ProjectRepository, StorageError, StorageResult, Upserted,
};
use bigo_compiler_html::{assemble, sandbox_frame};
use bigo_transform::{transform, Dialect, TransformError, TransformResult};
use wasm_bindgen::prelude::*;

/// Sandbox tokens for the preview iframe
pub const SANDBOX: &str = "allow-scripts";

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Outcome of a transform, success or located failure
#[wasm_bindgen]
pub struct TransformOutput {
    code: Option<String>,
    error: Option<TransformError>,
}

#[wasm_bindgen]
impl TransformOutput {
    #[wasm_bindgen(getter)]
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    #[wasm_bindgen(getter)]
    pub fn code(&self) -> Option<String> {
        self.code.clone()
    }

    /// `"{message} ({line}:{column})"`
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.message())
    }

    #[wasm_bindgen(getter, js_name = reasonCode)]
    pub fn reason_code(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.code().to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn line(&self) -> Option<usize> {
        self.error.as_ref().map(|e| e.line)
    }

    #[wasm_bindgen(getter)]
    pub fn column(&self) -> Option<usize> {
        self.error.as_ref().map(|e| e.column)
    }
}

impl From<TransformResult> for TransformOutput {
    fn from(result: TransformResult) -> Self {
        match result {
            Ok(compiled) => Self {
                code: Some(compiled.code),
                error: None,
            },
            Err(error) => Self {
                code: None,
                error: Some(error),
            },
        }
    }
}

fn parse_dialect(dialect: &str) -> Result<Dialect, JsValue> {
    dialect
        .parse::<Dialect>()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn preview_document(html: &str, css: &str, js: &str, kind: ProjectKind) -> String {
    let dialect = kind.dialect();
    assemble(html, css, &transform(js, dialect), dialect)
}

/// Transform JS/JSX source; failures come back as values, not exceptions
#[wasm_bindgen(js_name = transform)]
pub fn transform_js(source: &str, dialect: &str) -> Result<TransformOutput, JsValue> {
    let dialect = parse_dialect(dialect)?;
    Ok(transform(source, dialect).into())
}

/// Transform `js` and assemble the preview document
#[wasm_bindgen(js_name = assemble)]
pub fn assemble_js(html: &str, css: &str, js: &str, dialect: &str) -> Result<String, JsValue> {
    let dialect = parse_dialect(dialect)?;
    Ok(assemble(html, css, &transform(js, dialect), dialect))
}

/// Preview document for a project kind (`"react"` or `"vanilla"`)
#[wasm_bindgen(js_name = preview)]
pub fn preview_js(html: &str, css: &str, js: &str, kind: &str) -> String {
    preview_document(html, css, js, ProjectKind::from(kind))
}

/// Sandboxed `<iframe>` element showing the preview document
#[wasm_bindgen(js_name = previewFrame)]
pub fn preview_frame_js(html: &str, css: &str, js: &str, kind: &str) -> String {
    let document = preview_document(html, css, js, ProjectKind::from(kind));
    sandbox_frame(&document, SANDBOX, None)
}

/// `window.localStorage` as a key-value store
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window().ok_or("no window")?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or("localStorage is disabled")?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }
}

fn repository() -> Result<ProjectRepository<BrowserStore>, JsValue> {
    let store = BrowserStore::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(ProjectRepository::new(store))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Saved projects as a JSON array
#[wasm_bindgen(js_name = listProjects)]
pub fn list_projects_js() -> Result<String, JsValue> {
    to_json(&repository()?.load_all())
}

/// A fresh project record (not saved) for `kind`, as JSON
#[wasm_bindgen(js_name = newProject)]
pub fn new_project_js(kind: &str) -> Result<String, JsValue> {
    to_json(&Project::new(ProjectKind::from(kind)))
}

/// Upsert a project record given as JSON; true when it was new
#[wasm_bindgen(js_name = saveProject)]
pub fn save_project_js(project_json: &str) -> Result<bool, JsValue> {
    let project: Project = serde_json::from_str(project_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid project: {}", e)))?;
    let outcome = repository()?
        .upsert(&project)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(outcome == Upserted::Inserted)
}

#[wasm_bindgen(js_name = deleteProject)]
pub fn delete_project_js(id: &str) -> Result<bool, JsValue> {
    repository()?
        .delete(id)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_failure_is_a_value() {
        let output = TransformOutput::from(transform("function {", Dialect::EsNext));
        assert!(!output.ok());
        assert_eq!(output.code(), None);
        assert_eq!(output.error().as_deref(), Some("Unexpected token (1:9)"));
        assert_eq!(output.line(), Some(1));
        assert_eq!(output.column(), Some(9));
    }

    #[test]
    fn test_transform_success() {
        let output = transform_js("const a = <b/>;", "jsx").unwrap();
        assert!(output.ok());
        assert!(output.code().unwrap().contains("React.createElement(\"b\", null)"));
        assert_eq!(output.error(), None);
    }

    #[test]
    fn test_preview_picks_dialect_from_kind() {
        let react = preview_js("<div id='root'></div>", "", "render(<App/>)", "react");
        assert!(react.contains("React.createElement(App, null)"));
        assert!(react.contains("unpkg.com/react@18"));

        let vanilla = preview_js("", "", "render(<App/>)", "vanilla");
        assert!(vanilla.contains("Support for the experimental syntax &#39;jsx&#39;"));
    }

    #[test]
    fn test_preview_frame_is_sandboxed() {
        let frame = preview_frame_js("<p>\"hi\"</p>", "", "", "vanilla");
        assert!(frame.contains("sandbox=\"allow-scripts\""));
        assert!(frame.contains("&lt;p&gt;&quot;hi&quot;&lt;/p&gt;"));
    }
}
