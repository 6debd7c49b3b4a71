use std::path::Path;
use std::time::Duration;

use bigo_common::PROJECTS_KEY;
use bigo_compiler_html::{DocumentOptions, REACT_DOM_UMD, REACT_UMD};
use serde::{Deserialize, Serialize};

use crate::preview::SandboxPolicy;

pub const DEFAULT_CONFIG_NAME: &str = "bigo.config.json";

/// Playground configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundConfig {
    /// Quiet period before a JS edit is transformed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Key the project collection is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Scripts injected ahead of compiled JSX
    #[serde(default = "default_runtime_scripts")]
    pub runtime_scripts: Vec<String>,

    /// iframe sandbox tokens granted to the preview
    #[serde(default = "default_sandbox")]
    pub sandbox: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_storage_key() -> String {
    PROJECTS_KEY.to_string()
}

fn default_runtime_scripts() -> Vec<String> {
    vec![REACT_UMD.to_string(), REACT_DOM_UMD.to_string()]
}

fn default_sandbox() -> Vec<String> {
    vec!["allow-scripts".to_string()]
}

impl PlaygroundConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// is absent
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: PlaygroundConfig = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", config_path.display(), e))?;
            tracing::debug!("[PlaygroundConfig] loaded {}", config_path.display());
            Ok(config)
        } else {
            Ok(PlaygroundConfig::default())
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            runtime_scripts: self.runtime_scripts.clone(),
            ..DocumentOptions::default()
        }
    }

    pub fn sandbox_policy(&self) -> SandboxPolicy {
        SandboxPolicy::new(self.sandbox.iter().map(String::as_str))
    }
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            storage_key: default_storage_key(),
            runtime_scripts: default_runtime_scripts(),
            sandbox: default_sandbox(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "debounceMs": 250,
            "storageKey": "SCRATCH",
            "runtimeScripts": ["/react.js"],
            "sandbox": ["allow-scripts", "allow-modals"]
        }"#;

        let config: PlaygroundConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.storage_key, "SCRATCH");
        assert_eq!(config.document_options().runtime_scripts, vec!["/react.js"]);
        assert_eq!(config.sandbox_policy().attribute(), "allow-scripts allow-modals");
    }

    #[test]
    fn test_default_config() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.debounce_ms, 2000);
        assert_eq!(config.storage_key, "BIGO_LOCALPROJECTS");
        assert_eq!(config.runtime_scripts.len(), 2);
        assert_eq!(config.sandbox_policy().attribute(), "allow-scripts");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PlaygroundConfig = serde_json::from_str(r#"{"debounceMs": 10}"#).unwrap();
        assert_eq!(config.debounce_ms, 10);
        assert_eq!(config.storage_key, PROJECTS_KEY);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(PlaygroundConfig::load(dir.path()).unwrap(), PlaygroundConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{"debounceMs": 500}"#).unwrap();
        assert_eq!(PlaygroundConfig::load(dir.path()).unwrap().debounce_ms, 500);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{oops").unwrap();
        assert!(PlaygroundConfig::load(dir.path()).is_err());
    }
}
