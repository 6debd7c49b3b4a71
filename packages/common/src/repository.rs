use serde_json::{Map, Value};

use crate::project::Project;
use crate::result::StorageResult;
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of saved projects
pub const PROJECTS_KEY: &str = "BIGO_LOCALPROJECTS";

/// Outcome of [`ProjectRepository::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

/// The persisted project collection
///
/// The whole collection lives under a single key and is always written back
/// in full. Reads never fail: a missing, unreadable or corrupt value loads
/// as an empty collection.
#[derive(Debug, Clone)]
pub struct ProjectRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, PROJECTS_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Every record that reads as a [`Project`]
    ///
    /// Records that do not are skipped here but stay in storage untouched.
    pub fn load_all(&self) -> Vec<Project> {
        self.load_records()
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(project) => Some(project),
                Err(err) => {
                    tracing::warn!("[ProjectRepository] skipping unreadable record: {}", err);
                    None
                }
            })
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<Project> {
        self.load_all().into_iter().find(|project| project.id == id)
    }

    /// Insert `project`, or replace the name and buffers of the record with
    /// the same id. An existing record keeps its `type` and any other fields.
    pub fn upsert(&mut self, project: &Project) -> StorageResult<Upserted> {
        let mut records = self.load_records();

        let existing = records
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|record| record_id(record) == Some(project.id.as_str()));

        let outcome = match existing {
            Some(record) => {
                record.insert(
                    "projectName".to_string(),
                    Value::String(project.project_name.clone()),
                );
                record.insert("codes".to_string(), serde_json::to_value(&project.source)?);
                Upserted::Updated
            }
            None => {
                records.push(serde_json::to_value(project)?);
                Upserted::Inserted
            }
        };

        self.save_records(&records)?;
        tracing::debug!("[ProjectRepository] {:?} project {}", outcome, project.id);
        Ok(outcome)
    }

    /// Remove the record with `id`; returns whether one existed
    pub fn delete(&mut self, id: &str) -> StorageResult<bool> {
        let mut records = self.load_records();
        let before = records.len();
        records.retain(|record| record.as_object().and_then(record_id) != Some(id));

        if records.len() == before {
            return Ok(false);
        }
        self.save_records(&records)?;
        Ok(true)
    }

    /// The raw collection; anything but a JSON array loads as empty
    fn load_records(&self) -> Vec<Value> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!("[ProjectRepository] could not read {}: {}", self.key, err);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                tracing::warn!(
                    "[ProjectRepository] discarding non-array collection under {}",
                    self.key
                );
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(
                    "[ProjectRepository] discarding corrupt collection under {}: {}",
                    self.key,
                    err
                );
                Vec::new()
            }
        }
    }

    fn save_records(&mut self, records: &[Value]) -> StorageResult<()> {
        let raw = serde_json::to_string(records)?;
        self.store.set(&self.key, &raw)
    }
}

fn record_id(record: &Map<String, Value>) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, ProjectKind, SourceBundle};

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            kind: ProjectKind::Vanilla,
            project_name: name.to_string(),
            source: SourceBundle::new("<p>", "p{}", "go()"),
        }
    }

    #[test]
    fn test_missing_key_loads_empty() {
        let repo = ProjectRepository::new(MemoryStore::new());
        assert!(repo.load_all().is_empty());
        assert_eq!(repo.find("x"), None);
    }

    #[test]
    fn test_corrupt_value_loads_empty() {
        let repo = ProjectRepository::new(MemoryStore::new().with_entry(PROJECTS_KEY, "{not json"));
        assert!(repo.load_all().is_empty());
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let mut repo = ProjectRepository::new(MemoryStore::new());
        assert_eq!(repo.upsert(&project("a", "first")).unwrap(), Upserted::Inserted);
        assert_eq!(repo.upsert(&project("a", "renamed")).unwrap(), Upserted::Updated);

        let all = repo.load_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].project_name, "renamed");
    }

    #[test]
    fn test_update_keeps_type() {
        let mut repo = ProjectRepository::new(MemoryStore::new());
        let mut original = project("a", "x");
        original.kind = ProjectKind::React;
        repo.upsert(&original).unwrap();

        let mut changed = project("a", "y");
        changed.kind = ProjectKind::Vanilla;
        repo.upsert(&changed).unwrap();

        assert_eq!(repo.find("a").unwrap().kind, ProjectKind::React);
    }

    #[test]
    fn test_delete() {
        let mut repo = ProjectRepository::new(MemoryStore::new());
        repo.upsert(&project("a", "x")).unwrap();
        repo.upsert(&project("b", "y")).unwrap();

        assert!(repo.delete("a").unwrap());
        assert!(!repo.delete("a").unwrap());
        let ids: Vec<_> = repo.load_all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[test]
    fn test_custom_key() {
        let mut repo = ProjectRepository::with_key(MemoryStore::new(), "OTHER");
        repo.upsert(&project("a", "x")).unwrap();
        assert!(repo.store().entries.contains_key("OTHER"));
        assert!(!repo.store().entries.contains_key(PROJECTS_KEY));
    }

    #[test]
    fn test_unreadable_record_does_not_hide_the_rest() {
        let raw = r#"[{"id":"odd","type":"vanilla","projectName":null,"codes":{}},{"id":"b","type":"react","projectName":"ok","codes":{}}]"#;
        let mut repo = ProjectRepository::new(MemoryStore::new().with_entry(PROJECTS_KEY, raw));

        let ids: Vec<_> = repo.load_all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
        assert_eq!(repo.find("b").unwrap().kind, ProjectKind::React);

        // Saving another project writes the odd record back as it was
        repo.upsert(&project("c", "new")).unwrap();
        let stored: Value = serde_json::from_str(&repo.store().entries[PROJECTS_KEY]).unwrap();
        let records = stored.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["id"], "odd");
        assert!(records[0]["projectName"].is_null());
    }

    #[test]
    fn test_update_keeps_unknown_fields() {
        let raw = r#"[{"id":"a","type":"react","projectName":"x","codes":{},"createdAt":"2024-01-01"}]"#;
        let mut repo = ProjectRepository::new(MemoryStore::new().with_entry(PROJECTS_KEY, raw));

        assert_eq!(repo.upsert(&project("a", "renamed")).unwrap(), Upserted::Updated);

        let stored: Value = serde_json::from_str(&repo.store().entries[PROJECTS_KEY]).unwrap();
        assert_eq!(stored[0]["createdAt"], "2024-01-01");
        assert_eq!(stored[0]["type"], "react");
        assert_eq!(stored[0]["projectName"], "renamed");
        assert_eq!(stored[0]["codes"]["js"], "go()");
    }

    #[test]
    fn test_delete_leaves_unreadable_records() {
        let raw = r#"[{"id":"odd","projectName":7},{"id":"a","type":"vanilla","projectName":"x","codes":{}}]"#;
        let mut repo = ProjectRepository::new(MemoryStore::new().with_entry(PROJECTS_KEY, raw));

        assert!(repo.delete("a").unwrap());
        let stored: Value = serde_json::from_str(&repo.store().entries[PROJECTS_KEY]).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 1);
        assert_eq!(stored[0]["id"], "odd");
    }

    #[test]
    fn test_non_array_collection_loads_empty() {
        let repo = ProjectRepository::new(MemoryStore::new().with_entry(PROJECTS_KEY, r#"{"id":"a"}"#));
        assert!(repo.load_all().is_empty());
    }
}
