//! Saved-project persistence against a directory-backed store

use bigo_common::{FileStore, Project, ProjectKind, ProjectRepository, Upserted, PROJECTS_KEY};

#[test]
fn test_save_then_reload_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = ProjectRepository::new(FileStore::new(dir.path()));

    let mut project = Project::new(ProjectKind::React);
    project.project_name = "Counter".to_string();
    project.source.css = "body { margin: 0 }".to_string();
    repo.upsert(&project).unwrap();

    // A second repository over the same directory sees the same record
    let reopened = ProjectRepository::new(FileStore::new(dir.path()));
    let loaded = reopened.find(&project.id).expect("project should be saved");
    assert_eq!(loaded, project);
}

#[test]
fn test_collection_is_a_json_array_of_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = ProjectRepository::new(FileStore::new(dir.path()));
    let project = Project::new(ProjectKind::Vanilla);
    repo.upsert(&project).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", PROJECTS_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let records = value.as_array().expect("collection should be an array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["type"], "vanilla");
    assert_eq!(records[0]["codes"]["js"], "//js goes here");
}

#[test]
fn test_repeated_saves_keep_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = ProjectRepository::new(FileStore::new(dir.path()));
    let mut project = Project::new(ProjectKind::Vanilla);

    assert_eq!(repo.upsert(&project).unwrap(), Upserted::Inserted);
    project.source.js = "console.log('again')".to_string();
    assert_eq!(repo.upsert(&project).unwrap(), Upserted::Updated);

    let all = repo.load_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].source.js, "console.log('again')");
}

#[test]
fn test_corrupt_file_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(format!("{}.json", PROJECTS_KEY)), "[{broken").unwrap();

    let mut repo = ProjectRepository::new(FileStore::new(dir.path()));
    assert!(repo.load_all().is_empty());

    let project = Project::new(ProjectKind::React);
    assert_eq!(repo.upsert(&project).unwrap(), Upserted::Inserted);
    assert_eq!(repo.load_all(), vec![project]);
}

#[test]
fn test_records_written_by_other_versions_survive_a_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.json", PROJECTS_KEY));
    std::fs::write(
        &path,
        r#"[{"id":"old","type":"react","projectName":"Kept","codes":{"js":"a()"},"createdAt":1700000000},{"id":"bad","projectName":null}]"#,
    )
    .unwrap();

    let mut repo = ProjectRepository::new(FileStore::new(dir.path()));
    assert_eq!(repo.load_all().len(), 1);

    let mut project = repo.find("old").unwrap();
    project.source.js = "b()".to_string();
    assert_eq!(repo.upsert(&project).unwrap(), Upserted::Updated);

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["createdAt"], 1700000000);
    assert_eq!(value[0]["codes"]["js"], "b()");
    assert_eq!(value[1]["id"], "bad");
}
