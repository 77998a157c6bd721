//! End-to-end copies through on-disk endpoints.

use litedoc_core::{CollectionSpec, Database};
use litedoc_cp::{copy, Endpoint, EndpointError, EndpointKind, EndpointOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn locator(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn dir_locator(path: &Path) -> String {
    format!("{}{}", path.display(), std::path::MAIN_SEPARATOR)
}

#[test]
fn json_to_database_to_directory() {
    let temp = TempDir::new().unwrap();
    let json = temp.path().join("people.json");
    fs::write(
        &json,
        concat!(
            "{\"_id\":\"ann\",\"name\":\"Ann\"}\n",
            "{\"_id\":\"bob\",\"name\":\"Bob\"}\n",
            "{\"_id\":\"team/lead\",\"name\":\"Cat\"}\n",
        ),
    )
    .unwrap();
    let db_path = temp.path().join("people.litedoc");
    let out_dir = temp.path().join("export");
    let options = EndpointOptions::default();

    let mut source = Endpoint::create(&locator(&json)).unwrap();
    let mut destination = Endpoint::create(&locator(&db_path)).unwrap();
    assert_eq!(destination.kind(), EndpointKind::Db);
    let stats = copy(&mut source, &mut destination, &options, None).unwrap();
    assert_eq!(stats.copied, 3);
    drop(destination);

    let mut source = Endpoint::create(&locator(&db_path)).unwrap();
    let mut destination = Endpoint::create(&dir_locator(&out_dir)).unwrap();
    assert_eq!(destination.kind(), EndpointKind::Directory);
    let stats = copy(&mut source, &mut destination, &options, None).unwrap();
    assert_eq!(stats.copied, 3);
    drop(source);

    assert_eq!(
        fs::read_to_string(out_dir.join("ann.json")).unwrap(),
        r#"{"name":"Ann"}"#
    );
    assert!(out_dir.join("team%2Flead.json").is_file());

    let db = Database::open(&db_path).unwrap();
    let spec = CollectionSpec::default_collection();
    assert_eq!(db.document_count(&spec).unwrap(), 3);
    assert!(db.get_document(&spec, "team/lead").unwrap().is_live());
}

#[test]
fn directory_to_json_with_custom_id_and_limit() {
    let temp = TempDir::new().unwrap();
    let in_dir = temp.path().join("in");
    fs::create_dir(&in_dir).unwrap();
    fs::write(in_dir.join("a.json"), r#"{"n":1}"#).unwrap();
    fs::write(in_dir.join("b.json"), r#"{"n":2}"#).unwrap();
    fs::write(in_dir.join("c.json"), r#"{"n":3}"#).unwrap();
    let out = temp.path().join("out.json");
    let options = EndpointOptions {
        id_property: "key".into(),
        ..EndpointOptions::default()
    };

    let mut source = Endpoint::create(&dir_locator(&in_dir)).unwrap();
    let mut destination = Endpoint::create(&locator(&out)).unwrap();
    let stats = copy(&mut source, &mut destination, &options, Some(2)).unwrap();
    assert_eq!(stats.copied, 2);

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text, "{\"key\":\"a\",\"n\":1}\n{\"key\":\"b\",\"n\":2}\n");
}

#[test]
fn database_collection_round_trip() {
    let temp = TempDir::new().unwrap();
    let json = temp.path().join("in.json");
    fs::write(&json, "{\"_id\":\"x\",\"v\":true}\n").unwrap();
    let db_path = temp.path().join("c.litedoc");
    let spec = CollectionSpec::new("imports", "flags").unwrap();
    let options = EndpointOptions {
        collection: spec.clone(),
        ..EndpointOptions::default()
    };

    let mut source = Endpoint::create(&locator(&json)).unwrap();
    let mut destination = Endpoint::create(&locator(&db_path)).unwrap();
    copy(&mut source, &mut destination, &options, None).unwrap();
    drop(destination);

    let db = Database::open(&db_path).unwrap();
    assert!(db.has_collection(&spec));
    assert_eq!(
        db.document_count(&CollectionSpec::default_collection()).unwrap(),
        0
    );
    assert_eq!(db.document_count(&spec).unwrap(), 1);
}

#[test]
fn existing_flag_requires_destination() {
    let temp = TempDir::new().unwrap();
    let json = temp.path().join("in.json");
    fs::write(&json, "{\"_id\":\"x\"}\n").unwrap();
    let db_path = temp.path().join("absent.litedoc");
    let options = EndpointOptions {
        existing: true,
        ..EndpointOptions::default()
    };

    let mut source = Endpoint::create(&locator(&json)).unwrap();
    let mut destination = Endpoint::create(&locator(&db_path)).unwrap();
    let err = copy(&mut source, &mut destination, &options, None).unwrap_err();
    assert!(matches!(err, EndpointError::NotFound { .. }));
    assert!(!db_path.exists());
}

#[test]
fn missing_source_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join("out");

    let mut source = Endpoint::create(&locator(&temp.path().join("absent.json"))).unwrap();
    let mut destination = Endpoint::create(&dir_locator(&out_dir)).unwrap();
    let err = copy(&mut source, &mut destination, &EndpointOptions::default(), None).unwrap_err();
    assert!(matches!(err, EndpointError::NotFound { .. }));
    assert!(!out_dir.exists());
}

#[test]
fn copying_a_json_file_onto_itself_keeps_its_records() {
    let temp = TempDir::new().unwrap();
    let json = temp.path().join("a.json");
    fs::write(&json, "{\"_id\":\"a\",\"n\":1}\n{\"_id\":\"b\",\"n\":2}\n").unwrap();

    let mut source = Endpoint::create(&locator(&json)).unwrap();
    let mut destination = Endpoint::create(&locator(&json)).unwrap();
    let stats = copy(&mut source, &mut destination, &EndpointOptions::default(), None).unwrap();
    assert_eq!(stats.copied, 2);
    assert_eq!(
        fs::read_to_string(&json).unwrap(),
        "{\"_id\":\"a\",\"n\":1}\n{\"_id\":\"b\",\"n\":2}\n"
    );
}

#[test]
fn directory_reached_by_two_spellings() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("docs");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("x.json"), r#"{"v":1}"#).unwrap();
    let other_spelling = dir.join(".");

    let mut source = Endpoint::create(&dir_locator(&dir)).unwrap();
    let mut destination = Endpoint::create(&dir_locator(&other_spelling)).unwrap();
    let stats = copy(&mut source, &mut destination, &EndpointOptions::default(), None).unwrap();
    assert_eq!(stats.copied, 1);
    assert_eq!(fs::read_to_string(dir.join("x.json")).unwrap(), r#"{"v":1}"#);
}
