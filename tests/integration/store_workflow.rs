//! Integration test: the full import → store → rename → reload workflow.
//!
//! Exercises the public API end to end against a temporary configuration
//! directory.

use aws_identity::import::import_into;
use aws_identity::{IamCsvParser, Identity, IdentityError, IdentityFields, IdentityStore};

/// Twenty-six distinct identities, one per letter.
fn identity_fixtures() -> Vec<IdentityFields> {
    ('A'..='Z')
        .enumerate()
        .map(|(i, c)| {
            IdentityFields::new(
                format!("identity_{c}"),
                format!("someaccesskey_{c}"),
                format!("notasecret_{i}_{c}"),
            )
        })
        .collect()
}

#[test]
fn twenty_six_identities_are_listed_alphabetically() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = IdentityStore::open(dir.path()).unwrap();

    // Insert in reverse to prove ordering is not insertion order.
    for fields in identity_fixtures().into_iter().rev() {
        store.add_identity(fields).unwrap();
    }

    let expected: Vec<String> = ('A'..='Z').map(|c| format!("identity_{c}")).collect();
    assert_eq!(store.keys(), expected);
}

#[test]
fn persistence_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let originals: Vec<Identity> = identity_fixtures()
        .into_iter()
        .map(Identity::from_fields)
        .collect();

    {
        let mut store = IdentityStore::open(dir.path()).unwrap();
        store.add_identities(originals.clone()).unwrap();
    }

    let reopened = IdentityStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), originals.len());
    for original in &originals {
        assert_eq!(reopened.get(&original.id), Some(original));
    }
}

#[test]
fn re_adding_fixtures_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = IdentityStore::open(dir.path()).unwrap();

    store.add_identities(identity_fixtures()).unwrap();
    for fields in identity_fixtures() {
        store.add_identity(fields).unwrap();
    }

    assert_eq!(store.len(), 26);
}

#[test]
fn conflicting_add_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = IdentityStore::open(dir.path()).unwrap();
    store.add_identities(identity_fixtures()).unwrap();

    let before = store.get("identity_C").cloned().unwrap();
    let result = store.add_identity(IdentityFields::new(
        "identity_C",
        "someaccesskey_C",
        "a-different-secret",
    ));

    match result {
        Err(IdentityError::Conflict { existing, .. }) => assert_eq!(*existing, before),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(store.get("identity_C"), Some(&before));

    let reopened = IdentityStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("identity_C"), Some(&before));
}

#[test]
fn csv_import_then_rename_then_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("registry");
    let csv_path = dir.path().join("credentials.csv");
    std::fs::write(
        &csv_path,
        "User name,Access key ID,Secret access key\n\
         Alice,AKIA123,SECRET456\n\
         Bob,AKIA789,SECRET000\n",
    )
    .unwrap();

    let mut store = IdentityStore::open(&config_dir).unwrap();
    let added = import_into(&mut store, &IamCsvParser::new(&csv_path)).unwrap();
    assert_eq!(added, 2);

    // Importing the same file again changes nothing.
    let again = import_into(&mut store, &IamCsvParser::new(&csv_path)).unwrap();
    assert_eq!(again, 0);

    // Rename through a record the caller holds.
    let mut alice = store.get("Alice").cloned().unwrap();
    let change = alice.set_id("alice-prod");
    store.on_identity_change(change).unwrap();

    assert!(store.get("Alice").is_none());
    assert_eq!(store.get("alice-prod"), Some(&alice));
    assert_eq!(store.keys(), vec!["Bob", "alice-prod"]);

    let raw = std::fs::read(store.identities_path()).unwrap();
    let file: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&raw).unwrap();
    let mut keys: Vec<&String> = file.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["Bob", "alice-prod"]);

    let reopened = IdentityStore::open(&config_dir).unwrap();
    let restored = reopened.get("alice-prod").unwrap();
    assert_eq!(restored.name, "Alice");
    assert_eq!(restored.access_key_id, "AKIA123");
    assert_eq!(restored.secret_access_key, "SECRET456");
}

#[test]
fn malformed_csv_does_not_touch_store() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("bad.csv");
    std::fs::write(&csv_path, "header\nAlice,AKIA123,SECRET456\nBob\n").unwrap();

    let mut store = IdentityStore::open(dir.path().join("registry")).unwrap();
    let result = import_into(&mut store, &IamCsvParser::new(&csv_path));

    assert!(matches!(result, Err(IdentityError::MalformedRow { line: 3, .. })));
    assert!(store.is_empty());
    assert!(!store.identities_path().exists());
}

#[cfg(unix)]
#[test]
fn every_save_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let mut store = IdentityStore::open(dir.path()).unwrap();

    let mode = |store: &IdentityStore| {
        std::fs::metadata(store.identities_path())
            .unwrap()
            .permissions()
            .mode()
            & 0o777
    };

    store.add_identities(identity_fixtures()).unwrap();
    assert_eq!(mode(&store), 0o600);

    store.rename("identity_A", "first").unwrap();
    assert_eq!(mode(&store), 0o600);

    store.remove("identity_B").unwrap();
    assert_eq!(mode(&store), 0o600);
}
