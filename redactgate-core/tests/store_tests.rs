// redactgate-core/tests/store_tests.rs
use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use test_log::test; // For integrating with `env_logger` in tests

use redactgate_core::{
    JsonFileBackend, MemoryBackend, RedactGateError, RulePatch, RuleRegistry, RuleSetPatch,
    RuleSetSpec, RuleSpec, RuleStore, StorageBackend,
};

fn open_store() -> RuleStore {
    RuleStore::open(Box::new(MemoryBackend::new())).unwrap()
}

fn spec(name: &str, condition: &str) -> RuleSpec {
    RuleSpec {
        name: name.to_string(),
        condition: condition.to_string(),
        ..Default::default()
    }
}

fn assert_validation(err: RedactGateError, expected_field: &str) {
    match err {
        RedactGateError::Validation { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected a validation error, got: {other}"),
    }
}

#[test]
fn test_open_seeds_default_rules() {
    let store = open_store();

    let rules = store.list_rules();
    assert_eq!(rules.len(), 8);

    let ssn = store.get_rule("ssn").unwrap();
    assert_eq!(ssn.name, "SSN");
    assert_eq!(ssn.priority, 100);
    assert_eq!(ssn.replacement, "<SSN>");

    assert_eq!(store.default_rule_set_id(), "default");
    let default_set = store.get_rule_set("default").unwrap();
    assert_eq!(default_set.rules.len(), 8);
    assert!(default_set.enabled);
}

#[test]
fn test_store_debug_formats_a_registry_summary() {
    let store = open_store();

    let summary = format!("{store:?}");
    assert!(summary.contains("RuleStore"));
    assert!(summary.contains("rules: 8"));
    assert!(summary.contains("\"default\""));
}

#[test]
fn test_add_rule_derives_slug_id_and_joins_default_set() {
    let store = open_store();

    let rule = store.add_rule(spec("Order Number", r"ORD-\d+")).unwrap();
    assert_eq!(rule.id, "order_number");
    assert_eq!(rule.created_at, rule.updated_at);
    assert!(rule.enabled);
    assert_eq!(rule.priority, 0);

    // Reading it back yields the same rule, field for field.
    assert_eq!(store.get_rule("order_number").unwrap(), rule);

    let default_set = store.get_rule_set("default").unwrap();
    assert!(default_set.rules.iter().any(|id| id == "order_number"));
}

#[test]
fn test_add_rule_slug_collision_appends_counter() {
    let store = open_store();

    // The seeded catalog already owns the "email" id.
    let rule = store
        .add_rule(spec("Email", r"[a-z]+@[a-z]+\.test"))
        .unwrap();
    assert_eq!(rule.id, "email_2");
}

#[test]
fn test_add_rule_rejects_duplicate_explicit_id() {
    let store = open_store();

    let duplicate = RuleSpec {
        id: Some("email".to_string()),
        ..spec("Another Email", r"@")
    };
    assert_validation(store.add_rule(duplicate).unwrap_err(), "id");
}

#[test]
fn test_add_rule_rejects_bad_condition() {
    let store = open_store();
    assert_validation(store.add_rule(spec("Broken", "(")).unwrap_err(), "condition");
    assert_validation(store.add_rule(spec("Empty", "")).unwrap_err(), "condition");
}

#[test]
fn test_add_rule_rejects_out_of_range_priority() {
    let store = open_store();

    let out_of_range = RuleSpec {
        priority: 101,
        ..spec("Too High", r"\d+")
    };
    assert_validation(store.add_rule(out_of_range).unwrap_err(), "priority");
}

#[test]
fn test_update_rule_patches_supplied_fields() {
    let store = open_store();

    let patched = store
        .update_rule(
            "email",
            RulePatch {
                name: Some("Work Email".to_string()),
                replacement: Some("<WORK_EMAIL>".to_string()),
                priority: Some(85),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(patched.name, "Work Email");
    assert_eq!(patched.replacement, "<WORK_EMAIL>");
    assert_eq!(patched.priority, 85);
    assert!(patched.updated_at >= patched.created_at);

    // Unsupplied fields keep their stored values.
    let stored = store.get_rule("email").unwrap();
    assert_eq!(stored.description, "Email Address");
    assert_eq!(stored.name, "Work Email");

    let err = store.update_rule("ghost", RulePatch::default()).unwrap_err();
    assert!(matches!(err, RedactGateError::RuleNotFound(_)));
}

#[test]
fn test_update_rule_rejects_bad_condition_and_keeps_rule_intact() {
    let store = open_store();
    let before = store.get_rule("email").unwrap();

    let err = store
        .update_rule(
            "email",
            RulePatch {
                condition: Some("(".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_validation(err, "condition");

    let after = store.get_rule("email").unwrap();
    assert_eq!(after.condition, before.condition);
    assert_eq!(after.updated_at, before.updated_at);
}

#[test]
fn test_delete_rule_removes_it() {
    let store = open_store();

    store.delete_rule("phone").unwrap();
    assert!(matches!(
        store.get_rule("phone").unwrap_err(),
        RedactGateError::RuleNotFound(_)
    ));
    assert!(matches!(
        store.delete_rule("phone").unwrap_err(),
        RedactGateError::RuleNotFound(_)
    ));
}

#[test]
fn test_deleted_rule_reference_is_skipped_at_resolve() {
    let store = open_store();

    store.delete_rule("email").unwrap();

    // The set keeps the dangling reference; resolution skips it.
    let default_set = store.get_rule_set("default").unwrap();
    assert!(default_set.rules.iter().any(|id| id == "email"));

    let active = store.resolve_rule_set(None).unwrap();
    assert_eq!(active.len(), 7);
    assert!(!active.iter().any(|a| a.rule.id == "email"));
}

#[test]
fn test_readding_a_deleted_rule_does_not_duplicate_the_set_reference() {
    let store = open_store();

    // Deleting leaves the dangling "email" reference in the default set, and
    // re-adding the same name derives the same id again.
    store.delete_rule("email").unwrap();
    let rule = store.add_rule(spec("Email", r"[a-z]+@[a-z]+\.test")).unwrap();
    assert_eq!(rule.id, "email");

    let default_set = store.get_rule_set("default").unwrap();
    let references = default_set
        .rules
        .iter()
        .filter(|id| id.as_str() == "email")
        .count();
    assert_eq!(references, 1);

    // The re-added rule is applied exactly once.
    let active = store.resolve_rule_set(None).unwrap();
    assert_eq!(active.iter().filter(|a| a.rule.id == "email").count(), 1);
}

#[test]
fn test_toggle_rule_excludes_it_from_resolution() {
    let store = open_store();

    let disabled = store.toggle_rule("ssn", false).unwrap();
    assert!(!disabled.enabled);
    let active = store.resolve_rule_set(None).unwrap();
    assert!(!active.iter().any(|a| a.rule.id == "ssn"));

    store.toggle_rule("ssn", true).unwrap();
    let active = store.resolve_rule_set(None).unwrap();
    assert!(active.iter().any(|a| a.rule.id == "ssn"));
}

#[test]
fn test_list_rules_orders_by_priority_then_id() {
    let store = open_store();

    let ids: Vec<String> = store.list_rules().into_iter().map(|r| r.id).collect();
    assert_eq!(
        ids,
        vec![
            "profanity_block",
            "ssn",
            "credit_card",
            "email",
            "phone",
            "credentials",
            "ip_address",
            "url",
        ]
    );
}

#[test]
fn test_rule_set_crud() {
    let store = open_store();

    let set = store
        .add_rule_set(RuleSetSpec {
            name: "Strict".to_string(),
            rules: vec!["ssn".to_string(), "email".to_string()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(set.id, "strict");
    assert!(set.enabled);

    let listed: Vec<String> = store.list_rule_sets().into_iter().map(|s| s.id).collect();
    assert_eq!(listed, vec!["default", "strict"]);

    let updated = store
        .update_rule_set(
            "strict",
            RuleSetPatch {
                rules: Some(vec!["ssn".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.rules, vec!["ssn"]);

    store.delete_rule_set("strict").unwrap();
    assert!(matches!(
        store.get_rule_set("strict").unwrap_err(),
        RedactGateError::RuleSetNotFound(_)
    ));
    assert!(matches!(
        store
            .update_rule_set("strict", RuleSetPatch::default())
            .unwrap_err(),
        RedactGateError::RuleSetNotFound(_)
    ));
}

#[test]
fn test_default_rule_set_is_protected() {
    let store = open_store();

    assert_validation(store.delete_rule_set("default").unwrap_err(), "id");
    assert!(matches!(
        store.set_default_rule_set("nope").unwrap_err(),
        RedactGateError::RuleSetNotFound(_)
    ));

    // Re-pointing the default frees the old set for deletion.
    store
        .add_rule_set(RuleSetSpec {
            name: "Spare".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.set_default_rule_set("spare").unwrap();
    assert_eq!(store.default_rule_set_id(), "spare");
    store.delete_rule_set("default").unwrap();
}

#[test]
fn test_resolve_skips_unknown_refs_and_dedupes() {
    let store = open_store();

    store
        .add_rule_set(RuleSetSpec {
            name: "Partial".to_string(),
            rules: vec![
                "ssn".to_string(),
                "ghost".to_string(),
                "ssn".to_string(),
            ],
            ..Default::default()
        })
        .unwrap();

    let active = store.resolve_rule_set(Some("partial")).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].rule.id, "ssn");
}

#[test]
fn test_resolve_unknown_or_disabled_set_fails() {
    let store = open_store();

    assert!(matches!(
        store.resolve_rule_set(Some("nope")).unwrap_err(),
        RedactGateError::RuleSetNotFound(_)
    ));

    store
        .update_rule_set(
            "default",
            RuleSetPatch {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(matches!(
        store.resolve_rule_set(None).unwrap_err(),
        RedactGateError::RuleSetNotFound(_)
    ));
}

#[test]
fn test_json_backend_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state").join("rules.json");

    {
        let store = RuleStore::open(Box::new(JsonFileBackend::new(&path)))?;
        store.add_rule(spec("Order Number", r"ORD-\d+"))?;
    }
    assert!(path.exists());
    let raw = fs::read_to_string(&path)?;
    assert!(raw.contains("\"order_number\""));

    let reopened = RuleStore::open(Box::new(JsonFileBackend::new(&path)))?;
    assert_eq!(reopened.list_rules().len(), 9);
    assert_eq!(reopened.get_rule("order_number")?.name, "Order Number");
    Ok(())
}

/// Backend that fails every persist while the flag is set, for exercising
/// rollback.
struct FlakyBackend {
    inner: MemoryBackend,
    fail: Arc<AtomicBool>,
}

impl StorageBackend for FlakyBackend {
    fn load(&self) -> Result<Option<RuleRegistry>, RedactGateError> {
        self.inner.load()
    }

    fn persist(&self, registry: &RuleRegistry) -> Result<(), RedactGateError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RedactGateError::Persistence {
                path: PathBuf::from("flaky"),
                source: io::Error::other("injected failure"),
            });
        }
        self.inner.persist(registry)
    }
}

#[test]
fn test_persistence_failure_rolls_back_the_mutation() {
    let fail = Arc::new(AtomicBool::new(false));
    let backend = FlakyBackend {
        inner: MemoryBackend::new(),
        fail: Arc::clone(&fail),
    };
    let store = RuleStore::open(Box::new(backend)).unwrap();

    fail.store(true, Ordering::SeqCst);
    let err = store.add_rule(spec("Order Number", r"ORD-\d+")).unwrap_err();
    assert!(matches!(err, RedactGateError::Persistence { .. }));

    // Nothing was committed.
    assert_eq!(store.list_rules().len(), 8);
    assert!(matches!(
        store.get_rule("order_number").unwrap_err(),
        RedactGateError::RuleNotFound(_)
    ));

    fail.store(false, Ordering::SeqCst);
    store.add_rule(spec("Order Number", r"ORD-\d+")).unwrap();
    assert_eq!(store.list_rules().len(), 9);
}

fn write_doc(path: &std::path::Path, doc: serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(&doc)?)?;
    Ok(())
}

#[test]
fn test_open_fails_when_a_stored_condition_no_longer_compiles() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rules.json");
    write_doc(
        &path,
        serde_json::json!({
            "rules": {
                "bad": {
                    "id": "bad",
                    "name": "Bad",
                    "condition": "(",
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }
            },
            "rule_sets": {
                "default": {
                    "id": "default",
                    "name": "Default",
                    "rules": ["bad"],
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }
            },
            "default_rule_set": "default"
        }),
    )?;

    let err = RuleStore::open(Box::new(JsonFileBackend::new(&path))).unwrap_err();
    assert!(matches!(err, RedactGateError::Registry(_)));
    Ok(())
}

#[test]
fn test_open_rejects_structurally_broken_documents() -> Result<()> {
    let dir = tempfile::tempdir()?;

    // Not JSON at all.
    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, b"{ this is not json")?;
    let err = RuleStore::open(Box::new(JsonFileBackend::new(&garbled))).unwrap_err();
    assert!(matches!(err, RedactGateError::Registry(_)));

    // Default rule set points at nothing.
    let dangling = dir.path().join("dangling.json");
    write_doc(
        &dangling,
        serde_json::json!({
            "rules": {},
            "rule_sets": {},
            "default_rule_set": "ghost"
        }),
    )?;
    let err = RuleStore::open(Box::new(JsonFileBackend::new(&dangling))).unwrap_err();
    assert!(matches!(err, RedactGateError::Registry(_)));
    Ok(())
}
