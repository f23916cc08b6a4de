mod support;

use agent_registry::{
    ErrorKind, Pagination, RecordFilter, RecordId, RecordStatus, RecordStore, Registry,
    RegistryError, SkillId, StoredAgentRecord, fingerprint_card,
};
use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use support::{card, card_json, memory_registry, sales_bot, sqlite_registry};

fn names(records: &[StoredAgentRecord]) -> Vec<String> {
    records.iter().map(|record| record.card.name.clone()).collect()
}

fn versions(records: &[StoredAgentRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.card.version.clone())
        .collect()
}

/// Write a record with an arbitrary status straight through the store.
fn insert_with_status<S: RecordStore>(
    registry: &Registry<S>,
    name: &str,
    owner: &str,
    status: RecordStatus,
) -> Result<()> {
    let card = card(name, "1.0.0", &["skill.router"]);
    let record = StoredAgentRecord {
        id: RecordId::generate(),
        fingerprint: fingerprint_card(&card)?,
        card,
        owner: owner.to_string(),
        published_at: Utc::now(),
        status,
    };
    registry.store().insert(&record)?;
    Ok(())
}

fn check_idempotent_publish<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    let first = registry.submit(&sales_bot(), "revenue-team")?;
    let second = registry.submit(&sales_bot(), "revenue-team")?;
    assert_eq!(first.id, second.id);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.published_at, second.published_at);
    assert_eq!(first.status, RecordStatus::Published);

    let all = registry.list_all(&Pagination::default(), &RecordFilter::default())?;
    assert_eq!(all.len(), 1);
    Ok(())
}

fn check_key_order_does_not_matter<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    let original = sales_bot();
    let first = registry.submit(&original, "revenue-team")?;

    // Re-encode with reversed top-level key order.
    let reordered: serde_json::Map<String, serde_json::Value> = original
        .as_object()
        .unwrap()
        .iter()
        .rev()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let second = registry.submit(&serde_json::Value::Object(reordered), "someone-else")?;
    assert_eq!(first.id, second.id);
    Ok(())
}

fn check_conflict_leaves_record_untouched<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    let original = registry.submit(&sales_bot(), "revenue-team")?;

    let mut changed = sales_bot();
    changed["description"] = json!("A different description under the same version.");
    let err = registry.submit(&changed, "revenue-team").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(!err.is_retryable());
    match &err {
        RegistryError::Conflict { key, existing, .. } => {
            assert_eq!(key.name, "SalesBot");
            assert_eq!(key.version, "2.0.0");
            assert_eq!(existing, &original.fingerprint);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = registry
        .find_by_identity("SalesBot", "2.0.0")?
        .expect("original record still present");
    assert_eq!(stored, original);
    Ok(())
}

fn check_version_ordering<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    for version in ["1.2.0", "1.10.0", "1.10.0-rc.1", "0.9.0", "2.0.0-alpha"] {
        registry.publish(card("Router", version, &["skill.router"]), "ops")?;
    }
    registry.publish(card("Another", "9.0.0", &["skill.other"]), "ops")?;

    let listed = registry.find_by_name("Router", &Pagination::default())?;
    assert_eq!(
        versions(&listed),
        vec!["2.0.0-alpha", "1.10.0", "1.10.0-rc.1", "1.2.0", "0.9.0"]
    );

    let latest = registry.latest("Router")?.expect("latest exists");
    assert_eq!(latest.card.version, "2.0.0-alpha");
    assert!(registry.latest("Nobody")?.is_none());
    assert!(registry.find_by_identity("Router", "3.0.0")?.is_none());
    Ok(())
}

fn check_list_order_and_pagination<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    for index in 0..105 {
        let name = format!("agent-{index:03}");
        registry.publish(card(&name, "1.0.0", &["skill.echo"]), "ops")?;
    }
    registry.publish(card("agent-000", "2.0.0", &["skill.echo"]), "ops")?;

    let no_filter = RecordFilter::default();
    let page = |limit: Option<i64>, offset: Option<i64>| {
        registry.list_all(&Pagination::new(limit, offset), &no_filter)
    };

    assert_eq!(page(Some(500), None)?.len(), 100);
    assert_eq!(page(Some(0), None)?.len(), 20);
    assert_eq!(page(Some(-3), None)?.len(), 1);
    assert_eq!(page(None, None)?.len(), 20);
    assert_eq!(page(None, Some(-5))?, page(None, Some(0))?);

    let first = page(Some(3), None)?;
    assert_eq!(names(&first), vec!["agent-000", "agent-000", "agent-001"]);
    assert_eq!(versions(&first)[..2], ["2.0.0", "1.0.0"]);

    let tail = page(Some(10), Some(100))?;
    assert_eq!(tail.len(), 6);
    assert_eq!(tail.last().map(|r| r.card.name.as_str()), Some("agent-104"));
    assert!(page(None, Some(1_000))?.is_empty());

    let raw = Pagination::from_raw(Some("many"), Some("-3"));
    assert_eq!(registry.list_all(&raw, &no_filter)?, page(None, None)?);
    Ok(())
}

fn check_search_by_skill<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    registry.publish(card("Zeta", "1.0.0", &["skill.other", "skill.router"]), "ops")?;
    registry.submit(&sales_bot(), "revenue-team")?;
    registry.publish(card("Alpha", "1.0.0", &["skill.router"]), "ops")?;
    registry.publish(card("Middle", "1.0.0", &["skill.echo"]), "ops")?;
    registry.publish(card("Alpha", "1.1.0", &["skill.echo"]), "ops")?;

    let router = SkillId("skill.router".to_string());
    let found = registry.search_by_skill(&router, &Pagination::default(), &RecordFilter::default())?;
    assert_eq!(names(&found), vec!["Alpha", "SalesBot", "Zeta"]);
    assert!(found.iter().all(|record| record.card.has_skill(&router)));

    let owned = registry.search_by_skill(
        &router,
        &Pagination::default(),
        &RecordFilter::default().owner("revenue-team"),
    )?;
    assert_eq!(names(&owned), vec!["SalesBot"]);

    let paged = registry.search_by_skill(
        &router,
        &Pagination::new(Some(1), Some(1)),
        &RecordFilter::default(),
    )?;
    assert_eq!(names(&paged), vec!["SalesBot"]);

    let nothing = SkillId("skill.missing".to_string());
    assert!(
        registry
            .search_by_skill(&nothing, &Pagination::default(), &RecordFilter::default())?
            .is_empty()
    );
    Ok(())
}

fn check_status_and_owner_filters<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    insert_with_status(registry, "Drafty", "alice", RecordStatus::Draft)?;
    insert_with_status(registry, "Legacy", "bob", RecordStatus::Deprecated)?;
    registry.publish(card("Live", "1.0.0", &["skill.router"]), "alice")?;

    let by_status = |status| {
        registry.list_all(
            &Pagination::default(),
            &RecordFilter::default().status(status),
        )
    };
    assert_eq!(names(&by_status(RecordStatus::Draft)?), vec!["Drafty"]);
    assert_eq!(names(&by_status(RecordStatus::Deprecated)?), vec!["Legacy"]);
    assert_eq!(names(&by_status(RecordStatus::Published)?), vec!["Live"]);

    let alice = registry.list_all(&Pagination::default(), &RecordFilter::default().owner("alice"))?;
    assert_eq!(names(&alice), vec!["Drafty", "Live"]);

    let both = RecordFilter::default()
        .owner("alice")
        .status(RecordStatus::Published);
    let router = SkillId("skill.router".to_string());
    let found = registry.search_by_skill(&router, &Pagination::default(), &both)?;
    assert_eq!(names(&found), vec!["Live"]);
    Ok(())
}

fn check_rejections_do_not_persist<S: RecordStore>(registry: &Registry<S>) -> Result<()> {
    let err = registry.submit(&json!({"name": "NoVersion"}), "ops").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.details().iter().any(|e| e.path == "/version"));

    let mut bad_transport = card_json("Transporty", "1.0.0", &["skill.echo"]);
    bad_transport["preferredTransport"] = json!("http");
    bad_transport["transportUrl"] = json!("https://agents.example.com");
    let err = registry.submit(&bad_transport, "ops").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Policy);
    assert!(err.details()[0].message.contains("http://"));

    assert!(
        registry
            .list_all(&Pagination::default(), &RecordFilter::default())?
            .is_empty()
    );
    Ok(())
}

macro_rules! against_both_stores {
    ($($name:ident => $check:ident),* $(,)?) => {
        mod memory_store {
            use super::*;
            $(
                #[test]
                fn $name() -> Result<()> {
                    $check(&memory_registry())
                }
            )*
        }

        mod sqlite_store {
            use super::*;
            $(
                #[test]
                fn $name() -> Result<()> {
                    let (_dir, registry) = sqlite_registry()?;
                    $check(&registry)
                }
            )*
        }
    };
}

against_both_stores! {
    identical_republish_is_a_no_op => check_idempotent_publish,
    key_order_does_not_change_identity => check_key_order_does_not_matter,
    different_content_conflicts_without_side_effects => check_conflict_leaves_record_untouched,
    versions_sort_by_semver_precedence => check_version_ordering,
    listing_orders_then_paginates => check_list_order_and_pagination,
    search_matches_skill_ids_in_name_order => check_search_by_skill,
    filters_combine_owner_and_status => check_status_and_owner_filters,
    rejected_cards_never_reach_the_store => check_rejections_do_not_persist,
}

#[test]
fn sqlite_records_survive_reopen() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("nested").join("registry.db");
    let published = {
        let registry = Registry::with_embedded_schema(agent_registry::SqliteStore::open(&path)?)?;
        registry.submit(&sales_bot(), "revenue-team")?
    };

    let registry = Registry::with_embedded_schema(agent_registry::SqliteStore::open(&path)?)?;
    let reloaded = registry
        .find_by_identity("SalesBot", "2.0.0")?
        .expect("record persisted");
    assert_eq!(reloaded, published);
    assert_eq!(reloaded.fingerprint, fingerprint_card(&reloaded.card)?);
    Ok(())
}

#[test]
fn concurrent_publishers_agree_on_one_record() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("registry.db");
    let registry = Arc::new(Registry::with_embedded_schema(
        agent_registry::SqliteStore::open(&path)?,
    )?);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.submit(&sales_bot(), &format!("worker-{worker}")))
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let record = handle.join().expect("publisher thread panicked")?;
        ids.push(record.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "every publisher sees the same record");

    let all = registry.list_all(&Pagination::default(), &RecordFilter::default())?;
    assert_eq!(all.len(), 1);
    Ok(())
}

#[test]
fn concurrent_conflicting_publishers_have_one_winner() -> Result<()> {
    let registry = Arc::new(memory_registry());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut candidate = sales_bot();
                candidate["description"] = json!(format!("variant {worker}"));
                registry.submit(&candidate, "racer")
            })
        })
        .collect();

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().expect("publisher thread panicked") {
            Ok(_) => winners += 1,
            Err(err) if err.kind() == ErrorKind::Conflict => conflicts += 1,
            Err(err) => return Err(err.into()),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
    Ok(())
}
