//! Entity store behavior against a scripted backend
//!
//! Covers cache replacement vs upsert, id coercion, the loading/error
//! lifecycle, and how concurrent responses land under each ordering policy.

use erp_store::prelude::*;
use erp_store::StoreEvent;
use erp_test_utils::{record, wait_until, Method, Reply, ScriptedBackend};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

fn store(backend: &Arc<ScriptedBackend>) -> EntityStore<Value, ScriptedBackend> {
    EntityStore::new("branches", Arc::clone(backend))
}

fn ids(store: &EntityStore<Value, ScriptedBackend>) -> Vec<String> {
    store.ids().iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn remove_of_absent_id_is_a_noop() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "North"), record(2, "South")]);
    backend.reply(Value::Null);

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    let before = store.records();

    let removed = store.remove(99u32).await.unwrap();

    assert_eq!(removed.as_str(), "99");
    assert_eq!(store.records(), before);
    assert!(store.status().error(OperationKind::Remove).is_none());
}

#[tokio::test]
async fn remove_drops_id_from_map_and_order() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a"), record(2, "b"), record(3, "c")]);
    backend.reply(Value::Null);

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    store.remove("2").await.unwrap();

    assert_eq!(ids(&store), vec!["1", "3"]);
    assert!(store.get_cached(2u32).is_none());
}

#[tokio::test]
async fn failed_remove_keeps_record() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a")]);
    backend.fail_status(409, "branch has open invoices");

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    let err = store.remove(1u32).await.unwrap_err();

    assert_eq!(err.to_string(), "branch has open invoices");
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.status().error(OperationKind::Remove),
        Some("branch has open invoices")
    );
}

#[tokio::test]
async fn list_replaces_while_upserts_merge() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a"), record(2, "b"), record(3, "c")]);
    backend.reply(record(4, "d"));
    backend.reply_list(vec![record(5, "e"), record(6, "f")]);

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    store.create(&json!({ "name": "d" })).await.unwrap();
    assert_eq!(ids(&store), vec!["1", "2", "3", "4"]);

    store.list(QueryParams::new()).await.unwrap();
    assert_eq!(ids(&store), vec!["5", "6"]);
}

#[tokio::test]
async fn get_upserts_without_disturbing_others() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a"), record(2, "b")]);
    backend.reply(record(1, "a-refreshed"));
    backend.reply(record(7, "new"));

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    store.get(1u32).await.unwrap();
    store.get(7u32).await.unwrap();

    assert_eq!(ids(&store), vec!["1", "2", "7"]);
    assert_eq!(store.get_cached("1").unwrap()["name"], "a-refreshed");
}

#[tokio::test]
async fn list_is_always_a_round_trip() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a")]);
    backend.reply_list(vec![record(1, "a")]);

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    store.list(QueryParams::new().with("page", 2)).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].params, vec![("page".to_string(), "2".to_string())]);
}

#[tokio::test]
async fn failed_list_leaves_cache_unchanged() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "a"), record(2, "b")]);
    backend.fail_status(500, "Internal Server Error");

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    assert!(store.list(QueryParams::new()).await.is_err());

    assert_eq!(ids(&store), vec!["1", "2"]);
    let status = store.status();
    assert!(!status.is_loading(OperationKind::List));
    assert_eq!(status.error(OperationKind::List), Some("Internal Server Error"));
}

#[tokio::test]
async fn numeric_and_string_ids_share_a_slot() {
    let backend = ScriptedBackend::new();
    backend.reply(json!({ "id": 7, "name": "numeric" }));
    backend.reply(json!({ "id": "7", "name": "string" }));

    let store = store(&backend);
    store.get(7u32).await.unwrap();
    store.get("7").await.unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get_cached(7u32).unwrap()["name"], "string");
}

#[tokio::test]
async fn underscore_id_records_are_keyed() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![
        json!({ "_id": "65f0a", "name": "mongo" }),
        json!({ "id": 2, "name": "sql" }),
    ]);

    let store = store(&backend);
    store.list(QueryParams::new()).await.unwrap();
    assert_eq!(ids(&store), vec!["65f0a", "2"]);
}

#[tokio::test]
async fn create_keys_by_server_id() {
    let backend = ScriptedBackend::new();
    backend.reply(record(41, "Riyadh"));

    let store = store(&backend);
    let created = store
        .create(&json!({ "id": "client-temp", "name": "Riyadh" }))
        .await
        .unwrap();

    assert_eq!(created["id"], 41);
    assert!(store.get_cached("client-temp").is_none());
    assert!(store.get_cached(41u32).is_some());

    let calls = backend.calls();
    assert_eq!(calls[0].method, Method::Create);
    assert_eq!(calls[0].body.as_ref().unwrap()["name"], "Riyadh");
}

#[tokio::test]
async fn loading_is_true_only_while_in_flight() {
    let backend = ScriptedBackend::new();
    let store = store(&backend);

    for kind in OperationKind::ALL {
        let (action, reply) = match kind {
            OperationKind::List => (
                Action::List(QueryParams::new()),
                Reply::Records(vec![record(1, "a")]),
            ),
            OperationKind::Get => (Action::Get("1".into()), Reply::Record(record(1, "a"))),
            OperationKind::Create => (Action::Create(json!({})), Reply::Record(record(1, "a"))),
            OperationKind::Update => (
                Action::Update("1".into(), json!({})),
                Reply::Record(record(1, "a")),
            ),
            OperationKind::Remove => (Action::Remove("1".into()), Reply::Record(Value::Null)),
        };
        let gate = backend.gated(reply);
        assert!(!store.status().is_loading(kind), "{kind} loading before start");

        let (result, ()) = tokio::join!(store.run(action), async {
            wait_until(|| backend.pending() == 0).await;
            assert!(store.status().is_loading(kind), "{kind} not loading in flight");
            assert!(store.status().error(kind).is_none());
            gate.open();
        });

        result.unwrap();
        assert!(!store.status().is_loading(kind), "{kind} still loading");
        assert!(store.status().error(kind).is_none());
    }
}

#[tokio::test]
async fn error_is_cleared_when_next_attempt_starts() {
    let backend = ScriptedBackend::new();
    backend.fail_status(503, "");
    let gate = backend.gated(Reply::Record(record(1, "a")));

    let store = store(&backend);
    assert!(store.update(1u32, &json!({})).await.is_err());
    assert_eq!(store.status().error(OperationKind::Update), Some(""));

    let body = json!({});
    let (result, ()) = tokio::join!(store.update(1u32, &body), async {
        wait_until(|| backend.pending() == 0).await;
        assert!(store.status().is_loading(OperationKind::Update));
        assert!(store.status().error(OperationKind::Update).is_none());
        gate.open();
    });

    result.unwrap();
    assert!(store.status().error(OperationKind::Update).is_none());
}

#[tokio::test]
async fn every_kind_follows_the_lifecycle() {
    let backend = ScriptedBackend::new();
    let store = store(&backend);

    for kind in OperationKind::ALL {
        backend.fail_status(500, "down");
        let action = match kind {
            OperationKind::List => Action::List(QueryParams::new()),
            OperationKind::Get => Action::Get("1".into()),
            OperationKind::Create => Action::Create(json!({})),
            OperationKind::Update => Action::Update("1".into(), json!({})),
            OperationKind::Remove => Action::Remove("1".into()),
        };
        assert!(store.run(action).await.is_err());

        let status = store.status();
        assert!(!status.is_loading(kind), "{kind} still loading");
        assert_eq!(status.error(kind), Some("down"), "{kind} error missing");
    }
}

#[tokio::test]
async fn arrival_order_lets_the_last_response_win() {
    let backend = ScriptedBackend::new();
    let gate_a = backend.gated(Reply::Record(json!({ "id": 1, "name": "A" })));
    let gate_b = backend.gated(Reply::Record(json!({ "id": 1, "name": "B" })));

    let store = store(&backend);
    let body_a = json!({ "name": "A" });
    let body_b = json!({ "name": "B" });
    let (a, b, ()) = tokio::join!(
        store.update(1u32, &body_a),
        store.update(1u32, &body_b),
        async {
            wait_until(|| backend.pending() == 0).await;
            gate_b.open();
            wait_until(|| store.get_cached(1u32).is_some()).await;
            gate_a.open();
        }
    );
    a.unwrap();
    b.unwrap();

    // B was issued last but A's response landed last
    assert_eq!(store.get_cached(1u32).unwrap()["name"], "A");
    assert!(!store.status().is_loading(OperationKind::Update));
}

#[tokio::test]
async fn latest_issued_drops_stale_update() {
    let backend = ScriptedBackend::new();
    let gate_a = backend.gated(Reply::Record(json!({ "id": 1, "name": "A" })));
    let gate_b = backend.gated(Reply::Record(json!({ "id": 1, "name": "B" })));

    let store = store(&backend).with_ordering(ResponseOrdering::LatestIssued);
    let body_a = json!({ "name": "A" });
    let body_b = json!({ "name": "B" });
    let (a, b, ()) = tokio::join!(
        store.update(1u32, &body_a),
        store.update(1u32, &body_b),
        async {
            wait_until(|| backend.pending() == 0).await;
            gate_b.open();
            wait_until(|| store.get_cached(1u32).is_some()).await;
            gate_a.open();
        }
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.get_cached(1u32).unwrap()["name"], "B");
}

#[tokio::test]
async fn arrival_order_list_can_wipe_a_fresh_create() {
    let backend = ScriptedBackend::new();
    let create_gate = backend.gated(Reply::Record(record(9, "new")));
    let list_gate = backend.gated(Reply::Records(vec![record(1, "a")]));

    let store = store(&backend);
    let body = json!({ "name": "new" });
    let (created, listed, ()) = tokio::join!(
        store.create(&body),
        store.list(QueryParams::new()),
        async {
            wait_until(|| backend.pending() == 0).await;
            create_gate.open();
            wait_until(|| store.get_cached(9u32).is_some()).await;
            list_gate.open();
        }
    );
    created.unwrap();
    listed.unwrap();

    assert_eq!(ids(&store), vec!["1"]);
}

#[tokio::test]
async fn latest_issued_list_keeps_later_writes() {
    let backend = ScriptedBackend::new();
    let list_gate = backend.gated(Reply::Records(vec![record(1, "a"), record(2, "stale")]));
    let update_gate = backend.gated(Reply::Record(record(2, "fresh")));
    let create_gate = backend.gated(Reply::Record(record(3, "created")));

    let store = store(&backend).with_ordering(ResponseOrdering::LatestIssued);
    let update_body = json!({ "name": "fresh" });
    let create_body = json!({ "name": "created" });
    let (listed, updated, created, ()) = tokio::join!(
        store.list(QueryParams::new()),
        store.update(2u32, &update_body),
        store.create(&create_body),
        async {
            wait_until(|| backend.pending() == 0).await;
            update_gate.open();
            create_gate.open();
            wait_until(|| store.len() == 2).await;
            list_gate.open();
        }
    );
    listed.unwrap();
    updated.unwrap();
    created.unwrap();

    assert_eq!(ids(&store), vec!["1", "2", "3"]);
    assert_eq!(store.get_cached(2u32).unwrap()["name"], "fresh");
}

#[tokio::test]
async fn latest_issued_newer_list_beats_stale_get_of_uncached_id() {
    let backend = ScriptedBackend::new();
    let get_gate = backend.gated(Reply::Record(record(5, "stale")));
    let list_gate = backend.gated(Reply::Records(vec![record(1, "a")]));

    let store = store(&backend).with_ordering(ResponseOrdering::LatestIssued);
    let (fetched, listed, ()) = tokio::join!(
        store.get(5u32),
        store.list(QueryParams::new()),
        async {
            wait_until(|| backend.pending() == 0).await;
            list_gate.open();
            wait_until(|| store.len() == 1).await;
            get_gate.open();
        }
    );
    fetched.unwrap();
    listed.unwrap();

    // 5 was never cached, so only the list's issue order can reject it
    assert_eq!(ids(&store), vec!["1"]);
    assert!(store.get_cached(5u32).is_none());
}

#[tokio::test]
async fn latest_issued_drops_stale_list() {
    let backend = ScriptedBackend::new();
    let old_gate = backend.gated(Reply::Records(vec![record(1, "old")]));
    let new_gate = backend.gated(Reply::Records(vec![record(2, "new")]));

    let store = store(&backend).with_ordering(ResponseOrdering::LatestIssued);
    let (old, new, ()) = tokio::join!(
        store.list(QueryParams::new()),
        store.list(QueryParams::new()),
        async {
            wait_until(|| backend.pending() == 0).await;
            new_gate.open();
            wait_until(|| !store.is_empty()).await;
            old_gate.open();
        }
    );
    old.unwrap();
    new.unwrap();

    assert_eq!(ids(&store), vec!["2"]);
}

#[tokio::test]
async fn latest_issued_keeps_later_removal() {
    let backend = ScriptedBackend::new();
    backend.reply(record(5, "seed"));
    let get_gate = backend.gated(Reply::Record(record(5, "stale read")));
    let remove_gate = backend.gated(Reply::Record(Value::Null));

    let store = store(&backend).with_ordering(ResponseOrdering::LatestIssued);
    store.get(5u32).await.unwrap();

    let (read, removed, ()) = tokio::join!(store.get(5u32), store.remove(5u32), async {
        wait_until(|| backend.pending() == 0).await;
        remove_gate.open();
        wait_until(|| store.is_empty()).await;
        get_gate.open();
    });
    read.unwrap();
    removed.unwrap();

    assert!(store.is_empty());
}

#[tokio::test]
async fn dispatch_returns_before_the_response_lands() {
    let backend = ScriptedBackend::new();
    let gate = backend.gated(Reply::Records(vec![record(1, "a")]));

    let store = Arc::new(store(&backend));
    let mut events = store.subscribe();
    let handle = store.dispatch(Action::List(QueryParams::new()));

    wait_until(|| backend.pending() == 0).await;
    assert!(store.status().is_loading(OperationKind::List));
    assert!(store.is_empty());

    gate.open();
    let output = handle.await.unwrap().unwrap();

    assert_eq!(output, erp_store::ActionOutput::Listed(vec![record(1, "a")]));
    assert_eq!(events.recv().await.unwrap(), StoreEvent::Replaced { count: 1 });
    assert_eq!(
        events.recv().await.unwrap(),
        StoreEvent::Settled {
            kind: OperationKind::List,
            ok: true
        }
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Branch {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sale {
    id: u32,
    branch_id: u32,
    total: f64,
}

#[tokio::test]
async fn typed_stores_resolve_relations_client_side() {
    let backend = ScriptedBackend::new();
    backend.reply_list(vec![record(1, "North"), record(2, "South")]);
    backend.reply_list(vec![json!({ "id": 10, "branchId": 2, "total": 120.5 })]);

    let ctx = StoreContext::from_arc(Arc::clone(&backend));
    let branches = ctx.store::<Branch>("branches").unwrap();
    let sales = ctx.store::<Sale>("sales").unwrap();

    branches.list(QueryParams::new()).await.unwrap();
    sales.list(QueryParams::new()).await.unwrap();

    let sale = sales.get_cached(10u32).unwrap();
    let branch = branches.find(|b| b.id == sale.branch_id).unwrap();
    assert_eq!(branch.name, "South");

    let calls = backend.calls();
    assert_eq!(calls[0].entity, "branches");
    assert_eq!(calls[1].entity, "sales");
}

#[tokio::test]
async fn typed_update_accepts_partial_bodies() {
    #[derive(Serialize)]
    struct Rename<'a> {
        name: &'a str,
    }

    let backend = ScriptedBackend::new();
    backend.reply(record(1, "Central"));

    let store: EntityStore<Branch, ScriptedBackend> =
        EntityStore::new("branches", Arc::clone(&backend));
    let branch = store.update(1u32, &Rename { name: "Central" }).await.unwrap();

    assert_eq!(
        branch,
        Branch {
            id: 1,
            name: "Central".into()
        }
    );
    assert_eq!(backend.calls()[0].body, Some(json!({ "name": "Central" })));
}
