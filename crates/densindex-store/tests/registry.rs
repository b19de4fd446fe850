//! Behavioural tests for the registry store: predecessor lookups, cascade
//! deletes, rollback semantics, and the tracked protocol asset class.

use densindex_core::{
    AssetClass, ChainPoint, Hash32, NameSetEntry, Point, ProtocolParams, ResourceRecord,
    ScriptHash, TxOutRef,
};
use densindex_store::RegistryStore;

fn point(slot: u64) -> Point {
    Point::new(slot, Hash32([slot as u8; 32]))
}

fn txref(byte: u8, index: u32) -> TxOutRef {
    TxOutRef::new(Hash32([byte; 32]), index)
}

fn class(byte: u8) -> AssetClass {
    AssetClass::new(vec![byte; 28], vec![byte])
}

fn entry(name: &str, pointer: AssetClass, tx_out_ref: TxOutRef) -> NameSetEntry {
    NameSetEntry {
        name: name.as_bytes().to_vec(),
        pointer,
        tx_out_ref,
    }
}

fn params(byte: u8) -> ProtocolParams {
    ProtocolParams {
        element_id_policy: ScriptHash([byte; 28]),
        set_elem_policy: ScriptHash([byte.wrapping_add(1); 28]),
        set_validator: ScriptHash([byte.wrapping_add(2); 28]),
        records_validator: ScriptHash([byte.wrapping_add(3); 28]),
    }
}

fn record(ttl: u32, payload: &[u8]) -> ResourceRecord {
    ResourceRecord {
        ttl,
        value: payload.to_vec(),
    }
}

/// Insert one name at its own point, committing the transaction.
async fn register(store: &RegistryStore, slot: u64, name: &str, pointer: AssetClass, r: TxOutRef) {
    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(slot)).await.unwrap();
    session.insert_live_ref(&r, slot).await.unwrap();
    session
        .insert_name_set_entry(&entry(name, pointer, r), slot)
        .await
        .unwrap();
    session.commit().await.unwrap();
}

// ── Predecessor / existence ──────────────────────────────────────────────────

#[tokio::test]
async fn predecessor_and_existence() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "google.com", class(1), txref(1, 0)).await;

    // Before registration: predecessor is google.com, name not yet live.
    let lookup = store
        .select_predecessor(b"taylorswift.com")
        .await
        .unwrap();
    assert!(!lookup.name_exists);
    assert_eq!(lookup.predecessor.unwrap().name, b"google.com");

    register(&store, 101, "taylorswift.com", class(2), txref(2, 0)).await;

    let lookup = store
        .select_predecessor(b"taylorswift.com")
        .await
        .unwrap();
    assert!(lookup.name_exists);
    assert_eq!(lookup.predecessor.unwrap().name, b"google.com");
}

#[tokio::test]
async fn predecessor_none_below_minimum() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "mmm", class(1), txref(1, 0)).await;

    let lookup = store.select_predecessor(b"aaa").await.unwrap();
    assert!(lookup.predecessor.is_none());
    assert!(!lookup.name_exists);

    // Inserting above never disturbs lookups at or below the minimum.
    register(&store, 101, "zzz", class(2), txref(2, 0)).await;
    let lookup = store.select_predecessor(b"aaa").await.unwrap();
    assert!(lookup.predecessor.is_none());
}

#[tokio::test]
async fn predecessor_uses_byte_order() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "a", class(1), txref(1, 0)).await;
    register(&store, 101, "ab", class(2), txref(2, 0)).await;

    // "aa" sorts between "a" and "ab" in raw byte order.
    let lookup = store.select_predecessor(b"aa").await.unwrap();
    assert_eq!(lookup.predecessor.unwrap().name, b"a");
}

// ── Rollback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rollback_undoes_registration() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "google.com", class(1), txref(1, 0)).await;
    register(&store, 101, "taylorswift.com", class(2), txref(2, 0)).await;

    let mut session = store.begin().await.unwrap();
    session
        .roll_back_to(&ChainPoint::from(point(100)))
        .await
        .unwrap();
    session.commit().await.unwrap();

    let lookup = store
        .select_predecessor(b"taylorswift.com")
        .await
        .unwrap();
    assert!(!lookup.name_exists);
    assert_eq!(lookup.predecessor.unwrap().name, b"google.com");
}

#[tokio::test]
async fn rollback_retains_target_point() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "google.com", class(1), txref(1, 0)).await;

    let mut session = store.begin().await.unwrap();
    session
        .roll_back_to(&ChainPoint::from(point(100)))
        .await
        .unwrap();
    session.commit().await.unwrap();

    // The target point and everything it produced survive.
    assert_eq!(store.point_count().await.unwrap(), 1);
    assert!(store.select_predecessor(b"h").await.unwrap().predecessor.is_some());
    assert_eq!(store.recent_points(10).await.unwrap(), vec![point(100)]);
}

#[tokio::test]
async fn rollback_is_idempotent() {
    let store = RegistryStore::in_memory().await.unwrap();
    for (slot, name, byte) in [(100, "a", 1u8), (101, "b", 2), (102, "c", 3)] {
        register(&store, slot, name, class(byte), txref(byte, 0)).await;
    }

    for _ in 0..2 {
        let mut session = store.begin().await.unwrap();
        session
            .roll_back_to(&ChainPoint::from(point(101)))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(store.point_count().await.unwrap(), 2);
        assert_eq!(store.name_count().await.unwrap(), 2);
        assert_eq!(store.live_ref_count().await.unwrap(), 2);
    }
}

#[tokio::test]
async fn rollback_to_origin_clears_everything() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "a", class(1), txref(1, 0)).await;

    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(101)).await.unwrap();
    session.insert_live_ref(&txref(9, 0), 101).await.unwrap();
    session
        .insert_protocol(&txref(9, 0), &params(5), 101)
        .await
        .unwrap();
    session
        .insert_record_bundle(b"a", &txref(9, 0), &[record(60, b"x")], 101)
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    session.roll_back_to(&ChainPoint::Origin).await.unwrap();
    session.commit().await.unwrap();

    assert_eq!(store.point_count().await.unwrap(), 0);
    assert_eq!(store.live_ref_count().await.unwrap(), 0);
    assert_eq!(store.name_count().await.unwrap(), 0);
    assert_eq!(store.record_bundle_count().await.unwrap(), 0);
    assert!(store.select_protocol().await.unwrap().is_none());
}

// ── Points / duplicates / sessions ───────────────────────────────────────────

#[tokio::test]
async fn duplicate_point_rejected() {
    let store = RegistryStore::in_memory().await.unwrap();
    register(&store, 100, "a", class(1), txref(1, 0)).await;

    let mut session = store.begin().await.unwrap();
    let err = session.insert_point(&point(100)).await.unwrap_err();
    assert!(matches!(
        err,
        densindex_store::StoreError::DuplicatePoint { slot: 100 }
    ));
}

#[tokio::test]
async fn dropped_session_rolls_back() {
    let store = RegistryStore::in_memory().await.unwrap();

    {
        let mut session = store.begin().await.unwrap();
        session.insert_point(&point(100)).await.unwrap();
        session.insert_live_ref(&txref(1, 0), 100).await.unwrap();
        // No commit — dropped here.
    }

    assert_eq!(store.point_count().await.unwrap(), 0);
    assert_eq!(store.live_ref_count().await.unwrap(), 0);
}

#[tokio::test]
async fn recent_points_newest_first() {
    let store = RegistryStore::in_memory().await.unwrap();
    for slot in [100, 101, 102] {
        let mut session = store.begin().await.unwrap();
        session.insert_point(&point(slot)).await.unwrap();
        session.commit().await.unwrap();
    }

    let points = store.recent_points(2).await.unwrap();
    assert_eq!(points, vec![point(102), point(101)]);
}

// ── Cascade on consumption ───────────────────────────────────────────────────

#[tokio::test]
async fn consuming_a_ref_cascades() {
    let store = RegistryStore::in_memory().await.unwrap();

    let r = txref(1, 0);
    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(100)).await.unwrap();
    session.insert_live_ref(&r, 100).await.unwrap();
    session
        .insert_name_set_entry(&entry("a", class(1), r), 100)
        .await
        .unwrap();
    session
        .insert_record_bundle(b"a", &r, &[record(60, b"x")], 100)
        .await
        .unwrap();
    session.insert_protocol(&r, &params(5), 100).await.unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    assert!(session.live_ref_exists(&r).await.unwrap());
    session.delete_live_ref(&r).await.unwrap();
    assert!(!session.live_ref_exists(&r).await.unwrap());
    session.commit().await.unwrap();

    assert!(!store.select_predecessor(b"b").await.unwrap().name_exists);
    assert_eq!(store.name_count().await.unwrap(), 0);
    assert!(store.select_records_for_name(b"a").await.unwrap().is_empty());
    assert!(store.select_protocol().await.unwrap().is_none());
    assert_eq!(store.live_ref_count().await.unwrap(), 0);
}

// ── Records ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_union_across_bundles() {
    let store = RegistryStore::in_memory().await.unwrap();

    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(100)).await.unwrap();
    session.insert_live_ref(&txref(1, 0), 100).await.unwrap();
    session
        .insert_record_bundle(
            b"a",
            &txref(1, 0),
            &[record(60, b"10.0.0.1"), record(60, b"10.0.0.2")],
            100,
        )
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(101)).await.unwrap();
    session.insert_live_ref(&txref(2, 0), 101).await.unwrap();
    session
        .insert_record_bundle(b"a", &txref(2, 0), &[record(120, b"10.0.0.3")], 101)
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut records = store.select_records_for_name(b"a").await.unwrap();
    records.sort_by(|a, b| a.value.cmp(&b.value));
    assert_eq!(
        records,
        vec![
            record(60, b"10.0.0.1"),
            record(60, b"10.0.0.2"),
            record(120, b"10.0.0.3"),
        ]
    );
}

#[tokio::test]
async fn record_order_within_bundle_preserved() {
    let store = RegistryStore::in_memory().await.unwrap();

    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(100)).await.unwrap();
    session.insert_live_ref(&txref(1, 0), 100).await.unwrap();
    session
        .insert_record_bundle(
            b"a",
            &txref(1, 0),
            &[record(3, b"z"), record(1, b"a"), record(2, b"m")],
            100,
        )
        .await
        .unwrap();
    session.commit().await.unwrap();

    let records = store.select_records_for_name(b"a").await.unwrap();
    let ttls: Vec<u32> = records.iter().map(|r| r.ttl).collect();
    assert_eq!(ttls, vec![3, 1, 2]);
}

// ── Protocol singleton / tracked asset class ─────────────────────────────────

#[tokio::test]
async fn protocol_upsert_keeps_single_row() {
    let store = RegistryStore::in_memory().await.unwrap();

    let mut session = store.begin().await.unwrap();
    session.insert_point(&point(100)).await.unwrap();
    session.insert_live_ref(&txref(1, 0), 100).await.unwrap();
    session.insert_protocol(&txref(1, 0), &params(5), 100).await.unwrap();
    session.insert_live_ref(&txref(2, 0), 100).await.unwrap();
    session.insert_protocol(&txref(2, 0), &params(9), 100).await.unwrap();
    session.commit().await.unwrap();

    let protocol = store.select_protocol().await.unwrap().unwrap();
    assert_eq!(protocol.tx_out_ref, txref(2, 0));
    assert_eq!(protocol.params, params(9));
}

#[tokio::test]
async fn sync_protocol_asset_class_lifecycle() {
    let store = RegistryStore::in_memory().await.unwrap();

    // Empty config: candidate is stored and returned unchanged.
    assert_eq!(
        store.sync_protocol_asset_class(&class(1)).await.unwrap(),
        class(1)
    );
    assert_eq!(store.protocol_asset_class().await.unwrap(), Some(class(1)));

    // Same candidate: unchanged.
    assert_eq!(
        store.sync_protocol_asset_class(&class(1)).await.unwrap(),
        class(1)
    );

    // External reconfiguration wins over the caller's stale candidate.
    store.set_protocol_asset_class(&class(2)).await.unwrap();
    assert_eq!(
        store.sync_protocol_asset_class(&class(1)).await.unwrap(),
        class(2)
    );
}
