//! E2E tests for the online store
//!
//! The memory backend tests always run. Redis and TiKV tests need live
//! services and are ignored by default.
//!
//! To run ignored tests (requires running services):
//! `cargo test -p featurekv-online --all-features --test e2e_online_store -- --ignored`

use chrono::{TimeZone, Utc};
use featurekv_online::{
    BackendKind, EntityKey, FeatureRecord, FeatureValue, FeatureView, FeatureViewSchema, KvBackend,
    MemoryKv, OnlineStore, OnlineStoreConfig, RawKv, RawKvOnlineStore,
};

fn driver_stats() -> FeatureView {
    FeatureView::new("driver_stats")
        .with_entity("driver_id")
        .with_features(["conv_rate", "acc_rate", "avg_daily_trips"])
}

// Helper to create test feature records
fn create_test_records(count: usize) -> Vec<FeatureRecord> {
    (0..count)
        .map(|i| {
            FeatureRecord::new(
                EntityKey::new("driver_id", 1000 + i as i64),
                Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, i as u32 % 60).unwrap(),
            )
            .with_feature("conv_rate", FeatureValue::Float(0.5 + i as f64 * 0.01))
            .with_feature("acc_rate", FeatureValue::Float(0.9))
            .with_feature("avg_daily_trips", FeatureValue::Int(i as i64 * 10))
        })
        .collect()
}

/// Store over a memory map the test can inspect
fn memory_store() -> (RawKvOnlineStore, MemoryKv) {
    let kv = MemoryKv::new();
    let store = RawKvOnlineStore::with_backend(
        OnlineStoreConfig::new(BackendKind::Memory),
        KvBackend::Memory(kv.clone()),
    )
    .unwrap();
    (store, kv)
}

// =============================================================================
// Memory Tests
// =============================================================================

#[tokio::test]
async fn test_memory_driver_stats_scenario() {
    let (store, _) = memory_store();
    let view = driver_stats();
    let record = FeatureRecord::new(
        EntityKey::new("driver_id", 1001_i64),
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
    )
    .with_feature("conv_rate", FeatureValue::Float(0.5))
    .with_feature("acc_rate", FeatureValue::Float(0.9));

    store
        .online_write_batch("demo", &view, &[record], None)
        .await
        .unwrap();

    let requested = vec!["conv_rate".to_string(), "acc_rate".to_string()];
    let rows = store
        .online_read(
            "demo",
            &view,
            &[EntityKey::new("driver_id", 1001_i64)],
            Some(requested.as_slice()),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = rows[0].as_ref().expect("driver 1001 should exist");
    assert_eq!(row.event_timestamp, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(row.features.len(), 2);
    assert_eq!(row.get_feature("conv_rate"), Some(&FeatureValue::Float(0.5)));
    assert_eq!(row.get_feature("acc_rate"), Some(&FeatureValue::Float(0.9)));
}

#[tokio::test]
async fn test_memory_batch_write_with_progress() {
    let (store, kv) = memory_store();
    let view = driver_stats();
    let records = create_test_records(25);

    let mut progressed = 0usize;
    let mut on_progress = |n: usize| progressed += n;
    store
        .online_write_batch("demo", &view, &records, Some(&mut on_progress))
        .await
        .unwrap();

    assert_eq!(progressed, 25);
    // 3 features + _ts + _ex per record
    assert_eq!(kv.len().await, 25 * 5);
}

#[tokio::test]
async fn test_memory_read_defaults_to_declared_features() {
    let (store, _) = memory_store();
    let view = driver_stats();
    store
        .online_write_batch("demo", &view, &create_test_records(3), None)
        .await
        .unwrap();

    let keys: Vec<_> = (0..5).map(|i| EntityKey::new("driver_id", 1000 + i as i64)).collect();
    let rows = store.online_read("demo", &view, &keys, None).await.unwrap();

    assert_eq!(rows.len(), 5);
    for (i, row) in rows.iter().enumerate() {
        match row {
            Some(row) => {
                assert!(i < 3);
                assert_eq!(row.entity_key, keys[i]);
                assert_eq!(row.features.len(), view.feature_names().len());
                assert_eq!(
                    row.get_feature("avg_daily_trips"),
                    Some(&FeatureValue::Int(i as i64 * 10))
                );
            }
            None => assert!(i >= 3, "driver {} should have been found", i),
        }
    }
}

#[tokio::test]
async fn test_memory_projects_are_isolated() {
    let (store, _) = memory_store();
    let view = driver_stats();
    store
        .online_write_batch("staging", &view, &create_test_records(1), None)
        .await
        .unwrap();

    let key = EntityKey::new("driver_id", 1000_i64);
    let rows = store
        .online_read("prod", &view, std::slice::from_ref(&key), None)
        .await
        .unwrap();
    assert!(rows[0].is_none());

    let rows = store.online_read("staging", &view, &[key], None).await.unwrap();
    assert!(rows[0].is_some());
}

#[tokio::test]
async fn test_memory_provisioning_hooks_are_noops() {
    let (store, kv) = memory_store();
    let view = driver_stats();
    store
        .online_write_batch("demo", &view, &create_test_records(2), None)
        .await
        .unwrap();
    let before = kv.snapshot().await;

    let tables: [&dyn FeatureViewSchema; 1] = [&view];
    store.update("demo", &tables, &[], false).await.unwrap();
    store.update("demo", &[], &tables, true).await.unwrap();
    store.teardown("demo", &tables).await.unwrap();

    assert_eq!(kv.snapshot().await, before);
    assert!(store.health_check().await.is_ok());
    assert_eq!(store.store_type(), "memory");
}

#[tokio::test]
async fn test_memory_json_codec_round_trip() {
    let kv = MemoryKv::new();
    let config = OnlineStoreConfig::new(BackendKind::Memory).with_codec(featurekv_core::CodecKind::Json);
    let store = RawKvOnlineStore::with_backend(config, KvBackend::Memory(kv.clone())).unwrap();
    let view = driver_stats();

    store
        .online_write_batch("demo", &view, &create_test_records(1), None)
        .await
        .unwrap();

    // JSON values are readable in the raw keyspace
    let snapshot = kv.snapshot().await;
    assert!(snapshot.values().any(|v| v.starts_with(b"{\"Float\"")));

    let rows = store
        .online_read("demo", &view, &[EntityKey::new("driver_id", 1000_i64)], None)
        .await
        .unwrap();
    assert_eq!(
        rows[0].as_ref().unwrap().get_feature("acc_rate"),
        Some(&FeatureValue::Float(0.9))
    );
}

#[tokio::test]
async fn test_memory_reserved_feature_is_rejected_before_io() {
    let (store, kv) = memory_store();
    let view = driver_stats();
    let bad = FeatureRecord::new(EntityKey::new("driver_id", 1_i64), Utc::now())
        .with_feature("_ex", FeatureValue::Int(1));

    let result = store.online_write_batch("demo", &view, &[bad], None).await;
    assert!(matches!(result, Err(featurekv_core::Error::InvalidInput(_))));
    assert!(kv.is_empty().await);
}

#[tokio::test]
async fn test_memory_corrupt_value_surfaces_decode_error() {
    let (store, kv) = memory_store();
    let view = driver_stats();
    let entity = EntityKey::new("driver_id", 1000_i64);
    store
        .online_write_batch("demo", &view, &create_test_records(1), None)
        .await
        .unwrap();

    let key = featurekv_core::key::encode_key(
        "demo",
        &entity,
        "driver_stats",
        featurekv_core::key::Field::Feature("conv_rate"),
    )
    .unwrap();
    kv.put(key, vec![0xff]).await.unwrap();

    let result = store.online_read("demo", &view, &[entity], None).await;
    assert!(matches!(result, Err(featurekv_core::Error::DecodeError(_))));
}

// =============================================================================
// Redis Tests
// =============================================================================

#[cfg(feature = "redis")]
mod redis_tests {
    use super::*;

    fn redis_store() -> RawKvOnlineStore {
        let config = OnlineStoreConfig::new(BackendKind::Redis).with_pd_addresses("redis://localhost:6379");
        RawKvOnlineStore::new(config).expect("valid redis config")
    }

    #[tokio::test]
    #[ignore = "Requires Redis to be running"]
    async fn test_redis_health_check() {
        let store = redis_store();
        let result = store.health_check().await;
        assert!(result.is_ok(), "Health check should pass");
        assert_eq!(store.store_type(), "redis");
    }

    #[tokio::test]
    #[ignore = "Requires Redis to be running"]
    async fn test_redis_write_and_read() {
        let store = redis_store();
        let view = driver_stats();
        let records = create_test_records(10);
        let keys: Vec<_> = records.iter().map(|r| r.entity_key.clone()).collect();

        store
            .online_write_batch("e2e_redis", &view, &records, None)
            .await
            .expect("Write should succeed");

        let rows = store
            .online_read("e2e_redis", &view, &keys, None)
            .await
            .expect("Read should succeed");

        assert_eq!(rows.len(), 10);
        for (record, row) in records.iter().zip(&rows) {
            let row = row.as_ref().expect("written entity should be found");
            assert_eq!(row.event_timestamp, record.event_timestamp);
            assert_eq!(row.features, record.values);
        }
    }
}

// =============================================================================
// TiKV Tests
// =============================================================================

#[cfg(feature = "tikv")]
mod tikv_tests {
    use super::*;

    fn tikv_store() -> RawKvOnlineStore {
        let config = OnlineStoreConfig::new(BackendKind::Tikv).with_pd_addresses("127.0.0.1:2379");
        RawKvOnlineStore::new(config).expect("valid tikv config")
    }

    #[tokio::test]
    #[ignore = "Requires TiKV to be running"]
    async fn test_tikv_health_check() {
        let store = tikv_store();
        assert!(store.health_check().await.is_ok(), "Health check should pass");
        assert!(store.is_connected());
    }

    #[tokio::test]
    #[ignore = "Requires TiKV to be running"]
    async fn test_tikv_write_and_read() {
        let store = tikv_store();
        let view = driver_stats();
        let records = create_test_records(5);
        let keys: Vec<_> = records.iter().map(|r| r.entity_key.clone()).collect();

        store
            .online_write_batch("e2e_tikv", &view, &records, None)
            .await
            .expect("Write should succeed");

        let rows = store
            .online_read("e2e_tikv", &view, &keys, None)
            .await
            .expect("Read should succeed");
        assert!(rows.iter().all(Option::is_some));
    }
}
