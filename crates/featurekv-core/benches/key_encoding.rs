//! Microbenchmarks for storage key construction and record expansion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{TimeZone, Utc};
use featurekv_core::key::{decode_key, encode_key, EntityKeyspace, Field};
use featurekv_core::writer::encode_record;
use featurekv_core::{BincodeCodec, EntityKey, FeatureRecord, FeatureValue};

fn composite_key(i: i64) -> EntityKey {
    EntityKey::new("driver_id", i)
        .with_key("city", format!("city-{}", i % 97))
        .with_key("vehicle", vec![0x3a_u8; 16])
}

fn bench_encode_key(c: &mut Criterion) {
    let entity = composite_key(1001);

    c.bench_function("key/encode_single_field", |b| {
        b.iter(|| {
            encode_key(
                black_box("demo"),
                black_box(&entity),
                black_box("driver_stats"),
                Field::Feature("conv_rate"),
            )
        })
    });

    let keyspace = EntityKeyspace::new("demo", &entity, "driver_stats").unwrap();
    c.bench_function("key/keyspace_field", |b| {
        b.iter(|| keyspace.key(black_box(Field::Feature("conv_rate"))))
    });

    let key = encode_key("demo", &entity, "driver_stats", Field::EventTimestamp).unwrap();
    c.bench_function("key/decode", |b| b.iter(|| decode_key(black_box(&key))));
}

fn bench_encode_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("writer/encode_record");
    let ts = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();

    for n in [1usize, 8, 64] {
        let record = (0..n).fold(FeatureRecord::new(composite_key(7), ts), |r, i| {
            r.with_feature(format!("f{}", i), FeatureValue::Float(i as f64))
        });
        group.throughput(Throughput::Elements((n + 2) as u64));
        group.bench_with_input(BenchmarkId::new("features", n), &record, |b, record| {
            b.iter(|| encode_record(&BincodeCodec, "demo", "driver_stats", black_box(record)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode_key, bench_encode_record);
criterion_main!(benches);
