//! Throughput Benchmark for flashcache
//!
//! Measures the cache store and the command path (framing, parsing,
//! execution, serialization) under a few representative workloads.

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use flashcache::commands::CommandHandler;
use flashcache::protocol::parse_message;
use flashcache::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_new_keys", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            engine.set(key, Bytes::from_static(b"small_value"), 3600);
            i += 1;
        });
    });

    group.bench_function("set_overwrite", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 1_000));
            engine.set(key, Bytes::from_static(b"small_value"), 3600);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..100_000 {
        let key = Bytes::from(format!("key:{}", i));
        let value = Bytes::from(format!("value:{}", i));
        engine.set(key, value, 3600);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(engine.get(key.as_bytes()));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(engine.get(key.as_bytes()));
            i += 1;
        });
    });

    // Every read hits an expired entry and evicts it
    group.bench_function("get_expired", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("expired:{}", i));
            engine.set(key.clone(), Bytes::from_static(b"v"), -1);
            black_box(engine.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the full command path on one pipelined buffer
fn bench_commands(c: &mut Criterion) {
    let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    let request = b"set user:1 alice 3600\r\nset user:2 bob 3600\r\nget user:1 user:2 user:3\r\n";

    let mut group = c.benchmark_group("commands");
    group.throughput(Throughput::Elements(3));

    group.bench_function("pipeline_set_set_get", |b| {
        let mut out = Vec::with_capacity(128);
        b.iter(|| {
            let mut buf = BytesMut::from(&request[..]);
            out.clear();
            while let Some(command) = parse_message(&mut buf) {
                handler.execute(command).serialize_into(&mut out);
            }
            black_box(out.len());
        });
    });

    group.finish();
}

/// Benchmark concurrent access on a small set of hot keys
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_hot_keys", |b| {
        b.iter(|| {
            let engine = Arc::new(StorageEngine::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = Bytes::from(format!("hot:{}", i % 16));
                            if (t + i) % 5 == 0 {
                                engine.set(key, Bytes::from_static(b"value"), 60);
                            } else {
                                engine.get(&key);
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    group.finish();
}

/// Benchmark the sweeper's full scan
fn bench_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleanup");

    group.bench_function("cleanup_half_expired", |b| {
        b.iter(|| {
            let engine = StorageEngine::new();
            for i in 0..10_000 {
                let ttl = if i % 2 == 0 { -1 } else { 3600 };
                engine.set(Bytes::from(format!("key:{}", i)), Bytes::from_static(b"v"), ttl);
            }
            black_box(engine.cleanup_expired());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_commands,
    bench_concurrent,
    bench_cleanup,
);

criterion_main!(benches);
