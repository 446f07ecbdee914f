//! Throughput Benchmark for mimickv
//!
//! This benchmark measures the cost of direct commands, lock contention on
//! HINCRBY, and transaction execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mimickv::{Command, Store};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET and GET
fn bench_strings(c: &mut Criterion) {
    let store = Store::new();
    for i in 0..100_000 {
        store.set(&format!("key:{}", i), format!("value:{}", i)).unwrap();
    }

    let mut group = c.benchmark_group("strings");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(&format!("new:{}", i), "small_value").unwrap();
            i += 1;
        });
    });

    group.bench_function("set_large", |b| {
        let mut i = 0u64;
        let value = "x".repeat(64 * 1024); // 64KB value
        b.iter(|| {
            store.set(&format!("large:{}", i % 1000), value.clone()).unwrap();
            i += 1;
        });
    });

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.get(&format!("key:{}", i % 100_000)).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.get(&format!("missing:{}", i)).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark list operations
fn bench_lists(c: &mut Criterion) {
    let store = Store::new();
    store.lpush("big", (0..10_000).map(|i| i.to_string())).unwrap();

    let mut group = c.benchmark_group("lists");
    group.throughput(Throughput::Elements(1));

    group.bench_function("lpush_lpop", |b| {
        b.iter(|| {
            store.lpush("queue", ["job"]).unwrap();
            black_box(store.lpop("queue").unwrap());
        });
    });

    group.bench_function("lrange_100", |b| {
        b.iter(|| {
            black_box(store.lrange("big", 0, 99).unwrap());
        });
    });

    group.bench_function("lrange_all", |b| {
        b.iter(|| {
            black_box(store.lrange("big", 0, -1).unwrap());
        });
    });

    group.finish();
}

/// Benchmark HINCRBY
fn bench_hincrby(c: &mut Criterion) {
    let store = Store::new();

    let mut group = c.benchmark_group("hincrby");
    group.throughput(Throughput::Elements(1));

    // Single field (every call rewrites the same value)
    group.bench_function("single_field", |b| {
        b.iter(|| {
            black_box(store.hincrby("counter", "n", 1).unwrap());
        });
    });

    // Many fields
    group.bench_function("many_fields", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(
                store
                    .hincrby("counters", &format!("f:{}", i % 1000), 1)
                    .unwrap(),
            );
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark contention on the store's lock
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_hincrby", |b| {
        b.iter(|| {
            let store = Arc::new(Store::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            store
                                .hincrby("counter", "n", if t % 2 == 0 { i } else { -i })
                                .unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.hget("counter", "n").unwrap());
        });
    });

    group.finish();
}

/// Benchmark transaction execution
fn bench_transactions(c: &mut Criterion) {
    let store = Store::new();

    let mut group = c.benchmark_group("transactions");

    for size in [1u64, 10, 100] {
        group.throughput(Throughput::Elements(size));
        group.bench_function(format!("exec_{}", size), |b| {
            b.iter(|| {
                let mut tx = store.multi().unwrap();
                for i in 0..size {
                    tx.hincrby("tx", format!("f:{}", i), 1);
                }
                black_box(tx.exec().unwrap());
            });
        });
    }

    group.bench_function("queue_parsed", |b| {
        b.iter(|| {
            let mut tx = store.multi().unwrap();
            let command = Command::from_args(["SADD", "s", "a", "b", "c"]).unwrap();
            let response = tx.queue(command);
            tx.exec().unwrap();
            black_box(response.get().unwrap());
        });
    });

    group.finish();
}

/// Benchmark KEYS pattern matching
fn bench_keys(c: &mut Criterion) {
    let store = Store::new();

    // Pre-populate with various key patterns
    for i in 0..1_000 {
        store.set(&format!("user:{}", i), "user_data").unwrap();
        store.hset(&format!("session:{}", i), "id", "x").unwrap();
        store.sadd(&format!("cache:{}", i), ["x"]).unwrap();
    }

    let mut group = c.benchmark_group("keys");

    group.bench_function("keys_pattern", |b| {
        b.iter(|| {
            black_box(store.keys("user:*").unwrap());
        });
    });

    group.bench_function("keys_class", |b| {
        b.iter(|| {
            black_box(store.keys("user:[0-4]?").unwrap());
        });
    });

    group.bench_function("keys_all", |b| {
        b.iter(|| {
            black_box(store.keys("*").unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_strings,
    bench_lists,
    bench_hincrby,
    bench_concurrent,
    bench_transactions,
    bench_keys,
);

criterion_main!(benches);
