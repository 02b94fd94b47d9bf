use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kvs_load::partition::shard_of;
use kvs_load::txn::{Operation, ShardGroups, TRANSACTION_SIZE};
use kvs_load::workload::{Workload, WorkloadProfile, WorkloadSpec};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    for theta in [0.0, 0.5, 0.99].iter() {
        let spec = WorkloadSpec {
            profile: WorkloadProfile::YcsbA,
            theta: *theta,
            ..Default::default()
        };
        let mut workload = Workload::new(&spec, Some(0)).unwrap();
        c.bench_with_input(BenchmarkId::new("next_op", theta), theta, |b, _| {
            b.iter(|| black_box(workload.next_op()));
        });
    }

    for shards in [1usize, 4, 16].iter() {
        c.bench_with_input(BenchmarkId::new("shard_of", shards), shards, |b, &n| {
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                black_box(shard_of(&i.to_string(), n))
            });
        });
    }

    let mut workload = Workload::new(&WorkloadSpec::default(), Some(0)).unwrap();
    c.bench_function("route_transaction", |b| {
        b.iter(|| {
            let ops: [Operation; TRANSACTION_SIZE] =
                std::array::from_fn(|_| workload.next_op());
            black_box(ShardGroups::route(ops, 8).into_groups().count())
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
