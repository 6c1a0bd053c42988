use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mallacc_sim::workload::{Benchmark, Op, WorkloadGenerator};
use mallacc_sim::{AllocationSimulator, MallocCache};
use std::hint::black_box;

const OPS: usize = 10_000;

fn replay(sim: &AllocationSimulator, benchmark: Benchmark, assist: bool, capacity: usize) -> u64 {
    let mut cache = MallocCache::new(capacity).expect("capacity > 0");
    let mut cycles = 0;
    for op in WorkloadGenerator::new(benchmark, OPS) {
        cycles += match op {
            Op::Malloc(size) => sim.allocate(size, assist, &mut cache),
            Op::Free(size) => sim.deallocate(size, assist, &mut cache),
        }
        .expect("workload sizes are non-zero");
    }
    cycles
}

fn benchmark_fast_path(c: &mut Criterion) {
    let sim = AllocationSimulator::default();
    let mut group = c.benchmark_group("fast_path");

    for benchmark in Benchmark::ALL {
        group.throughput(Throughput::Elements(OPS as u64));

        group.bench_with_input(
            BenchmarkId::new("software", benchmark),
            &benchmark,
            |b, &bm| b.iter(|| black_box(replay(&sim, bm, false, 16))),
        );

        for capacity in [4, 16, 32] {
            let id = BenchmarkId::new(format!("mallacc-{capacity}"), benchmark);
            group.bench_with_input(id, &benchmark, |b, &bm| {
                b.iter(|| black_box(replay(&sim, bm, true, capacity)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_fast_path);
criterion_main!(benches);
