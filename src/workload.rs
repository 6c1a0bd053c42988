//! Deterministic microbenchmark workloads: back-to-back malloc/free at striding sizes.

use std::fmt;

/// Iterations per accessor, as in gperftools' microbenchmarks.
pub const DEFAULT_ITERATIONS: usize = 32768;

/// One call issued by a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Malloc(usize),
    Free(usize),
}

/// Available microbenchmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Benchmark {
    /// Sizes 32..=512 in 16-byte steps, then wrap.
    Tp,
    /// Sizes 8..=128 in 32-byte steps, then wrap.
    TpSmall,
}

impl Benchmark {
    pub const ALL: [Benchmark; 2] = [Benchmark::Tp, Benchmark::TpSmall];

    fn stride(self) -> SizeStride {
        match self {
            Benchmark::Tp => SizeStride {
                start: 32,
                step: 16,
                max: 512,
            },
            Benchmark::TpSmall => SizeStride {
                start: 8,
                step: 32,
                max: 128,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Benchmark::Tp => "tp",
            Benchmark::TpSmall => "tp_small",
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug)]
struct SizeStride {
    start: usize,
    step: usize,
    max: usize,
}

/// Yields `iterations` malloc/free pairs for one accessor.
#[derive(Clone, Debug)]
pub struct WorkloadGenerator {
    stride: SizeStride,
    iterations: usize,
    index: usize,
    size: usize,
    pending_free: Option<usize>,
}

impl WorkloadGenerator {
    pub fn new(benchmark: Benchmark, iterations: usize) -> Self {
        let stride = benchmark.stride();
        Self {
            stride,
            iterations,
            index: 0,
            size: stride.start,
            pending_free: None,
        }
    }

    /// Iterations not yet started.
    pub fn remaining(&self) -> usize {
        self.iterations.saturating_sub(self.index)
    }
}

impl Iterator for WorkloadGenerator {
    type Item = Op;

    fn next(&mut self) -> Option<Op> {
        if let Some(size) = self.pending_free.take() {
            return Some(Op::Free(size));
        }
        if self.index >= self.iterations {
            return None;
        }
        self.index += 1;
        let size = self.size;
        self.size += self.stride.step;
        if self.size > self.stride.max {
            self.size = self.stride.start;
        }
        self.pending_free = Some(size);
        Some(Op::Malloc(size))
    }
}

/// One generator per accessor thread.
pub fn build_workload(
    num_accessors: usize,
    benchmark: Benchmark,
    iterations: usize,
) -> Vec<WorkloadGenerator> {
    (0..num_accessors)
        .map(|_| WorkloadGenerator::new(benchmark, iterations))
        .collect()
}
