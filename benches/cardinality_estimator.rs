#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::hash::{BuildHasherDefault, Hash};

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use hll_cardinality::Estimator;
use hyperloglogplus::HyperLogLog as HyperLogLogTrait;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::WyHash;

/// Insert, estimate and merge operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 256;

/// Index bits used by every benchmarked estimator
const INDEX_BITS: u8 = 12;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let bench_results_path =
        std::env::var("BENCH_RESULTS_PATH").unwrap_or_else(|_| "target".to_string());
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("insert");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_insert::<HllCardinality>(&mut group, cardinality);
        bench_insert::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_estimate::<HllCardinality>(&mut group, cardinality);
        bench_estimate::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_merge::<HllCardinality>(&mut group, cardinality);
        bench_merge::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            hll_cardinality: measure_allocations::<HllCardinality>(cardinality),
            hyperloglogplus: measure_allocations::<HyperLogLogPlus>(cardinality),
        })
        .collect();
    write_table(&bench_results_path, "memory_usage.md", results);

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            hll_cardinality: measure_error::<HllCardinality>(cardinality),
            hyperloglogplus: measure_error::<HyperLogLogPlus>(cardinality),
        })
        .collect();
    write_table(&bench_results_path, "relative_error.md", results);
}

fn write_table(path: &str, file_name: &str, results: Vec<StatRecord>) {
    let table_config = Settings::default().with(Style::markdown());
    let markdown = Table::new(results).with(table_config).to_string();
    if let Err(e) = std::fs::write(format!("{}/{}", path, file_name), markdown) {
        eprintln!("failed to write {}: {}", file_name, e);
    }
}

/// Cardinality estimator trait representing common estimator operations.
trait CardinalityEstimatorTrait<T: Hash + ?Sized> {
    fn new() -> Self;
    fn insert(&mut self, item: &T);
    fn estimate(&mut self) -> usize;
    fn merge(&mut self, rhs: &Self);
    fn name() -> String;
}

fn bench_insert<E: CardinalityEstimatorTrait<usize>>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut estimator = E::new();
                for i in 0..black_box(cardinality) {
                    estimator.insert(black_box(&i));
                }
            });
        },
    );
}

fn bench_estimate<E: CardinalityEstimatorTrait<usize>>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            let mut estimator = E::new();
            for i in 0..black_box(cardinality) {
                estimator.insert(black_box(&i));
            }
            b.iter(|| estimator.estimate());
        },
    );
}

fn bench_merge<E: CardinalityEstimatorTrait<usize>>(
    group: &mut BenchmarkGroup<WallTime>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            let mut lhs = E::new();
            let mut rhs = E::new();
            for i in 0..black_box(cardinality) {
                lhs.insert(black_box(&i));
                rhs.insert(black_box(&(i + cardinality / 2)));
            }
            b.iter(|| lhs.merge(black_box(&rhs)));
        },
    );
}

fn measure_allocations<E: CardinalityEstimatorTrait<usize>>(cardinality: usize) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut estimator = E::new();
    for i in 0..cardinality {
        estimator.insert(&i);
    }
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {}",
        std::mem::size_of::<E>(),
        stats.total_bytes,
        stats.total_blocks,
    )
}

fn measure_error<E: CardinalityEstimatorTrait<usize>>(cardinality: usize) -> String {
    let n = 100;
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut estimator = E::new();
        for _ in 0..cardinality {
            estimator.insert(&rng.gen());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            (estimator.estimate() as f64 - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    hll_cardinality: String,
    hyperloglogplus: String,
}

struct HllCardinality(Estimator<WyHash>);

impl CardinalityEstimatorTrait<usize> for HllCardinality {
    fn new() -> Self {
        Self(Estimator::with_config(
            hll_cardinality::Config::new(INDEX_BITS).expect("valid index bits"),
        ))
    }

    fn insert(&mut self, item: &usize) {
        self.0.insert(item);
    }

    fn estimate(&mut self) -> usize {
        self.0.estimate()
    }

    fn merge(&mut self, rhs: &Self) {
        self.0.merge(&rhs.0).expect("equal index bits");
    }

    fn name() -> String {
        "hll-cardinality".to_string()
    }
}

struct HyperLogLogPlus(hyperloglogplus::HyperLogLogPlus<usize, BuildHasherDefault<WyHash>>);

impl CardinalityEstimatorTrait<usize> for HyperLogLogPlus {
    fn new() -> Self {
        let build_hasher = BuildHasherDefault::<WyHash>::default();
        Self(hyperloglogplus::HyperLogLogPlus::new(INDEX_BITS, build_hasher).unwrap())
    }

    fn insert(&mut self, item: &usize) {
        self.0.insert(item);
    }

    fn estimate(&mut self) -> usize {
        self.0.count() as usize
    }

    fn merge(&mut self, rhs: &Self) {
        self.0.merge(&rhs.0).unwrap();
    }

    fn name() -> String {
        "hyperloglogplus".to_string()
    }
}
