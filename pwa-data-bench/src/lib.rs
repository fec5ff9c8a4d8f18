//! Benchmarks for tree operations over synthetic event data

use std::hint::black_box;
use std::time::{Duration, Instant};

use ndarray::ArrayD;
use tracing::debug;

use pwa_data_core::{
    data_map, data_merge, data_shape, data_split, flatten_dict_data, DecayKey, Error, Key, ParticleKey, Result, Tree,
};

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Number of timed iterations
    pub iterations: usize,

    /// Warmup iterations
    pub warmup_iterations: usize,

    /// Events in the synthetic tree
    pub events: usize,

    /// Final-state particles per event
    pub particles: usize,

    /// Decay chains per event
    pub decays: usize,

    /// Batch size for split benchmarks
    pub batch_size: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            warmup_iterations: 3,
            events: 100_000,
            particles: 3,
            decays: 2,
            batch_size: 4096,
        }
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchResult {
    /// Name of the benchmark
    pub name: String,

    /// Total time taken
    pub total_time: Duration,

    /// Average time per iteration
    pub avg_time: Duration,

    /// Min time per iteration
    pub min_time: Duration,

    /// Max time per iteration
    pub max_time: Duration,

    /// Throughput (events/second)
    pub throughput: f64,
}

/// Run a benchmark, failing on the first error `func` returns
pub fn run_benchmark<F>(name: &str, config: &BenchConfig, mut func: F) -> Result<BenchResult>
where
    F: FnMut() -> Result<()>,
{
    if config.iterations == 0 {
        return Err(Error::Configuration("benchmark needs at least one iteration".into()));
    }

    for _ in 0..config.warmup_iterations {
        func()?;
    }

    let mut times = Vec::with_capacity(config.iterations);
    let start_total = Instant::now();
    for _ in 0..config.iterations {
        let start = Instant::now();
        func()?;
        times.push(start.elapsed());
    }
    let total_time = start_total.elapsed();

    let avg_time = times.iter().sum::<Duration>() / u32::try_from(times.len()).unwrap_or(u32::MAX);
    let min_time = times.iter().min().copied().unwrap_or_default();
    let max_time = times.iter().max().copied().unwrap_or_default();

    let total_events = config.iterations * config.events;
    let throughput = total_events as f64 / total_time.as_secs_f64().max(f64::EPSILON);

    debug!(name, ?avg_time, throughput, "benchmark finished");
    Ok(BenchResult {
        name: name.to_string(),
        total_time,
        avg_time,
        min_time,
        max_time,
        throughput,
    })
}

/// Build a tree shaped like decoded event data
///
/// Each particle holds a `p` four-momentum block and a mass column, the
/// `decay` sequence holds one mapping per decay chain keyed by its
/// [`DecayKey`] with a `(theta, phi)` angle tuple, and `weight` is a per-event
/// column.
pub fn event_tree(config: &BenchConfig) -> Tree<ArrayD<f64>> {
    let n = config.events;
    let column = |offset: f64| Tree::leaf(ArrayD::from_shape_fn(vec![n], |idx| offset + idx[0] as f64 * 1e-3));

    let particles = (0..config.particles).map(|i| {
        let momenta = ArrayD::from_shape_fn(vec![n, 4], |idx| (i * 4 + idx[1]) as f64 + idx[0] as f64 * 1e-3);
        let particle = Tree::mapping([("p", Tree::leaf(momenta)), ("m", column(0.1 * i as f64))]);
        (Key::from(ParticleKey::new(format!("P{i}"))), particle)
    });

    let decays = (0..config.decays).map(|d| {
        let key = DecayKey::new(ParticleKey::new("A"), vec![ParticleKey::new(format!("R{d}")), ParticleKey::new("P0")]);
        Tree::mapping([(key, Tree::tuple([column(0.5), column(-0.5)]))])
    });

    let mut entries: Vec<(Key, Tree<ArrayD<f64>>)> = particles.collect();
    entries.push((Key::from("decay"), Tree::sequence(decays)));
    entries.push((Key::from("weight"), column(1.0)));
    Tree::mapping(entries)
}

/// Split into batches and merge them back
pub fn bench_split_merge(config: &BenchConfig) -> Result<BenchResult> {
    let tree = event_tree(config);
    run_benchmark("Split/Merge", config, || {
        let batches = data_split(&tree, config.batch_size, 0)?.collect::<Result<Vec<_>>>()?;
        let merged = data_merge(&batches, 0)?;
        black_box(data_shape(&merged, 0)?);
        Ok(())
    })
}

/// Apply an elementwise function to every leaf
pub fn bench_map(config: &BenchConfig) -> Result<BenchResult> {
    let tree = event_tree(config);
    run_benchmark("Map", config, || {
        black_box(data_map(&tree, |x| x.mapv(|v| v * 2.0)));
        Ok(())
    })
}

/// Flatten the tree into composite keys
pub fn bench_flatten(config: &BenchConfig) -> Result<BenchResult> {
    let tree = event_tree(config);
    run_benchmark("Flatten", config, || {
        black_box(flatten_dict_data(&tree)?.len());
        Ok(())
    })
}
