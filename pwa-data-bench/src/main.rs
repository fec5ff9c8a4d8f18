//! Benchmark runner for tree operations

use anyhow::Context;
use tracing::info;

use pwa_data_bench::{bench_flatten, bench_map, bench_split_merge, BenchConfig, BenchResult};

fn report(result: &BenchResult) {
    println!("\nBenchmark: {}", result.name);
    println!("  Total time:   {:?}", result.total_time);
    println!("  Average time: {:?}", result.avg_time);
    println!("  Min time:     {:?}", result.min_time);
    println!("  Max time:     {:?}", result.max_time);
    println!("  Throughput:   {:.2} events/sec", result.throughput);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    println!("=== Tree Operation Benchmarks ===");

    let config = BenchConfig {
        iterations: 5,
        warmup_iterations: 2,
        ..BenchConfig::default()
    };
    info!(events = config.events, particles = config.particles, "running benchmarks");

    report(&bench_split_merge(&config).context("split/merge benchmark")?);
    report(&bench_map(&config).context("map benchmark")?);
    report(&bench_flatten(&config).context("flatten benchmark")?);

    println!("\n=== Batch Size Scaling ===");
    for batch_size in [256, 1024, 4096, 16384] {
        let config = BenchConfig {
            iterations: 3,
            warmup_iterations: 1,
            batch_size,
            ..BenchConfig::default()
        };
        let result = bench_split_merge(&config).with_context(|| format!("split/merge with batch size {batch_size}"))?;
        println!("\nBatch size: {batch_size}");
        println!("  Average time: {:?}", result.avg_time);
        println!("  Throughput:   {:.2} events/sec", result.throughput);
    }

    Ok(())
}
