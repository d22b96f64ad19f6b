use clap::Parser;
use fused8::kernel::FastKernel;
use fused8::table::FusedTable;
use fused8::{KernelPreference, LookupConfig, LookupInputs, ReductionMode, SparseLengthsFused8BitRowwise, Tensor};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "fused8-bench", version, about = "Benchmark fused 8-bit rowwise lookup throughput")]
struct Args {
    /// Table rows
    #[arg(long, default_value_t = 100_000)]
    rows: usize,

    /// Embedding dimension (quantized values per row)
    #[arg(long, default_value_t = 64)]
    dim: usize,

    /// Segments per invocation
    #[arg(long, default_value_t = 256)]
    batch: usize,

    /// Indices per segment
    #[arg(long, default_value_t = 20)]
    pooling: usize,

    /// Invocations to time
    #[arg(long, default_value_t = 200)]
    iters: usize,

    /// Threads (invocations run in parallel on disjoint outputs)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Reduction: sum, mean or weighted-sum
    #[arg(long, default_value = "sum")]
    mode: ReductionMode,

    /// Force the scalar kernel
    #[arg(long, default_value_t = false)]
    scalar: bool,

    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.rows > 0, "--rows must be at least 1");
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let normal = Normal::new(0.0f32, 1.0)?;

    let float_rows: Vec<Vec<f32>> =
        (0..args.rows).map(|_| (0..args.dim).map(|_| normal.sample(&mut rng)).collect()).collect();
    let data = FusedTable::from_f32_rows(&float_rows)?.into_tensor()?;
    drop(float_rows);

    let n = args.batch * args.pooling;
    let indices = Tensor::vector((0..n).map(|_| rng.gen_range(0..args.rows as i64)).collect::<Vec<i64>>());
    let lengths = Tensor::vector(vec![args.pooling as i32; args.batch]);
    let weights = Tensor::vector((0..n).map(|_| rng.gen::<f32>()).collect::<Vec<f32>>());

    let mut config = LookupConfig::default();
    if args.scalar { config.kernel = KernelPreference::Scalar; }
    let op = SparseLengthsFused8BitRowwise::with_config(args.mode, config);
    let mut inputs = LookupInputs::new(&data, &indices, &lengths);
    if args.mode.with_weights() { inputs = inputs.with_weights(&weights); }

    let pb = ProgressBar::new(args.iters as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {elapsed_precise}")?);

    let t0 = Instant::now();
    let checksum: f64 = if args.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;
        pool.install(|| {
            (0..args.iters)
                .into_par_iter()
                .map(|_| {
                    let out = op.run(&inputs);
                    pb.inc(1);
                    out.map(|o| o.data().first().copied().unwrap_or(0.0) as f64)
                })
                .collect::<Result<Vec<f64>, _>>()
        })?
        .into_iter()
        .sum()
    } else {
        let mut acc = 0.0f64;
        for _ in 0..args.iters {
            acc += op.run(&inputs)?.data().first().copied().unwrap_or(0.0) as f64;
            pb.inc(1);
        }
        acc
    };
    let dt = t0.elapsed();
    pb.finish_and_clear();

    let lookups = (args.iters * n) as f64;
    let bytes = lookups * (args.dim + 8) as f64;
    let secs = dt.as_secs_f64().max(f64::EPSILON);
    println!(
        "op={} kernel={} iters={} elapsed={:.3}s lookups/s={:.1} GB/s={:.2} checksum={:.3}",
        args.mode.operator_name(),
        op.kernel().name(),
        args.iters,
        secs,
        lookups / secs,
        bytes / secs / 1e9,
        checksum
    );
    Ok(())
}
