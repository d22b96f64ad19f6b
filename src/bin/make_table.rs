use clap::Parser;
use fused8::table::FusedTable;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fused8-make-table", about = "Quantize a synthetic float embedding table into a fused 8-bit table file")]
struct Args {
    #[arg(long, default_value_t = 1000)]
    rows: usize,
    #[arg(long, default_value_t = 64)]
    dim: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Standard deviation of the generated values
    #[arg(long, default_value_t = 0.5)]
    std: f32,
    #[arg(long, default_value = "out/table.fused8")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    let mut rng = SmallRng::seed_from_u64(a.seed);
    let normal = Normal::new(0.0f32, a.std)?;
    let rows: Vec<Vec<f32>> = (0..a.rows).map(|_| (0..a.dim).map(|_| normal.sample(&mut rng)).collect()).collect();
    let table = FusedTable::from_f32_rows(&rows)?;
    if let Some(parent) = a.out.parent() {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    table.save(&a.out)?;
    println!("wrote {} rows x {} bytes to {}", table.rows, table.row_width, a.out.display());
    Ok(())
}
