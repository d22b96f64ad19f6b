use anyhow::{Context, Result};
use clap::Parser;
use fused8::index::IndexKind;
use fused8::table::FusedTable;
use fused8::{LookupConfig, LookupInputs, ReductionMode, SparseLengthsFused8BitRowwise, Tensor};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one fused 8-bit rowwise sparse lengths lookup", long_about = None)]
struct Args {
    /// Fused table file (FUSED8R1)
    #[arg(long)]
    table: PathBuf,

    /// Comma-separated row ids
    #[arg(long)]
    indices: String,

    /// Comma-separated segment lengths
    #[arg(long)]
    lengths: String,

    /// Comma-separated per-index weights (weighted-sum only)
    #[arg(long)]
    weights: Option<String>,

    /// Reduction: sum, mean or weighted-sum
    #[arg(long, default_value = "sum")]
    mode: ReductionMode,

    /// Index element type: i32 or i64
    #[arg(long, default_value = "i32")]
    index_kind: String,

    /// JSON config (prefetch_distance, fallback, kernel)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the output as JSON
    #[arg(long)]
    json: bool,
}

fn parse_list<T: std::str::FromStr>(s: &str, what: &str) -> Result<Vec<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<T>().with_context(|| format!("bad {} value '{}'", what, t)))
        .collect()
}

fn parse_index_kind(s: &str) -> Result<IndexKind> {
    match s.to_lowercase().as_str() {
        "i32" | "int32" => Ok(IndexKind::I32),
        "i64" | "int64" => Ok(IndexKind::I64),
        _ => anyhow::bail!("Invalid index kind: use 'i32' or 'i64'"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(p) => LookupConfig::from_json_file(p)?,
        None => LookupConfig::default(),
    };
    let data = FusedTable::load(&args.table)?.into_tensor()?;
    let lengths = Tensor::vector(parse_list::<i32>(&args.lengths, "length")?);
    let weights = args.weights.as_deref().map(|w| parse_list::<f32>(w, "weight")).transpose()?.map(Tensor::vector);

    let op = SparseLengthsFused8BitRowwise::with_config(args.mode, config);
    let result = match parse_index_kind(&args.index_kind)? {
        IndexKind::I32 => {
            let idx = Tensor::vector(parse_list::<i32>(&args.indices, "index")?);
            let mut inputs = LookupInputs::new(&data, &idx, &lengths);
            if let Some(w) = weights.as_ref() { inputs = inputs.with_weights(w); }
            op.run(&inputs)
        }
        IndexKind::I64 => {
            let idx = Tensor::vector(parse_list::<i64>(&args.indices, "index")?);
            let mut inputs = LookupInputs::new(&data, &idx, &lengths);
            if let Some(w) = weights.as_ref() { inputs = inputs.with_weights(w); }
            op.run(&inputs)
        }
    };
    let output = match result {
        Ok(o) => o,
        Err(e) if e.is_segment_error() => {
            eprintln!("malformed --indices/--lengths: {}", e);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    let rows: Vec<&[f32]> = (0..output.size(0)).map(|r| output.row(r)).collect();
    if args.json {
        let payload = serde_json::json!({
            "operator": args.mode.operator_name(),
            "shape": output.shape(),
            "output": rows,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{} -> shape {:?}", args.mode.operator_name(), output.shape());
        for (i, r) in rows.iter().enumerate() {
            let cells: Vec<String> = r.iter().map(|v| format!("{:.6}", v)).collect();
            println!("[{}] {}", i, cells.join(" "));
        }
    }
    Ok(())
}
