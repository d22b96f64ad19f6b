use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fused8::fused::quantize_row;
use fused8::kernel::scalar::ScalarKernel;
use fused8::{LookupConfig, LookupInputs, ReductionMode, SparseLengthsFused8BitRowwise, Tensor};

fn make_table(rows: usize, dim: usize) -> Tensor<u8> {
    let mut seed = 0x1234_5678_9abc_def0u64;
    let mut next_f32 = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((seed >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0 // [-1,1)
    };
    let mut bytes = Vec::with_capacity(rows * (dim + 8));
    for _ in 0..rows {
        let vals: Vec<f32> = (0..dim).map(|_| next_f32()).collect();
        bytes.extend(quantize_row(&vals));
    }
    Tensor::new(vec![rows, dim + 8], bytes).expect("table shape")
}

fn bench_lookup(c: &mut Criterion) {
    // modest sizes for benchmark speed; adjust as needed
    let (rows, dim, batch, pooling) = (50_000usize, 64usize, 128usize, 32usize);
    let data = make_table(rows, dim);
    let indices: Vec<i64> = (0..batch * pooling).map(|i| ((i * 7919) % rows) as i64).collect();
    let idx = Tensor::vector(indices);
    let len = Tensor::vector(vec![pooling as i32; batch]);
    let inputs = LookupInputs::new(&data, &idx, &len);

    for mode in [ReductionMode::Sum, ReductionMode::Mean] {
        let op = SparseLengthsFused8BitRowwise::new(mode);
        c.bench_function(&format!("{}_dispatched", mode.operator_name()), |b| {
            b.iter(|| black_box(op.run(black_box(&inputs)).expect("lookup")))
        });
    }
    let scalar = SparseLengthsFused8BitRowwise::with_kernel(ReductionMode::Sum, LookupConfig::default(), ScalarKernel);
    c.bench_function("SparseLengthsSumFused8BitRowwise_scalar", |b| {
        b.iter(|| black_box(scalar.run(black_box(&inputs)).expect("lookup")))
    });
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
