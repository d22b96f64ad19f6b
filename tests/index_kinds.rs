use fused8::fused::quantize_row;
use fused8::{Blob, IndexKind, Indices, LookupError, LookupInputs, ReductionMode, SparseLengthsFused8BitRowwise, Tensor};
use pretty_assertions::assert_eq;

fn data() -> Tensor<u8> {
    let rows: Vec<u8> = (0..6).flat_map(|r| quantize_row(&[r as f32, -(r as f32), 0.5 * r as f32, 1.0])).collect();
    Tensor::new(vec![6, 12], rows).unwrap()
}

#[test]
fn narrow_and_wide_indices_give_identical_output() {
    let d = data();
    let narrow = Tensor::vector(vec![5i32, 0, 3, 3, 1]);
    let wide = Tensor::vector(vec![5i64, 0, 3, 3, 1]);
    let len = Tensor::vector(vec![2, 0, 3]);
    assert_eq!(Indices::from(&narrow).kind(), IndexKind::I32);
    assert_eq!(Indices::from(&wide).kind(), IndexKind::I64);
    for mode in [ReductionMode::Sum, ReductionMode::Mean] {
        let op = SparseLengthsFused8BitRowwise::new(mode);
        let a = op.run(&LookupInputs::new(&d, &narrow, &len)).unwrap();
        let b = op.run(&LookupInputs::new(&d, &wide, &len)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn positional_slots_without_weights() {
    let d = data();
    let blobs = vec![
        Blob::U8(d.clone()),
        Blob::I64(Tensor::vector(vec![1, 2])),
        Blob::I32(Tensor::vector(vec![2])),
    ];
    let op = SparseLengthsFused8BitRowwise::new(ReductionMode::Sum);
    let out = op.run_positional(&blobs).unwrap();
    let idx = Tensor::vector(vec![1i32, 2]);
    let len = Tensor::vector(vec![2]);
    assert_eq!(out, op.run(&LookupInputs::new(&d, &idx, &len)).unwrap());
}

#[test]
fn positional_slots_with_weights() {
    let d = data();
    let blobs = vec![
        Blob::U8(d.clone()),
        Blob::F32(Tensor::vector(vec![2.0, 0.0])),
        Blob::I32(Tensor::vector(vec![4, 5])),
        Blob::I32(Tensor::vector(vec![1, 1])),
    ];
    let op = SparseLengthsFused8BitRowwise::new(ReductionMode::WeightedSum);
    let out = op.run_positional(&blobs).unwrap();
    assert_eq!(out.shape(), &[2, 4]);
    assert_eq!(out.row(1), &[0.0; 4]);
    assert!((out.row(0)[3] - 2.0).abs() < 0.05);
}

#[test]
fn positional_type_and_arity_errors() {
    let d = data();
    let op = SparseLengthsFused8BitRowwise::new(ReductionMode::Sum);

    let bad_indices = vec![Blob::U8(d.clone()), Blob::F32(Tensor::vector(vec![0.0])), Blob::I32(Tensor::vector(vec![1]))];
    assert_eq!(
        op.run_positional(&bad_indices).unwrap_err(),
        LookupError::InputType { slot: 1, name: "INDICES", expected: "int32 or int64", found: "float" }
    );

    let bad_lengths = vec![Blob::U8(d.clone()), Blob::I32(Tensor::vector(vec![0])), Blob::I64(Tensor::vector(vec![1]))];
    assert_eq!(
        op.run_positional(&bad_lengths).unwrap_err(),
        LookupError::InputType { slot: 2, name: "LENGTHS", expected: "int32", found: "int64" }
    );

    let missing = vec![Blob::U8(d)];
    assert_eq!(
        op.run_positional(&missing).unwrap_err(),
        LookupError::MissingInput { slot: 1, name: "INDICES" }
    );
}
