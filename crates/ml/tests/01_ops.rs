use compute::default_backend;
use ml::*;

#[test]
fn tensor_ops_forward_values() -> anyhow::Result<()> {
    let mut tape = Tape::new(default_backend());

    let a = Tensor::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    let b = Tensor::from_vec(vec![2, 2], vec![5.0, 6.0, 7.0, 8.0]);

    let c = a.add(&b, &mut tape)?;
    let d = a.mul(&b, &mut tape)?;
    let e = c.reduce_sum(&mut tape)?;
    let f = d.reduce_mean(&mut tape)?;

    assert_eq!(c.data, vec![6.0, 8.0, 10.0, 12.0]);
    assert_eq!(d.data, vec![5.0, 12.0, 21.0, 32.0]);
    assert_eq!(e.data, vec![36.0]);
    assert_eq!(f.data, vec![17.5]);

    assert_eq!(tape.nodes().len(), 4);
    Ok(())
}

#[test]
fn inference_records_nothing_but_matches_tape() -> anyhow::Result<()> {
    let backend = default_backend();
    let mut tape = Tape::new(backend.clone());
    let mut inference = Inference::new(backend);

    let x = Tensor::from_vec(vec![1, 3], vec![-1.0, 0.0, 2.0]);
    let via_tape = x.swish(&mut tape)?.softplus(&mut tape)?;
    let via_inference = x.swish(&mut inference)?.softplus(&mut inference)?;

    assert_eq!(via_tape.data, via_inference.data);
    assert_eq!(tape.nodes().len(), 2);
    Ok(())
}

#[test]
fn matmul_t_and_narrow() -> anyhow::Result<()> {
    let mut rec = Inference::new(default_backend());
    let x = Tensor::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    // w is [3, 2]
    let w = Tensor::from_vec(vec![3, 2], vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    let y = x.matmul_t(&w, &mut rec)?;
    assert_eq!(y.shape, vec![2, 3]);
    assert_eq!(y.data, vec![1.0, 2.0, 3.0, 3.0, 4.0, 7.0]);

    let tail = y.narrow(1, 2, &mut rec)?;
    assert_eq!(tail.shape, vec![2, 2]);
    assert_eq!(tail.data, vec![2.0, 3.0, 4.0, 7.0]);
    Ok(())
}

#[test]
fn shape_errors_are_reported() {
    let mut rec = Inference::new(default_backend());
    let a = Tensor::zeros(vec![2, 2]);
    let b = Tensor::zeros(vec![4]);
    assert!(matches!(a.add(&b, &mut rec), Err(MlError::ShapeMismatch { op: "add", .. })));
    assert!(matches!(a.matmul_t(&Tensor::zeros(vec![2, 3]), &mut rec), Err(MlError::ShapeMismatch { .. })));
    assert!(matches!(b.matmul_t(&a, &mut rec), Err(MlError::Rank { .. })));
    assert!(matches!(a.narrow(1, 2, &mut rec), Err(MlError::ShapeMismatch { op: "narrow", .. })));
}

#[test]
fn softplus_and_exp_stay_finite_for_large_inputs() -> anyhow::Result<()> {
    let mut rec = Inference::new(default_backend());
    let x = Tensor::from_vec(vec![3], vec![-100.0, 0.0, 100.0]);
    let sp = x.softplus(&mut rec)?;
    assert!(sp.is_finite());
    assert!((sp.data[1] - std::f32::consts::LN_2).abs() < 1e-6);
    assert!((sp.data[2] - 100.0).abs() < 1e-4);
    assert!(sp.data[0] >= 0.0 && sp.data[0] < 1e-30);

    let e = Tensor::from_vec(vec![1], vec![0.0]).exp(&mut rec)?;
    assert_eq!(e.item(), Some(1.0));
    Ok(())
}
