// Composes kernels the way a dense layer uses them and checks the result
// against a plain host computation.

use compute::{default_backend, kernels, read_f32s, BufferView, Device, Kernel, MatMulConfig};

fn dispatch(kernel: Kernel, binds: &[BufferView]) -> Vec<f32> {
    let backend = default_backend();
    let out = backend.dispatch(&kernel, binds, [1, 1, 1]).unwrap();
    assert_eq!(out.len(), 1, "{kernel:?} should return one buffer");
    read_f32s(&out[0])
}

#[test]
fn dense_swish_forward_matches_host() {
    let (batch, inp, out) = (3usize, 4usize, 2usize);
    let x: Vec<f32> = (0..batch * inp).map(|i| i as f32 * 0.25 - 1.0).collect();
    let w: Vec<f32> = (0..out * inp).map(|i| (i as f32 * 0.37).sin()).collect();
    let b = vec![0.1f32, -0.3];

    let cfg = MatMulConfig { m: batch as u32, k: inp as u32, n: out as u32, transpose_b: 1 };
    let xw = dispatch(
        Kernel::MatMul,
        &[
            BufferView::from_f32s(&x, vec![batch, inp]),
            BufferView::from_f32s(&w, vec![out, inp]),
            BufferView::placeholder(vec![batch, out]),
            BufferView::config(&cfg),
        ],
    );
    let biased = dispatch(
        Kernel::AddBroadcast,
        &[
            BufferView::from_f32s(&xw, vec![batch, out]),
            BufferView::from_f32s(&b, vec![out]),
            BufferView::placeholder(vec![batch, out]),
        ],
    );
    let y = dispatch(
        Kernel::Swish,
        &[
            BufferView::from_f32s(&biased, vec![batch, out]),
            BufferView::placeholder(vec![batch, out]),
            BufferView::config(&0u32),
        ],
    );

    for r in 0..batch {
        for c in 0..out {
            let z: f32 = (0..inp).map(|j| x[r * inp + j] * w[c * inp + j]).sum::<f32>() + b[c];
            let expected = z * kernels::sigmoid(z);
            let got = y[r * out + c];
            assert!((got - expected).abs() < 1e-5, "({r}, {c}): {got} vs {expected}");
        }
    }
}

#[test]
fn scale_then_reduce_mean() {
    let values = [1.0f32, 2.0, 3.0, 6.0];
    let scaled = dispatch(
        Kernel::Scale,
        &[
            BufferView::from_f32s(&values, vec![4]),
            BufferView::placeholder(vec![4]),
            BufferView::config(&0.5f32),
        ],
    );
    let mean = dispatch(
        Kernel::ReduceMean,
        &[
            BufferView::from_f32s(&scaled, vec![4]),
            BufferView::placeholder(vec![1]),
            BufferView::config(&0u32),
        ],
    );
    assert_eq!(mean, vec![1.5]);
}

#[test]
fn device_is_configured_by_name() {
    let device: Device = serde_json::from_str("\"cpu\"").unwrap();
    assert_eq!(device, Device::Cpu);
    assert_eq!(serde_json::to_string(&Device::default()).unwrap(), "\"cpu\"");
    assert!(compute::backend_for(device).is_ok());
    assert!(serde_json::from_str::<Device>("\"tpu\"").is_err());
}
