use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seqpool::backend::Backend;
use seqpool::ops::dispatch::{backward_on, forward_on};
use seqpool::tensors::{LodTensor, Tensor};
use seqpool::PoolType;

/// A random ragged batch: returns the packed input and the offsets used.
fn random_batch(rng: &mut StdRng) -> LodTensor<f64> {
    let width = rng.random_range(1..5);
    let batch = rng.random_range(1..6);
    let mut offsets = vec![0];
    for _ in 0..batch {
        let len = rng.random_range(1..5);
        offsets.push(offsets.last().copied().unwrap_or(0) + len);
    }
    let rows = *offsets.last().unwrap();
    // small integers keep ties likely, which exercises the arg-max tie-break
    let data = (0..rows * width)
        .map(|_| f64::from(rng.random_range(-3i32..4)))
        .collect();
    LodTensor::with_offsets(Tensor::new(vec![rows, width], data), offsets)
}

fn random_grad(rng: &mut StdRng, shape: &[usize]) -> Tensor<f64> {
    let len = shape.iter().product();
    Tensor::new(shape.to_vec(), (0..len).map(|_| rng.random_range(-1.0..1.0)).collect())
}

fn pool(x: &LodTensor<f64>, pool: PoolType) -> Tensor<f64> {
    let mut out = Tensor::zeros(vec![0]);
    forward_on(Backend::Parallel, x, pool, &mut out).unwrap();
    out
}

fn unpool(x: &LodTensor<f64>, dy: &Tensor<f64>, pool: PoolType) -> Tensor<f64> {
    let mut grad = Tensor::zeros(vec![0]);
    backward_on(Backend::Parallel, x, dy, pool, &mut grad).unwrap();
    grad
}

#[test]
fn output_has_one_row_per_sequence() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..32 {
        let x = random_batch(&mut rng);
        let (batch, width) = (x.lod[0].len() - 1, x.value.shape[1]);
        for p in PoolType::ALL {
            let out = pool(&x, p);
            assert_eq!(out.shape, vec![batch, width], "{p}");
        }
    }
}

#[test]
fn forward_is_repeatable() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..16 {
        let x = random_batch(&mut rng);
        for p in PoolType::ALL {
            let first = pool(&x, p);
            let second = pool(&x, p);
            let bits = |t: &Tensor<f64>| t.data.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&first), bits(&second), "{p}");
        }
    }
}

#[test]
fn average_gradient_is_sum_gradient_over_length() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..16 {
        let x = random_batch(&mut rng);
        let dy = random_grad(&mut rng, &pool(&x, PoolType::Sum).shape);
        let sum = unpool(&x, &dy, PoolType::Sum);
        let avg = unpool(&x, &dy, PoolType::Average);
        let w = x.value.shape[1];
        for (i, seq) in x.lod[0].windows(2).enumerate() {
            let h = (seq[1] - seq[0]) as f64;
            let range = seq[0] * w..seq[1] * w;
            for (s, a) in sum.data[range.clone()].iter().zip(&avg.data[range]) {
                assert!((s / h - a).abs() < 1e-12, "sequence {i}");
            }
        }
    }
}

#[test]
fn max_gradient_follows_forward_argmax() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..32 {
        let x = random_batch(&mut rng);
        let out = pool(&x, PoolType::Max);
        let dy = Tensor::new(out.shape.clone(), vec![1.0; out.numel()]);
        let grad = unpool(&x, &dy, PoolType::Max);
        let w = x.value.shape[1];

        for (i, seq) in x.lod[0].windows(2).enumerate() {
            for col in 0..w {
                let column: Vec<f64> = (seq[0]..seq[1]).map(|r| grad.data[r * w + col]).collect();
                let hit = column.iter().position(|&g| g != 0.0).unwrap();
                assert_eq!(column.iter().filter(|&&g| g != 0.0).count(), 1);

                // the hit row holds the pooled value and no earlier row does
                let row = seq[0] + hit;
                let max = out.data[i * w + col];
                assert_eq!(x.value.data[row * w + col], max);
                assert!((seq[0]..row).all(|r| x.value.data[r * w + col] < max));
            }
        }
    }
}

#[test]
fn first_and_last_leave_other_rows_zero() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..16 {
        let x = random_batch(&mut rng);
        let dy = random_grad(&mut rng, &pool(&x, PoolType::First).shape);
        let w = x.value.shape[1];
        for (p, pick) in [(PoolType::First, 0usize), (PoolType::Last, 1)] {
            let grad = unpool(&x, &dy, p);
            for (i, seq) in x.lod[0].windows(2).enumerate() {
                let selected = if pick == 0 { seq[0] } else { seq[1] - 1 };
                for r in seq[0]..seq[1] {
                    let row = &grad.data[r * w..(r + 1) * w];
                    if r == selected {
                        assert_eq!(row, &dy.data[i * w..(i + 1) * w], "{p}");
                    } else {
                        assert!(row.iter().all(|&g| g == 0.0), "{p}");
                    }
                }
            }
        }
    }
}
