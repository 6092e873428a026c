use tch::Tensor;
use tracing::debug;

/// Xavier/Glorot fans for a weight laid out `[out, in, receptive...]`
fn fans(size: &[i64]) -> (i64, i64) {
    let receptive: i64 = size.iter().skip(2).product();
    (size[1] * receptive, size[0] * receptive)
}

pub fn xavier_uniform_bound(size: &[i64]) -> f64 {
    let (fan_in, fan_out) = fans(size);
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

/// Re-samples every tensor with more than one dimension from U(-a, a),
/// a = sqrt(6 / (fan_in + fan_out)). Biases and other 1-D tensors are left as they are.
/// Runs without gradient tracking, so it can be repeated on live parameters.
pub fn xavier_uniform_all(params: &[Tensor]) {
    tch::no_grad(|| {
        let mut touched = 0usize;
        for p in params.iter().filter(|p| p.dim() > 1) {
            let bound = xavier_uniform_bound(&p.size());
            let _ = p.shallow_clone().uniform_(-bound, bound);
            touched += 1;
        }
        debug!(touched, total = params.len(), "xavier-uniform init");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_bound_for_linear_weight() {
        // nn::Linear stores ws as [out, in]
        let bound = xavier_uniform_bound(&[16, 18]);
        assert!((bound - (6.0f64 / 34.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_bound_includes_receptive_field() {
        let bound = xavier_uniform_bound(&[8, 4, 3]);
        assert!((bound - (6.0f64 / (12.0 + 24.0)).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_only_multi_dim_tensors_change() {
        let weight = Tensor::zeros([16, 18], (Kind::Float, Device::Cpu));
        let bias = Tensor::zeros([16], (Kind::Float, Device::Cpu));

        xavier_uniform_all(&[weight.shallow_clone(), bias.shallow_clone()]);

        let bound = xavier_uniform_bound(&[16, 18]);
        assert!(weight.abs().sum(Kind::Float).double_value(&[]) > 0.0);
        assert!(weight.abs().max().double_value(&[]) <= bound);
        assert_eq!(bias.abs().sum(Kind::Float).double_value(&[]), 0.0);
    }

    #[test]
    fn test_init_on_variables_tracks_no_grad() {
        let vs = tch::nn::VarStore::new(Device::Cpu);
        let ws = vs.root().zeros("ws", &[4, 4]);

        xavier_uniform_all(&[ws.shallow_clone()]);

        assert!(ws.requires_grad());
        assert!(!ws.grad().defined());
    }
}
