use tch::nn::{self, Init};
use tch::{Kind, Tensor};

/// Scales each position to unit root-mean-square over the last axis, then applies a learned gain.
/// Computed in f32 and cast back to the input dtype.
pub(super) struct RMSNorm {
    gain: Tensor,
    eps: f64,
}

impl RMSNorm {
    pub(super) fn new(p: &nn::Path, dim: i64, eps: f64) -> Self {
        let gain = p.var("weight", &[dim], Init::Const(1.0));
        Self { gain, eps }
    }

    pub(super) fn forward(&self, xs: &Tensor) -> Tensor {
        let xs_f32 = xs.to_kind(Kind::Float);
        let inv_rms = (xs_f32.square().mean_dim(-1, true, Kind::Float) + self.eps).rsqrt();
        (xs_f32 * inv_rms * &self.gain).to_kind(xs.kind())
    }

    pub(super) fn weight(&self) -> &Tensor {
        &self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn test_unit_rms_after_norm() {
        let vs = nn::VarStore::new(Device::Cpu);
        let norm = RMSNorm::new(&vs.root(), 16, 1e-6);

        let xs = Tensor::randn([4, 16], (Kind::Float, Device::Cpu)) * 7.0;
        let rms = norm
            .forward(&xs)
            .square()
            .mean_dim(-1, false, Kind::Float)
            .sqrt();

        let ones = Tensor::ones([4], (Kind::Float, Device::Cpu));
        assert!(rms.allclose(&ones, 1e-3, 1e-3, false));
    }

    #[test]
    fn test_keeps_input_dtype() {
        let vs = nn::VarStore::new(Device::Cpu);
        let norm = RMSNorm::new(&vs.root(), 8, 1e-6);

        let xs = Tensor::randn([2, 3, 8], (Kind::Double, Device::Cpu));
        assert_eq!(norm.forward(&xs).kind(), Kind::Double);
    }
}
