use tch::{nn, TchError, Tensor};

/// Linear → ReLU → … → Linear. `layer_count - 1` hidden blocks of width `hidden_dim`, then a
/// projection to `out_dim` with nothing after it. `layer_count` must be at least 1.
#[derive(Debug)]
pub struct FeedForward {
    layers: Vec<nn::Linear>,
    in_dim: i64,
    out_dim: i64,
}

impl FeedForward {
    pub fn new(p: &nn::Path, layer_count: i64, in_dim: i64, hidden_dim: i64, out_dim: i64) -> Self {
        let layers = (0..layer_count)
            .map(|i| {
                let layer_in = if i == 0 { in_dim } else { hidden_dim };
                let layer_out = if i == layer_count - 1 { out_dim } else { hidden_dim };
                nn::linear(
                    p / format!("layer_{}", i),
                    layer_in,
                    layer_out,
                    Default::default(),
                )
            })
            .collect::<Vec<_>>();
        Self {
            layers,
            in_dim,
            out_dim,
        }
    }

    pub fn f_forward(&self, xs: &Tensor) -> Result<Tensor, TchError> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = xs.shallow_clone();
        for (i, layer) in self.layers.iter().enumerate() {
            x = x.f_linear(&layer.ws, layer.bs.as_ref())?;
            if i < last {
                x = x.f_relu()?;
            }
        }
        Ok(x)
    }

    pub fn layers(&self) -> &[nn::Linear] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn in_dim(&self) -> i64 {
        self.in_dim
    }

    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }

    /// Weights and biases of every layer
    pub fn parameters(&self) -> Vec<Tensor> {
        self.layers
            .iter()
            .flat_map(|l| std::iter::once(&l.ws).chain(l.bs.as_ref()))
            .map(Tensor::shallow_clone)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_layer_widths() {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = FeedForward::new(&vs.root(), 3, 18, 16, 5);

        let shapes = head
            .layers()
            .iter()
            .map(|l| l.ws.size())
            .collect::<Vec<_>>();
        assert_eq!(shapes, vec![vec![16, 18], vec![16, 16], vec![5, 16]]);
    }

    #[test]
    fn test_single_layer_is_plain_projection() {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = FeedForward::new(&vs.root(), 1, 7, 16, 1);

        assert_eq!(head.layer_count(), 1);
        assert_eq!(head.layers()[0].ws.size(), vec![1, 7]);

        // No activation: output is exactly x W^T + b, negatives included
        let layer = &head.layers()[0];
        let xs = Tensor::randn([32, 7], (Kind::Float, Device::Cpu));
        let expected = xs.matmul(&layer.ws.tr()) + layer.bs.as_ref().unwrap();
        let out = head.f_forward(&xs).unwrap();
        assert!(out.allclose(&expected, 1e-5, 1e-6, false));
    }

    #[test]
    fn test_no_activation_after_last_layer() {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = FeedForward::new(&vs.root(), 2, 4, 8, 3);
        tch::no_grad(|| {
            let _ = head.layers()[1].bs.as_ref().unwrap().shallow_clone().fill_(-10.0);
        });

        let out = head
            .f_forward(&Tensor::randn([16, 4], (Kind::Float, Device::Cpu)))
            .unwrap();
        assert!(out.lt(0.0).any().int64_value(&[]) != 0);
    }

    #[test]
    fn test_wrong_input_width_is_error() {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = FeedForward::new(&vs.root(), 2, 4, 8, 3);

        let xs = Tensor::randn([2, 5], (Kind::Float, Device::Cpu));
        assert!(head.f_forward(&xs).is_err());
    }

    #[test]
    fn test_parameters_cover_weights_and_biases() {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = FeedForward::new(&vs.root(), 3, 4, 8, 3);

        assert_eq!(head.parameters().len(), 6);
        assert_eq!(vs.trainable_variables().len(), 6);
    }
}
