use tch::{nn, Kind, TchError, Tensor};

use super::rmsnorm::RMSNorm;
use crate::torch::constants::{MASKED_LOGIT, RMS_NORM_EPS};

/// Pre-norm self-attention + ReLU MLP, both residual
pub(super) struct EncoderBlock {
    attn_ln: RMSNorm,
    qkv: nn::Linear,
    attn_out: nn::Linear,
    mlp_ln: RMSNorm,
    mlp_fc1: nn::Linear,
    mlp_fc2: nn::Linear,
    n_heads: i64,
}

impl EncoderBlock {
    pub(super) fn new(p: &nn::Path, model_dim: i64, n_heads: i64, ff_dim: i64) -> Self {
        let attn_ln = RMSNorm::new(&(p / "attn_ln"), model_dim, RMS_NORM_EPS);
        let qkv = nn::linear(p / "qkv", model_dim, 3 * model_dim, Default::default());
        let attn_out = nn::linear(p / "attn_out", model_dim, model_dim, Default::default());
        let mlp_ln = RMSNorm::new(&(p / "mlp_ln"), model_dim, RMS_NORM_EPS);
        let mlp_fc1 = nn::linear(p / "mlp_fc1", model_dim, ff_dim, Default::default());
        let mlp_fc2 = nn::linear(p / "mlp_fc2", ff_dim, model_dim, Default::default());
        Self {
            attn_ln,
            qkv,
            attn_out,
            mlp_ln,
            mlp_fc1,
            mlp_fc2,
            n_heads,
        }
    }

    /// x: [batch, seq_len, model_dim], key_mask: bool [batch, seq_len]
    pub(super) fn forward(&self, x: &Tensor, key_mask: &Tensor) -> Result<Tensor, TchError> {
        let (b, s, d) = x.size3()?;
        let head_dim = d / self.n_heads;

        let qkv = self.attn_ln.forward(x).apply(&self.qkv);
        let parts = qkv.split(d, -1);
        let to_heads = |t: &Tensor| {
            t.reshape([b, s, self.n_heads, head_dim])
                .permute([0, 2, 1, 3])
        };
        let q = to_heads(&parts[0]);
        let k = to_heads(&parts[1]);
        let v = to_heads(&parts[2]);

        // Padded keys get a large negative logit; queries at padded positions still
        // produce output, the caller decides what to do with those rows.
        let key_mask = key_mask.f_reshape([b, 1, 1, s])?;
        let scores = q.matmul(&k.transpose(-2, -1)) / (head_dim as f64).sqrt();
        let scores = scores.f_masked_fill(&key_mask, MASKED_LOGIT)?;
        let attn = scores.softmax(-1, Kind::Float).to_kind(q.kind());
        let ctx = attn
            .matmul(&v)
            .permute([0, 2, 1, 3])
            .reshape([b, s, d])
            .apply(&self.attn_out);
        let x = x + ctx;

        let mlp = self
            .mlp_ln
            .forward(&x)
            .apply(&self.mlp_fc1)
            .relu()
            .apply(&self.mlp_fc2);
        Ok(x + mlp)
    }

    pub(super) fn parameters(&self) -> Vec<Tensor> {
        let mut params = vec![
            self.attn_ln.weight().shallow_clone(),
            self.mlp_ln.weight().shallow_clone(),
        ];
        for linear in [&self.qkv, &self.attn_out, &self.mlp_fc1, &self.mlp_fc2] {
            params.push(linear.ws.shallow_clone());
            params.extend(linear.bs.as_ref().map(Tensor::shallow_clone));
        }
        params
    }
}
