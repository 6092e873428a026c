//! Sequence encoders the generator and critic condition on.
//!
//! The heads only need `d_out` and `encode(driver, sequence, key_mask)`; anything
//! implementing [`SequenceEncoder`] can be plugged in. [`AttentionEncoder`] is the
//! driver-conditioned transformer used by the binary and the tests.

mod block;
mod rmsnorm;

use tch::nn::{self, Init};
use tch::{TchError, Tensor};
use tracing::debug;

use super::config::EncoderConfig;
use super::constants::RMS_NORM_EPS;
use super::shape::batch_and_len;
use block::EncoderBlock;
use rmsnorm::RMSNorm;

pub trait SequenceEncoder {
    /// Width of each per-position embedding
    fn d_out(&self) -> i64;

    /// driver: [batch, driver_dim], sequence: [batch, seq_len, feature_dim],
    /// key_mask: bool [batch, seq_len] (true = padding)
    ///
    /// Returns [batch, seq_len, d_out].
    fn encode(
        &self,
        driver: &Tensor,
        sequence: &Tensor,
        key_mask: &Tensor,
    ) -> Result<Tensor, TchError>;

    /// Learnable tensors owned by the encoder. A wrapping generator/critic re-initializes
    /// these together with its own head.
    fn parameters(&self) -> Vec<Tensor> {
        Vec::new()
    }
}

impl<E: SequenceEncoder + ?Sized> SequenceEncoder for &E {
    fn d_out(&self) -> i64 {
        (**self).d_out()
    }

    fn encode(
        &self,
        driver: &Tensor,
        sequence: &Tensor,
        key_mask: &Tensor,
    ) -> Result<Tensor, TchError> {
        (**self).encode(driver, sequence, key_mask)
    }

    fn parameters(&self) -> Vec<Tensor> {
        (**self).parameters()
    }
}

impl<E: SequenceEncoder + ?Sized> SequenceEncoder for Box<E> {
    fn d_out(&self) -> i64 {
        (**self).d_out()
    }

    fn encode(
        &self,
        driver: &Tensor,
        sequence: &Tensor,
        key_mask: &Tensor,
    ) -> Result<Tensor, TchError> {
        (**self).encode(driver, sequence, key_mask)
    }

    fn parameters(&self) -> Vec<Tensor> {
        (**self).parameters()
    }
}

/// bv features and drivers are embedded into `model_dim`, the driver embedding is
/// broadcast over every position, a learned positional embedding is added, then
/// `n_layers` self-attention blocks run with the key padding mask before a final
/// projection to `d_out`.
pub struct AttentionEncoder {
    config: EncoderConfig,
    bv_embed: nn::Linear,
    driver_embed: nn::Linear,
    pos_embed: Tensor,
    blocks: Vec<EncoderBlock>,
    final_ln: RMSNorm,
    out_proj: nn::Linear,
}

impl AttentionEncoder {
    pub fn new(p: &nn::Path, config: EncoderConfig) -> Self {
        assert!(
            config.model_dim % config.n_heads == 0,
            "model_dim must be divisible by n_heads"
        );
        let bv_embed = nn::linear(
            p / "bv_embed",
            config.feature_dim,
            config.model_dim,
            Default::default(),
        );
        let driver_embed = nn::linear(
            p / "driver_embed",
            config.driver_dim,
            config.model_dim,
            Default::default(),
        );
        let pos_embed = p.var(
            "pos_embed",
            &[config.max_seq_len, config.model_dim],
            Init::Randn {
                mean: 0.0,
                stdev: 0.02,
            },
        );
        let blocks = (0..config.n_layers)
            .map(|i| {
                EncoderBlock::new(
                    &(p / format!("block_{}", i)),
                    config.model_dim,
                    config.n_heads,
                    config.ff_dim,
                )
            })
            .collect::<Vec<_>>();
        let final_ln = RMSNorm::new(&(p / "final_ln"), config.model_dim, RMS_NORM_EPS);
        let out_proj = nn::linear(
            p / "out_proj",
            config.model_dim,
            config.d_out,
            Default::default(),
        );
        debug!(?config, "built attention encoder");
        Self {
            config,
            bv_embed,
            driver_embed,
            pos_embed,
            blocks,
            final_ln,
            out_proj,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl SequenceEncoder for AttentionEncoder {
    fn d_out(&self) -> i64 {
        self.config.d_out
    }

    fn encode(
        &self,
        driver: &Tensor,
        sequence: &Tensor,
        key_mask: &Tensor,
    ) -> Result<Tensor, TchError> {
        let (batch, seq_len) = batch_and_len(sequence)?;
        // A size-1 driver batch would otherwise broadcast silently
        let driver_batch = driver.size().first().copied().unwrap_or(-1);
        if driver_batch != batch {
            return Err(TchError::Shape(format!(
                "driver batch {driver_batch} does not match sequence batch {batch}"
            )));
        }
        if key_mask.size() != [batch, seq_len] {
            return Err(TchError::Shape(format!(
                "key mask shape {:?} does not match sequence ({batch}, {seq_len})",
                key_mask.size()
            )));
        }

        let tokens = sequence.f_linear(&self.bv_embed.ws, self.bv_embed.bs.as_ref())?;
        let drivers = driver
            .f_linear(&self.driver_embed.ws, self.driver_embed.bs.as_ref())?
            .f_unsqueeze(1)?;
        let positions = self.pos_embed.f_narrow(0, 0, seq_len)?.f_unsqueeze(0)?;

        let mut x = tokens.f_add(&drivers)?.f_add(&positions)?;
        for block in &self.blocks {
            x = block.forward(&x, key_mask)?;
        }
        Ok(self.final_ln.forward(&x).apply(&self.out_proj))
    }

    fn parameters(&self) -> Vec<Tensor> {
        let mut params = Vec::new();
        for linear in [&self.bv_embed, &self.driver_embed, &self.out_proj] {
            params.push(linear.ws.shallow_clone());
            params.extend(linear.bs.as_ref().map(Tensor::shallow_clone));
        }
        params.push(self.pos_embed.shallow_clone());
        params.push(self.final_ln.weight().shallow_clone());
        for block in &self.blocks {
            params.extend(block.parameters());
        }
        params
    }
}
