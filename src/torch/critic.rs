use tch::{nn, TchError, Tensor};
use tracing::{debug, trace};

use super::config::CriticConfig;
use super::encoder::SequenceEncoder;
use super::feed_forward::FeedForward;
use super::init::xavier_uniform_all;
use super::mask::no_padding_mask;
use super::shape::flatten_positions;

/// Scores each position of a candidate bv sequence against the encoder's view of a
/// reference sequence. Which polarity means "real" is up to the training objective.
pub struct Critic<E> {
    encoder: E,
    head: FeedForward,
    config: CriticConfig,
}

impl<E: SequenceEncoder> Critic<E> {
    pub fn new(p: &nn::Path, encoder: E, config: CriticConfig) -> Self {
        let critic = Self::new_uninitialized(p, encoder, config);
        critic.initialize();
        critic
    }

    pub fn new_uninitialized(p: &nn::Path, encoder: E, config: CriticConfig) -> Self {
        let in_dim = encoder.d_out() + config.feature_dim;
        let head = FeedForward::new(
            &(p / "head"),
            config.layer_count,
            in_dim,
            config.hidden_dim,
            1,
        );
        debug!(?config, in_dim, "built critic head");
        Self {
            encoder,
            head,
            config,
        }
    }

    /// Re-samples every multi-dimensional parameter, encoder included
    pub fn initialize(&self) {
        let mut params = self.head.parameters();
        params.extend(self.encoder.parameters());
        xavier_uniform_all(&params);
    }

    /// candidate: [batch, seq_len, feature_dim] sequence being scored,
    /// driver: [batch, driver_dim],
    /// reference: [batch, seq_len, feature_dim] sequence the encoder conditions on,
    /// mask: bool [batch, seq_len] (all false, sized from `candidate`, when `None`)
    ///
    /// Returns [batch * seq_len, 1].
    pub fn forward(
        &self,
        candidate: &Tensor,
        driver: &Tensor,
        reference: &Tensor,
        mask: Option<&Tensor>,
    ) -> Result<Tensor, TchError> {
        let default_mask;
        let mask = match mask {
            Some(mask) => mask,
            None => {
                default_mask = no_padding_mask(candidate)?;
                &default_mask
            }
        };

        let candidate_rows = flatten_positions(candidate)?;
        let embedding = self.encoder.encode(driver, reference, mask)?;
        let embedding = flatten_positions(&embedding)?;

        let rows = Tensor::f_cat(&[&embedding, &candidate_rows], 1)?;
        let scores = self.head.f_forward(&rows)?;
        trace!(rows = ?rows.size(), "critic forward");
        Ok(scores)
    }

    pub fn config(&self) -> &CriticConfig {
        &self.config
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn head(&self) -> &FeedForward {
        &self.head
    }
}
