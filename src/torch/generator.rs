use tch::{nn, TchError, Tensor};
use tracing::{debug, trace};

use super::config::GeneratorConfig;
use super::encoder::SequenceEncoder;
use super::feed_forward::FeedForward;
use super::init::xavier_uniform_all;
use super::mask::no_padding_mask;
use super::noise::{NoiseSource, StandardNormal};
use super::shape::{flatten_positions, unflatten_positions};

/// Produces a synthetic bv feature sequence from drivers, a conditioning sequence and noise.
///
/// The encoder embeds every position of the conditioning sequence; each embedding is
/// concatenated with its own latent vector and mapped to `feature_dim` by the head.
pub struct Generator<E> {
    encoder: E,
    head: FeedForward,
    config: GeneratorConfig,
    noise: Box<dyn NoiseSource>,
}

impl<E: SequenceEncoder> Generator<E> {
    /// Builds the head under `p` and Xavier-initializes the head and the encoder.
    pub fn new(p: &nn::Path, encoder: E, config: GeneratorConfig) -> Self {
        let generator = Self::new_uninitialized(p, encoder, config);
        generator.initialize();
        generator
    }

    /// Same as [`Generator::new`] but keeps every tensor at its default init, for callers
    /// about to load trained weights into the var store.
    pub fn new_uninitialized(p: &nn::Path, encoder: E, config: GeneratorConfig) -> Self {
        let in_dim = encoder.d_out() + config.latent_dim;
        let head = FeedForward::new(
            &(p / "head"),
            config.layer_count,
            in_dim,
            config.hidden_dim,
            config.feature_dim,
        );
        debug!(?config, in_dim, "built generator head");
        Self {
            encoder,
            head,
            config,
            noise: Box::new(StandardNormal),
        }
    }

    /// Replaces the noise drawn when `forward` gets none
    pub fn with_noise_source(mut self, noise: impl NoiseSource + 'static) -> Self {
        self.noise = Box::new(noise);
        self
    }

    /// Re-samples every multi-dimensional parameter, encoder included
    pub fn initialize(&self) {
        let mut params = self.head.parameters();
        params.extend(self.encoder.parameters());
        xavier_uniform_all(&params);
    }

    /// driver: [batch, driver_dim], sequence: [batch, seq_len, feature_dim],
    /// mask: bool [batch, seq_len] (all false when `None`),
    /// noise: [batch * seq_len, latent_dim] (drawn from the noise source when `None`)
    ///
    /// Returns a tensor shaped like `sequence`.
    pub fn forward(
        &self,
        driver: &Tensor,
        sequence: &Tensor,
        mask: Option<&Tensor>,
        noise: Option<&Tensor>,
    ) -> Result<Tensor, TchError> {
        let default_mask;
        let mask = match mask {
            Some(mask) => mask,
            None => {
                default_mask = no_padding_mask(sequence)?;
                &default_mask
            }
        };

        let embedding = self.encoder.encode(driver, sequence, mask)?;
        let embedding = flatten_positions(&embedding)?;

        let sampled;
        let noise = match noise {
            Some(noise) => noise,
            None => {
                sampled = self.noise.sample(
                    embedding.size()[0],
                    self.config.latent_dim,
                    driver.kind(),
                    driver.device(),
                )?;
                &sampled
            }
        };

        let rows = Tensor::f_cat(&[&embedding, noise], 1)?;
        let fake = self.head.f_forward(&rows)?;
        trace!(rows = ?rows.size(), out = ?fake.size(), "generator forward");
        unflatten_positions(&fake, &sequence.size())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn head(&self) -> &FeedForward {
        &self.head
    }
}
