//! Generator and critic networks for a GAN over variable-length bv feature sequences,
//! conditioned on driver features through an injected sequence encoder.

pub mod torch;

pub use torch::config::{CriticConfig, EncoderConfig, GeneratorConfig};
pub use torch::critic::Critic;
pub use torch::encoder::{AttentionEncoder, SequenceEncoder};
pub use torch::generator::Generator;
pub use torch::noise::{FixedNoise, NoiseSource, StandardNormal};
