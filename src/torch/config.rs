use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_DRIVER_DIM, DEFAULT_ENCODER_D_OUT, DEFAULT_ENCODER_FF_DIM, DEFAULT_ENCODER_HEADS,
    DEFAULT_ENCODER_LAYERS, DEFAULT_ENCODER_MODEL_DIM, DEFAULT_FEATURE_DIM, DEFAULT_HEAD_LAYERS,
    DEFAULT_HIDDEN_DIM, DEFAULT_LATENT_DIM, DEFAULT_MAX_SEQ_LEN,
};

/// Constructor arguments of a [`Generator`](super::generator::Generator), kept for
/// introspection and so a saved model can be rebuilt with the same head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Linear layers in the head; at least 1
    pub layer_count: i64,
    pub latent_dim: i64,
    pub feature_dim: i64,
    pub hidden_dim: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layer_count: DEFAULT_HEAD_LAYERS,
            latent_dim: DEFAULT_LATENT_DIM,
            feature_dim: DEFAULT_FEATURE_DIM,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticConfig {
    /// Linear layers in the head; at least 1
    pub layer_count: i64,
    pub feature_dim: i64,
    pub hidden_dim: i64,
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            layer_count: DEFAULT_HEAD_LAYERS,
            feature_dim: DEFAULT_FEATURE_DIM,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        }
    }
}

/// Shape of the reference [`AttentionEncoder`](super::encoder::AttentionEncoder)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub driver_dim: i64,
    pub feature_dim: i64,
    pub max_seq_len: i64,
    /// Attention width; must divide evenly by `n_heads`
    pub model_dim: i64,
    pub n_heads: i64,
    pub n_layers: i64,
    pub ff_dim: i64,
    pub d_out: i64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            driver_dim: DEFAULT_DRIVER_DIM,
            feature_dim: DEFAULT_FEATURE_DIM,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            model_dim: DEFAULT_ENCODER_MODEL_DIM,
            n_heads: DEFAULT_ENCODER_HEADS,
            n_layers: DEFAULT_ENCODER_LAYERS,
            ff_dim: DEFAULT_ENCODER_FF_DIM,
            d_out: DEFAULT_ENCODER_D_OUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_json_keys() {
        let config = GeneratorConfig {
            layer_count: 2,
            latent_dim: 8,
            feature_dim: 5,
            hidden_dim: 16,
        };
        let json = serde_json::to_value(config).unwrap();

        assert_eq!(json["layer_count"], 2);
        assert_eq!(json["latent_dim"], 8);
        assert_eq!(json["feature_dim"], 5);
        assert_eq!(json["hidden_dim"], 16);

        let back: GeneratorConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_defaults_follow_head_constants() {
        let generator = GeneratorConfig::default();
        let critic = CriticConfig::default();

        assert_eq!(generator.layer_count, critic.layer_count);
        assert_eq!(generator.hidden_dim, critic.hidden_dim);
        assert_eq!(generator.feature_dim, critic.feature_dim);
        assert_eq!(EncoderConfig::default().model_dim % EncoderConfig::default().n_heads, 0);
    }
}
