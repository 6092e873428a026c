/// Linear layers in a generator/critic head when none is configured
pub const DEFAULT_HEAD_LAYERS: i64 = 4;
pub const DEFAULT_LATENT_DIM: i64 = 16;
pub const DEFAULT_HIDDEN_DIM: i64 = 128;
/// Width of a bv feature vector
pub const DEFAULT_FEATURE_DIM: i64 = 6;
pub const DEFAULT_DRIVER_DIM: i64 = 12;
/// Padded sequence length the reference encoder supports
pub const DEFAULT_MAX_SEQ_LEN: i64 = 30;

pub const DEFAULT_ENCODER_MODEL_DIM: i64 = 64;
pub const DEFAULT_ENCODER_HEADS: i64 = 4;
pub const DEFAULT_ENCODER_LAYERS: i64 = 2;
pub const DEFAULT_ENCODER_FF_DIM: i64 = 128;
pub const DEFAULT_ENCODER_D_OUT: i64 = 32;

pub const RMS_NORM_EPS: f64 = 1e-6;
/// Attention logit written into padded key positions. Finite so a fully padded row
/// softmaxes to uniform weights instead of NaN.
pub const MASKED_LOGIT: f64 = -1e9;
