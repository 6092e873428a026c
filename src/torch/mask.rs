//! Key padding masks. `true` marks a padded position the encoder's attention must ignore.

use tch::{Device, Kind, TchError, Tensor};

use super::shape::batch_and_len;

/// All-false `(batch, seq_len)` mask for `sequence`, on the sequence's device.
/// Used whenever a caller omits the mask.
pub fn no_padding_mask(sequence: &Tensor) -> Result<Tensor, TchError> {
    let (batch, seq_len) = batch_and_len(sequence)?;
    Tensor::f_zeros([batch, seq_len], (Kind::Bool, sequence.device()))
}

/// Mask for a padded batch where row `b` holds `lengths[b]` real positions followed by padding.
pub fn key_mask_from_lengths(
    lengths: &[i64],
    max_len: i64,
    device: Device,
) -> Result<Tensor, TchError> {
    if let Some(&len) = lengths.iter().find(|&&len| len < 0 || len > max_len) {
        return Err(TchError::Shape(format!(
            "sequence length {len} outside 0..={max_len}"
        )));
    }
    let positions = Tensor::f_arange(max_len, (Kind::Int64, device))?.f_unsqueeze(0)?;
    let lengths = Tensor::f_from_slice(lengths)?
        .f_to_device(device)?
        .f_unsqueeze(1)?;
    positions.f_ge_tensor(&lengths)
}
