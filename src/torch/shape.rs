//! Batch × sequence axis handling shared by the generator and critic.
//!
//! Heads operate on one row per sequence position, so `(batch, seq_len, width)` tensors are
//! flattened row-major into `(batch * seq_len, width)` and reshaped back afterwards. Both
//! directions go through here so the layout can't drift between call sites.

use tch::{TchError, Tensor};

/// `(batch, seq_len, width)` -> `(batch * seq_len, width)`
pub fn flatten_positions(xs: &Tensor) -> Result<Tensor, TchError> {
    xs.f_flatten(0, 1)
}

/// Inverse of [`flatten_positions`]: restores `rows` to `shape`, which must hold the same
/// number of elements.
pub fn unflatten_positions(rows: &Tensor, shape: &[i64]) -> Result<Tensor, TchError> {
    rows.f_reshape(shape)
}

/// `(batch, seq_len)` of a sequence tensor
pub fn batch_and_len(xs: &Tensor) -> Result<(i64, i64), TchError> {
    let size = xs.size();
    if size.len() < 2 {
        return Err(TchError::Shape(format!(
            "expected a (batch, seq_len, ..) tensor, got shape {size:?}"
        )));
    }
    Ok((size[0], size[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_flatten_merges_batch_and_sequence() {
        let xs = Tensor::randn([2, 3, 5], (Kind::Float, Device::Cpu));
        let rows = flatten_positions(&xs).unwrap();

        assert_eq!(rows.size(), vec![6, 5]);
    }

    #[test]
    fn test_flatten_is_row_major() {
        // Row b * seq_len + s must be position (b, s)
        let xs = Tensor::arange(2 * 3 * 4, (Kind::Float, Device::Cpu)).view([2, 3, 4]);
        let rows = flatten_positions(&xs).unwrap();

        for b in 0..2 {
            for s in 0..3 {
                assert!(rows.get(b * 3 + s).equal(&xs.get(b).get(s)));
            }
        }
    }

    #[test]
    fn test_unflatten_restores_original() {
        let xs = Tensor::randn([4, 7, 3], (Kind::Float, Device::Cpu));
        let rows = flatten_positions(&xs).unwrap();
        let back = unflatten_positions(&rows, &xs.size()).unwrap();

        assert_eq!(back.size(), xs.size());
        assert!(back.equal(&xs));
    }

    #[test]
    fn test_unflatten_rejects_wrong_element_count() {
        let rows = Tensor::zeros([6, 5], (Kind::Float, Device::Cpu));

        assert!(unflatten_positions(&rows, &[2, 4, 5]).is_err());
    }

    #[test]
    fn test_batch_and_len() {
        let xs = Tensor::zeros([2, 9, 1], (Kind::Float, Device::Cpu));
        assert_eq!(batch_and_len(&xs).unwrap(), (2, 9));

        let flat = Tensor::zeros([4], (Kind::Float, Device::Cpu));
        assert!(batch_and_len(&flat).is_err());
    }
}
