use crate::error::{ModelError, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{BasicOps, Tensor, TensorKind};

/// Cut a time-major tensor into consecutive windows of `time_batch_len`
/// steps along axis 0. A trailing remainder shorter than a window is
/// dropped.
pub fn split_time_batches<B, const D: usize, K>(
    tensor: Tensor<B, D, K>,
    time_batch_len: usize,
) -> Result<Vec<Tensor<B, D, K>>>
where
    B: Backend,
    K: TensorKind<B> + BasicOps<B>,
{
    if time_batch_len == 0 {
        return Err(ModelError::InvalidConfig(
            "time_batch_len must be positive".to_string(),
        ));
    }

    let total = tensor.dims()[0];
    let windows = total / time_batch_len;
    if windows * time_batch_len < total {
        tracing::debug!(
            total,
            time_batch_len,
            dropped = total - windows * time_batch_len,
            "dropping trailing partial time batch"
        );
    }

    Ok((0..windows)
        .map(|w| tensor.clone().narrow(0, w * time_batch_len, time_batch_len))
        .collect())
}

/// Input/target windows for next-step prediction on a piano roll
/// `[time, batch, dim]`: the target at step `t` is the frame at `t + 1`.
pub fn next_step_pairs<B: Backend>(
    roll: Tensor<B, 3>,
    time_batch_len: usize,
) -> Result<Vec<(Tensor<B, 3>, Tensor<B, 3>)>> {
    let [time, _, _] = roll.dims();
    if time < 2 {
        return Ok(Vec::new());
    }

    let inputs = roll.clone().narrow(0, 0, time - 1);
    let targets = roll.narrow(0, 1, time - 1);

    Ok(split_time_batches(inputs, time_batch_len)?
        .into_iter()
        .zip(split_time_batches(targets, time_batch_len)?)
        .collect())
}
