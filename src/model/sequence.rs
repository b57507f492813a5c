use crate::cells::CellType;
use crate::error::{ModelError, Result};
use crate::model::objective::{Objective, Targets};
use crate::rnn::{MultiRnnCell, StackState};
use burn::module::Module;
use burn::nn::Linear;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Logits and final recurrent state of one time batch.
#[derive(Debug, Clone)]
pub struct ModelOutput<B: Backend> {
    /// `[time, batch, input_dim]`
    pub logits: Tensor<B, 3>,
    pub final_state: StackState<B>,
}

/// Recurrent stack followed by a shared affine read-out at every step.
///
/// Build it through [`ModelConfig::init`](crate::model::ModelConfig::init).
#[derive(Module, Debug)]
pub struct SequenceModel<B: Backend> {
    cell: MultiRnnCell<B>,
    output: Linear<B>,
    time_batch_len: usize,
}

impl<B: Backend> SequenceModel<B> {
    pub(crate) fn from_parts(cell: MultiRnnCell<B>, output: Linear<B>, time_batch_len: usize) -> Self {
        Self {
            cell,
            output,
            time_batch_len,
        }
    }

    pub fn time_batch_len(&self) -> usize {
        self.time_batch_len
    }

    pub fn input_dim(&self) -> usize {
        self.cell.input_dim()
    }

    pub fn hidden_size(&self) -> usize {
        self.cell.hidden_size()
    }

    pub fn num_layers(&self) -> usize {
        self.cell.num_layers()
    }

    pub fn cell_type(&self) -> CellType {
        self.cell.cell_type()
    }

    pub fn has_output_dropout(&self) -> bool {
        self.cell.has_output_dropout()
    }

    /// All-zero initial state for `batch_size` sequences.
    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> StackState<B> {
        self.cell.zero_state(batch_size, device)
    }

    /// Run one time batch.
    ///
    /// # Arguments
    /// * `inputs` - `[time_batch_len, batch, input_dim]`
    /// * `initial_state` - zero state when `None`
    pub fn forward(
        &self,
        inputs: Tensor<B, 3>,
        initial_state: Option<StackState<B>>,
    ) -> Result<ModelOutput<B>> {
        let [time, batch, dim] = inputs.dims();
        if time != self.time_batch_len || dim != self.input_dim() {
            return Err(ModelError::shape(
                "model input",
                &[self.time_batch_len, batch, self.input_dim()],
                &[time, batch, dim],
            ));
        }

        let (outputs, final_state) = self.cell.unroll(inputs, initial_state)?;

        // One matmul over every (time, batch) row.
        let hidden = self.hidden_size();
        let flat = outputs.reshape([time * batch, hidden]);
        let logits = self.output.forward(flat).reshape([time, batch, dim]);

        Ok(ModelOutput {
            logits,
            final_state,
        })
    }

    /// Forward pass followed by the objective's probabilities.
    pub fn predict(
        &self,
        objective: &Objective,
        inputs: Tensor<B, 3>,
        initial_state: Option<StackState<B>>,
    ) -> Result<(Tensor<B, 3>, StackState<B>)> {
        objective.validate(self.input_dim())?;
        let ModelOutput {
            logits,
            final_state,
        } = self.forward(inputs, initial_state)?;
        Ok((objective.probs(logits)?, final_state))
    }

    /// Forward pass followed by the objective's loss.
    pub fn forward_loss(
        &self,
        objective: &Objective,
        inputs: Tensor<B, 3>,
        targets: Targets<B>,
        initial_state: Option<StackState<B>>,
        melody_coeff: f64,
    ) -> Result<(Tensor<B, 1>, ModelOutput<B>)> {
        objective.validate(self.input_dim())?;
        let output = self.forward(inputs, initial_state)?;
        let loss = objective.loss(output.logits.clone(), targets, melody_coeff)?;
        Ok((loss, output))
    }
}
