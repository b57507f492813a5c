//! Multi-layer recurrent stack unrolled over time-major batches.

use crate::cells::{CellType, LayerState, RecurrentCell};
use crate::error::{ModelError, Result};
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Recurrent state of a whole stack, one [`LayerState`] per layer.
#[derive(Debug, Clone)]
pub struct StackState<B: Backend> {
    pub layers: Vec<LayerState<B>>,
}

impl<B: Backend> StackState<B> {
    pub fn zeros(
        cell_type: CellType,
        batch_size: usize,
        hidden_size: usize,
        num_layers: usize,
        device: &B::Device,
    ) -> Self {
        let layers = (0..num_layers)
            .map(|_| LayerState::zeros(cell_type, batch_size, hidden_size, device))
            .collect();
        Self { layers }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn batch_size(&self) -> usize {
        self.layers.first().map(|l| l.batch_size()).unwrap_or(0)
    }

    /// Total width of the flattened state.
    pub fn state_size(&self) -> usize {
        self.layers.iter().map(|l| l.state_size()).sum()
    }

    /// Concatenate every layer into `[batch, state_size]`.
    ///
    /// Per layer the memory cell (if any) comes before the hidden state.
    pub fn flatten(&self) -> Tensor<B, 2> {
        let mut parts = Vec::with_capacity(self.layers.len() * 2);
        for layer in &self.layers {
            if let Some(cell) = &layer.cell {
                parts.push(cell.clone());
            }
            parts.push(layer.hidden.clone());
        }
        Tensor::cat(parts, 1)
    }

    /// Inverse of [`StackState::flatten`].
    pub fn from_flat(
        flat: Tensor<B, 2>,
        cell_type: CellType,
        hidden_size: usize,
        num_layers: usize,
    ) -> Result<Self> {
        let [batch_size, width] = flat.dims();
        let expected = cell_type.state_size(hidden_size) * num_layers;
        if width != expected {
            return Err(ModelError::shape(
                "flattened state",
                &[batch_size, expected],
                &[batch_size, width],
            ));
        }

        let take = |offset: usize| {
            flat.clone()
                .slice([0..batch_size, offset..offset + hidden_size])
        };

        let mut layers = Vec::with_capacity(num_layers);
        let mut offset = 0;
        for _ in 0..num_layers {
            let layer = match cell_type {
                CellType::Vanilla => LayerState {
                    hidden: take(offset),
                    cell: None,
                },
                CellType::Lstm => LayerState {
                    cell: Some(take(offset)),
                    hidden: take(offset + hidden_size),
                },
            };
            offset += cell_type.state_size(hidden_size);
            layers.push(layer);
        }
        Ok(Self { layers })
    }

    /// Drop autodiff history so the state can seed the next time batch.
    pub fn detach(self) -> Self {
        Self {
            layers: self.layers.into_iter().map(LayerState::detach).collect(),
        }
    }
}

/// Stack of recurrent cells with optional dropout on the stack output.
///
/// Layer 0 maps `input_dim -> hidden_size`, every later layer maps
/// `hidden_size -> hidden_size`.
#[derive(Module, Debug)]
pub struct MultiRnnCell<B: Backend> {
    layers: Vec<RecurrentCell<B>>,
    output_dropout: Option<Dropout>,
    input_dim: usize,
    hidden_size: usize,
    keep_prob: f64,
}

impl<B: Backend> MultiRnnCell<B> {
    pub fn new(
        cell_type: CellType,
        input_dim: usize,
        hidden_size: usize,
        num_layers: usize,
        device: &B::Device,
    ) -> Self {
        let layers = (0..num_layers)
            .map(|i| {
                let input_size = if i == 0 { input_dim } else { hidden_size };
                RecurrentCell::new(cell_type, input_size, hidden_size, device)
            })
            .collect();

        Self {
            layers,
            output_dropout: None,
            input_dim,
            hidden_size,
            keep_prob: 1.0,
        }
    }

    /// Apply dropout to the stack output, keeping each unit with
    /// probability `keep_prob`. A keep probability of 1.0 removes it.
    ///
    /// Dropout only fires on autodiff backends.
    pub fn with_output_dropout(mut self, keep_prob: f64) -> Self {
        self.keep_prob = keep_prob;
        self.output_dropout = if keep_prob < 1.0 {
            Some(DropoutConfig::new(1.0 - keep_prob).init())
        } else {
            None
        };
        self
    }

    pub fn cell_type(&self) -> CellType {
        self.layers
            .first()
            .map(|l| l.cell_type())
            .unwrap_or_default()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn keep_prob(&self) -> f64 {
        self.keep_prob
    }

    pub fn has_output_dropout(&self) -> bool {
        self.output_dropout.is_some()
    }

    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> StackState<B> {
        StackState::zeros(
            self.cell_type(),
            batch_size,
            self.hidden_size,
            self.layers.len(),
            device,
        )
    }

    /// Advance every layer by one timestep.
    ///
    /// `input`: `[batch, input_dim]`. Returns the top layer's output
    /// `[batch, hidden_size]` (after dropout) and the new state.
    pub fn step(&self, input: Tensor<B, 2>, state: StackState<B>) -> (Tensor<B, 2>, StackState<B>) {
        let mut next = Vec::with_capacity(self.layers.len());
        let mut x = input;

        for (layer, layer_state) in self.layers.iter().zip(state.layers) {
            let (output, new_state) = layer.forward(x, layer_state);
            next.push(new_state);
            x = output;
        }

        if let Some(dropout) = &self.output_dropout {
            x = dropout.forward(x);
        }

        (x, StackState { layers: next })
    }

    /// Unroll over a time-major sequence.
    ///
    /// # Arguments
    /// * `inputs` - `[time, batch, input_dim]`
    /// * `initial_state` - zero state when `None`
    ///
    /// # Returns
    /// `([time, batch, hidden_size], final_state)`
    pub fn unroll(
        &self,
        inputs: Tensor<B, 3>,
        initial_state: Option<StackState<B>>,
    ) -> Result<(Tensor<B, 3>, StackState<B>)> {
        let [seq_len, batch_size, features] = inputs.dims();
        if seq_len == 0 || features != self.input_dim {
            return Err(ModelError::shape(
                "unroll input",
                &[seq_len, batch_size, self.input_dim],
                &[seq_len, batch_size, features],
            ));
        }

        let device = inputs.device();
        let mut state = match initial_state {
            Some(state) => {
                self.check_state(&state, batch_size)?;
                state
            }
            None => self.zero_state(batch_size, &device),
        };

        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            // inputs[t] -> [batch, features]
            let step_input = inputs
                .clone()
                .slice([t..t + 1, 0..batch_size, 0..features])
                .reshape([batch_size, features]);

            let (output, new_state) = self.step(step_input, state);
            state = new_state;
            outputs.push(output);
        }

        let outputs: Tensor<B, 3> = Tensor::stack(outputs, 0);
        Ok((outputs, state))
    }

    fn check_state(&self, state: &StackState<B>, batch_size: usize) -> Result<()> {
        let expected = self.cell_type().state_size(self.hidden_size) * self.layers.len();
        let actual = state.state_size();
        if state.num_layers() != self.layers.len()
            || actual != expected
            || state.batch_size() != batch_size
        {
            return Err(ModelError::shape(
                "initial state",
                &[batch_size, expected],
                &[state.batch_size(), actual],
            ));
        }

        let width = [batch_size, self.hidden_size];
        for layer in &state.layers {
            let hidden = layer.hidden.dims();
            if hidden != width {
                return Err(ModelError::shape("initial hidden state", &width, &hidden));
            }
            match (self.cell_type(), &layer.cell) {
                (CellType::Lstm, Some(cell)) => {
                    let cell = cell.dims();
                    if cell != width {
                        return Err(ModelError::shape("initial cell state", &width, &cell));
                    }
                }
                (CellType::Vanilla, None) => {}
                (_, cell) => {
                    let actual = if cell.is_some() { 2 * hidden[1] } else { hidden[1] };
                    return Err(ModelError::shape(
                        "initial layer state",
                        &[batch_size, self.cell_type().state_size(self.hidden_size)],
                        &[batch_size, actual],
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_stack_layer_sizes() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Lstm, 20, 32, 3, &device);

        assert_eq!(stack.num_layers(), 3);
        assert_eq!(stack.input_dim(), 20);
        assert_eq!(stack.hidden_size(), 32);
        assert!(!stack.has_output_dropout());
    }

    #[test]
    fn test_unroll_time_major_shapes() {
        let device = Default::default();
        for cell_type in [CellType::Vanilla, CellType::Lstm] {
            let stack = MultiRnnCell::<TestBackend>::new(cell_type, 10, 16, 2, &device);
            let inputs = Tensor::<TestBackend, 3>::zeros([7, 4, 10], &device);

            let (outputs, state) = stack.unroll(inputs, None).unwrap();

            assert_eq!(outputs.dims(), [7, 4, 16]);
            assert_eq!(state.num_layers(), 2);
            assert_eq!(state.batch_size(), 4);
            assert_eq!(state.state_size(), 2 * cell_type.state_size(16));
        }
    }

    #[test]
    fn test_unroll_rejects_wrong_feature_width() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Vanilla, 10, 16, 1, &device);
        let inputs = Tensor::<TestBackend, 3>::zeros([3, 2, 11], &device);

        assert!(matches!(
            stack.unroll(inputs, None),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unroll_rejects_mismatched_state() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Lstm, 4, 8, 2, &device);
        let inputs = Tensor::<TestBackend, 3>::zeros([3, 2, 4], &device);
        let wrong_batch = stack.zero_state(5, &device);

        assert!(stack.unroll(inputs, Some(wrong_batch)).is_err());
    }

    #[test]
    fn test_unroll_rejects_uneven_layer_widths() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Lstm, 4, 8, 2, &device);
        let inputs = Tensor::<TestBackend, 3>::zeros([3, 2, 4], &device);

        // Total width matches (2 * 7 + 2 * 9 == 2 * 2 * 8) but neither layer does.
        let uneven = StackState {
            layers: vec![
                LayerState::zeros(CellType::Lstm, 2, 7, &device),
                LayerState::zeros(CellType::Lstm, 2, 9, &device),
            ],
        };
        assert!(matches!(
            stack.unroll(inputs.clone(), Some(uneven)),
            Err(ModelError::ShapeMismatch { .. })
        ));

        // An LSTM stack handed vanilla-shaped layers of twice the width.
        let missing_cell = StackState {
            layers: vec![
                LayerState::zeros(CellType::Vanilla, 2, 16, &device),
                LayerState::zeros(CellType::Vanilla, 2, 16, &device),
            ],
        };
        assert!(matches!(
            stack.unroll(inputs, Some(missing_cell)),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_split_unroll_matches_single_unroll() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Lstm, 6, 12, 2, &device);
        let inputs =
            Tensor::<TestBackend, 3>::random([8, 3, 6], Distribution::Uniform(-1.0, 1.0), &device);

        let (full, full_state) = stack.unroll(inputs.clone(), None).unwrap();

        let first = inputs.clone().slice([0..4, 0..3, 0..6]);
        let second = inputs.slice([4..8, 0..3, 0..6]);
        let (_, mid_state) = stack.unroll(first, None).unwrap();
        let (tail, end_state) = stack.unroll(second, Some(mid_state)).unwrap();

        let tail_diff: f32 = (full.slice([4..8, 0..3, 0..12]) - tail)
            .abs()
            .max()
            .into_scalar();
        let state_diff: f32 = (full_state.flatten() - end_state.flatten())
            .abs()
            .max()
            .into_scalar();
        assert!(tail_diff < 1e-5);
        assert!(state_diff < 1e-5);
    }

    #[test]
    fn test_flatten_round_trip_layout() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Lstm, 3, 4, 2, &device);
        let inputs =
            Tensor::<TestBackend, 3>::random([2, 1, 3], Distribution::Uniform(-1.0, 1.0), &device);
        let (_, state) = stack.unroll(inputs, None).unwrap();

        let flat = state.flatten();
        assert_eq!(flat.dims(), [1, 16]);

        // First layer: cell then hidden.
        let first_cell = flat.clone().slice([0..1, 0..4]);
        let cell_diff: f32 = (first_cell - state.layers[0].cell.clone().unwrap())
            .abs()
            .sum()
            .into_scalar();
        assert!(cell_diff < 1e-6);

        let rebuilt = StackState::from_flat(flat.clone(), CellType::Lstm, 4, 2).unwrap();
        let diff: f32 = (rebuilt.flatten() - flat).abs().sum().into_scalar();
        assert!(diff < 1e-6);

        let bad = Tensor::<TestBackend, 2>::zeros([1, 15], &device);
        assert!(StackState::from_flat(bad, CellType::Lstm, 4, 2).is_err());
    }

    #[test]
    fn test_keep_prob_of_one_has_no_dropout() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Vanilla, 3, 4, 1, &device)
            .with_output_dropout(1.0);
        assert!(!stack.has_output_dropout());

        let stack = stack.with_output_dropout(0.5);
        assert!(stack.has_output_dropout());
        assert_eq!(stack.keep_prob(), 0.5);
    }

    #[test]
    fn test_dropout_inactive_without_autodiff() {
        let device = Default::default();
        let stack = MultiRnnCell::<TestBackend>::new(CellType::Vanilla, 3, 4, 1, &device)
            .with_output_dropout(0.1);
        let inputs = Tensor::<TestBackend, 3>::ones([2, 2, 3], &device);

        let (a, _) = stack.unroll(inputs.clone(), None).unwrap();
        let (b, _) = stack.unroll(inputs, None).unwrap();

        let diff: f32 = (a - b).abs().sum().into_scalar();
        assert_eq!(diff, 0.0);
    }
}
