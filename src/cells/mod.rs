//! # Recurrent Cells
//!
//! Single-timestep cells. The multi-layer stack in [`crate::rnn`] unrolls
//! them over a time-major batch.
//!
//! | Cell | State | Transition |
//! |------|-------|------------|
//! | [`BasicRnnCell`] | `h` | `h' = tanh(W_x x + W_h h + b)` |
//! | [`LSTMCell`] | `(h, c)` | gated, forget bias 1.0 |
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `input` | `[batch, input_size]` |
//! | `hidden` / `cell` | `[batch, hidden_size]` |
//! | `output` | `[batch, hidden_size]` |
//!
//! ## Example
//!
//! ```ignore
//! use nottingham_rnn::cells::{CellType, LayerState, RecurrentCell};
//!
//! let cell = RecurrentCell::<Backend>::new(CellType::Lstm, 16, 32, &device);
//! let state = LayerState::zeros(CellType::Lstm, batch, 32, &device);
//! let (output, state) = cell.forward(input, state);
//! ```

pub mod lstm_cell;
pub mod rnn_cell;

use std::fmt;
use std::str::FromStr;

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

pub use lstm_cell::LSTMCell;
pub use rnn_cell::BasicRnnCell;

/// Which recurrent unit a stack is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Vanilla,
    #[default]
    Lstm,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Vanilla => "vanilla",
            CellType::Lstm => "lstm",
        }
    }

    /// Width of one layer's state when flattened into a single tensor.
    pub fn state_size(&self, hidden_size: usize) -> usize {
        match self {
            CellType::Vanilla => hidden_size,
            CellType::Lstm => 2 * hidden_size,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that is not exactly `"vanilla"` selects an LSTM.
impl FromStr for CellType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "vanilla" {
            Ok(CellType::Vanilla)
        } else {
            Ok(CellType::Lstm)
        }
    }
}

/// Recurrent state of one layer.
#[derive(Debug, Clone)]
pub struct LayerState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    /// Memory cell; `None` for vanilla layers.
    pub cell: Option<Tensor<B, 2>>,
}

impl<B: Backend> LayerState<B> {
    pub fn zeros(
        cell_type: CellType,
        batch_size: usize,
        hidden_size: usize,
        device: &B::Device,
    ) -> Self {
        let hidden = Tensor::zeros([batch_size, hidden_size], device);
        let cell = match cell_type {
            CellType::Vanilla => None,
            CellType::Lstm => Some(Tensor::zeros([batch_size, hidden_size], device)),
        };
        Self { hidden, cell }
    }

    pub fn batch_size(&self) -> usize {
        self.hidden.dims()[0]
    }

    pub fn state_size(&self) -> usize {
        let hidden = self.hidden.dims()[1];
        match self.cell {
            Some(_) => 2 * hidden,
            None => hidden,
        }
    }

    pub fn detach(self) -> Self {
        Self {
            hidden: self.hidden.detach(),
            cell: self.cell.map(|c| c.detach()),
        }
    }
}

/// A single recurrent layer of either kind.
#[derive(Module, Debug)]
pub enum RecurrentCell<B: Backend> {
    Vanilla(BasicRnnCell<B>),
    Lstm(LSTMCell<B>),
}

impl<B: Backend> RecurrentCell<B> {
    pub fn new(
        cell_type: CellType,
        input_size: usize,
        hidden_size: usize,
        device: &B::Device,
    ) -> Self {
        match cell_type {
            CellType::Vanilla => {
                RecurrentCell::Vanilla(BasicRnnCell::new(input_size, hidden_size, device))
            }
            CellType::Lstm => RecurrentCell::Lstm(LSTMCell::new(input_size, hidden_size, device)),
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            RecurrentCell::Vanilla(_) => CellType::Vanilla,
            RecurrentCell::Lstm(_) => CellType::Lstm,
        }
    }

    pub fn input_size(&self) -> usize {
        match self {
            RecurrentCell::Vanilla(cell) => cell.input_size(),
            RecurrentCell::Lstm(cell) => cell.input_size(),
        }
    }

    pub fn hidden_size(&self) -> usize {
        match self {
            RecurrentCell::Vanilla(cell) => cell.hidden_size(),
            RecurrentCell::Lstm(cell) => cell.hidden_size(),
        }
    }

    /// One timestep. Returns `(output, new_state)`; the output is the new
    /// hidden state for both cell kinds.
    ///
    /// An LSTM handed a state without a memory cell starts from a zero cell.
    pub fn forward(&self, input: Tensor<B, 2>, state: LayerState<B>) -> (Tensor<B, 2>, LayerState<B>) {
        match self {
            RecurrentCell::Vanilla(cell) => {
                let hidden = cell.forward(input, state.hidden);
                (hidden.clone(), LayerState { hidden, cell: None })
            }
            RecurrentCell::Lstm(cell) => {
                let memory = state
                    .cell
                    .unwrap_or_else(|| state.hidden.zeros_like());
                let (hidden, memory) = cell.forward(input, (state.hidden, memory));
                (
                    hidden.clone(),
                    LayerState {
                        hidden,
                        cell: Some(memory),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_cell_type_parsing_falls_back_to_lstm() {
        assert_eq!("vanilla".parse::<CellType>().unwrap(), CellType::Vanilla);
        assert_eq!("lstm".parse::<CellType>().unwrap(), CellType::Lstm);
        assert_eq!("gru".parse::<CellType>().unwrap(), CellType::Lstm);
        assert_eq!("Vanilla".parse::<CellType>().unwrap(), CellType::Lstm);
    }

    #[test]
    fn test_cell_type_serde_names() {
        let json = serde_json::to_string(&CellType::Vanilla).unwrap();
        assert_eq!(json, "\"vanilla\"");
        let back: CellType = serde_json::from_str("\"lstm\"").unwrap();
        assert_eq!(back, CellType::Lstm);
    }

    #[test]
    fn test_zero_state_layout() {
        let device = Default::default();
        let vanilla = LayerState::<TestBackend>::zeros(CellType::Vanilla, 3, 7, &device);
        let lstm = LayerState::<TestBackend>::zeros(CellType::Lstm, 3, 7, &device);

        assert!(vanilla.cell.is_none());
        assert_eq!(vanilla.state_size(), 7);
        assert_eq!(lstm.state_size(), 14);
        assert_eq!(lstm.batch_size(), 3);
    }

    #[test]
    fn test_recurrent_cell_dispatch() {
        let device = Default::default();
        for cell_type in [CellType::Vanilla, CellType::Lstm] {
            let cell = RecurrentCell::<TestBackend>::new(cell_type, 5, 9, &device);
            assert_eq!(cell.cell_type(), cell_type);
            assert_eq!(cell.input_size(), 5);
            assert_eq!(cell.hidden_size(), 9);

            let input = Tensor::<TestBackend, 2>::ones([2, 5], &device);
            let state = LayerState::zeros(cell_type, 2, 9, &device);
            let (output, state) = cell.forward(input, state);

            assert_eq!(output.dims(), [2, 9]);
            assert_eq!(state.state_size(), cell_type.state_size(9));
        }
    }
}
