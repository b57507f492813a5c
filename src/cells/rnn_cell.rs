use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Vanilla (Elman) recurrent cell: `h' = tanh(W_x x + W_h h + b)`.
///
/// The output of the cell is its new hidden state.
#[derive(Module, Debug)]
pub struct BasicRnnCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    input_map: Linear<B>,
    recurrent_map: Linear<B>,
}

impl<B: Backend> BasicRnnCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let input_map = LinearConfig::new(input_size, hidden_size)
            .with_bias(true)
            .init(device);
        let recurrent_map = LinearConfig::new(hidden_size, hidden_size)
            .with_bias(false)
            .init(device);

        Self {
            input_size,
            hidden_size,
            input_map,
            recurrent_map,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// `input`: `[batch, input_size]`, `hidden`: `[batch, hidden_size]`.
    pub fn forward(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        (self.input_map.forward(input) + self.recurrent_map.forward(hidden)).tanh()
    }
}
