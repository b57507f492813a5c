//! # nottingham-rnn
//!
//! Recurrent sequence models for polyphonic music (for example the
//! Nottingham folk-tune set) built on the Burn framework.
//!
//! ## Features
//!
//! - **Cells**: vanilla RNN and LSTM (forget bias 1.0)
//! - **Stacks**: multi-layer cells with output dropout, unrolled over
//!   time-major batches `[time, batch, features]`
//! - **Objectives**: independent sigmoid notes, joint melody + harmony
//!   softmaxes, or one merged softmax
//! - **Training**: RMSProp with adjustable learning rate, decay and melody
//!   coefficient; recurrent state carried across time batches
//! - **Checkpoints**: compact records plus a JSON config
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use nottingham_rnn::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let config = ModelConfig::new(16, 88, 32).with_num_layers(2);
//! let model = config.init::<Backend>(false, &device).unwrap();
//!
//! let inputs = Tensor::<Backend, 3>::zeros([16, 4, 88], &device);
//! let output = model.forward(inputs, None).unwrap();
//! assert_eq!(output.logits.dims(), [16, 4, 88]);
//!
//! let probs = config.objective.probs(output.logits).unwrap();
//! assert_eq!(probs.dims(), [16, 4, 88]);
//! ```

pub mod cells;
pub mod checkpoint;
pub mod data;
pub mod error;
pub mod model;
pub mod rnn;
pub mod train;

pub use error::{ModelError, Result};

pub mod prelude {
    pub use crate::cells::{BasicRnnCell, CellType, LSTMCell, LayerState, RecurrentCell};
    pub use crate::checkpoint::Checkpointer;
    pub use crate::data::FrameEncoding;
    pub use crate::error::ModelError;
    pub use crate::model::{ModelConfig, ModelOutput, Objective, SequenceModel, Targets};
    pub use crate::rnn::{MultiRnnCell, StackState};
    pub use crate::train::{Hyperparams, StepOutput, Trainer};
}
