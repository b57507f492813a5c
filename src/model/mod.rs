//! # Sequence Models
//!
//! A [`SequenceModel`] is a [`MultiRnnCell`](crate::rnn::MultiRnnCell)
//! unrolled over `time_batch_len` steps with an affine read-out
//! `hidden_size -> input_dim` applied at every step. The [`Objective`]
//! decides how logits become probabilities and losses.
//!
//! ```ignore
//! use nottingham_rnn::prelude::*;
//!
//! let config = ModelConfig::new(128, 88, 200)
//!     .with_num_layers(2)
//!     .with_dropout_prob(0.5)
//!     .with_cell_type(CellType::Lstm);
//! let model = config.init::<Backend>(false, &device)?;
//!
//! let output = model.forward(inputs, None)?; // inputs: [128, batch, 88]
//! let probs = config.objective.probs(output.logits)?;
//! ```

pub mod config;
pub mod objective;
pub mod sequence;

pub use config::ModelConfig;
pub use objective::{Objective, Targets, DEFAULT_MELODY_COEFF};
pub use sequence::{ModelOutput, SequenceModel};
