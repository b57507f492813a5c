//! # Multi-layer Recurrent Stacks
//!
//! [`MultiRnnCell`] stacks [`RecurrentCell`](crate::cells::RecurrentCell)s
//! and unrolls them over a **time-major** batch.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | input | `[time, batch, input_dim]` |
//! | output | `[time, batch, hidden_size]` |
//! | flattened state | `[batch, num_layers * state_size]` |
//!
//! `state_size` is `hidden_size` for vanilla layers and `2 * hidden_size`
//! for LSTM layers (memory cell followed by hidden state).
//!
//! ## Stateful Processing
//!
//! A long piece is cut into fixed-length time batches; the final state of
//! one batch seeds the next:
//!
//! ```ignore
//! let stack = MultiRnnCell::<Backend>::new(CellType::Lstm, 88, 200, 2, &device);
//!
//! let (out1, state) = stack.unroll(batch1, None)?;
//! let (out2, state) = stack.unroll(batch2, Some(state))?;
//! ```
//!
//! ## Output Dropout
//!
//! ```ignore
//! let stack = MultiRnnCell::<Backend>::new(CellType::Lstm, 88, 200, 2, &device)
//!     .with_output_dropout(0.5); // keep probability
//! ```

pub mod multi;

pub use multi::{MultiRnnCell, StackState};
