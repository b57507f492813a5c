//! Turning sequences into time-major model inputs and targets.

pub mod batching;
pub mod nottingham;

pub use batching::{next_step_pairs, split_time_batches};
pub use nottingham::{FrameEncoding, MELODY_MAX, MELODY_MIN, MELODY_RANGE, REST_CLASS};
