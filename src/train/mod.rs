//! # Training
//!
//! [`Trainer`] runs RMSProp (`burn::optim::RmsPropConfig`) on an autodiff
//! backend. Learning rate, RMSProp decay and melody coefficient live in
//! [`Hyperparams`] and can be changed between steps.
//!
//! ```ignore
//! type Backend = Autodiff<NdArray<f32>>;
//!
//! let mut trainer = Trainer::<Backend>::from_config(&config, &device)?;
//! trainer.assign_lr(5e-3)?;
//! trainer.assign_lr_decay(0.9)?;
//!
//! let mut state = None;
//! for (inputs, targets) in time_batches {
//!     let step = trainer.train_step(inputs, targets, state)?;
//!     state = Some(step.final_state);
//! }
//! ```

pub mod hyperparams;
pub mod trainer;

pub use hyperparams::Hyperparams;
pub use trainer::{StepOutput, Trainer};
