//! Basic usage of the sequence model
//!
//! Builds a two-layer LSTM over an 88-key piano roll, runs one time batch,
//! and carries the recurrent state into the next one.

use anyhow::Result;
use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use nottingham_rnn::prelude::*;

fn main() -> Result<()> {
    println!("=== Basic Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let config = ModelConfig::new(32, 88, 64)
        .with_num_layers(2)
        .with_cell_type(CellType::Lstm);
    let model = config.init::<Backend>(false, &device)?;

    println!("Created model:");
    println!("  Cell:           {}", model.cell_type());
    println!("  Layers:         {}", model.num_layers());
    println!("  Time batch len: {}", model.time_batch_len());
    println!();

    // Input shape: [time=32, batch=4, notes=88]
    let batch1 = Tensor::<Backend, 3>::random([32, 4, 88], Distribution::Bernoulli(0.05), &device);
    let batch2 = Tensor::<Backend, 3>::random([32, 4, 88], Distribution::Bernoulli(0.05), &device);

    let (probs, state) = model.predict(&config.objective, batch1, None)?;
    println!("Time batch 1:");
    println!("  Probabilities: {:?}", probs.dims());
    println!("  Flat state:    {:?}", state.flatten().dims());

    let (probs, _) = model.predict(&config.objective, batch2, Some(state))?;
    println!("Time batch 2 (carried state):");
    println!("  Probabilities: {:?}", probs.dims());
    println!();

    println!("=== Basic Example completed! ===");
    Ok(())
}
