//! Save and Load Example
//!
//! Writes a model and its config to a checkpoint directory and restores it.

use anyhow::Result;
use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use nottingham_rnn::prelude::*;

fn main() -> Result<()> {
    println!("=== Model Save/Load Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let config = ModelConfig::new(8, 88, 32).with_cell_type(CellType::Vanilla);
    let model = config.init::<Backend>(false, &device)?;

    let dir = std::env::temp_dir().join("nottingham_rnn_save_load");
    let checkpointer = Checkpointer::new(&dir)?;
    checkpointer.save(&model, &config, 1)?;
    println!("Saved checkpoint to {}", dir.display());

    let (restored, restored_config) = checkpointer.load::<Backend>(&device)?;
    println!("Restored model:");
    println!("  Cell:      {}", restored_config.cell_type);
    println!("  Objective: {}", restored_config.objective.name());

    let inputs = Tensor::<Backend, 3>::random([8, 1, 88], Distribution::Bernoulli(0.1), &device);
    let before = model.forward(inputs.clone(), None)?.logits;
    let after = restored.forward(inputs, None)?.logits;
    let diff: f32 = (before - after).abs().max().into_scalar();
    println!("  Max logit difference after reload: {diff:.5}");

    println!("\n=== Save/Load Example completed! ===");
    Ok(())
}
