//! Integration tests for saving and loading checkpoints

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use nottingham_rnn::prelude::*;
use std::path::PathBuf;

type Backend = NdArray<f32>;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nottingham_rnn_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_save_and_load_round_trip() {
    let device = Default::default();
    let dir = scratch_dir("round_trip");
    let config = ModelConfig::new(5, 8, 12)
        .with_num_layers(2)
        .with_cell_type(CellType::Vanilla)
        .with_objective(Objective::MelodyHarmony { melody_range: 3 });
    let model = config.init::<Backend>(false, &device).unwrap();

    let checkpointer = Checkpointer::new(&dir).unwrap();
    checkpointer.save(&model, &config, 3).unwrap();
    assert_eq!(checkpointer.latest_epoch().unwrap(), 3);

    let (loaded, loaded_config) = checkpointer.load::<Backend>(&device).unwrap();
    assert_eq!(loaded_config.objective, config.objective);
    assert_eq!(loaded_config.cell_type, CellType::Vanilla);
    assert_eq!(loaded.num_layers(), 2);

    let inputs = Tensor::<Backend, 3>::random([5, 2, 8], Distribution::Uniform(0.0, 1.0), &device);
    let before = model.forward(inputs.clone(), None).unwrap().logits;
    let after = loaded.forward(inputs, None).unwrap().logits;

    // The compact recorder stores half precision.
    let diff: f32 = (before - after).abs().max().into_scalar();
    assert!(diff < 1e-2, "restored logits differ by {diff}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_latest_epoch_tracks_last_save() {
    let device = Default::default();
    let dir = scratch_dir("latest");
    let config = ModelConfig::new(2, 4, 4);
    let model = config.init::<Backend>(false, &device).unwrap();

    let checkpointer = Checkpointer::new(&dir).unwrap();
    checkpointer.save(&model, &config, 1).unwrap();
    checkpointer.save(&model, &config, 2).unwrap();

    assert_eq!(checkpointer.latest_epoch().unwrap(), 2);
    assert!(checkpointer.load_epoch::<Backend>(&config, 1, &device).is_ok());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_loading_empty_directory_fails() {
    let device = Default::default();
    let dir = scratch_dir("empty");
    let checkpointer = Checkpointer::new(&dir).unwrap();

    assert!(checkpointer.load::<Backend>(&device).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
