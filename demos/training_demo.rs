//! Training Demo - joint melody + harmony prediction
//!
//! Trains an LSTM on a handful of synthetic tunes with RMSProp, carrying
//! the recurrent state across time batches. Set `RUST_LOG=debug` to see
//! every step.

use anyhow::Result;
use burn::backend::{Autodiff, NdArray};
use nottingham_rnn::data::{split_time_batches, FrameEncoding, MELODY_RANGE, REST_CLASS};
use nottingham_rnn::prelude::*;
use rand::prelude::*;
use tracing_subscriber::EnvFilter;

const HARMONY_CLASSES: usize = 8;
const TIME_BATCH_LEN: usize = 16;

fn synthetic_tunes(rng: &mut StdRng, count: usize, len: usize) -> Vec<Vec<(usize, usize)>> {
    (0..count)
        .map(|_| {
            let mut melody = rng.gen_range(0..MELODY_RANGE - 1);
            let mut chord = rng.gen_range(0..HARMONY_CLASSES);
            (0..len)
                .map(|t| {
                    if t % 4 == 0 {
                        chord = rng.gen_range(0..HARMONY_CLASSES);
                    }
                    let step: i64 = rng.gen_range(-2..=2);
                    melody = (melody as i64 + step).clamp(0, (REST_CLASS - 1) as i64) as usize;
                    if rng.gen_bool(0.05) {
                        (REST_CLASS, chord)
                    } else {
                        (melody, chord)
                    }
                })
                .collect()
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("nottingham_rnn=info".parse()?),
        )
        .init();

    println!("=== Training Example ===\n");

    type Backend = Autodiff<NdArray<f32>>;
    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(42);

    let encoding = FrameEncoding::new(HARMONY_CLASSES)?;
    let config = ModelConfig::new(TIME_BATCH_LEN, encoding.joint_dim(), 64)
        .with_num_layers(2)
        .with_dropout_prob(0.8)
        .with_objective(encoding.joint_objective());

    let mut trainer = Trainer::<Backend>::from_config(&config, &device)?;
    trainer.assign_lr(5e-3)?;
    trainer.assign_lr_decay(0.9)?;
    trainer.assign_melody_coeff(0.5)?;

    // 4 * 16 steps after the one-step shift
    let tunes = synthetic_tunes(&mut rng, 8, 4 * TIME_BATCH_LEN + 1);
    let (inputs, targets) = encoding.joint_tensors::<Backend>(&tunes, &device)?;
    let input_batches = split_time_batches(inputs, TIME_BATCH_LEN)?;
    let target_batches = split_time_batches(targets, TIME_BATCH_LEN)?;

    for epoch in 1..=10 {
        let batches = input_batches
            .iter()
            .cloned()
            .zip(target_batches.iter().cloned().map(Targets::MelodyHarmony));
        let loss = trainer.run_sequence(batches)?;
        println!("Epoch {epoch:>2} | train_loss={loss:.4}");
    }

    println!("\n=== Training Example completed! ===");
    Ok(())
}
