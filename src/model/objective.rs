//! Loss and probability schemes for the three task variants.
//!
//! | Objective | Targets | Probabilities |
//! |-----------|---------|---------------|
//! | [`Objective::IndependentNotes`] | 0/1 piano roll `[T, B, D]` | `sigmoid(logits)` |
//! | [`Objective::MelodyHarmony`] | class pairs `[T, B, 2]` | two softmaxes, split at `melody_range` |
//! | [`Objective::Merged`] | classes `[T, B]` | one softmax |
//!
//! Every loss is summed over all steps and examples, then divided by
//! `time * batch`.

use crate::error::{ModelError, Result};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor};
use serde::{Deserialize, Serialize};

/// Default weight of the melody loss in [`Objective::MelodyHarmony`].
pub const DEFAULT_MELODY_COEFF: f64 = 0.5;

/// Which loss/probability scheme sits on top of the logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Multi-label note prediction: every logit is an independent sigmoid.
    #[default]
    IndependentNotes,
    /// Joint prediction of one melody class and one harmony class. The
    /// first `melody_range` logits belong to the melody softmax, the rest to
    /// the harmony softmax.
    MelodyHarmony { melody_range: usize },
    /// A single softmax over every logit.
    Merged,
}

/// Training targets, time-major.
#[derive(Debug, Clone)]
pub enum Targets<B: Backend> {
    /// `[time, batch, input_dim]` of 0.0 / 1.0.
    Notes(Tensor<B, 3>),
    /// `[time, batch, 2]` holding `(melody_class, harmony_class)`.
    MelodyHarmony(Tensor<B, 3, Int>),
    /// `[time, batch]` class indices.
    Classes(Tensor<B, 2, Int>),
}

impl<B: Backend> Targets<B> {
    fn kind(&self) -> &'static str {
        match self {
            Targets::Notes(_) => "note",
            Targets::MelodyHarmony(_) => "melody/harmony",
            Targets::Classes(_) => "class",
        }
    }

    /// Leading `[time, batch]` dimensions.
    fn time_batch(&self) -> [usize; 2] {
        match self {
            Targets::Notes(t) => {
                let [time, batch, _] = t.dims();
                [time, batch]
            }
            Targets::MelodyHarmony(t) => {
                let [time, batch, _] = t.dims();
                [time, batch]
            }
            Targets::Classes(t) => t.dims(),
        }
    }
}

impl Objective {
    pub fn name(&self) -> &'static str {
        match self {
            Objective::IndependentNotes => "independent_notes",
            Objective::MelodyHarmony { .. } => "melody_harmony",
            Objective::Merged => "merged",
        }
    }

    fn expected_targets(&self) -> &'static str {
        match self {
            Objective::IndependentNotes => "note",
            Objective::MelodyHarmony { .. } => "melody/harmony",
            Objective::Merged => "class",
        }
    }

    /// Check the objective against the logit width it will be applied to.
    pub fn validate(&self, input_dim: usize) -> Result<()> {
        if let Objective::MelodyHarmony { melody_range } = *self {
            if melody_range == 0 || melody_range >= input_dim {
                return Err(ModelError::InvalidConfig(format!(
                    "melody range {melody_range} must lie in 1..{input_dim}"
                )));
            }
        }
        Ok(())
    }

    /// Probabilities with the same shape as `logits` (`[time, batch, dim]`).
    ///
    /// Fails when a melody range does not fit inside the logit width.
    pub fn probs<B: Backend>(&self, logits: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
        self.validate(logits.dims()[2])?;

        let probs = match *self {
            Objective::IndependentNotes => activation::sigmoid(logits),
            Objective::MelodyHarmony { melody_range } => {
                let [time, batch, dim] = logits.dims();
                let melody = logits
                    .clone()
                    .slice([0..time, 0..batch, 0..melody_range]);
                let harmony = logits.slice([0..time, 0..batch, melody_range..dim]);
                Tensor::cat(
                    vec![activation::softmax(melody, 2), activation::softmax(harmony, 2)],
                    2,
                )
            }
            Objective::Merged => activation::softmax(logits, 2),
        };
        Ok(probs)
    }

    /// Confirm that `targets` match this objective and the logits' shape.
    pub fn validate_targets<B: Backend>(&self, targets: &Targets<B>, logits_dims: [usize; 3]) -> Result<()> {
        let [time, batch, dim] = logits_dims;
        if time == 0 || batch == 0 {
            return Err(ModelError::EmptyBatch { time, batch });
        }
        self.validate(dim)?;

        let expected: Vec<usize> = match (self, targets) {
            (Objective::IndependentNotes, Targets::Notes(t)) => {
                let actual = t.dims();
                if actual != logits_dims {
                    return Err(ModelError::shape("note targets", &logits_dims, &actual));
                }
                return Ok(());
            }
            (Objective::MelodyHarmony { .. }, Targets::MelodyHarmony(t)) => {
                let actual = t.dims();
                if actual != [time, batch, 2] {
                    return Err(ModelError::shape("melody/harmony targets", &[time, batch, 2], &actual));
                }
                vec![time, batch, 2]
            }
            (Objective::Merged, Targets::Classes(_)) => vec![time, batch],
            _ => {
                return Err(ModelError::TargetMismatch {
                    objective: self.name(),
                    expected: self.expected_targets(),
                    actual: targets.kind(),
                })
            }
        };

        if targets.time_batch() != [time, batch] {
            return Err(ModelError::shape("class targets", &expected, &targets.time_batch()));
        }

        match (*self, targets) {
            (Objective::MelodyHarmony { melody_range }, Targets::MelodyHarmony(t)) => {
                let melody = t.clone().slice([0..time, 0..batch, 0..1]);
                let harmony = t.clone().slice([0..time, 0..batch, 1..2]);
                check_class_range(melody, melody_range)?;
                check_class_range(harmony, dim - melody_range)
            }
            (Objective::Merged, Targets::Classes(t)) => check_class_range(t.clone(), dim),
            _ => Ok(()),
        }
    }

    /// Scalar loss (`[1]`), normalised by `time * batch`.
    ///
    /// `melody_coeff` weights the melody term of
    /// [`Objective::MelodyHarmony`] and is ignored by the other variants.
    /// It must lie in `[0, 1]` for every variant.
    pub fn loss<B: Backend>(
        &self,
        logits: Tensor<B, 3>,
        targets: Targets<B>,
        melody_coeff: f64,
    ) -> Result<Tensor<B, 1>> {
        if !(0.0..=1.0).contains(&melody_coeff) {
            return Err(ModelError::InvalidMelodyCoeff(melody_coeff));
        }
        let dims = logits.dims();
        self.validate_targets(&targets, dims)?;
        let [time, batch, dim] = dims;
        let rows = time * batch;

        let total = match (*self, targets) {
            (Objective::IndependentNotes, Targets::Notes(z)) => {
                sigmoid_cross_entropy_with_logits(logits, z).sum()
            }
            (Objective::MelodyHarmony { melody_range }, Targets::MelodyHarmony(t)) => {
                let flat = logits.reshape([rows, dim]);
                let pairs = t.reshape([rows, 2]);

                let melody_loss = sparse_softmax_cross_entropy(
                    flat.clone().slice([0..rows, 0..melody_range]),
                    pairs.clone().slice([0..rows, 0..1]).reshape([rows]),
                );
                let harmony_loss = sparse_softmax_cross_entropy(
                    flat.slice([0..rows, melody_range..dim]),
                    pairs.slice([0..rows, 1..2]).reshape([rows]),
                );

                (melody_loss * melody_coeff + harmony_loss * (1.0 - melody_coeff)).sum()
            }
            (Objective::Merged, Targets::Classes(t)) => {
                sparse_softmax_cross_entropy(logits.reshape([rows, dim]), t.reshape([rows])).sum()
            }
            // validate_targets rejects every other pairing
            (_, targets) => {
                return Err(ModelError::TargetMismatch {
                    objective: self.name(),
                    expected: self.expected_targets(),
                    actual: targets.kind(),
                })
            }
        };

        Ok(total / time as f64 / batch as f64)
    }
}

fn check_class_range<B: Backend, const D: usize>(classes: Tensor<B, D, Int>, num_classes: usize) -> Result<()> {
    let min: i64 = classes.clone().min().into_scalar().elem();
    let max: i64 = classes.max().into_scalar().elem();
    if min < 0 {
        return Err(ModelError::TargetOutOfRange {
            value: min,
            classes: num_classes,
        });
    }
    if max >= num_classes as i64 {
        return Err(ModelError::TargetOutOfRange {
            value: max,
            classes: num_classes,
        });
    }
    Ok(())
}

/// Element-wise `max(x, 0) - x * z + ln(1 + exp(-|x|))`.
pub fn sigmoid_cross_entropy_with_logits<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    targets: Tensor<B, D>,
) -> Tensor<B, D> {
    logits.clone().clamp_min(0.0) - logits.clone() * targets + logits.abs().neg().exp().log1p()
}

/// Per-row cross entropy of `logits` `[rows, classes]` against class
/// indices `[rows]`. Returns `[rows]`.
pub fn sparse_softmax_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let [rows] = targets.dims();
    let log_probs = activation::log_softmax(logits, 1);
    log_probs
        .gather(1, targets.reshape([rows, 1]))
        .reshape([rows])
        .neg()
}
