//! Frame encodings for melody + harmony data such as the Nottingham set.
//!
//! Each timestep carries one melody class and one harmony (chord) class.
//! Melody classes cover MIDI pitches `MELODY_MIN..=MELODY_MAX` followed by
//! a rest class.

use crate::error::{ModelError, Result};
use crate::model::Objective;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};

pub const MELODY_MIN: u8 = 55;
pub const MELODY_MAX: u8 = 88;
/// Pitches in range plus one rest class.
pub const MELODY_RANGE: usize = (MELODY_MAX - MELODY_MIN) as usize + 2;
pub const REST_CLASS: usize = MELODY_RANGE - 1;

/// Melody class of a MIDI pitch, `None` meaning a rest.
pub fn melody_class(pitch: Option<u8>) -> Result<usize> {
    match pitch {
        None => Ok(REST_CLASS),
        Some(p) if (MELODY_MIN..=MELODY_MAX).contains(&p) => Ok((p - MELODY_MIN) as usize),
        Some(p) => Err(ModelError::TargetOutOfRange {
            value: p as i64,
            classes: MELODY_RANGE,
        }),
    }
}

/// Inverse of [`melody_class`].
pub fn melody_pitch(class: usize) -> Option<u8> {
    if class < REST_CLASS {
        Some(MELODY_MIN + class as u8)
    } else {
        None
    }
}

/// Maps `(melody, harmony)` frames to model inputs and targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoding {
    harmony_classes: usize,
}

impl FrameEncoding {
    pub fn new(harmony_classes: usize) -> Result<Self> {
        if harmony_classes == 0 {
            return Err(ModelError::InvalidConfig(
                "at least one harmony class is required".to_string(),
            ));
        }
        Ok(Self { harmony_classes })
    }

    pub fn harmony_classes(&self) -> usize {
        self.harmony_classes
    }

    /// Input width of the two-hot joint encoding.
    pub fn joint_dim(&self) -> usize {
        MELODY_RANGE + self.harmony_classes
    }

    /// Number of classes of the merged encoding.
    pub fn merged_dim(&self) -> usize {
        MELODY_RANGE * self.harmony_classes
    }

    pub fn joint_objective(&self) -> Objective {
        Objective::MelodyHarmony {
            melody_range: MELODY_RANGE,
        }
    }

    pub fn merged_class(&self, melody: usize, harmony: usize) -> Result<usize> {
        self.check(melody, harmony)?;
        Ok(melody * self.harmony_classes + harmony)
    }

    pub fn split_merged(&self, class: usize) -> Result<(usize, usize)> {
        if class >= self.merged_dim() {
            return Err(ModelError::TargetOutOfRange {
                value: class as i64,
                classes: self.merged_dim(),
            });
        }
        Ok((class / self.harmony_classes, class % self.harmony_classes))
    }

    fn check(&self, melody: usize, harmony: usize) -> Result<()> {
        if melody >= MELODY_RANGE {
            return Err(ModelError::TargetOutOfRange {
                value: melody as i64,
                classes: MELODY_RANGE,
            });
        }
        if harmony >= self.harmony_classes {
            return Err(ModelError::TargetOutOfRange {
                value: harmony as i64,
                classes: self.harmony_classes,
            });
        }
        Ok(())
    }

    /// Two-hot inputs `[T - 1, B, joint_dim]` and class-pair targets
    /// `[T - 1, B, 2]` for next-step prediction.
    ///
    /// `sequences` holds `B` sequences of equal length `T >= 2`.
    pub fn joint_tensors<B: Backend>(
        &self,
        sequences: &[Vec<(usize, usize)>],
        device: &B::Device,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 3, Int>)> {
        let (time, batch) = self.sequence_dims(sequences)?;
        let dim = self.joint_dim();
        let steps = time - 1;

        let mut inputs = vec![0.0f32; steps * batch * dim];
        let mut targets = vec![0i64; steps * batch * 2];
        for (b, seq) in sequences.iter().enumerate() {
            for t in 0..steps {
                let (melody, harmony) = seq[t];
                self.check(melody, harmony)?;
                let row = (t * batch + b) * dim;
                inputs[row + melody] = 1.0;
                inputs[row + MELODY_RANGE + harmony] = 1.0;

                let (next_melody, next_harmony) = seq[t + 1];
                self.check(next_melody, next_harmony)?;
                let pair = (t * batch + b) * 2;
                targets[pair] = next_melody as i64;
                targets[pair + 1] = next_harmony as i64;
            }
        }

        Ok((
            Tensor::from_data(TensorData::new(inputs, [steps, batch, dim]), device),
            Tensor::from_data(TensorData::new(targets, [steps, batch, 2]), device),
        ))
    }

    /// One-hot merged inputs `[T - 1, B, merged_dim]` and merged class
    /// targets `[T - 1, B]` for next-step prediction.
    pub fn merged_tensors<B: Backend>(
        &self,
        sequences: &[Vec<(usize, usize)>],
        device: &B::Device,
    ) -> Result<(Tensor<B, 3>, Tensor<B, 2, Int>)> {
        let (time, batch) = self.sequence_dims(sequences)?;
        let dim = self.merged_dim();
        let steps = time - 1;

        let mut inputs = vec![0.0f32; steps * batch * dim];
        let mut targets = vec![0i64; steps * batch];
        for (b, seq) in sequences.iter().enumerate() {
            for t in 0..steps {
                let (melody, harmony) = seq[t];
                inputs[(t * batch + b) * dim + self.merged_class(melody, harmony)?] = 1.0;

                let (next_melody, next_harmony) = seq[t + 1];
                targets[t * batch + b] = self.merged_class(next_melody, next_harmony)? as i64;
            }
        }

        Ok((
            Tensor::from_data(TensorData::new(inputs, [steps, batch, dim]), device),
            Tensor::from_data(TensorData::new(targets, [steps, batch]), device),
        ))
    }

    fn sequence_dims(&self, sequences: &[Vec<(usize, usize)>]) -> Result<(usize, usize)> {
        let time = sequences.first().map(Vec::len).unwrap_or(0);
        if time < 2 {
            return Err(ModelError::InvalidConfig(
                "need at least one sequence of two or more frames".to_string(),
            ));
        }
        if let Some(bad) = sequences.iter().find(|s| s.len() != time) {
            return Err(ModelError::shape(
                "sequence length",
                &[time],
                &[bad.len()],
            ));
        }
        Ok((time, sequences.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_melody_range_includes_rest() {
        assert_eq!(MELODY_RANGE, 35);
        assert_eq!(melody_class(Some(55)).unwrap(), 0);
        assert_eq!(melody_class(Some(88)).unwrap(), 33);
        assert_eq!(melody_class(None).unwrap(), REST_CLASS);
        assert!(melody_class(Some(89)).is_err());
        assert!(melody_class(Some(40)).is_err());

        assert_eq!(melody_pitch(0), Some(55));
        assert_eq!(melody_pitch(REST_CLASS), None);
    }

    #[test]
    fn test_merged_class_round_trip() {
        let enc = FrameEncoding::new(24).unwrap();
        let class = enc.merged_class(10, 7).unwrap();
        assert_eq!(enc.split_merged(class).unwrap(), (10, 7));
        assert!(enc.merged_class(35, 0).is_err());
        assert!(enc.merged_class(0, 24).is_err());
        assert!(enc.split_merged(enc.merged_dim()).is_err());
    }

    #[test]
    fn test_joint_tensors_layout() {
        let device = Default::default();
        let enc = FrameEncoding::new(3).unwrap();
        let sequences = vec![
            vec![(0, 0), (1, 2), (REST_CLASS, 1)],
            vec![(5, 1), (5, 1), (6, 0)],
        ];

        let (inputs, targets) = enc.joint_tensors::<TestBackend>(&sequences, &device).unwrap();
        assert_eq!(inputs.dims(), [2, 2, 38]);
        assert_eq!(targets.dims(), [2, 2, 2]);

        // Exactly two hot units per frame.
        let per_frame = inputs.clone().sum_dim(2);
        let diff: f32 = (per_frame - 2.0).abs().max().into_scalar();
        assert_eq!(diff, 0.0);

        let targets: Vec<i64> = targets.to_data().to_vec().unwrap();
        // t = 0: seq0 -> (1, 2), seq1 -> (5, 1); t = 1: seq0 -> rest, seq1 -> (6, 0)
        assert_eq!(targets, vec![1, 2, 5, 1, REST_CLASS as i64, 1, 6, 0]);
    }

    #[test]
    fn test_merged_tensors_layout() {
        let device = Default::default();
        let enc = FrameEncoding::new(2).unwrap();
        let sequences = vec![vec![(0, 0), (0, 1), (1, 0)]];

        let (inputs, targets) = enc.merged_tensors::<TestBackend>(&sequences, &device).unwrap();
        assert_eq!(inputs.dims(), [2, 1, 70]);
        let targets: Vec<i64> = targets.to_data().to_vec().unwrap();
        assert_eq!(targets, vec![1, 2]);
    }

    #[test]
    fn test_ragged_sequences_rejected() {
        let device = Default::default();
        let enc = FrameEncoding::new(2).unwrap();
        let sequences = vec![vec![(0, 0), (0, 1)], vec![(0, 0)]];
        assert!(enc.joint_tensors::<TestBackend>(&sequences, &device).is_err());
        assert!(enc.joint_tensors::<TestBackend>(&[], &device).is_err());
    }
}
