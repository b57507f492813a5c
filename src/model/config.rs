use crate::cells::CellType;
use crate::error::ModelError;
use crate::model::objective::Objective;
use crate::model::sequence::SequenceModel;
use crate::rnn::MultiRnnCell;
use burn::config::Config;
use burn::nn::LinearConfig;
use burn::tensor::backend::Backend;

/// Hyper-parameters that fix the topology of a [`SequenceModel`].
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of timesteps in one time-major batch.
    pub time_batch_len: usize,
    /// Width of each input frame; also the width of the logits.
    pub input_dim: usize,
    pub hidden_size: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    /// Probability of *keeping* a unit of the stack output during training.
    #[config(default = 1.0)]
    pub dropout_prob: f64,
    #[config(default = "CellType::Lstm")]
    pub cell_type: CellType,
    #[config(default = "Objective::IndependentNotes")]
    pub objective: Objective,
}

impl ModelConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.dropout_prob <= 0.0 || self.dropout_prob > 1.0 || self.dropout_prob.is_nan() {
            return Err(ModelError::InvalidDropout(self.dropout_prob));
        }
        for (name, value) in [
            ("time_batch_len", self.time_batch_len),
            ("input_dim", self.input_dim),
            ("hidden_size", self.hidden_size),
            ("num_layers", self.num_layers),
        ] {
            if value == 0 {
                return Err(ModelError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        self.objective.validate(self.input_dim)
    }

    /// Build the network.
    ///
    /// Output dropout is only attached when `training` is set and the keep
    /// probability is below 1.0.
    pub fn init<B: Backend>(
        &self,
        training: bool,
        device: &B::Device,
    ) -> crate::error::Result<SequenceModel<B>> {
        self.validate()?;

        tracing::info!(
            cell = %self.cell_type,
            objective = self.objective.name(),
            time_batch_len = self.time_batch_len,
            input_dim = self.input_dim,
            hidden_size = self.hidden_size,
            num_layers = self.num_layers,
            keep_prob = self.dropout_prob,
            training,
            "building sequence model"
        );

        let mut cell = MultiRnnCell::new(
            self.cell_type,
            self.input_dim,
            self.hidden_size,
            self.num_layers,
            device,
        );
        if training && self.dropout_prob < 1.0 {
            cell = cell.with_output_dropout(self.dropout_prob);
        }

        let output = LinearConfig::new(self.hidden_size, self.input_dim)
            .with_bias(true)
            .init(device);

        Ok(SequenceModel::from_parts(cell, output, self.time_batch_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::new(128, 88, 200);
        assert_eq!(config.num_layers, 1);
        assert_eq!(config.dropout_prob, 1.0);
        assert_eq!(config.cell_type, CellType::Lstm);
        assert_eq!(config.objective, Objective::IndependentNotes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dropout_probability_bounds() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let config = ModelConfig::new(4, 8, 16).with_dropout_prob(bad);
            assert!(matches!(config.validate(), Err(ModelError::InvalidDropout(_))));
        }
        for good in [0.1, 0.5, 1.0] {
            assert!(ModelConfig::new(4, 8, 16).with_dropout_prob(good).validate().is_ok());
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(ModelConfig::new(0, 8, 16).validate().is_err());
        assert!(ModelConfig::new(4, 0, 16).validate().is_err());
        assert!(ModelConfig::new(4, 8, 0).validate().is_err());
        assert!(ModelConfig::new(4, 8, 16).with_num_layers(0).validate().is_err());
    }

    #[test]
    fn test_dropout_attached_only_when_training() {
        let device = Default::default();
        let config = ModelConfig::new(4, 8, 16).with_dropout_prob(0.5);

        let train = config.init::<TestBackend>(true, &device).unwrap();
        let infer = config.init::<TestBackend>(false, &device).unwrap();
        assert!(train.has_output_dropout());
        assert!(!infer.has_output_dropout());

        let full_keep = ModelConfig::new(4, 8, 16)
            .init::<TestBackend>(true, &device)
            .unwrap();
        assert!(!full_keep.has_output_dropout());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = ModelConfig::new(16, 59, 64)
            .with_num_layers(2)
            .with_cell_type(CellType::Vanilla)
            .with_objective(Objective::MelodyHarmony { melody_range: 35 });

        let json = serde_json::to_string(&config).unwrap();
        let back: ModelConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.num_layers, 2);
        assert_eq!(back.cell_type, CellType::Vanilla);
        assert_eq!(back.objective, Objective::MelodyHarmony { melody_range: 35 });
    }
}
