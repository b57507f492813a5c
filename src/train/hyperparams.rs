use crate::error::{ModelError, Result};
use crate::model::DEFAULT_MELODY_COEFF;
use serde::{Deserialize, Serialize};

/// Values that change during training without rebuilding the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparams {
    learning_rate: f64,
    /// RMSProp moving-average coefficient.
    lr_decay: f64,
    melody_coeff: f64,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Self {
            learning_rate: 0.0,
            lr_decay: 0.0,
            melody_coeff: DEFAULT_MELODY_COEFF,
        }
    }
}

impl Hyperparams {
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn lr_decay(&self) -> f64 {
        self.lr_decay
    }

    pub fn melody_coeff(&self) -> f64 {
        self.melody_coeff
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        if !learning_rate.is_finite() || learning_rate < 0.0 {
            return Err(ModelError::InvalidLearningRate(learning_rate));
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn set_lr_decay(&mut self, lr_decay: f64) -> Result<()> {
        if !(0.0..1.0).contains(&lr_decay) {
            return Err(ModelError::InvalidLearningRateDecay(lr_decay));
        }
        self.lr_decay = lr_decay;
        Ok(())
    }

    pub fn set_melody_coeff(&mut self, melody_coeff: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&melody_coeff) {
            return Err(ModelError::InvalidMelodyCoeff(melody_coeff));
        }
        self.melody_coeff = melody_coeff;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let hp = Hyperparams::default();
        assert_eq!(hp.learning_rate(), 0.0);
        assert_eq!(hp.lr_decay(), 0.0);
        assert_eq!(hp.melody_coeff(), 0.5);
    }

    #[test]
    fn test_melody_coeff_bounds() {
        let mut hp = Hyperparams::default();
        assert!(hp.set_melody_coeff(0.0).is_ok());
        assert!(hp.set_melody_coeff(1.0).is_ok());
        assert!(matches!(
            hp.set_melody_coeff(1.01),
            Err(ModelError::InvalidMelodyCoeff(_))
        ));
        assert!(hp.set_melody_coeff(-0.1).is_err());
        assert!(hp.set_melody_coeff(f64::NAN).is_err());
        // Rejected values leave the previous one in place.
        assert_eq!(hp.melody_coeff(), 1.0);
    }

    #[test]
    fn test_learning_rate_and_decay_bounds() {
        let mut hp = Hyperparams::default();
        assert!(hp.set_learning_rate(5e-3).is_ok());
        assert!(hp.set_learning_rate(-1.0).is_err());
        assert!(hp.set_learning_rate(f64::INFINITY).is_err());
        assert_eq!(hp.learning_rate(), 5e-3);

        assert!(hp.set_lr_decay(0.9).is_ok());
        assert!(hp.set_lr_decay(1.0).is_err());
        assert!(hp.set_lr_decay(-0.1).is_err());
        assert_eq!(hp.lr_decay(), 0.9);
    }
}
