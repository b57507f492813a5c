//! RMSProp training loop over time-major batches.

use crate::error::{ModelError, Result};
use crate::model::{ModelConfig, Objective, SequenceModel, Targets};
use crate::rnn::StackState;
use crate::train::Hyperparams;
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{GradientsParams, Optimizer, RmsProp, RmsPropConfig};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};

type ModelOptimizer<B> = OptimizerAdaptor<RmsProp, SequenceModel<B>, B>;

/// Loss of one time batch and the state to feed into the next.
#[derive(Debug, Clone)]
pub struct StepOutput<B: Backend> {
    pub loss: f64,
    pub final_state: StackState<B>,
}

/// Owns a model, its objective, the mutable hyper-parameters and the
/// optimizer state.
pub struct Trainer<B: AutodiffBackend> {
    model: SequenceModel<B>,
    objective: Objective,
    hyper: Hyperparams,
    optim: ModelOptimizer<B>,
    steps: usize,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(model: SequenceModel<B>, objective: Objective) -> Self {
        let hyper = Hyperparams::default();
        let optim = build_optimizer(hyper.lr_decay());
        Self {
            model,
            objective,
            hyper,
            optim,
            steps: 0,
        }
    }

    /// Build a training model from `config` and wrap it.
    pub fn from_config(config: &ModelConfig, device: &B::Device) -> Result<Self> {
        let model = config.init(true, device)?;
        Ok(Self::new(model, config.objective))
    }

    pub fn model(&self) -> &SequenceModel<B> {
        &self.model
    }

    pub fn into_model(self) -> SequenceModel<B> {
        self.model
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn hyperparams(&self) -> &Hyperparams {
        &self.hyper
    }

    /// Number of optimizer steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn assign_lr(&mut self, learning_rate: f64) -> Result<()> {
        self.hyper.set_learning_rate(learning_rate)
    }

    /// Change the RMSProp decay. The optimizer is rebuilt, so the running
    /// mean of squared gradients starts over.
    pub fn assign_lr_decay(&mut self, lr_decay: f64) -> Result<()> {
        self.hyper.set_lr_decay(lr_decay)?;
        if self.steps > 0 {
            tracing::warn!(
                lr_decay,
                steps = self.steps,
                "rebuilding optimizer, accumulated RMS state is reset"
            );
        }
        self.optim = build_optimizer(lr_decay);
        Ok(())
    }

    pub fn assign_melody_coeff(&mut self, melody_coeff: f64) -> Result<()> {
        self.hyper.set_melody_coeff(melody_coeff)
    }

    /// Forward, backward and one optimizer step on a single time batch.
    ///
    /// The returned state is detached and can seed the next time batch of
    /// the same sequences.
    pub fn train_step(
        &mut self,
        inputs: Tensor<B, 3>,
        targets: Targets<B>,
        initial_state: Option<StackState<B>>,
    ) -> Result<StepOutput<B>> {
        let (loss, output) = self.model.forward_loss(
            &self.objective,
            inputs,
            targets,
            initial_state,
            self.hyper.melody_coeff(),
        )?;

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optim
            .step(self.hyper.learning_rate(), self.model.clone(), grads);
        self.steps += 1;

        tracing::debug!(step = self.steps, loss = loss_val, lr = self.hyper.learning_rate(), "train step");

        Ok(StepOutput {
            loss: loss_val,
            final_state: output.final_state.detach(),
        })
    }

    /// Loss on the inner backend with dropout disabled.
    pub fn evaluate(
        &self,
        inputs: Tensor<B::InnerBackend, 3>,
        targets: Targets<B::InnerBackend>,
        initial_state: Option<StackState<B::InnerBackend>>,
    ) -> Result<StepOutput<B::InnerBackend>> {
        let model = self.model.valid();
        let (loss, output) = model.forward_loss(
            &self.objective,
            inputs,
            targets,
            initial_state,
            self.hyper.melody_coeff(),
        )?;

        Ok(StepOutput {
            loss: loss.into_scalar().elem::<f64>(),
            final_state: output.final_state,
        })
    }

    /// Train on consecutive time batches of the same sequences, carrying the
    /// recurrent state from one batch to the next. Returns the mean loss.
    ///
    /// An empty iterator is an error.
    pub fn run_sequence<I>(&mut self, batches: I) -> Result<f64>
    where
        I: IntoIterator<Item = (Tensor<B, 3>, Targets<B>)>,
    {
        let mut state = None;
        let mut total = 0.0;
        let mut count = 0usize;

        for (inputs, targets) in batches {
            let step = self.train_step(inputs, targets, state)?;
            total += step.loss;
            count += 1;
            state = Some(step.final_state);
        }

        if count == 0 {
            return Err(ModelError::EmptyBatch { time: 0, batch: 0 });
        }
        Ok(total / count as f64)
    }
}

fn build_optimizer<B: AutodiffBackend>(lr_decay: f64) -> ModelOptimizer<B> {
    RmsPropConfig::new().with_alpha(lr_decay as f32).init()
}
