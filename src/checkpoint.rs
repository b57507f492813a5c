//! Saving and restoring trained models.
//!
//! Layout of a checkpoint directory:
//!
//! ```text
//! checkpoints/
//!   model_epoch_1.mpk.gz
//!   model_epoch_2.mpk.gz
//!   latest_epoch.json
//!   model_config.json
//! ```
//!
//! Weights go through `burn::record::CompactRecorder`; the config is needed
//! to rebuild a module with the same topology before loading them.

use crate::error::Result;
use crate::model::{ModelConfig, SequenceModel};
use burn::config::Config;
use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "model_config.json";
const LATEST_FILE: &str = "latest_epoch.json";

pub struct Checkpointer {
    dir: PathBuf,
}

impl Checkpointer {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the weights for `epoch`, the config, and the latest-epoch
    /// pointer.
    pub fn save<B: Backend>(
        &self,
        model: &SequenceModel<B>,
        config: &ModelConfig,
        epoch: usize,
    ) -> Result<()> {
        let path = self.model_path(epoch);
        CompactRecorder::new().record(model.clone().into_record(), path.clone())?;

        config.save(self.dir.join(CONFIG_FILE))?;
        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&epoch)?)?;

        tracing::info!(epoch, path = %path.display(), "saved checkpoint");
        Ok(())
    }

    pub fn load_config(&self) -> Result<ModelConfig> {
        Ok(ModelConfig::load(self.dir.join(CONFIG_FILE))?)
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(LATEST_FILE))?;
        Ok(serde_json::from_str(&s)?)
    }

    /// Rebuild the model (inference mode, no dropout) from the stored config
    /// and load the latest weights into it.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<(SequenceModel<B>, ModelConfig)> {
        let config = self.load_config()?;
        let epoch = self.latest_epoch()?;
        let model = self.load_epoch(&config, epoch, device)?;
        Ok((model, config))
    }

    pub fn load_epoch<B: Backend>(
        &self,
        config: &ModelConfig,
        epoch: usize,
        device: &B::Device,
    ) -> Result<SequenceModel<B>> {
        let path = self.model_path(epoch);
        tracing::info!(epoch, path = %path.display(), "loading checkpoint");

        let model = config.init::<B>(false, device)?;
        let record = CompactRecorder::new().load(path, device)?;
        Ok(model.load_record(record))
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // the recorder appends its own extension
        self.dir.join(format!("model_epoch_{epoch}"))
    }
}
