//! Run orchestrator: owns the selected model and dispatches train/test.

use crate::checkpoint::CheckpointStore;
use crate::config::{Mode, RunConfig};
use crate::result_log::ResultLog;
use crate::tester::{run_test, TestReport};
use crate::trainer::{train_loop, TrainSummary};
use crate::TrainResult;
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use models::Clstm;
use signal_dataset::PatientData;

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Trained(TrainSummary),
    Tested(TestReport),
}

pub struct Baselines<B: AutodiffBackend> {
    config: RunConfig,
    model: Clstm<B>,
    store: CheckpointStore,
    log: ResultLog,
    device: B::Device,
}

impl<B: AutodiffBackend> Baselines<B> {
    /// Build the configured model; with `check_point` set, resume from its saved parameters.
    pub fn new(config: RunConfig, device: B::Device) -> TrainResult<Self> {
        let model = models::select::<B>(&device, &config.model, config.dim, config.resampling)?;
        let store = CheckpointStore::new(&config.save_dir);
        let log = ResultLog::new(&config.log_path);
        let mut baselines = Self {
            config,
            model,
            store,
            log,
            device,
        };
        if baselines.config.check_point {
            baselines.load_checkpoint()?;
            tracing::info!("Start checkpoint training");
        }
        Ok(baselines)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn model(&self) -> &Clstm<B> {
        &self.model
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Restore the model from `<save_dir>/Baselines_<model>_<patient>.pkl`; returns whether a
    /// checkpoint was found.
    pub fn load_checkpoint(&mut self) -> TrainResult<bool> {
        let loaded = self.store.load::<B, _>(
            self.model.clone(),
            &self.config.model,
            &self.config.patient,
            &self.device,
        )?;
        self.model = loaded.model;
        Ok(loaded.restored)
    }

    pub fn train(&mut self) -> TrainResult<TrainSummary> {
        let mut data = PatientData::new(self.config.data_config())?;
        tracing::info!(
            model = %self.config.model,
            patient = %self.config.patient,
            epochs = self.config.epoch,
            "training"
        );
        let (model, summary) = train_loop::<B, Clstm<B>>(
            self.model.clone(),
            &mut data,
            &self.config,
            &self.store,
            &self.device,
        )?;
        self.model = model;
        Ok(summary)
    }

    /// Load the best checkpoint and score the test split.
    pub fn test(&mut self) -> TrainResult<TestReport> {
        self.load_checkpoint()?;
        let mut data = PatientData::new(self.config.data_config())?;
        run_test::<B::InnerBackend, _>(
            &self.model.valid(),
            &mut data,
            &self.config.model,
            &self.config.patient,
            &self.log,
            &self.device,
        )
    }

    pub fn run(&mut self) -> TrainResult<RunOutcome> {
        match self.config.mode {
            Mode::Train => self.train().map(RunOutcome::Trained),
            Mode::Test => self.test().map(RunOutcome::Tested),
        }
    }
}
