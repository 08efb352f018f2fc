use crate::device::ComputeDevice;
use crate::{TrainError, TrainResult};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use signal_dataset::DataConfig;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_NAME: &str = "baselines.toml";
const CONFIG_ENV: &str = "BASELINES_CONFIG";

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Train,
    Test,
}

/// Everything a run needs; fixed once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub patient: String,
    pub epoch: usize,
    pub batch_size: usize,
    /// Features per time step.
    pub dim: usize,
    pub lr: f64,
    /// Negative selects the CPU, otherwise an accelerator index.
    pub gpu: i64,
    pub train_path: Option<PathBuf>,
    pub test_path: Option<PathBuf>,
    pub val_path: Option<PathBuf>,
    pub mode: Mode,
    pub model: String,
    pub few_shot: bool,
    pub few_shot_ratio: f64,
    /// Resume from the saved checkpoint when the run starts.
    pub check_point: bool,
    pub resampling: usize,
    pub save_dir: PathBuf,
    pub log_path: PathBuf,
    /// Validate every this many batches (by batch index within the epoch).
    pub validate_every: usize,
    /// Reset the best validation accuracy to 0 once it reaches exactly 1.0, so later
    /// validations keep checkpointing.
    pub reset_best_on_perfect: bool,
    pub seed: Option<u64>,
    /// Draw a terminal progress bar during training.
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            patient: String::new(),
            epoch: 10,
            batch_size: 16,
            dim: 32,
            lr: 0.001,
            gpu: -1,
            train_path: None,
            test_path: None,
            val_path: None,
            mode: Mode::Train,
            model: "clstm".to_string(),
            few_shot: true,
            few_shot_ratio: 0.2,
            check_point: false,
            resampling: 500,
            save_dir: PathBuf::from("save_model"),
            log_path: PathBuf::from("log/log.txt"),
            validate_every: 50,
            reset_best_on_perfect: true,
            seed: None,
            progress: false,
        }
    }
}

impl RunConfig {
    /// Defaults overlaid with the first config file found: `explicit`, then `$BASELINES_CONFIG`,
    /// then `baselines.toml` in the working directory.
    pub fn load(explicit: Option<&Path>) -> TrainResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_NAME);
        if default_path.exists() {
            return Self::from_path(default_path);
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> TrainResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| TrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw)
            .map_err(|e| TrainError::Config(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> TrainResult<()> {
        let fail = |msg: String| Err(TrainError::Config(msg));
        if self.patient.trim().is_empty() {
            return fail("patient must be set".into());
        }
        if self.epoch == 0 {
            return fail("epoch must be at least 1".into());
        }
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".into());
        }
        if self.dim == 0 {
            return fail("dim must be at least 1".into());
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return fail(format!("lr must be a positive number, got {}", self.lr));
        }
        if self.few_shot && !(self.few_shot_ratio > 0.0 && self.few_shot_ratio <= 1.0) {
            return fail(format!(
                "few_shot_ratio must be in (0, 1], got {}",
                self.few_shot_ratio
            ));
        }
        if self.validate_every == 0 {
            return fail("validate_every must be at least 1".into());
        }
        match self.mode {
            Mode::Train if self.train_path.is_none() || self.val_path.is_none() => {
                fail("train mode needs train_path and val_path".into())
            }
            Mode::Test if self.test_path.is_none() => fail("test mode needs test_path".into()),
            _ => Ok(()),
        }
    }

    pub fn device(&self) -> ComputeDevice {
        ComputeDevice::from_index(self.gpu)
    }

    pub fn data_config(&self) -> DataConfig {
        DataConfig {
            train_path: self.train_path.clone(),
            test_path: self.test_path.clone(),
            val_path: self.val_path.clone(),
            batch_size: self.batch_size,
            dim: self.dim,
            few_shot: self.few_shot,
            few_shot_ratio: self.few_shot_ratio,
            seed: self.seed,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "baselines",
    about = "Train or test baseline sequence classifiers on patient time-series"
)]
pub struct RunArgs {
    /// TOML config file (defaults to $BASELINES_CONFIG, then ./baselines.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Patient identifier; keys checkpoints and log lines.
    #[arg(long)]
    pub patient: Option<String>,
    /// Number of epochs.
    #[arg(long)]
    pub epoch: Option<usize>,
    /// Batch size.
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Features per time step.
    #[arg(long)]
    pub dim: Option<usize>,
    /// Learning rate.
    #[arg(long)]
    pub lr: Option<f64>,
    /// Accelerator index; negative runs on the CPU.
    #[arg(long, allow_hyphen_values = true)]
    pub gpu: Option<i64>,
    #[arg(long)]
    pub train_path: Option<PathBuf>,
    #[arg(long)]
    pub test_path: Option<PathBuf>,
    #[arg(long)]
    pub val_path: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,
    /// Baseline model name.
    #[arg(long)]
    pub model: Option<String>,
    /// Subsample the training split (true/false).
    #[arg(long)]
    pub few_shot: Option<bool>,
    /// Fraction of the training split kept when few-shot is on.
    #[arg(long)]
    pub few_shot_ratio: Option<f64>,
    /// Resume from the saved checkpoint.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub check_point: Option<bool>,
    /// Time steps consumed by the model.
    #[arg(long)]
    pub resampling: Option<usize>,
    /// Checkpoint directory.
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
    /// Result log file.
    #[arg(long)]
    pub log_path: Option<PathBuf>,
    /// Batches between validation sub-passes.
    #[arg(long)]
    pub validate_every: Option<usize>,
    /// Reset the best validation accuracy after a perfect score (true/false).
    #[arg(long)]
    pub reset_best_on_perfect: Option<bool>,
    /// Seed for shuffling and few-shot sampling.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Show a progress bar.
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl RunArgs {
    /// Load the config file, apply the flags on top and validate the result.
    pub fn resolve(self) -> TrainResult<RunConfig> {
        let mut cfg = RunConfig::load(self.config.as_deref())?;
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply(self, cfg: &mut RunConfig) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field { cfg.$field = v; })*
            };
        }
        set!(
            patient,
            epoch,
            batch_size,
            dim,
            lr,
            gpu,
            mode,
            model,
            few_shot,
            few_shot_ratio,
            check_point,
            resampling,
            save_dir,
            log_path,
            validate_every,
            reset_best_on_perfect,
        );
        if self.train_path.is_some() {
            cfg.train_path = self.train_path;
        }
        if self.test_path.is_some() {
            cfg.test_path = self.test_path;
        }
        if self.val_path.is_some() {
            cfg.val_path = self.val_path;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if self.progress {
            cfg.progress = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_config() -> RunConfig {
        RunConfig {
            patient: "chb01".into(),
            train_path: Some("train.jsonl".into()),
            val_path: Some("val.jsonl".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_mirror_the_baseline_script() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.epoch, 10);
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.dim, 32);
        assert_eq!(cfg.model, "clstm");
        assert!(cfg.few_shot);
        assert!(!cfg.check_point);
        assert_eq!(cfg.validate_every, 50);
        assert_eq!(cfg.device(), ComputeDevice::Cpu);
    }

    #[test]
    fn validate_catches_bad_values() {
        assert!(train_config().validate().is_ok());
        let bad = [
            RunConfig {
                patient: " ".into(),
                ..train_config()
            },
            RunConfig {
                epoch: 0,
                ..train_config()
            },
            RunConfig {
                lr: f64::NAN,
                ..train_config()
            },
            RunConfig {
                few_shot_ratio: 1.5,
                ..train_config()
            },
            RunConfig {
                val_path: None,
                ..train_config()
            },
            RunConfig {
                mode: Mode::Test,
                ..train_config()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(TrainError::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn flags_override_file_values() {
        let mut cfg = train_config();
        let args = RunArgs::parse_from([
            "baselines",
            "--epoch",
            "3",
            "--gpu",
            "-1",
            "--mode",
            "test",
            "--check-point",
            "--few-shot",
            "false",
        ]);
        args.apply(&mut cfg);
        assert_eq!(cfg.epoch, 3);
        assert_eq!(cfg.gpu, -1);
        assert_eq!(cfg.mode, Mode::Test);
        assert!(cfg.check_point);
        assert!(!cfg.few_shot);
        assert_eq!(cfg.patient, "chb01");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: RunConfig =
            toml::from_str("patient = \"p7\"\nmode = \"test\"\nlr = 0.01\n").unwrap();
        assert_eq!(cfg.patient, "p7");
        assert_eq!(cfg.mode, Mode::Test);
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.batch_size, 16);
    }
}
