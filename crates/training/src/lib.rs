#![recursion_limit = "256"]

pub mod baselines;
pub mod checkpoint;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod result_log;
pub mod tester;
pub mod trainer;

pub use baselines::{Baselines, RunOutcome};
pub use checkpoint::{CheckpointLoad, CheckpointStore};
pub use config::{Mode, RunArgs, RunConfig};
pub use device::{resolve_device, ComputeDevice, TrainDevice};
pub use error::{TrainError, TrainResult};
pub use metrics::{evaluate, ConfusionMatrix, MetricsResult};
pub use result_log::ResultLog;
pub use tester::{format_result, run_test, TestReport};
pub use trainer::{train_loop, BestAccuracy, TrainSummary, ValidationRecord};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
