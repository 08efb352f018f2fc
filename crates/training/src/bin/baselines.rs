use burn::backend::Autodiff;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use training::{resolve_device, Baselines, RunArgs, RunOutcome, TrainBackend};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = RunArgs::parse().resolve()?;
    let device = resolve_device(cfg.device())?;
    tracing::info!(device = %cfg.device(), mode = ?cfg.mode, "starting run");

    let mut baselines = Baselines::<Autodiff<TrainBackend>>::new(cfg, device)?;
    match baselines.run()? {
        RunOutcome::Trained(summary) => tracing::info!(
            steps = summary.steps,
            validations = summary.validations.len(),
            checkpoints = summary.checkpoints_saved(),
            "training finished"
        ),
        RunOutcome::Tested(report) => println!("{}", report.summary),
    }
    Ok(())
}
