mod common;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use training::{Baselines, Mode, RunOutcome};

type Backend = Autodiff<NdArray<f32>>;

#[test]
fn test_after_training_appends_one_result_line() -> anyhow::Result<()> {
    let fx = common::fixture(Mode::Train)?;
    Baselines::<Backend>::new(fx.cfg.clone(), Default::default())?.train()?;

    let mut cfg = fx.cfg.clone();
    cfg.mode = Mode::Test;
    let mut baselines = Baselines::<Backend>::new(cfg, Default::default())?;
    let report = match baselines.run()? {
        RunOutcome::Tested(report) => report,
        other => anyhow::bail!("expected a test outcome, got {other:?}"),
    };

    assert_eq!(report.samples, 4);
    assert!(report
        .summary
        .starts_with("Baselines: clstm|Patient chb01|Data size:4| test loss:"));
    for m in [
        report.metrics.accuracy,
        report.metrics.precision,
        report.metrics.recall,
        report.metrics.f1score,
        report.metrics.auc,
    ] {
        assert!((0.0..=1.0).contains(&m));
    }
    assert!((report.sample_accuracy - report.metrics.accuracy).abs() < 1e-9);

    let log = std::fs::read_to_string(&fx.cfg.log_path)?;
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(format!("{}\n", lines[0]), report.log_line);
    let (result, timestamp) = lines[0].split_once('\t').expect("tab separated");
    assert_eq!(result, report.summary);
    assert!(!timestamp.is_empty());
    Ok(())
}

#[test]
fn test_without_checkpoint_still_scores_fresh_model() -> anyhow::Result<()> {
    let fx = common::fixture(Mode::Test)?;
    let mut baselines = Baselines::<Backend>::new(fx.cfg.clone(), Default::default())?;
    assert!(!baselines.load_checkpoint()?);
    let report = baselines.test()?;
    assert_eq!(report.samples, 4);
    assert!(!fx.cfg.save_dir.exists());
    assert_eq!(std::fs::read_to_string(&fx.cfg.log_path)?.lines().count(), 1);
    Ok(())
}

#[test]
fn resume_flag_restores_saved_parameters() -> anyhow::Result<()> {
    let fx = common::fixture(Mode::Train)?;
    let mut trainer = Baselines::<Backend>::new(fx.cfg.clone(), Default::default())?;
    trainer.train()?;

    let mut cfg = fx.cfg.clone();
    cfg.check_point = true;
    cfg.mode = Mode::Test;
    let mut first = Baselines::<Backend>::new(cfg.clone(), Default::default())?;
    let mut second = Baselines::<Backend>::new(cfg, Default::default())?;
    let a = first.test()?;
    let b = second.test()?;
    assert_eq!(a.loss_avg, b.loss_avg);
    assert_eq!(a.metrics, b.metrics);
    Ok(())
}
