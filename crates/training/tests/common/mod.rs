#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use training::{Mode, RunConfig};

pub const DIM: usize = 3;
pub const STEPS: usize = 6;

/// Writes `count` samples alternating between label 0 (low signal) and label 1 (high signal).
pub fn write_split(path: &Path, prefix: &str, count: usize) -> anyhow::Result<()> {
    let lines: Vec<String> = (0..count)
        .map(|i| {
            let label = (i % 2) as i64;
            let level = if label == 1 { 1.0f32 } else { -1.0 };
            let signal: Vec<Vec<f32>> = (0..STEPS).map(|_| vec![level; DIM]).collect();
            serde_json::json!({
                "id": format!("{prefix}{i}"),
                "label": label,
                "domain": 0,
                "signal": signal,
            })
            .to_string()
        })
        .collect();
    fs::write(path, lines.join("\n"))?;
    Ok(())
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub cfg: RunConfig,
}

impl Fixture {
    pub fn save_dir(&self) -> PathBuf {
        self.cfg.save_dir.clone()
    }
}

/// 8 train, 4 validation and 4 test samples with batch size 4 and one epoch.
pub fn fixture(mode: Mode) -> anyhow::Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let root = dir.path();
    write_split(&root.join("train.jsonl"), "tr", 8)?;
    write_split(&root.join("val.jsonl"), "va", 4)?;
    write_split(&root.join("test.jsonl"), "te", 4)?;
    let cfg = RunConfig {
        patient: "chb01".into(),
        epoch: 1,
        batch_size: 4,
        dim: DIM,
        train_path: Some(root.join("train.jsonl")),
        val_path: Some(root.join("val.jsonl")),
        test_path: Some(root.join("test.jsonl")),
        mode,
        few_shot: false,
        resampling: STEPS,
        save_dir: root.join("save_model"),
        log_path: root.join("log.txt"),
        seed: Some(7),
        ..Default::default()
    };
    Ok(Fixture { dir, cfg })
}
