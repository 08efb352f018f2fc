//! JSON-lines split files: one `SignalSample` per line.

use crate::types::{DatasetError, DatasetResult, SignalSample};
use std::fs;
use std::path::Path;

pub fn load_split(path: &Path, dim: usize) -> DatasetResult<Vec<SignalSample>> {
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = parse_samples(&raw, path, dim)?;
    tracing::debug!(path = %path.display(), samples = samples.len(), "loaded split");
    Ok(samples)
}

/// Parse and validate JSON-lines `raw`; `path` is only used in error messages.
pub fn parse_samples(raw: &str, path: &Path, dim: usize) -> DatasetResult<Vec<SignalSample>> {
    let mut samples = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let sample: SignalSample =
            serde_json::from_str(line).map_err(|source| DatasetError::Json {
                path: path.to_path_buf(),
                line: line_no,
                source,
            })?;
        if sample.signal.is_empty() {
            return Err(DatasetError::EmptySequence {
                path: path.to_path_buf(),
                line: line_no,
            });
        }
        if let Some(step) = sample.signal.iter().find(|step| step.len() != dim) {
            return Err(DatasetError::DimensionMismatch {
                path: path.to_path_buf(),
                line: line_no,
                expected: dim,
                actual: step.len(),
            });
        }
        if !(0..=1).contains(&sample.label) {
            return Err(DatasetError::InvalidLabel {
                path: path.to_path_buf(),
                line: line_no,
                label: sample.label,
            });
        }
        samples.push(sample);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("mem.jsonl")
    }

    #[test]
    fn parses_lines_and_defaults_domain() {
        let raw = r#"{"id":"a","label":1,"signal":[[0.1,0.2],[0.3,0.4]]}

{"id":"b","label":0,"domain":3,"signal":[[1.0,2.0]]}
"#;
        let samples = parse_samples(raw, p(), 2).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].domain, 0);
        assert_eq!(samples[0].steps(), 2);
        assert_eq!(samples[1].domain, 3);
    }

    #[test]
    fn rejects_wrong_feature_count() {
        let raw = r#"{"id":"a","label":1,"signal":[[0.1,0.2],[0.3]]}"#;
        let err = parse_samples(raw, p(), 2).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::DimensionMismatch {
                line: 1,
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_signal_and_non_binary_label() {
        let empty = r#"{"id":"a","label":1,"signal":[]}"#;
        assert!(matches!(
            parse_samples(empty, p(), 2),
            Err(DatasetError::EmptySequence { line: 1, .. })
        ));
        let label = "\n{\"id\":\"a\",\"label\":2,\"signal\":[[0.0]]}";
        assert!(matches!(
            parse_samples(label, p(), 1),
            Err(DatasetError::InvalidLabel { line: 2, label: 2, .. })
        ));
    }

    #[test]
    fn reports_json_errors_with_line_numbers() {
        let raw = "{\"id\":\"a\",\"label\":0,\"signal\":[[0.0]]}\nnot json";
        assert!(matches!(
            parse_samples(raw, p(), 1),
            Err(DatasetError::Json { line: 2, .. })
        ));
    }
}
