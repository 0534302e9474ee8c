//! The sample manifest: which transcriptions exist and which audio file
//! each TTS model produced for them.

use crate::csv::CsvRecords;
use crate::errors::ConfigError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Column holding the reference text; every other column is a model.
pub const TRANSCRIPTION_COLUMN: &str = "transcriptions";

#[derive(Debug, Clone)]
pub struct Manifest {
    /// Model names in manifest column order.
    pub models: Vec<String>,
    pub rows: Vec<ManifestRow>,
}

#[derive(Debug, Clone)]
pub struct ManifestRow {
    pub transcription: String,
    takes: BTreeMap<String, String>,
}

impl ManifestRow {
    /// The audio file this model produced for this row, if any.
    /// Blank cells count as "no take".
    pub fn take(&self, model: &str) -> Option<&str> {
        self.takes
            .get(model)
            .map(String::as_str)
            .filter(|f| !f.trim().is_empty())
    }
}

/// One rateable sample: a manifest row where the model has a take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub row: usize,
    pub transcription: String,
    pub audio_file: String,
}

/// One rateable A/B sample: both models have a take for the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSample {
    pub row: usize,
    pub transcription: String,
    pub baseline_file: String,
    pub experimental_file: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| {
            ConfigError(format!("failed to read manifest {}: {}", path.display(), e))
        })?;
        let mut records = CsvRecords::new(BufReader::new(file));

        let header = match records.next() {
            Some(Ok(h)) => h,
            Some(Err(e)) => {
                return Err(ConfigError(format!(
                    "failed to parse manifest {}: {}",
                    path.display(),
                    e
                )))
            }
            None => return Err(ConfigError(format!("manifest {} is empty", path.display()))),
        };

        let transcription_col = header
            .iter()
            .position(|c| c.trim() == TRANSCRIPTION_COLUMN)
            .ok_or_else(|| {
                ConfigError(format!(
                    "manifest {} must contain column: {}",
                    path.display(),
                    TRANSCRIPTION_COLUMN
                ))
            })?;

        let models: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != transcription_col)
            .map(|(_, c)| c.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|e| {
                ConfigError(format!(
                    "failed to parse manifest {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if record.len() != header.len() {
                return Err(ConfigError(format!(
                    "manifest {}: row {} has {} fields, header has {}",
                    path.display(),
                    rows.len() + 2,
                    record.len(),
                    header.len()
                )));
            }
            let mut takes = BTreeMap::new();
            let mut transcription = String::new();
            for (i, value) in record.into_iter().enumerate() {
                if i == transcription_col {
                    transcription = value;
                } else {
                    takes.insert(header[i].trim().to_string(), value);
                }
            }
            rows.push(ManifestRow {
                transcription,
                takes,
            });
        }

        Ok(Self { models, rows })
    }

    /// Ordered samples for one model, skipping rows without a take.
    pub fn valid_rows(&self, model: &str) -> Vec<Sample> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                row.take(model).map(|file| Sample {
                    row: idx,
                    transcription: row.transcription.clone(),
                    audio_file: file.to_string(),
                })
            })
            .collect()
    }

    /// Ordered samples where both models have a take. When `audio_root`
    /// is given, both clips must also exist on disk.
    pub fn valid_pair_rows(
        &self,
        baseline: &str,
        experimental: &str,
        audio_root: Option<&Path>,
    ) -> Vec<PairSample> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let b = row.take(baseline)?;
                let e = row.take(experimental)?;
                if let Some(root) = audio_root {
                    if !audio_path(root, baseline, b).exists()
                        || !audio_path(root, experimental, e).exists()
                    {
                        return None;
                    }
                }
                Some(PairSample {
                    row: idx,
                    transcription: row.transcription.clone(),
                    baseline_file: b.to_string(),
                    experimental_file: e.to_string(),
                })
            })
            .collect()
    }
}

/// Clips live under `<root>/<model>/<file>`.
pub fn audio_path(root: &Path, model: &str, file: &str) -> PathBuf {
    root.join(model).join(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_splits_models_from_transcriptions() {
        let f = write_manifest(
            "transcriptions,base_v1,exp_v2\nhello there,a0.wav,b0.wav\nsecond line,a1.wav,\n",
        );
        let m = Manifest::load(f.path()).unwrap();
        assert_eq!(m.models, vec!["base_v1", "exp_v2"]);
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.rows[0].transcription, "hello there");
        assert_eq!(m.rows[1].take("exp_v2"), None);
    }

    #[test]
    fn missing_transcription_column_is_rejected() {
        let f = write_manifest("model_a,model_b\nx.wav,y.wav\n");
        let err = Manifest::load(f.path()).unwrap_err();
        assert!(err.to_string().contains(TRANSCRIPTION_COLUMN));
    }

    #[test]
    fn ragged_row_is_rejected() {
        let f = write_manifest("transcriptions,m\nhello,a.wav,extra\n");
        assert!(Manifest::load(f.path()).is_err());
    }

    #[test]
    fn valid_rows_skips_blank_takes() {
        let f = write_manifest("transcriptions,m\none,a.wav\ntwo,\nthree,  \nfour,d.wav\n");
        let m = Manifest::load(f.path()).unwrap();
        let samples = m.valid_rows("m");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].row, 0);
        assert_eq!(samples[1].row, 3);
        assert_eq!(samples[1].audio_file, "d.wav");
    }

    #[test]
    fn valid_pair_rows_requires_both_takes() {
        let f = write_manifest(
            "transcriptions,a,b\nr0,a0.wav,b0.wav\nr1,a1.wav,\nr2,,b2.wav\nr3,a3.wav,b3.wav\n",
        );
        let m = Manifest::load(f.path()).unwrap();
        let pairs = m.valid_pair_rows("a", "b", None);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].row, 0);
        assert_eq!(pairs[1].row, 3);
    }

    #[test]
    fn valid_pair_rows_checks_disk_when_rooted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/a0.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("b/b0.wav"), b"x").unwrap();
        std::fs::write(dir.path().join("a/a1.wav"), b"x").unwrap();
        // b/b1.wav deliberately absent

        let f = write_manifest("transcriptions,a,b\nr0,a0.wav,b0.wav\nr1,a1.wav,b1.wav\n");
        let m = Manifest::load(f.path()).unwrap();
        let pairs = m.valid_pair_rows("a", "b", Some(dir.path()));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].row, 0);
    }
}
