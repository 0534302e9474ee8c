//! CSV score logs: one row per judgment.
//!
//! The file is created with a header on first write. Re-submitting a
//! judgment with the same key (evaluator + model(s) + clip(s)) replaces
//! the earlier row instead of duplicating it; the rewrite goes through a
//! temp file in the same directory and a rename.

use crate::csv::{write_record, CsvRecords};
use crate::pairing::PresentationOrder;
use crate::scoring::{Preference, Score};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Local wall-clock timestamp, RFC 3339.
pub fn timestamp_now() -> String {
    chrono::Local::now().to_rfc3339()
}

/// A loggable judgment row.
pub trait Record: Sized {
    const HEADER: &'static [&'static str];

    /// Identity of the judgment; rows with equal keys supersede each
    /// other.
    fn key(&self) -> Vec<String>;
    fn to_fields(&self) -> Vec<String>;
    fn from_fields(fields: &[String]) -> Result<Self>;
}

/// Append-style CSV log for one row type.
#[derive(Debug, Clone)]
pub struct ScoreLog<T: Record> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Record> ScoreLog<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log a judgment, replacing any earlier row with the same key.
    pub fn append(&self, row: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        if !self.path.exists() {
            let file = fs::File::create(&self.path)
                .with_context(|| format!("failed to create {}", self.path.display()))?;
            let mut w = BufWriter::new(file);
            write_record(&mut w, T::HEADER)?;
            write_record(&mut w, &row.to_fields())?;
            w.flush()?;
            return Ok(());
        }

        let mut rows = self.read_all()?;
        let key = row.key();
        let before = rows.len();
        rows.retain(|r| r.key() != key);
        if rows.len() < before {
            tracing::debug!(path = %self.path.display(), "replacing earlier row for {:?}", key);
        }

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
            .context("failed to create temp log file")?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            write_record(&mut w, T::HEADER)?;
            for r in &rows {
                write_record(&mut w, &r.to_fields())?;
            }
            write_record(&mut w, &row.to_fields())?;
            w.flush()?;
        }
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// All rows currently in the log; empty when the file is absent.
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let mut records = CsvRecords::new(BufReader::new(file));

        let header = records
            .next()
            .ok_or_else(|| anyhow!("{} is empty", self.path.display()))??;
        if header != T::HEADER {
            bail!(
                "{} has unexpected header {:?} (expected {:?})",
                self.path.display(),
                header,
                T::HEADER
            );
        }

        let mut rows = Vec::new();
        for record in records {
            let record = record?;
            if record.len() != T::HEADER.len() {
                bail!(
                    "{}: row {} has {} fields, expected {}",
                    self.path.display(),
                    rows.len() + 2,
                    record.len(),
                    T::HEADER.len()
                );
            }
            rows.push(T::from_fields(&record)?);
        }
        Ok(rows)
    }
}

fn parse_u8(field: &str, name: &str) -> Result<u8> {
    field
        .trim()
        .parse::<u8>()
        .map_err(|_| anyhow!("invalid {}: {:?}", name, field))
}

fn parse_bool(field: &str, name: &str) -> Result<bool> {
    match field.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(anyhow!("invalid {}: {:?}", name, other)),
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleRow {
    pub user_name: String,
    pub model: String,
    pub audio_file: String,
    pub transcription: String,
    pub score: Score,
    pub timestamp: String,
}

impl Record for SingleRow {
    const HEADER: &'static [&'static str] = &[
        "user_name",
        "model",
        "audio_file",
        "transcription",
        "score",
        "timestamp",
    ];

    fn key(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.model.clone(),
            self.audio_file.clone(),
        ]
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.model.clone(),
            self.audio_file.clone(),
            self.transcription.clone(),
            self.score.to_string(),
            self.timestamp.clone(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self> {
        Ok(Self {
            user_name: f[0].clone(),
            model: f[1].clone(),
            audio_file: f[2].clone(),
            transcription: f[3].clone(),
            score: Score::new(parse_u8(&f[4], "score")?),
            timestamp: f[5].clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRow {
    pub user_name: String,
    pub baseline_model: String,
    pub experimental_model: String,
    pub baseline_audio: String,
    pub experimental_audio: String,
    pub baseline_score: Score,
    pub experimental_score: Score,
    pub preference: Preference,
    /// Whether the blind preference agrees with the two ratings.
    pub consistent: bool,
    /// Which clip was played as "A" for this judgment.
    pub presented_first: PresentationOrder,
    pub timestamp: String,
}

impl Record for CompareRow {
    const HEADER: &'static [&'static str] = &[
        "user_name",
        "baseline_model",
        "experimental_model",
        "baseline_audio",
        "experimental_audio",
        "baseline_score",
        "experimental_score",
        "preference",
        "consistent",
        "presented_first",
        "timestamp",
    ];

    fn key(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.baseline_model.clone(),
            self.experimental_model.clone(),
            self.baseline_audio.clone(),
            self.experimental_audio.clone(),
        ]
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.baseline_model.clone(),
            self.experimental_model.clone(),
            self.baseline_audio.clone(),
            self.experimental_audio.clone(),
            self.baseline_score.to_string(),
            self.experimental_score.to_string(),
            self.preference.as_str().to_string(),
            self.consistent.to_string(),
            self.presented_first.as_str().to_string(),
            self.timestamp.clone(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self> {
        Ok(Self {
            user_name: f[0].clone(),
            baseline_model: f[1].clone(),
            experimental_model: f[2].clone(),
            baseline_audio: f[3].clone(),
            experimental_audio: f[4].clone(),
            baseline_score: Score::new(parse_u8(&f[5], "baseline_score")?),
            experimental_score: Score::new(parse_u8(&f[6], "experimental_score")?),
            preference: Preference::parse(&f[7])
                .ok_or_else(|| anyhow!("invalid preference: {:?}", f[7]))?,
            consistent: parse_bool(&f[8], "consistent")?,
            presented_first: PresentationOrder::parse(&f[9])
                .ok_or_else(|| anyhow!("invalid presented_first: {:?}", f[9]))?,
            timestamp: f[10].clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub user_name: String,
    pub audio_name: String,
    /// Expected score on the 0–10 scale.
    pub reference_score: u8,
    pub user_score: u8,
    pub timestamp: String,
}

impl Record for CalibrationRow {
    const HEADER: &'static [&'static str] = &[
        "user_name",
        "audio_name",
        "reference_score",
        "user_score",
        "timestamp",
    ];

    fn key(&self) -> Vec<String> {
        vec![self.user_name.clone(), self.audio_name.clone()]
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.audio_name.clone(),
            self.reference_score.to_string(),
            self.user_score.to_string(),
            self.timestamp.clone(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self> {
        Ok(Self {
            user_name: f[0].clone(),
            audio_name: f[1].clone(),
            reference_score: parse_u8(&f[2], "reference_score")?,
            user_score: parse_u8(&f[3], "user_score")?,
            timestamp: f[4].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_row(user: &str, file: &str, score: u8) -> SingleRow {
        SingleRow {
            user_name: user.to_string(),
            model: "m1".to_string(),
            audio_file: file.to_string(),
            transcription: "hello, \"world\"".to_string(),
            score: Score::new(score),
            timestamp: timestamp_now(),
        }
    }

    #[test]
    fn first_append_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<SingleRow> = ScoreLog::new(dir.path().join("out/eval.csv"));
        log.append(&single_row("kay", "a.wav", 70)).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with("user_name,model,audio_file"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn rekey_replaces_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<SingleRow> = ScoreLog::new(dir.path().join("eval.csv"));
        log.append(&single_row("kay", "a.wav", 70)).unwrap();
        log.append(&single_row("kay", "b.wav", 30)).unwrap();
        log.append(&single_row("kay", "a.wav", 55)).unwrap();

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        let a = rows.iter().find(|r| r.audio_file == "a.wav").unwrap();
        assert_eq!(a.score, Score::new(55));
    }

    #[test]
    fn same_clip_different_evaluator_coexists() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<SingleRow> = ScoreLog::new(dir.path().join("eval.csv"));
        log.append(&single_row("kay", "a.wav", 70)).unwrap();
        log.append(&single_row("lee", "a.wav", 40)).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 2);
    }

    #[test]
    fn round_trips_fields_needing_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<SingleRow> = ScoreLog::new(dir.path().join("eval.csv"));
        let row = single_row("kay", "a.wav", 88);
        log.append(&row).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![row]);
    }

    #[test]
    fn read_all_rejects_foreign_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.csv");
        std::fs::write(&path, "who,what\nx,y\n").unwrap();
        let log: ScoreLog<SingleRow> = ScoreLog::new(&path);
        assert!(log.read_all().is_err());
    }

    #[test]
    fn compare_row_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<CompareRow> = ScoreLog::new(dir.path().join("comp.csv"));
        let row = CompareRow {
            user_name: "kay".to_string(),
            baseline_model: "base_v1".to_string(),
            experimental_model: "exp_v2".to_string(),
            baseline_audio: "a.wav".to_string(),
            experimental_audio: "b.wav".to_string(),
            baseline_score: Score::new(40),
            experimental_score: Score::new(60),
            preference: Preference::Experimental,
            consistent: true,
            presented_first: PresentationOrder::ExperimentalFirst,
            timestamp: timestamp_now(),
        };
        log.append(&row).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![row]);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log: ScoreLog<CalibrationRow> = ScoreLog::new(dir.path().join("none.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }
}
