//! Preflight checks: is the manifest loadable, and do the clips it
//! references actually exist?

use crate::errors::{codes, Diagnostic};
use crate::manifest::{audio_path, Manifest};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidateReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidateReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

pub fn validate(manifest_path: &Path, audio_root: &Path) -> ValidateReport {
    let mut report = ValidateReport::default();

    if !manifest_path.exists() {
        report.diagnostics.push(
            Diagnostic::error(
                codes::E_MANIFEST_MISSING,
                format!("manifest not found: {}", manifest_path.display()),
            )
            .with_path(manifest_path.display().to_string()),
        );
        return report;
    }

    let manifest = match Manifest::load(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            report.diagnostics.push(
                Diagnostic::error(codes::E_MANIFEST_PARSE, e.to_string())
                    .with_path(manifest_path.display().to_string()),
            );
            return report;
        }
    };

    if manifest.models.is_empty() {
        report.diagnostics.push(Diagnostic::error(
            codes::E_NO_MODELS,
            "manifest has no model columns",
        ));
    }
    if manifest.rows.is_empty() {
        report.diagnostics.push(Diagnostic::error(
            codes::E_NO_ROWS,
            "manifest has no sample rows",
        ));
    }

    if !audio_root.exists() {
        report.diagnostics.push(
            Diagnostic::warning(
                codes::E_AUDIO_DIR_MISSING,
                format!("audio folder not found: {}", audio_root.display()),
            )
            .with_path(audio_root.display().to_string()),
        );
        return report;
    }

    for model in &manifest.models {
        let samples = manifest.valid_rows(model);
        if samples.is_empty() {
            report.diagnostics.push(Diagnostic::warning(
                codes::E_MODEL_EMPTY,
                format!("model {:?} has no takes; it will be skipped", model),
            ));
            continue;
        }
        for sample in samples {
            let path = audio_path(audio_root, model, &sample.audio_file);
            if !path.exists() {
                report.diagnostics.push(
                    Diagnostic::error(
                        codes::E_AUDIO_MISSING,
                        format!(
                            "clip referenced by row {} of model {:?} is missing: {}",
                            sample.row + 1,
                            model,
                            path.display()
                        ),
                    )
                    .with_path(path.display().to_string()),
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::codes;

    fn has_code(report: &ValidateReport, code: &str) -> bool {
        report.diagnostics.iter().any(|d| d.code == code)
    }

    #[test]
    fn missing_manifest_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate(&dir.path().join("nope.csv"), dir.path());
        assert_eq!(report.diagnostics.len(), 1);
        assert!(has_code(&report, codes::E_MANIFEST_MISSING));
        assert!(report.has_errors());
    }

    #[test]
    fn clean_setup_yields_no_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("list.csv");
        std::fs::write(&manifest, "transcriptions,m\nhello,a.wav\n").unwrap();
        std::fs::create_dir_all(dir.path().join("audios/m")).unwrap();
        std::fs::write(dir.path().join("audios/m/a.wav"), b"riff").unwrap();

        let report = validate(&manifest, &dir.path().join("audios"));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn missing_clip_is_an_error_empty_model_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("list.csv");
        std::fs::write(&manifest, "transcriptions,m,ghost\nhello,a.wav,\n").unwrap();
        std::fs::create_dir_all(dir.path().join("audios/m")).unwrap();

        let report = validate(&manifest, &dir.path().join("audios"));
        assert!(has_code(&report, codes::E_AUDIO_MISSING));
        assert!(has_code(&report, codes::E_MODEL_EMPTY));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn unparseable_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("list.csv");
        std::fs::write(&manifest, "no_transcriptions_here,m\nx,y\n").unwrap();
        let report = validate(&manifest, dir.path());
        assert!(has_code(&report, codes::E_MANIFEST_PARSE));
    }
}
