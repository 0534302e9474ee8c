//! Shared server state: the manifest, the serve config, and the live
//! sessions keyed by cookie id.

use audition_core::calibration::CalibrationSession;
use audition_core::config::AppConfig;
use audition_core::log::{CalibrationRow, CompareRow, ScoreLog, SingleRow};
use audition_core::manifest::Manifest;
use audition_core::session::{CompareSession, SingleSession};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Which variant this server instance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Compare,
    Calibrate,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Compare => "compare",
            Mode::Calibrate => "calibrate",
        }
    }

    /// Where an evaluator lands after entering their name.
    pub fn landing_path(self) -> &'static str {
        match self {
            Mode::Single => "/eval",
            Mode::Compare => "/compare",
            Mode::Calibrate => "/calibrate",
        }
    }
}

pub enum Session {
    Single(SingleSession),
    Compare(CompareSession),
    Calibration(CalibrationSession),
}

pub struct ServerState {
    pub mode: Mode,
    pub config: AppConfig,
    /// Absent in calibrate mode, which rates fixed reference clips.
    pub manifest: Option<Manifest>,
    pub sessions: RwLock<HashMap<String, Session>>,
}

impl ServerState {
    pub fn new(mode: Mode, config: AppConfig, manifest: Option<Manifest>) -> Self {
        Self {
            mode,
            config,
            manifest,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn single_log(&self) -> ScoreLog<SingleRow> {
        ScoreLog::new(self.config.single_log_path())
    }

    pub fn compare_log(&self) -> ScoreLog<CompareRow> {
        ScoreLog::new(self.config.compare_log_path())
    }

    pub fn calibration_log(&self) -> ScoreLog<CalibrationRow> {
        ScoreLog::new(self.config.calibration_log_path())
    }

    /// Create a session for the active mode and hand back its id.
    pub async fn open_session(&self, user_name: String) -> String {
        let session = match self.mode {
            Mode::Single => Session::Single(SingleSession::new(user_name)),
            Mode::Compare => {
                let manifest = self.manifest.as_ref();
                let empty = Manifest {
                    models: Vec::new(),
                    rows: Vec::new(),
                };
                Session::Compare(CompareSession::new(
                    user_name,
                    manifest.unwrap_or(&empty),
                ))
            }
            Mode::Calibrate => Session::Calibration(CalibrationSession::new(
                user_name,
                &mut rand::thread_rng(),
            )),
        };
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.write().await.insert(id.clone(), session);
        id
    }
}
