use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}

/// Stable diagnostic codes used by `validate` and surfaced in JSON output.
pub mod codes {
    pub const E_MANIFEST_MISSING: &str = "E_MANIFEST_MISSING";
    pub const E_MANIFEST_PARSE: &str = "E_MANIFEST_PARSE";
    pub const E_NO_MODELS: &str = "E_NO_MODELS";
    pub const E_NO_ROWS: &str = "E_NO_ROWS";
    pub const E_MODEL_EMPTY: &str = "E_MODEL_EMPTY";
    pub const E_AUDIO_DIR_MISSING: &str = "E_AUDIO_DIR_MISSING";
    pub const E_AUDIO_MISSING: &str = "E_AUDIO_MISSING";
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnostic {
    pub code: String,
    /// "error" or "warning".
    pub severity: String,
    pub message: String,
    /// File the finding refers to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: "error".to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: "warning".to_string(),
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}
