use std::path::PathBuf;

use thiserror::Error;

pub type EaResult<T> = Result<T, EaError>;

#[derive(Debug, Error)]
pub enum EaError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing mandatory config key(s): {}", missing.join(", "))]
    Config { missing: Vec<String> },

    #[error("parse failure in `{path}` line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("missing command `{command}` on PATH")]
    CommandMissing { command: String },

    #[error("command failed: `{command}` (status: {status}){stderr_suffix}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr_suffix: String,
    },

    #[error("missing expected artifact at `{0}`")]
    MissingArtifact(PathBuf),

    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EaError {
    #[must_use]
    pub fn from_command_failure(command: String, status: i32, stderr: String) -> Self {
        let trimmed = stderr.trim();
        let stderr_suffix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("; stderr: {trimmed}")
        };
        Self::CommandFailed {
            command,
            status,
            stderr_suffix,
        }
    }

    pub fn parse(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Stable, unique, machine-readable code for every variant.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "EA-IO",
            Self::Json(_) => "EA-JSON",
            Self::Config { .. } => "EA-CONFIG",
            Self::Parse { .. } => "EA-PARSE",
            Self::CommandMissing { .. } => "EA-CMD-MISSING",
            Self::CommandFailed { .. } => "EA-CMD-FAILED",
            Self::MissingArtifact(_) => "EA-MISSING-ARTIFACT",
            Self::DataIntegrity(_) => "EA-DATA-INTEGRITY",
            Self::InvalidRequest(_) => "EA-INVALID-REQUEST",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EaError;

    fn all_variants() -> Vec<EaError> {
        vec![
            EaError::Io(std::io::Error::other("disk fail")),
            EaError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err()),
            EaError::Config {
                missing: vec!["patient_dir".to_owned()],
            },
            EaError::Parse {
                path: std::path::PathBuf::from("cue_events.txt"),
                line: 3,
                message: "bad float".to_owned(),
            },
            EaError::CommandMissing {
                command: "mfa".to_owned(),
            },
            EaError::CommandFailed {
                command: "mfa align".to_owned(),
                status: 1,
                stderr_suffix: String::new(),
            },
            EaError::MissingArtifact(std::path::PathBuf::from("out.TextGrid")),
            EaError::DataIntegrity("empty merge input".to_owned()),
            EaError::InvalidRequest("bad".to_owned()),
        ]
    }

    #[test]
    fn error_codes_are_unique_and_prefixed() {
        let errors = all_variants();
        assert_eq!(errors.len(), 9, "test should cover every EaError variant");

        let mut seen = std::collections::HashSet::new();
        for error in &errors {
            let code = error.error_code();
            assert!(code.starts_with("EA-"), "bad prefix: {code}");
            assert!(seen.insert(code), "duplicate error_code: {code}");
        }
    }

    #[test]
    fn config_error_lists_all_missing_keys() {
        let err = EaError::Config {
            missing: vec![
                "patient_dir".to_owned(),
                "task.max_dur".to_owned(),
                "merge_thresh".to_owned(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("patient_dir"), "got: {text}");
        assert!(text.contains("task.max_dur"), "got: {text}");
        assert!(text.contains("merge_thresh"), "got: {text}");
    }

    #[test]
    fn from_command_failure_with_empty_stderr() {
        let err = EaError::from_command_failure("cmd".to_owned(), 1, String::new());
        let text = err.to_string();
        assert!(text.contains("status: 1"));
        assert!(!text.contains("stderr"));
    }

    #[test]
    fn from_command_failure_trims_stderr() {
        let err = EaError::from_command_failure("mfa align".to_owned(), 2, "  boom  \n".to_owned());
        let text = err.to_string();
        assert!(text.contains("mfa align"));
        assert!(text.contains("stderr: boom"), "should trim stderr: {text}");
    }

    #[test]
    fn from_command_failure_whitespace_only_stderr_treated_as_empty() {
        let err = EaError::from_command_failure("cmd".to_owned(), 1, "   \n\t  ".to_owned());
        assert!(!err.to_string().contains("stderr"));
    }

    #[test]
    fn parse_error_names_file_and_line() {
        let err = EaError::parse(std::path::Path::new("dog_words.txt"), 7, "expected 3 fields");
        let text = err.to_string();
        assert!(text.contains("dog_words.txt"), "got: {text}");
        assert!(text.contains("line 7"), "got: {text}");
        assert!(text.contains("expected 3 fields"), "got: {text}");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EaError = io_err.into();
        assert!(matches!(err, EaError::Io(_)));
        assert_eq!(err.error_code(), "EA-IO");
    }

    #[test]
    fn ea_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<EaError>();
        assert_sync::<EaError>();
    }
}
