//! Recording duration via ffprobe.

use std::path::Path;

use crate::error::{EaError, EaResult};
use crate::process::run_command;

/// Duration of an audio file in seconds, as reported by ffprobe.
pub fn recording_duration_seconds(input: &Path) -> EaResult<f64> {
    if !input.is_file() {
        return Err(EaError::MissingArtifact(input.to_path_buf()));
    }

    let args = vec![
        "-v".to_owned(),
        "error".to_owned(),
        "-show_entries".to_owned(),
        "format=duration".to_owned(),
        "-of".to_owned(),
        "default=nokey=1:noprint_wrappers=1".to_owned(),
        input.display().to_string(),
    ];

    let output = run_command("ffprobe", &args, None)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_duration(&stdout).ok_or_else(|| {
        EaError::DataIntegrity(format!(
            "ffprobe reported an unusable duration for `{}`: `{}`",
            input.display(),
            stdout.trim()
        ))
    })
}

fn parse_probe_duration(stdout: &str) -> Option<f64> {
    let secs = stdout.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(secs)
}
