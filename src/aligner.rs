//! External forced-aligner boundary (Montreal Forced Aligner).
//!
//! The aligner is a black box invoked as a subprocess: it consumes an input
//! directory holding one audio file and one TextGrid per speaker and writes
//! aligned TextGrids to an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EaError, EaResult};
use crate::process::run_command;

pub const ALIGNER_PROGRAM: &str = "mfa";

/// Per-patient aligner directory layout, rooted under `<patient>/mfa`.
#[derive(Debug, Clone)]
pub struct AlignerDirs {
    pub base: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl AlignerDirs {
    /// Create (idempotently) the `mfa/`, `mfa/input_mfa/` and
    /// `mfa/output_mfa/` directories for a patient.
    pub fn create(patient_dir: &Path) -> EaResult<Self> {
        let base = patient_dir.join("mfa");
        let input = base.join("input_mfa");
        let output = base.join("output_mfa");
        fs::create_dir_all(&input)?;
        fs::create_dir_all(&output)?;
        Ok(Self {
            base,
            input,
            output,
        })
    }
}

/// Copy the audio file and its transcript TextGrid into the aligner input
/// directory, overwriting any previous staging.
pub fn stage_input(dirs: &AlignerDirs, wav_path: &Path, textgrid_path: &Path) -> EaResult<()> {
    for source in [wav_path, textgrid_path] {
        if !source.is_file() {
            return Err(EaError::MissingArtifact(source.to_path_buf()));
        }
        let name = source
            .file_name()
            .ok_or_else(|| EaError::MissingArtifact(source.to_path_buf()))?;
        fs::copy(source, dirs.input.join(name))?;
    }
    Ok(())
}

/// Run `mfa align` on the staged input directory.
///
/// A non-zero exit is a stage failure carrying the aligner's stderr. On
/// success the aligned TextGrid named after `session` must exist in the
/// output directory.
pub fn run_align(
    dirs: &AlignerDirs,
    dict: &str,
    model: &str,
    session: &str,
) -> EaResult<PathBuf> {
    let args = vec![
        "align".to_owned(),
        "--clean".to_owned(),
        dirs.input.display().to_string(),
        dict.to_owned(),
        model.to_owned(),
        dirs.output.display().to_string(),
    ];
    run_command(ALIGNER_PROGRAM, &args, None)?;

    let aligned = dirs.output.join(format!("{session}.TextGrid"));
    if !aligned.is_file() {
        return Err(EaError::MissingArtifact(aligned));
    }
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{run_align, stage_input, AlignerDirs};
    use crate::error::EaError;
    use crate::process::command_exists;

    #[test]
    fn create_builds_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AlignerDirs::create(dir.path()).unwrap();
        assert!(dirs.base.is_dir());
        assert!(dirs.input.is_dir());
        assert!(dirs.output.is_dir());
        // idempotent
        AlignerDirs::create(dir.path()).unwrap();
    }

    #[test]
    fn stage_input_copies_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AlignerDirs::create(dir.path()).unwrap();
        let wav = dir.path().join("allblocks.wav");
        let tg = dir.path().join("allblocks.TextGrid");
        fs::write(&wav, b"RIFF").unwrap();
        fs::write(&tg, "grid").unwrap();

        stage_input(&dirs, &wav, &tg).unwrap();
        assert!(dirs.input.join("allblocks.wav").is_file());
        assert!(dirs.input.join("allblocks.TextGrid").is_file());
    }

    #[test]
    fn stage_input_missing_source_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AlignerDirs::create(dir.path()).unwrap();
        let tg = dir.path().join("allblocks.TextGrid");
        fs::write(&tg, "grid").unwrap();

        let err = stage_input(&dirs, &dir.path().join("missing.wav"), &tg).unwrap_err();
        assert!(matches!(err, EaError::MissingArtifact(_)), "got: {err:?}");
    }

    #[test]
    fn run_align_without_aligner_installed_is_command_missing() {
        if command_exists(super::ALIGNER_PROGRAM) {
            // environment actually has mfa; nothing to assert here
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let dirs = AlignerDirs::create(dir.path()).unwrap();
        let err = run_align(&dirs, "english_us_arpa", "english_us_arpa", "allblocks")
            .unwrap_err();
        assert!(matches!(err, EaError::CommandMissing { .. }), "got: {err:?}");
    }
}
