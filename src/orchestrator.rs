//! Per-patient pipeline driver.
//!
//! Each patient runs the fixed stage sequence: stimulus annotation, interval
//! merging, response windowing, TextGrid conversion, aligner input staging,
//! the external aligner, and output extraction. In production mode a stage
//! failure marks the patient as failed and the batch continues with the next
//! patient; in debug mode the first failure propagates and halts the run.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use crate::aligner::{self, AlignerDirs};
use crate::annotations::{AnnotationStore, DEFAULT_TIERS};
use crate::audio;
use crate::codec;
use crate::config::{Config, PatientSelection};
use crate::error::{EaError, EaResult};
use crate::merge;
use crate::model::{Interval, Modality, WindowMethod};
use crate::stimulus;
use crate::textgrid::TextGrid;
use crate::trial_info::TrialTable;
use crate::windows;

/// Base name shared by the per-patient recording and its transcript.
pub const SESSION_NAME: &str = "allblocks";

/// Discrete per-patient pipeline stages, used for logging and failure
/// attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientStage {
    StimAnnotate,
    Merge,
    Window,
    Convert,
    PrepareInput,
    Align,
    ExtractOutput,
}

impl PatientStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::StimAnnotate => "stim_annotate",
            Self::Merge => "merge",
            Self::Window => "window",
            Self::Convert => "convert",
            Self::PrepareInput => "prepare_input",
            Self::Align => "align",
            Self::ExtractOutput => "extract_output",
        }
    }
}

impl fmt::Display for PatientStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at_rfc3339: String,
    pub processed: usize,
    pub failed: Vec<String>,
    pub elapsed_secs: f64,
}

pub struct Engine {
    config: Config,
    store: AnnotationStore,
}

impl Engine {
    /// Load the stimulus annotation templates and build the engine. The
    /// store is loaded once and shared across all patients in the run.
    pub fn new(config: Config) -> EaResult<Self> {
        let store = AnnotationStore::load(&config.task.stim_dir, DEFAULT_TIERS)?;
        if store.is_empty() {
            tracing::warn!(
                stim_dir = %config.task.stim_dir.display(),
                "annotation template store is empty"
            );
        }
        Ok(Self { config, store })
    }

    /// Run the batch over all selected patients.
    pub fn run(&self) -> EaResult<BatchReport> {
        let started = Instant::now();
        let started_at_rfc3339 = Utc::now().to_rfc3339();

        let patients = self.resolve_patients()?;
        tracing::info!(
            count = patients.len(),
            task = self.config.task.kind.label(),
            debug_mode = self.config.debug_mode,
            "starting batch"
        );

        let mut failed = Vec::new();
        for patient in &patients {
            tracing::info!(patient, "processing patient");
            if self.config.debug_mode {
                self.run_patient(patient)?;
            } else if let Err(error) = self.run_patient(patient) {
                tracing::error!(
                    patient,
                    error = %error,
                    code = error.error_code(),
                    "patient failed; continuing with next"
                );
                failed.push(patient.clone());
            }
        }

        Ok(BatchReport {
            started_at_rfc3339,
            processed: patients.len(),
            failed,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    fn resolve_patients(&self) -> EaResult<Vec<String>> {
        match &self.config.patients {
            PatientSelection::List(list) => Ok(list.clone()),
            PatientSelection::All { prefixes } => {
                let mut found = Vec::new();
                for entry in fs::read_dir(&self.config.patient_dir)? {
                    let entry = entry?;
                    if !entry.file_type()?.is_dir() {
                        continue;
                    }
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else {
                        continue;
                    };
                    if prefixes
                        .iter()
                        .any(|p| name.starts_with(p.trim_end_matches('*')))
                    {
                        found.push(name.to_owned());
                    }
                }
                found.sort();
                Ok(found)
            }
        }
    }

    /// The full per-patient stage sequence. Re-runs overwrite every
    /// intermediate artifact, so a previously failed patient restarts from
    /// scratch.
    fn run_patient(&self, patient: &str) -> EaResult<()> {
        let patient_dir = self.config.patient_dir.join(patient);
        let task = self.config.task.kind;
        let dirs = AlignerDirs::create(&patient_dir)?;

        let tiered = run_stage(patient, PatientStage::StimAnnotate, || {
            let cues = stimulus::load_cue_events(&patient_dir.join("cue_events.txt"))?;
            let modalities = if task.uses_trial_modality() {
                let table = TrialTable::load(&patient_dir.join("trial_info.tsv"))?;
                table
                    .column_by_name("modality")?
                    .into_iter()
                    .map(Modality::from_cell)
                    .collect()
            } else {
                vec![Modality::Sound; cues.len()]
            };
            let tiered = stimulus::annotate(&self.store, &cues, &modalities)?;
            write_tiered(&dirs, "mfa_stim", &tiered)?;
            Ok(tiered)
        })?;

        if self.config.only_stims {
            tracing::debug!(patient, "only_stims set; skipping remaining stages");
            return Ok(());
        }

        let merged = run_stage(patient, PatientStage::Merge, || {
            // merge operates on the word-level stimulus sequence
            let stim_words = tiered.get("words").ok_or_else(|| {
                EaError::DataIntegrity("no word-level stimulus annotations produced".to_owned())
            })?;
            let merged = merge::merge(stim_words, self.config.merge_thresh)?;
            codec::write_intervals(&patient_dir.join("merged_stim_times.txt"), &merged)?;
            Ok(merged)
        })?;

        let wav_path = patient_dir.join(format!("{SESSION_NAME}.wav"));
        let (resp_windows, recording_dur) = run_stage(patient, PatientStage::Window, || {
            let recording_dur = audio::recording_duration_seconds(&wav_path)?;
            let trials = if task.gates_on_conditions() {
                let table = TrialTable::load(&patient_dir.join("trial_info.tsv"))?;
                windows::conditions_for_task(task, &table)?
            } else {
                Vec::new()
            };
            let resp = windows::compute_windows(
                &merged,
                &trials,
                recording_dur,
                self.config.task.max_dur,
                WindowMethod::Resp,
                task,
            )?;
            codec::write_intervals(&dirs.base.join("annotated_resp_windows.txt"), &resp)?;

            if self.config.task.annotate_yesno {
                for method in [WindowMethod::Yes, WindowMethod::No] {
                    let forced = windows::compute_windows(
                        &merged,
                        &trials,
                        recording_dur,
                        self.config.task.max_dur,
                        method,
                        task,
                    )?;
                    codec::write_intervals(
                        &dirs
                            .base
                            .join(format!("annotated_{}_windows.txt", method.label())),
                        &forced,
                    )?;
                }
            }
            Ok((resp, recording_dur))
        })?;

        let tg_path = patient_dir.join(format!("{SESSION_NAME}.TextGrid"));
        run_stage(patient, PatientStage::Convert, || {
            TextGrid::from_intervals("words", &resp_windows)
                .with_xmax(recording_dur)
                .write(&tg_path)
        })?;

        run_stage(patient, PatientStage::PrepareInput, || {
            aligner::stage_input(&dirs, &wav_path, &tg_path)
        })?;

        let aligned = run_stage(patient, PatientStage::Align, || {
            aligner::run_align(
                &dirs,
                &self.config.task.aligner_dict,
                &self.config.task.aligner_model,
                SESSION_NAME,
            )
        })?;

        run_stage(patient, PatientStage::ExtractOutput, || {
            let grid = TextGrid::read(&aligned)?;
            for tier_name in DEFAULT_TIERS {
                let tier = grid.tier(tier_name).ok_or_else(|| {
                    EaError::DataIntegrity(format!(
                        "tier `{tier_name}` not found in aligned TextGrid"
                    ))
                })?;
                codec::write_intervals(
                    &dirs.base.join(format!("mfa_resp_{tier_name}.txt")),
                    &tier.labeled_intervals(),
                )?;
            }
            Ok(())
        })?;

        tracing::info!(patient, "patient done");
        Ok(())
    }
}

fn write_tiered(
    dirs: &AlignerDirs,
    prefix: &str,
    tiered: &BTreeMap<String, Vec<Interval>>,
) -> EaResult<()> {
    for (tier, intervals) in tiered {
        codec::write_intervals(&dirs.base.join(format!("{prefix}_{tier}.txt")), intervals)?;
    }
    Ok(())
}

fn run_stage<T>(
    patient: &str,
    stage: PatientStage,
    body: impl FnOnce() -> EaResult<T>,
) -> EaResult<T> {
    tracing::debug!(patient, stage = stage.label(), "stage start");
    body().map_err(|error| {
        tracing::error!(patient, stage = stage.label(), error = %error, "stage failed");
        error
    })
}
