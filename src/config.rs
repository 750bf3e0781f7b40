//! Pipeline configuration.
//!
//! Loaded from a JSON file into a raw struct with optional fields, then
//! validated once at startup. All missing mandatory keys are collected and
//! reported together in a single error rather than one at a time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EaError, EaResult};
use crate::model::TaskKind;

pub const DEFAULT_ALIGNER_DICT: &str = "english_us_arpa";
pub const DEFAULT_ALIGNER_MODEL: &str = "english_us_arpa";

/// Which patients a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientSelection {
    /// Scan the patient directory for entries matching any of the name
    /// prefixes.
    All { prefixes: Vec<String> },
    /// An explicit list of patient identifiers.
    List(Vec<String>),
}

impl PatientSelection {
    /// `"all"` selects by prefix scan; anything else is a comma-separated
    /// explicit list.
    pub fn from_spec(spec: &str, prefixes: Vec<String>) -> Self {
        if spec == "all" {
            Self::All { prefixes }
        } else {
            Self::List(
                spec.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub kind: TaskKind,
    /// Maximum response window duration in seconds.
    pub max_dur: f64,
    /// Directory of stimulus annotation template files.
    pub stim_dir: PathBuf,
    pub aligner_dict: String,
    pub aligner_model: String,
    /// Emit additional yes/no window files for forced yes/no trials.
    pub annotate_yesno: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub patient_dir: PathBuf,
    pub patients: PatientSelection,
    pub task: TaskConfig,
    /// Maximum gap in seconds between stimulus intervals for them to be
    /// coalesced into one.
    pub merge_thresh: f64,
    /// Stop each patient after stimulus annotation.
    pub only_stims: bool,
    /// Propagate the first per-patient failure instead of isolating it.
    pub debug_mode: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    patient_dir: Option<PathBuf>,
    patients: Option<String>,
    patient_prefixes: Option<Vec<String>>,
    task: Option<RawTaskConfig>,
    merge_thresh: Option<f64>,
    only_stims: Option<bool>,
    debug_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTaskConfig {
    name: Option<TaskKind>,
    max_dur: Option<f64>,
    stim_dir: Option<PathBuf>,
    aligner_dict: Option<String>,
    aligner_model: Option<String>,
    annotate_yesno: Option<bool>,
}

impl Config {
    pub fn load(path: &Path) -> EaResult<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawConfig = serde_json::from_str(&text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> EaResult<Self> {
        let mut missing = Vec::new();

        let patient_dir = required(raw.patient_dir, "patient_dir", &mut missing);
        let merge_thresh = required(raw.merge_thresh, "merge_thresh", &mut missing);

        let task = raw.task.unwrap_or_else(|| {
            missing.push("task".to_owned());
            RawTaskConfig::default()
        });
        let kind = required(task.name, "task.name", &mut missing);
        let max_dur = required(task.max_dur, "task.max_dur", &mut missing);
        let stim_dir = required(task.stim_dir, "task.stim_dir", &mut missing);

        if !missing.is_empty() {
            return Err(EaError::Config { missing });
        }

        let patients = PatientSelection::from_spec(
            raw.patients.as_deref().unwrap_or("all"),
            raw.patient_prefixes.unwrap_or_default(),
        );

        Ok(Self {
            patient_dir: patient_dir.expect("validated"),
            patients,
            task: TaskConfig {
                kind: kind.expect("validated"),
                max_dur: max_dur.expect("validated"),
                stim_dir: stim_dir.expect("validated"),
                aligner_dict: task
                    .aligner_dict
                    .unwrap_or_else(|| DEFAULT_ALIGNER_DICT.to_owned()),
                aligner_model: task
                    .aligner_model
                    .unwrap_or_else(|| DEFAULT_ALIGNER_MODEL.to_owned()),
                annotate_yesno: task.annotate_yesno.unwrap_or(false),
            },
            merge_thresh: merge_thresh.expect("validated"),
            only_stims: raw.only_stims.unwrap_or(false),
            debug_mode: raw.debug_mode.unwrap_or(false),
        })
    }
}

fn required<T>(value: Option<T>, key: &str, missing: &mut Vec<String>) -> Option<T> {
    if value.is_none() {
        missing.push(key.to_owned());
    }
    value
}
