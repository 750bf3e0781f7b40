//! Core data model: labeled time intervals, cue events, task kinds, and the
//! categorical trial conditions extracted from trial metadata.

use serde::{Deserialize, Serialize};

use crate::error::{EaError, EaResult};

/// A labeled time span in seconds. Sequences of intervals are ordered by
/// start time; downstream consumers assume but do not verify this ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub label: String,
}

impl Interval {
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A timestamped trial onset marker carrying a stimulus identifier, read in
/// onset order from a per-patient `cue_events.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct CueEvent {
    pub start: f64,
    pub end: f64,
    pub stimulus: String,
}

impl CueEvent {
    /// Extract the token portion of a stimulus identifier of the form
    /// `<prefix>_<token>[.ext]` (e.g. `cue_dog.wav` -> `dog`).
    pub fn token(&self) -> EaResult<&str> {
        let after = self
            .stimulus
            .split('_')
            .nth(1)
            .ok_or_else(|| {
                EaError::DataIntegrity(format!(
                    "stimulus identifier `{}` has no token segment",
                    self.stimulus
                ))
            })?;
        Ok(after.split('.').next().unwrap_or(after))
    }
}

/// Closed set of supported experiment tasks. Each variant carries its own
/// condition-synthesis rule (see [`TaskKind::synthesized_conditions`]) so the
/// windower never branches on task-name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SentenceRep,
    PhonemeSequencing,
    PictureNaming,
    LexicalRepeatIntraop,
    Retrocue,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SentenceRep => "sentence_rep",
            Self::PhonemeSequencing => "phoneme_sequencing",
            Self::PictureNaming => "picture_naming",
            Self::LexicalRepeatIntraop => "lexical_repeat_intraop",
            Self::Retrocue => "retrocue",
        }
    }

    /// Picture naming is the only task whose stimulus modality varies per
    /// trial; every other task is sound-cued throughout.
    #[must_use]
    pub fn uses_trial_modality(self) -> bool {
        matches!(self, Self::PictureNaming)
    }

    /// Whether the response windower gates trials on metadata conditions at
    /// all. Retrocue windows every labeled stimulus interval.
    #[must_use]
    pub fn gates_on_conditions(self) -> bool {
        !matches!(self, Self::Retrocue)
    }

    /// Conditions synthesized for tasks whose metadata lacks the relevant
    /// columns. Returns `(go, cue)` overrides; `None` means read the column
    /// from the trial table.
    #[must_use]
    pub fn synthesized_conditions(self) -> (Option<GoCondition>, Option<CueCondition>) {
        match self {
            // No go column exists in picture-naming metadata; every trial
            // expects a spoken response.
            Self::PictureNaming => (Some(GoCondition::Speak), None),
            // Intraop metadata carries neither column; all trials are
            // listen-then-repeat.
            Self::LexicalRepeatIntraop => {
                (Some(GoCondition::Speak), Some(CueCondition::Listen))
            }
            _ => (None, None),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Labeling method for response windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMethod {
    /// Window label carries the stimulus token.
    Resp,
    /// Forced yes/no trials: every window is labeled `yes`.
    Yes,
    /// Forced yes/no trials: every window is labeled `no`.
    No,
}

impl WindowMethod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Resp => "resp",
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Go condition column from trial metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoCondition {
    Speak,
    Other(String),
}

impl GoCondition {
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "Speak" => Self::Speak,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Cue condition column from trial metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueCondition {
    Repeat,
    Listen,
    ListenSpeak,
    YesNo,
    Other(String),
}

impl CueCondition {
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "Repeat" => Self::Repeat,
            "Listen" => Self::Listen,
            "ListenSpeak" => Self::ListenSpeak,
            "Yes/No" => Self::YesNo,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Stimulus modality for one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modality {
    Sound,
    Other(String),
}

impl Modality {
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "sound" => Self::Sound,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_duration() {
        let iv = Interval::new(1.5, 3.0, "dog");
        assert!((iv.duration() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn cue_event_token_strips_prefix_and_extension() {
        let cue = CueEvent {
            start: 0.0,
            end: 1.0,
            stimulus: "cue_dog.wav".to_owned(),
        };
        assert_eq!(cue.token().unwrap(), "dog");
    }

    #[test]
    fn cue_event_token_without_extension() {
        let cue = CueEvent {
            start: 0.0,
            end: 1.0,
            stimulus: "stim_hoot".to_owned(),
        };
        assert_eq!(cue.token().unwrap(), "hoot");
    }

    #[test]
    fn cue_event_token_missing_segment_is_error() {
        let cue = CueEvent {
            start: 0.0,
            end: 1.0,
            stimulus: "dog.wav".to_owned(),
        };
        let err = cue.token().unwrap_err();
        assert!(matches!(err, EaError::DataIntegrity(_)), "got: {err:?}");
    }

    #[test]
    fn task_kind_serde_snake_case() {
        let kind: TaskKind = serde_json::from_str("\"picture_naming\"").unwrap();
        assert_eq!(kind, TaskKind::PictureNaming);
        assert_eq!(
            serde_json::to_string(&TaskKind::LexicalRepeatIntraop).unwrap(),
            "\"lexical_repeat_intraop\""
        );
    }

    #[test]
    fn synthesized_conditions_per_task() {
        assert_eq!(
            TaskKind::PictureNaming.synthesized_conditions(),
            (Some(GoCondition::Speak), None)
        );
        assert_eq!(
            TaskKind::LexicalRepeatIntraop.synthesized_conditions(),
            (Some(GoCondition::Speak), Some(CueCondition::Listen))
        );
        assert_eq!(
            TaskKind::SentenceRep.synthesized_conditions(),
            (None, None)
        );
    }

    #[test]
    fn retrocue_skips_condition_gate() {
        assert!(!TaskKind::Retrocue.gates_on_conditions());
        assert!(TaskKind::SentenceRep.gates_on_conditions());
    }

    #[test]
    fn condition_parsing_from_cells() {
        assert_eq!(GoCondition::from_cell("Speak"), GoCondition::Speak);
        assert_eq!(
            GoCondition::from_cell(""),
            GoCondition::Other(String::new())
        );
        assert_eq!(CueCondition::from_cell("Yes/No"), CueCondition::YesNo);
        assert_eq!(
            CueCondition::from_cell("ListenSpeak"),
            CueCondition::ListenSpeak
        );
        assert_eq!(Modality::from_cell("sound"), Modality::Sound);
        assert_eq!(
            Modality::from_cell("visual"),
            Modality::Other("visual".to_owned())
        );
    }
}
