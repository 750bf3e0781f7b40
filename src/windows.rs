//! Response window derivation.
//!
//! For each trial, the window opens at the stimulus offset and closes at the
//! next stimulus onset (or the end of the recording for the last trial),
//! clipped to a maximum duration. Trials are gated on categorical metadata
//! conditions; tasks whose metadata lacks the relevant columns synthesize
//! them (see [`TaskKind::synthesized_conditions`]).
//!
//! The "next stimulus" boundary is the next positional entry in the full
//! stimulus sequence, not the next eligible one, so windows naturally abut
//! ineligible stimuli.

use crate::error::{EaError, EaResult};
use crate::model::{CueCondition, GoCondition, Interval, TaskKind, WindowMethod};
use crate::trial_info::TrialTable;

/// Categorical conditions for one trial, in trial order matching the
/// stimulus interval sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialConditions {
    pub go: GoCondition,
    pub cue: CueCondition,
}

/// Positional columns of the trial table, fixed by the acquisition layout.
const CUE_COLUMN: usize = 0;
const GO_COLUMN: usize = 2;

/// Resolve per-trial conditions for a task, reading the trial table only for
/// the columns the task does not synthesize.
pub fn conditions_for_task(task: TaskKind, table: &TrialTable) -> EaResult<Vec<TrialConditions>> {
    let n = table.len();
    let (go_override, cue_override) = task.synthesized_conditions();

    let cues: Vec<CueCondition> = match cue_override {
        Some(cue) => vec![cue; n],
        None => table
            .column_by_index(CUE_COLUMN)?
            .into_iter()
            .map(CueCondition::from_cell)
            .collect(),
    };
    let gos: Vec<GoCondition> = match go_override {
        Some(go) => vec![go; n],
        None => table
            .column_by_index(GO_COLUMN)?
            .into_iter()
            .map(GoCondition::from_cell)
            .collect(),
    };

    Ok(gos
        .into_iter()
        .zip(cues)
        .map(|(go, cue)| TrialConditions { go, cue })
        .collect())
}

/// Derive response windows from stimulus timing and trial conditions.
///
/// `trials` must be index-aligned with `stim_times` for gating tasks;
/// a length mismatch is rejected rather than silently mispairing trials.
/// Retrocue ignores `trials` entirely and windows every stimulus interval.
///
/// Every emitted window satisfies `end >= start` and
/// `end - start <= max_dur`; windows come out in trial order and there is at
/// most one per input stimulus interval.
pub fn compute_windows(
    stim_times: &[Interval],
    trials: &[TrialConditions],
    recording_dur: f64,
    max_dur: f64,
    method: WindowMethod,
    task: TaskKind,
) -> EaResult<Vec<Interval>> {
    let gated = task.gates_on_conditions();
    if gated && stim_times.len() != trials.len() {
        return Err(EaError::DataIntegrity(format!(
            "stimulus interval count ({}) does not match trial condition count ({})",
            stim_times.len(),
            trials.len()
        )));
    }

    let mut windows = Vec::new();
    for (i, stim) in stim_times.iter().enumerate() {
        if gated && !eligible(method, &trials[i]) {
            continue;
        }

        let label = match method {
            WindowMethod::Resp => stim.label.clone(),
            WindowMethod::Yes | WindowMethod::No => method.label().to_owned(),
        };

        let start = stim.end;
        // Last window runs to the end of the recording.
        let mut end = match stim_times.get(i + 1) {
            Some(next) => next.start,
            None => recording_dur,
        };
        if end - start > max_dur {
            end = start + max_dur;
        }
        windows.push(Interval::new(start, end.max(start), label));
    }
    Ok(windows)
}

fn eligible(method: WindowMethod, trial: &TrialConditions) -> bool {
    if trial.go != GoCondition::Speak {
        return false;
    }
    match method {
        WindowMethod::Resp => matches!(
            trial.cue,
            CueCondition::Repeat | CueCondition::Listen | CueCondition::ListenSpeak
        ),
        WindowMethod::Yes | WindowMethod::No => trial.cue == CueCondition::YesNo,
    }
}
