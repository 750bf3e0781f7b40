//! Stimulus annotation: place per-stimulus template intervals into a
//! patient's recording timeline at the cue onsets.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::annotations::AnnotationStore;
use crate::error::{EaError, EaResult};
use crate::model::{CueEvent, Interval, Modality};

/// Read a per-patient cue event file: one `start\tend\tstimulus` triple per
/// line, in onset order. Unlike interval files, an unreadable or malformed
/// cue file fails the whole patient.
pub fn load_cue_events(path: &Path) -> EaResult<Vec<CueEvent>> {
    let text = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(EaError::parse(
                path,
                idx + 1,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            ));
        }
        let start = parse_float(fields[0], path, idx + 1)?;
        let end = parse_float(fields[1], path, idx + 1)?;
        events.push(CueEvent {
            start,
            end,
            stimulus: fields[2].trim_end().to_owned(),
        });
    }
    Ok(events)
}

/// Map cue events through the template store to absolute-time labeled
/// intervals, one sequence per tier.
///
/// Sound-modality trials look up the template for the token extracted from
/// the stimulus identifier; one absolute interval is emitted per template
/// sub-interval, shifted by the cue onset. A missing template is logged and
/// skipped, never fatal. Non-sound trials emit the cue span with the raw
/// stimulus identifier as label. Output order follows cue-event order; no
/// re-sorting is performed.
pub fn annotate(
    store: &AnnotationStore,
    cues: &[CueEvent],
    modalities: &[Modality],
) -> EaResult<BTreeMap<String, Vec<Interval>>> {
    if cues.len() != modalities.len() {
        return Err(EaError::DataIntegrity(format!(
            "cue event count ({}) does not match trial modality count ({})",
            cues.len(),
            modalities.len()
        )));
    }

    let mut out = BTreeMap::new();
    for tier in store.tier_names() {
        let mut intervals = Vec::new();
        for (cue, modality) in cues.iter().zip(modalities) {
            match modality {
                Modality::Sound => {
                    let token = cue.token()?;
                    let Some(template) = store.template(tier, token) else {
                        tracing::warn!(tier, stimulus = token, "no annotation template");
                        continue;
                    };
                    for sub in template {
                        intervals.push(Interval::new(
                            cue.start + sub.start,
                            cue.start + sub.end,
                            sub.label.clone(),
                        ));
                    }
                }
                Modality::Other(_) => {
                    intervals.push(Interval::new(cue.start, cue.end, cue.stimulus.clone()));
                }
            }
        }
        out.insert(tier.to_owned(), intervals);
    }
    Ok(out)
}

fn parse_float(field: &str, path: &Path, line: usize) -> EaResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| EaError::parse(path, line, format!("invalid float `{field}`")))
}
