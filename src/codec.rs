//! Flat interval text codec.
//!
//! One record per line, tab-separated: `<start>\t<end>\t<label>`. Lines with
//! fewer than three fields carry no label and are skipped on read.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{EaError, EaResult};
use crate::model::Interval;

pub fn read_intervals(path: &Path) -> EaResult<Vec<Interval>> {
    let text = fs::read_to_string(path)?;
    parse_intervals(&text, path)
}

pub fn parse_intervals(text: &str, path: &Path) -> EaResult<Vec<Interval>> {
    let mut intervals = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        // Unlabeled records are skipped, not rejected.
        if fields.len() < 3 {
            continue;
        }
        let start = parse_float(fields[0], path, idx + 1)?;
        let end = parse_float(fields[1], path, idx + 1)?;
        intervals.push(Interval::new(start, end, fields[2]));
    }
    Ok(intervals)
}

pub fn write_intervals(path: &Path, intervals: &[Interval]) -> EaResult<()> {
    fs::write(path, render_intervals(intervals))?;
    Ok(())
}

pub fn render_intervals(intervals: &[Interval]) -> String {
    let mut out = String::new();
    for iv in intervals {
        let _ = writeln!(out, "{}\t{}\t{}", iv.start, iv.end, iv.label);
    }
    out
}

fn parse_float(field: &str, path: &Path, line: usize) -> EaResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| EaError::parse(path, line, format!("invalid float `{field}`")))
}
