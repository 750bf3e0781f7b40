//! Minimal Praat TextGrid codec (long text format).
//!
//! Only the three fields this pipeline carries are modeled: interval start,
//! end, and label, grouped into named interval tiers. Anything else in a
//! TextGrid document (point tiers, per-tier bounds) is ignored on read.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{EaError, EaResult};
use crate::model::Interval;

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTier {
    pub name: String,
    pub intervals: Vec<Interval>,
}

impl IntervalTier {
    /// Tier intervals with empty labels dropped (the inter-word padding the
    /// aligner emits between real tokens).
    #[must_use]
    pub fn labeled_intervals(&self) -> Vec<Interval> {
        self.intervals
            .iter()
            .filter(|iv| !iv.label.is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextGrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<IntervalTier>,
}

impl TextGrid {
    /// Build a single-tier grid from a flat interval sequence. The grid end
    /// time defaults to the latest interval end.
    pub fn from_intervals(tier_name: impl Into<String>, intervals: &[Interval]) -> Self {
        let xmax = intervals.iter().fold(0.0_f64, |acc, iv| acc.max(iv.end));
        Self {
            xmin: 0.0,
            xmax,
            tiers: vec![IntervalTier {
                name: tier_name.into(),
                intervals: intervals.to_vec(),
            }],
        }
    }

    #[must_use]
    pub fn with_xmax(mut self, xmax: f64) -> Self {
        self.xmax = xmax;
        self
    }

    pub fn tier(&self, name: &str) -> Option<&IntervalTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn read(path: &Path) -> EaResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn write(&self, path: &Path) -> EaResult<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("File type = \"ooTextFile\"\n");
        out.push_str("Object class = \"TextGrid\"\n\n");
        let _ = writeln!(out, "xmin = {}", self.xmin);
        let _ = writeln!(out, "xmax = {}", self.xmax);
        out.push_str("tiers? <exists>\n");
        let _ = writeln!(out, "size = {}", self.tiers.len());
        out.push_str("item []:\n");
        for (t_idx, tier) in self.tiers.iter().enumerate() {
            let _ = writeln!(out, "    item [{}]:", t_idx + 1);
            out.push_str("        class = \"IntervalTier\"\n");
            let _ = writeln!(out, "        name = \"{}\"", escape(&tier.name));
            let _ = writeln!(out, "        xmin = {}", self.xmin);
            let _ = writeln!(out, "        xmax = {}", self.xmax);
            let _ = writeln!(out, "        intervals: size = {}", tier.intervals.len());
            for (i_idx, iv) in tier.intervals.iter().enumerate() {
                let _ = writeln!(out, "        intervals [{}]:", i_idx + 1);
                let _ = writeln!(out, "            xmin = {}", iv.start);
                let _ = writeln!(out, "            xmax = {}", iv.end);
                let _ = writeln!(out, "            text = \"{}\"", escape(&iv.label));
            }
        }
        out
    }

    pub fn parse(text: &str, path: &Path) -> EaResult<Self> {
        let mut grid = Self {
            xmin: 0.0,
            xmax: 0.0,
            tiers: Vec::new(),
        };

        let mut in_interval_tier = false;
        // (start, end) of the interval currently being collected.
        let mut pending: Option<(Option<f64>, Option<f64>)> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let lineno = idx + 1;

            if let Some(value) = assignment(line, "class") {
                in_interval_tier = unquote(value) == "IntervalTier";
                pending = None;
            } else if let Some(value) = assignment(line, "name") {
                if in_interval_tier {
                    grid.tiers.push(IntervalTier {
                        name: unquote(value),
                        intervals: Vec::new(),
                    });
                }
            } else if line.starts_with("intervals [") {
                if in_interval_tier {
                    pending = Some((None, None));
                }
            } else if let Some(value) = assignment(line, "xmin") {
                match pending {
                    Some((ref mut start, _)) => {
                        *start = Some(parse_float(value, path, lineno)?);
                    }
                    None if grid.tiers.is_empty() => {
                        grid.xmin = parse_float(value, path, lineno)?;
                    }
                    None => {}
                }
            } else if let Some(value) = assignment(line, "xmax") {
                match pending {
                    Some((_, ref mut end)) => {
                        *end = Some(parse_float(value, path, lineno)?);
                    }
                    None if grid.tiers.is_empty() => {
                        grid.xmax = parse_float(value, path, lineno)?;
                    }
                    None => {}
                }
            } else if let Some(value) = assignment(line, "text") {
                let (start, end) = pending.take().ok_or_else(|| {
                    EaError::parse(path, lineno, "interval text outside an intervals block")
                })?;
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(EaError::parse(
                        path,
                        lineno,
                        "interval missing xmin or xmax",
                    ));
                };
                let tier = grid.tiers.last_mut().ok_or_else(|| {
                    EaError::parse(path, lineno, "interval outside a tier")
                })?;
                tier.intervals.push(Interval::new(start, end, unquote(value)));
            }
        }

        Ok(grid)
    }
}

fn assignment<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start();
    let value = rest.strip_prefix('=')?;
    Some(value.trim())
}

fn unquote(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.replace("\"\"", "\"")
}

fn escape(text: &str) -> String {
    text.replace('"', "\"\"")
}

fn parse_float(field: &str, path: &Path, line: usize) -> EaResult<f64> {
    field
        .parse::<f64>()
        .map_err(|_| EaError::parse(path, line, format!("invalid float `{field}`")))
}
