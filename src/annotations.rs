//! Stimulus annotation template store.
//!
//! A directory of per-label interval files, one tier per file suffix:
//! `<label>_<tier>.txt` (e.g. `dog_words.txt`, `dog_phones.txt`). Times in a
//! template are relative to stimulus onset. Each tier owns an independent
//! label namespace.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{EaError, EaResult};
use crate::model::Interval;

pub const DEFAULT_TIERS: &[&str] = &["words", "phones"];

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    tiers: BTreeMap<String, BTreeMap<String, Vec<Interval>>>,
}

impl AnnotationStore {
    /// Scan `dir` for `*_<tier>.txt` files for each requested tier and parse
    /// them into per-tier label maps. The label is the filename prefix before
    /// the first underscore. Malformed lines fail the load with an error
    /// naming the file and line.
    pub fn load(dir: &Path, tier_names: &[&str]) -> EaResult<Self> {
        let mut tiers: BTreeMap<String, BTreeMap<String, Vec<Interval>>> = tier_names
            .iter()
            .map(|t| ((*t).to_owned(), BTreeMap::new()))
            .collect();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            for tier in tier_names {
                let suffix = format!("_{tier}.txt");
                if !file_name.ends_with(&suffix) {
                    continue;
                }
                let Some(label) = file_name.split('_').next() else {
                    continue;
                };
                let templates = parse_template_file(&path)?;
                if let Some(map) = tiers.get_mut(*tier) {
                    map.insert(label.to_owned(), templates);
                }
            }
        }

        Ok(Self { tiers })
    }

    pub fn tier_names(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    /// Template intervals (relative to stimulus onset) for a label in a tier.
    pub fn template(&self, tier: &str, label: &str) -> Option<&[Interval]> {
        self.tiers
            .get(tier)
            .and_then(|labels| labels.get(label))
            .map(Vec::as_slice)
    }

    /// Number of labels loaded for a tier.
    pub fn tier_len(&self, tier: &str) -> usize {
        self.tiers.get(tier).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(BTreeMap::is_empty)
    }
}

fn parse_template_file(path: &Path) -> EaResult<Vec<Interval>> {
    let text = fs::read_to_string(path)?;
    let mut intervals = Vec::new();
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
        intervals.push(Interval::new(start, end, fields[2].trim_end()));
    }
    Ok(intervals)
}

fn parse_float(field: &str, path: &Path, line: usize) -> EaResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| EaError::parse(path, line, format!("invalid float `{field}`")))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{AnnotationStore, DEFAULT_TIERS};
    use crate::error::EaError;
    use crate::model::Interval;

    fn write(dir: &std::path::Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_labels_grouped_by_tier() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dog_words.txt", "0.0\t0.6\tdog\n");
        write(
            dir.path(),
            "dog_phones.txt",
            "0.0\t0.2\td\n0.2\t0.45\taa\n0.45\t0.6\tg\n",
        );
        write(dir.path(), "hoot_words.txt", "0.0\t0.5\thoot\n");

        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert_eq!(store.tier_len("words"), 2);
        assert_eq!(store.tier_len("phones"), 1);
        assert_eq!(
            store.template("words", "dog").unwrap(),
            &[Interval::new(0.0, 0.6, "dog")]
        );
        assert_eq!(store.template("phones", "dog").unwrap().len(), 3);
    }

    #[test]
    fn tiers_keep_independent_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dog_words.txt", "0.0\t0.6\tdog\n");

        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert!(store.template("words", "dog").is_some());
        assert!(store.template("phones", "dog").is_none());
    }

    #[test]
    fn label_is_prefix_before_first_underscore() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "mice_v2_words.txt", "0.0\t1.0\tmice\n");

        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert!(store.template("words", "mice").is_some());
        assert!(store.template("words", "mice_v2").is_none());
    }

    #[test]
    fn unmatched_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "readme.txt", "not an annotation\n");
        write(dir.path(), "dog_words.txt", "0.0\t0.6\tdog\n");

        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert_eq!(store.tier_len("words"), 1);
    }

    #[test]
    fn malformed_line_fails_the_load_naming_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dog_words.txt", "0.0\t0.6\tdog\n0.7\toops\n");

        let err = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, EaError::Parse { .. }), "got: {msg}");
        assert!(msg.contains("dog_words.txt"), "got: {msg}");
        assert!(msg.contains("line 2"), "got: {msg}");
    }

    #[test]
    fn invalid_float_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "dog_words.txt", "zero\t0.6\tdog\n");
        assert!(AnnotationStore::load(dir.path(), DEFAULT_TIERS).is_err());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err =
            AnnotationStore::load(std::path::Path::new("/nonexistent_annot_dir"), DEFAULT_TIERS)
                .unwrap_err();
        assert!(matches!(err, EaError::Io(_)));
    }

    #[test]
    fn empty_directory_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.tier_names().count(), 2);
    }

    #[test]
    fn negative_relative_onsets_are_allowed() {
        // Template starts may be offset before the nominal stimulus onset.
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hut_words.txt", "-0.05\t0.4\thut\n");
        let store = AnnotationStore::load(dir.path(), DEFAULT_TIERS).unwrap();
        assert_eq!(
            store.template("words", "hut").unwrap(),
            &[Interval::new(-0.05, 0.4, "hut")]
        );
    }
}
