//! Override/default merge and flattening.

use std::collections::BTreeMap;

use super::{DefaultArgs, FlagRow};

/// Switch → ordered values.
///
/// Keys iterate in lexical order so the flattened command line is stable
/// from run to run. QEMU itself does not care about the order of distinct
/// switches, only about the order of repeated ones, which is kept per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueMap {
    buckets: BTreeMap<String, Vec<String>>,
}

impl MultiValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest expanded override rows.
    ///
    /// Fragments after the switch are concatenated. An empty result still
    /// registers the switch, which blocks its default and yields a bare flag.
    pub fn from_overrides(rows: &[FlagRow]) -> Self {
        let mut map = Self::new();
        for row in rows {
            let Some((key, fragments)) = row.split_first() else {
                tracing::warn!("Ignoring empty qemuargs row");
                continue;
            };
            let value = fragments.concat();
            let bucket = map.buckets.entry(key.clone()).or_default();
            if !value.is_empty() {
                bucket.push(value);
            }
        }
        map
    }

    /// Add every default whose switch has no override presence at all.
    pub fn backfill(&mut self, defaults: &DefaultArgs) {
        for (key, value) in defaults.iter() {
            if !self.buckets.contains_key(key) {
                self.buckets.insert(key.to_string(), vec![value.to_string()]);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Flatten into `key value` pairs, one per value, or a bare `key`.
    pub fn flatten(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for (key, values) in &self.buckets {
            if values.is_empty() {
                tokens.push(key.clone());
            } else {
                for value in values {
                    tokens.push(key.clone());
                    tokens.push(value.clone());
                }
            }
        }
        tokens
    }
}

/// Merge expanded overrides over defaults and flatten to tokens.
pub fn merge(overrides: &[FlagRow], defaults: &DefaultArgs) -> Vec<String> {
    let mut map = MultiValueMap::from_overrides(overrides);
    map.backfill(defaults);
    map.flatten()
}
