//! Corpus-wide tag frequency aggregation.
//!
//! The table is an explicit accumulator: callers pass it into
//! [`FrequencyAggregator::accumulate`] and get the updated table back. The
//! stop-list is immutable configuration. Accumulation is a pure count per key,
//! so processing images in any order yields the same table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::Detection;

/// Tags excluded from the frequency table unless configured otherwise.
pub const DEFAULT_STOP_LIST: &[&str] = &[
    "someone", "person", "hand", "table", "robot", "desk", "room", "man", "arm", "boy", "woman",
    "machine", "counter", "pan", "paper", "box", "mouse",
];

/// Fixed set of uninformative tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopList {
    tags: BTreeSet<String>,
}

impl StopList {
    /// A stop-list that excludes nothing.
    pub fn empty() -> Self {
        Self {
            tags: BTreeSet::new(),
        }
    }

    /// Whether `tag` is excluded.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for StopList {
    fn default() -> Self {
        DEFAULT_STOP_LIST.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for StopList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Mapping from tag to the number of times it was detected.
///
/// Ordered by tag so serialized tables are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFrequencyTable {
    counts: BTreeMap<String, u64>,
}

impl TagFrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `tag`, or 0 when it was never seen.
    pub fn get(&self, tag: &str) -> u64 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.counts.contains_key(tag)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate `(tag, count)` in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(tag, &count)| (tag.as_str(), count))
    }

    /// Entries sorted by descending count, ties broken by tag.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Combine two tables by summing counts per tag.
    pub fn merge(mut self, other: TagFrequencyTable) -> TagFrequencyTable {
        for (tag, count) in other.counts {
            *self.counts.entry(tag).or_insert(0) += count;
        }
        self
    }

    /// Consume the table, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, u64> {
        self.counts
    }

    fn increment(&mut self, tag: &str) {
        match self.counts.get_mut(tag) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(tag.to_string(), 1);
            }
        }
    }
}

/// Folds detected tokens into a [`TagFrequencyTable`], skipping stop-listed tags.
#[derive(Debug, Clone, Default)]
pub struct FrequencyAggregator {
    stop_list: StopList,
}

impl FrequencyAggregator {
    pub fn new(stop_list: StopList) -> Self {
        Self { stop_list }
    }

    pub fn stop_list(&self) -> &StopList {
        &self.stop_list
    }

    /// Count every non-stop-listed token from one image.
    pub fn accumulate<I, S>(&self, mut table: TagFrequencyTable, tokens: I) -> TagFrequencyTable
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref();
            if !self.stop_list.contains(token) {
                table.increment(token);
            }
        }
        table
    }

    /// Count the flattened per-query token lists of one image's detections.
    pub fn accumulate_detections(
        &self,
        table: TagFrequencyTable,
        detections: &[Detection],
    ) -> TagFrequencyTable {
        self.accumulate(table, detections.iter().flat_map(|d| d.tokens.iter()))
    }

    /// Build a table from scratch over a whole corpus of per-image token lists.
    pub fn aggregate<C, I, S>(&self, corpus: C) -> TagFrequencyTable
    where
        C: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        corpus
            .into_iter()
            .fold(TagFrequencyTable::new(), |table, image_tokens| {
                self.accumulate(table, image_tokens)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<&'static str>> {
        vec![
            vec!["cat", "table", "cup"],
            vec!["cat", "cat", "laptop"],
            vec![],
            vec!["hand", "cup", "mug"],
        ]
    }

    #[test]
    fn test_counts_tokens_across_images() {
        let aggregator = FrequencyAggregator::default();
        let table = aggregator.aggregate(corpus());
        assert_eq!(table.get("cat"), 3);
        assert_eq!(table.get("cup"), 2);
        assert_eq!(table.get("laptop"), 1);
        assert_eq!(table.get("mug"), 1);
        assert_eq!(table.len(), 4);
        assert_eq!(table.total(), 7);
    }

    #[test]
    fn test_stop_listed_tokens_never_appear() {
        let aggregator = FrequencyAggregator::default();
        let every_image = vec![vec!["table", "hand", "mouse"]; 5];
        let table = aggregator.aggregate(every_image);
        assert!(table.is_empty());
        assert!(!table.contains("table"));
    }

    #[test]
    fn test_order_independent() {
        let aggregator = FrequencyAggregator::default();
        let forward = aggregator.aggregate(corpus());

        let mut reversed = corpus();
        reversed.reverse();
        assert_eq!(aggregator.aggregate(reversed), forward);

        let mut rotated = corpus();
        rotated.rotate_left(2);
        assert_eq!(aggregator.aggregate(rotated), forward);

        let mut shuffled: Vec<Vec<&str>> = corpus()
            .into_iter()
            .map(|mut tokens| {
                tokens.reverse();
                tokens
            })
            .collect();
        shuffled.swap(0, 3);
        assert_eq!(aggregator.aggregate(shuffled), forward);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let aggregator = FrequencyAggregator::default();
        let images = corpus();
        let (left, right) = images.split_at(2);
        let a = aggregator.aggregate(left.to_vec());
        let b = aggregator.aggregate(right.to_vec());
        assert_eq!(a.clone().merge(b.clone()), aggregator.aggregate(corpus()));
        assert_eq!(b.merge(a), aggregator.aggregate(corpus()));
    }

    #[test]
    fn test_counts_never_decrease() {
        let aggregator = FrequencyAggregator::default();
        let mut table = TagFrequencyTable::new();
        let mut previous = table.clone();
        for image in corpus() {
            table = aggregator.accumulate(table, image);
            for (tag, count) in previous.iter() {
                assert!(table.get(tag) >= count);
            }
            previous = table.clone();
        }
    }

    #[test]
    fn test_custom_stop_list() {
        let aggregator = FrequencyAggregator::new(["cat"].into_iter().collect());
        let table = aggregator.aggregate(corpus());
        assert!(!table.contains("cat"));
        // "table" is only stop-listed by default
        assert_eq!(table.get("table"), 1);
    }

    #[test]
    fn test_ranked_orders_by_count_then_tag() {
        let aggregator = FrequencyAggregator::new(StopList::empty());
        let table = aggregator.aggregate(vec![vec!["b", "a", "c", "c"]]);
        assert_eq!(table.ranked(), vec![("c", 2), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn test_table_serializes_as_plain_map() {
        let aggregator = FrequencyAggregator::default();
        let table = aggregator.aggregate(vec![vec!["cup", "cat"]]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"cat":1,"cup":1}"#);
    }
}
