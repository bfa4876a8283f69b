// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// word -> occurrences
pub type WordCounts = HashMap<String, u64>;

/// occurrences -> every word seen that many times
pub type FrequencyGroups = HashMap<u64, Vec<String>>;

/// The share of a local result destined for one worker
pub type Bucket<K, V> = HashMap<K, V>;

/// The two chained map/shuffle/reduce computations of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    /// Job 1: hash-partitioned word counting
    Count,
    /// Job 2: range-partitioned sort by frequency
    Sort,
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Count => write!(f, "count"),
            Job::Sort => write!(f, "sort"),
        }
    }
}

/// Job 2 map step: invert the job 1 result so frequencies become keys
pub fn group_by_frequency(counts: WordCounts) -> FrequencyGroups {
    let mut groups = FrequencyGroups::new();
    for (word, count) in counts {
        groups.entry(count).or_default().push(word);
    }
    groups
}
