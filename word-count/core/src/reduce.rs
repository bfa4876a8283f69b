// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job::Bucket;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::warn;

/// Associative, commutative merge of two values under the same key
pub trait Combine {
    fn combine(&mut self, other: Self);
}

impl Combine for u64 {
    fn combine(&mut self, other: Self) {
        *self += other;
    }
}

impl Combine for Vec<String> {
    fn combine(&mut self, other: Self) {
        self.extend(other);
    }
}

/// Merge the buckets received from every worker (own bucket included),
/// indexed by sender. A missing bucket or a null value counts as empty.
pub fn reduce_buckets<K, V>(received: Vec<Option<Bucket<K, Option<V>>>>) -> Bucket<K, V>
where
    K: Eq + Hash + Debug,
    V: Combine,
{
    let mut result = Bucket::new();
    for (from, bucket) in received.into_iter().enumerate() {
        let Some(bucket) = bucket else {
            warn!("No bucket from worker {}, reducing without it", from);
            continue;
        };
        for (key, value) in bucket {
            let Some(value) = value else {
                warn!("Null value for {:?} from worker {}, skipped", key, from);
                continue;
            };
            match result.get_mut(&key) {
                Some(existing) => V::combine(existing, value),
                None => {
                    result.insert(key, value);
                }
            }
        }
    }
    result
}
