// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job::Bucket;
use crate::range::Range;
use std::hash::Hash;

/// Maps a key to the index of the worker that reduces it.
/// Implementations must be pure so every worker routes a key the same way
/// without talking to anyone.
pub trait Partitioner<K> {
    fn num_partitions(&self) -> usize;
    fn partition(&self, key: &K) -> usize;
}

/// Polynomial string hash `h = sum(c[i] * 31^(len - 1 - i))` over UTF-16
/// code units with 32-bit wrapping, so the value is stable across
/// implementations of the same cluster. Units, not code points: a character
/// outside the BMP contributes both halves of its surrogate pair, so the
/// result differs from a hash over `chars()`.
pub fn polynomial_hash(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

pub fn hash_partition(key: &str, n: usize) -> usize {
    polynomial_hash(key).unsigned_abs() as usize % n
}

/// Job 1 routing: `|hash(word)| mod n`
#[derive(Debug, Clone, Copy)]
pub struct HashPartitioner {
    n: usize,
}

impl HashPartitioner {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "cannot partition across zero workers");
        Self { n }
    }
}

impl Partitioner<String> for HashPartitioner {
    fn num_partitions(&self) -> usize {
        self.n
    }

    fn partition(&self, key: &String) -> usize {
        hash_partition(key, self.n)
    }
}

/// Job 2 routing: equal-width buckets over the merged global range
#[derive(Debug, Clone, Copy)]
pub struct RangePartitioner {
    range: Range,
    n: usize,
}

impl RangePartitioner {
    pub fn new(range: Range, n: usize) -> Self {
        assert!(n > 0, "cannot partition across zero workers");
        Self { range, n }
    }
}

impl Partitioner<u64> for RangePartitioner {
    fn num_partitions(&self) -> usize {
        self.n
    }

    fn partition(&self, key: &u64) -> usize {
        self.range.attribute_to(*key, self.n)
    }
}

/// Split a local result into one bucket per worker
pub fn split_into_buckets<K, V, P>(local: Bucket<K, V>, partitioner: &P) -> Vec<Bucket<K, V>>
where
    K: Eq + Hash,
    P: Partitioner<K>,
{
    let mut buckets: Vec<Bucket<K, V>> = (0..partitioner.num_partitions())
        .map(|_| Bucket::new())
        .collect();
    for (key, value) in local {
        let index = partitioner.partition(&key);
        buckets[index].insert(key, value);
    }
    buckets
}
