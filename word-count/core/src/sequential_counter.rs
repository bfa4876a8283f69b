// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::Result;
use crate::job::WordCounts;
use crate::tokenizer::tokenize;
use std::path::Path;

/// Single-machine baseline for checking distributed results
#[derive(Debug, Default)]
pub struct SequentialCounter {
    counts: WordCounts,
}

impl SequentialCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_text(&mut self, text: &str) {
        for (word, count) in tokenize(text) {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }

    pub async fn count_file(&mut self, path: &Path) -> Result<()> {
        let text = tokio::fs::read_to_string(path).await?;
        self.count_text(&text);
        Ok(())
    }

    pub fn counts(&self) -> &WordCounts {
        &self.counts
    }

    /// Most frequent first, ties broken alphabetically
    pub fn sorted(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_count_then_word() {
        let mut counter = SequentialCounter::new();
        counter.count_text("Deer Beer River");
        counter.count_text("Car Car River");
        counter.count_text("Deer Car Beer");

        let sorted = counter.sorted();

        assert_eq!(
            sorted,
            vec![
                ("car".to_string(), 3),
                ("beer".to_string(), 2),
                ("deer".to_string(), 2),
                ("river".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_single_text_matches_tokenizer() {
        let text = "It's the deer's beer; the DEER, the river!";
        let mut counter = SequentialCounter::new();

        counter.count_text(text);

        assert_eq!(counter.counts(), &tokenize(text));
    }

    #[tokio::test]
    async fn test_count_file_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "a b a").unwrap();

        let mut counter = SequentialCounter::new();
        counter.count_file(&path).await.unwrap();
        counter.count_file(&path).await.unwrap();

        assert_eq!(counter.counts()["a"], 4);
        assert_eq!(counter.counts()["b"], 2);
    }
}
