// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job::WordCounts;

fn is_separator(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_whitespace()
}

/// Lower-cased words of `text`, in order
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(is_separator)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Job 1 map step: count every word of a split
pub fn tokenize(text: &str) -> WordCounts {
    let mut counts = WordCounts::new();
    for word in words(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_counts_case_insensitively() {
        let counts = tokenize("Deer Beer River\nDEER beer");
        assert_eq!(counts.len(), 3);
        assert_eq!(counts["deer"], 2);
        assert_eq!(counts["beer"], 2);
        assert_eq!(counts["river"], 1);
    }

    #[test]
    fn test_tokenize_splits_on_punctuation_runs() {
        let collected: Vec<String> = words("hello,, world!!--it's\tfine...").collect();
        assert_eq!(collected, vec!["hello", "world", "it", "s", "fine"]);
    }

    #[test]
    fn test_tokenize_keeps_non_ascii_letters() {
        let counts = tokenize("Été, été; ÉTÉ");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["été"], 3);
    }

    #[test]
    fn test_tokenize_empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ,.;\n\t ").is_empty());
    }
}
