// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::Result;
use crate::job::FrequencyGroups;
use std::path::Path;

/// One line per non-empty frequency, ascending: `<freq> : [w1, w2]`.
/// Words inside a line are sorted so reruns produce identical files.
pub fn format_sorted(groups: &FrequencyGroups) -> String {
    let mut frequencies: Vec<u64> = groups
        .iter()
        .filter(|(_, words)| !words.is_empty())
        .map(|(frequency, _)| *frequency)
        .collect();
    frequencies.sort_unstable();

    let mut out = String::new();
    for frequency in frequencies {
        let mut words: Vec<&str> = groups[&frequency].iter().map(String::as_str).collect();
        words.sort_unstable();
        out.push_str(&format!("{} : [{}]\n", frequency, words.join(", ")));
    }
    out
}

pub async fn write_sorted(path: &Path, groups: &FrequencyGroups) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, format_sorted(groups)).await?;
    Ok(())
}
