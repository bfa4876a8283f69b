// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job::Job;
use crate::synchronization_signal::Barrier;
use std::fmt::Write;
use std::time::Duration;

/// Wall-clock time of every completed barrier, in run order
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    entries: Vec<(Barrier, Duration)>,
}

impl PhaseTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, barrier: Barrier, elapsed: Duration) {
        self.entries.push((barrier, elapsed));
    }

    pub fn entries(&self) -> &[(Barrier, Duration)] {
        &self.entries
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, elapsed)| *elapsed).sum()
    }

    /// Human-readable table, one section per job
    pub fn report(&self) -> String {
        let mut out = String::new();
        let mut section: Option<Job> = None;
        for (barrier, elapsed) in &self.entries {
            if barrier.job.is_some() && barrier.job != section {
                section = barrier.job;
                let title = match barrier.job {
                    Some(Job::Count) => "COUNT",
                    Some(Job::Sort) => "SORT",
                    None => "",
                };
                let _ = writeln!(out, "/// MAPREDUCE TO {} ///", title);
            }
            let _ = writeln!(out, "{} : {}ms", barrier.label, elapsed.as_millis());
        }
        let _ = write!(out, "Total : {}ms", self.total().as_millis());
        out
    }
}
