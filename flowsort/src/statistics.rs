//! # Cohort statistics
//!
//! Directory mean motions of a batch run are split into moving and still cohorts, which are then
//! summarised into a [`Report`].

use crate::prelude::v1::*;
use chrono::NaiveDate;
use std::fmt;

/// Summary of a single cohort.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CohortStats {
    pub count: usize,
    /// Mean of the directory motions, `0.0` if the cohort is empty.
    pub mean: f64,
    /// Population standard deviation, `0.0` for empty and single element cohorts.
    pub std_dev: f64,
}

impl CohortStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let count = samples.len();

        if count == 0 {
            return Self::default();
        }

        let mean = samples.iter().sum::<f64>() / count as f64;

        let std_dev = if count == 1 {
            0.0
        } else {
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;
            var.sqrt()
        };

        Self {
            count,
            mean,
            std_dev,
        }
    }
}

/// Number of lines in the moving and still ledgers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub moving: usize,
    pub still: usize,
}

impl LedgerCounts {
    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Moving => self.moving,
            Label::Still => self.still,
        }
    }
}

/// Final statistics of a batch run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub date: NaiveDate,
    pub moving: CohortStats,
    pub still: CohortStats,
    pub ledgers: Option<LedgerCounts>,
}

impl Report {
    pub fn cohort(&self, label: Label) -> &CohortStats {
        match label {
            Label::Moving => &self.moving,
            Label::Still => &self.still,
        }
    }

    /// Ledger line count as a percentage of the cohort's directory count.
    ///
    /// Returns `None` if ledger counts are unknown, and `0.0` if the cohort is empty.
    pub fn ledger_percentage(&self, label: Label) -> Option<f64> {
        let lines = self.ledgers?.get(label);

        match self.cohort(label).count {
            0 => Some(0.0),
            count => Some(lines as f64 / count as f64 * 100.0),
        }
    }

    /// Render the human readable statistics report.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledgers = self.ledgers.unwrap_or_default();

        writeln!(f, "Optical Flow Statistics")?;
        writeln!(f, " date: {}", self.date.format("%Y-%m-%d"))?;
        writeln!(f, "=====================")?;

        for (name, label) in [("Still", Label::Still), ("Move", Label::Moving)] {
            writeln!(f, "{name} Count: {}", ledgers.get(label))?;
            writeln!(
                f,
                " {:.4}%",
                self.ledger_percentage(label).unwrap_or_default()
            )?;
        }

        for (name, stats) in [("Moving", &self.moving), ("Still", &self.still)] {
            writeln!(f, "{name} Avg Motion: {:.4}", stats.mean)?;
            writeln!(f, "{name} Std Motion: {:.4}", stats.std_dev)?;
        }

        Ok(())
    }
}

/// Collects directory mean motions of a single batch run.
#[derive(Clone, Debug, Default)]
pub struct CohortAccumulator {
    moving: Vec<f64>,
    still: Vec<f64>,
}

impl CohortAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory's mean motion to the cohort of its label.
    pub fn accumulate(&mut self, summary: DirectoryMotionSummary) {
        match summary.label {
            Label::Moving => self.moving.push(summary.mean),
            Label::Still => self.still.push(summary.mean),
        }
    }

    /// Summarise the cohorts, dated today.
    ///
    /// # Arguments
    ///
    /// * `ledgers` - ledger line counts, if the result sink provides them.
    pub fn finalize(&self, ledgers: Option<LedgerCounts>) -> Report {
        self.finalize_on(chrono::Local::now().date_naive(), ledgers)
    }

    /// Summarise the cohorts with an explicit report date.
    pub fn finalize_on(&self, date: NaiveDate, ledgers: Option<LedgerCounts>) -> Report {
        Report {
            date,
            moving: CohortStats::from_samples(&self.moving),
            still: CohortStats::from_samples(&self.still),
            ledgers,
        }
    }
}

#[cfg(test)]
impl CohortAccumulator {
    /// Number of directories in a cohort.
    pub fn count(&self, label: Label) -> usize {
        match label {
            Label::Moving => self.moving.len(),
            Label::Still => self.still.len(),
        }
    }
}
