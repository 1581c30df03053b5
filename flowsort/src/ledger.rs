//! # Classification result sinks

use crate::prelude::v1::*;
use log::*;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Ledger receiving frames labelled as moving.
pub const MOVING_LEDGER: &str = "move.txt";
/// Ledger receiving frames labelled as still.
pub const STILL_LEDGER: &str = "still.txt";
/// Human readable statistics of a run.
pub const REPORT_FILE: &str = "optical_flow_statistics.txt";

/// Destination of classification results.
pub trait ResultSink {
    /// Record labels of every frame of a single directory.
    fn record(&mut self, classification: &FrameClassification) -> Result<()>;

    /// Number of frames recorded in each ledger.
    fn ledger_counts(&self) -> Result<LedgerCounts>;

    /// Store the final statistics report.
    fn write_report(&mut self, report: &Report) -> Result<()>;
}

/// Text ledger sink.
///
/// Frames are appended to `move.txt` and `still.txt` inside the output directory, one absolute
/// path per line. Ledgers are only created once they receive a line.
pub struct LedgerSink {
    save_dir: PathBuf,
}

impl LedgerSink {
    /// Create a sink writing into `save_dir`, creating the directory if it is absent.
    pub fn create(save_dir: impl Into<PathBuf>) -> Result<Self> {
        let save_dir = save_dir.into();

        if !save_dir.is_dir() {
            debug!("Creating output directory {}", save_dir.display());
            std::fs::create_dir_all(&save_dir).map_err(|source| Error::MissingOutputPath {
                path: save_dir.clone(),
                source,
            })?;
        }

        Ok(Self { save_dir })
    }

    /// Path to the ledger of the given label.
    pub fn ledger_path(&self, label: Label) -> PathBuf {
        self.save_dir.join(match label {
            Label::Moving => MOVING_LEDGER,
            Label::Still => STILL_LEDGER,
        })
    }

    pub fn report_path(&self) -> PathBuf {
        self.save_dir.join(REPORT_FILE)
    }

    fn open(&self, label: Label) -> Result<BufWriter<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.ledger_path(label))?;

        Ok(BufWriter::new(file))
    }
}

fn count_lines(path: &Path) -> Result<usize> {
    match File::open(path) {
        Ok(file) => {
            let mut count = 0;
            for line in BufReader::new(file).lines() {
                line?;
                count += 1;
            }
            Ok(count)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

impl ResultSink for LedgerSink {
    fn record(&mut self, classification: &FrameClassification) -> Result<()> {
        // All ledgers are opened before the first write, so a failed open leaves none of them
        // partially written.
        let mut ledgers = vec![];

        for label in [Label::Moving, Label::Still] {
            let frames = classification.with_label(label).collect::<Vec<_>>();
            if !frames.is_empty() {
                ledgers.push((self.open(label)?, frames));
            }
        }

        for (mut out, frames) in ledgers {
            for frame in frames {
                writeln!(out, "{}", frame.display())?;
            }
            out.flush()?;
        }

        Ok(())
    }

    fn ledger_counts(&self) -> Result<LedgerCounts> {
        Ok(LedgerCounts {
            moving: count_lines(&self.ledger_path(Label::Moving))?,
            still: count_lines(&self.ledger_path(Label::Still))?,
        })
    }

    fn write_report(&mut self, report: &Report) -> Result<()> {
        std::fs::write(self.report_path(), report.render())?;
        Ok(())
    }
}
