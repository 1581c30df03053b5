//! # Batch runner
//!
//! Walks every top-level folder of the input directory, classifies each frame directory found
//! beneath it, and writes ledgers and statistics into the folder's output directory.
//!
//! Failures are contained: a bad frame pair is skipped, a bad directory is logged and skipped,
//! and a folder whose output directory cannot be created is logged and skipped.

use crate::prelude::v1::*;
use crate::utils::{frame_directories, top_level_folders};
use log::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of processing one top-level folder.
#[derive(Clone, Debug)]
pub struct FolderOutcome {
    pub folder: PathBuf,
    pub save_dir: PathBuf,
    /// Directories that were classified and committed to the statistics.
    pub processed: usize,
    /// Directories that failed and were left out.
    pub skipped: usize,
    pub report: Report,
}

/// Runs classification over a whole input directory.
pub struct BatchRunner<S, E> {
    config: Config,
    source: S,
    aggregator: DirectoryMotionAggregator<E>,
}

// Cohorts and ledgers are append-only, thus a panicked worker can not leave them in an
// inconsistent state.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: FrameSource + Sync, E: MotionEstimator + Sync> BatchRunner<S, E> {
    /// Create a new runner.
    ///
    /// # Arguments
    ///
    /// * `config` - run configuration. Validated here.
    /// * `source` - frame source to list and load frames with.
    /// * `estimator` - motion estimator to score frame pairs with.
    pub fn new(config: Config, source: S, estimator: E) -> Result<Self> {
        config.validate()?;

        let aggregator = DirectoryMotionAggregator::new(estimator, config.motion_threshold);

        Ok(Self {
            config,
            source,
            aggregator,
        })
    }

    /// Process every selected top-level folder.
    ///
    /// Only failing to list the input directory is fatal. Returns outcomes of the folders that
    /// were processed.
    pub fn run(&self) -> Result<Vec<FolderOutcome>> {
        let folders = top_level_folders(&self.config)?;

        info!(
            "Processing {} folders in {}",
            folders.len(),
            self.config.input_path.display()
        );

        let mut outcomes = vec![];

        for (i, folder) in folders.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, folders.len(), folder.display());

            match self.process_folder(folder) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Skipping folder {}: {}", folder.display(), e),
            }
        }

        Ok(outcomes)
    }

    /// Process a single top-level folder.
    ///
    /// Cohort statistics start empty for every folder.
    pub fn process_folder(&self, folder: &Path) -> Result<FolderOutcome> {
        let save_dir = self.config.save_dir(folder);
        let sink = Mutex::new(LedgerSink::create(&save_dir)?);
        let cohorts = Mutex::new(CohortAccumulator::new());

        let directories = frame_directories(folder)?;

        info!(
            "Found {} frame directories in {}",
            directories.len(),
            folder.display()
        );

        let process = |(i, dir): (usize, &PathBuf)| {
            debug!("[{}/{}] {}", i + 1, directories.len(), dir.display());

            self.process_directory(dir, &sink, &cohorts)
                .map_err(|e| warn!("Skipping directory {}: {}", dir.display(), e))
                .is_ok()
        };

        let processed = if self.config.parallel {
            directories
                .par_iter()
                .enumerate()
                .map(process)
                .filter(|ok| *ok)
                .count()
        } else {
            directories
                .iter()
                .enumerate()
                .map(process)
                .filter(|ok| *ok)
                .count()
        };

        let skipped = directories.len() - processed;

        let mut sink = sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        let cohorts = cohorts.into_inner().unwrap_or_else(PoisonError::into_inner);

        let ledgers = sink
            .ledger_counts()
            .map_err(|e| warn!("Unable to count ledger lines: {}", e))
            .ok();

        let report = cohorts.finalize(ledgers);
        sink.write_report(&report)?;

        info!(
            "{}: {} moving, {} still directories, {} skipped",
            folder.display(),
            report.moving.count,
            report.still.count,
            skipped
        );

        Ok(FolderOutcome {
            folder: folder.to_path_buf(),
            save_dir,
            processed,
            skipped,
            report,
        })
    }

    /// Classify a single frame directory.
    ///
    /// The directory's summary is committed to `cohorts` only after its frames have been
    /// recorded, so an interrupted or failed directory leaves no partial statistics behind.
    ///
    /// # Arguments
    ///
    /// * `dir` - directory containing the frames.
    /// * `sink` - sink to record frame labels into.
    /// * `cohorts` - statistics of the current batch.
    pub fn process_directory<R: ResultSink>(
        &self,
        dir: &Path,
        sink: &Mutex<R>,
        cohorts: &Mutex<CohortAccumulator>,
    ) -> Result<DirectoryMotionSummary> {
        let frames = self.source.list_frames(dir)?;

        let (summary, pairs) = self.aggregator.summarize(&self.source, &frames);

        let classification = classify(
            self.config.classify_by,
            &frames,
            &summary,
            &pairs,
            self.config.motion_threshold,
        );

        lock(sink).record(&classification)?;
        lock(cohorts).accumulate(summary.clone());

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MOVING_LEDGER, REPORT_FILE, STILL_LEDGER};
    use crate::testing::*;
    use assert_approx_eq::assert_approx_eq;
    use std::fs;

    /// Create frame files named `{prefix}{i}.jpg` scoring `scores`, or undecodable frames.
    fn add_session(
        source: &mut ScriptedSource,
        dir: &Path,
        prefix: &str,
        scores: Option<&[f32]>,
        frames: usize,
    ) {
        fs::create_dir_all(dir).unwrap();

        let values: Vec<Option<f32>> = match scores {
            Some(scores) => intensities(scores).into_iter().map(Some).collect(),
            None => vec![None; frames],
        };

        for (i, v) in values.into_iter().enumerate() {
            let name = format!("{prefix}{i}.jpg");
            fs::write(dir.join(&name), b"").unwrap();
            source.set(&name, v);
        }
    }

    fn setup(root: &Path) -> ScriptedSource {
        let mut source = ScriptedSource::default();
        let cam = root.join("cam01");

        add_session(&mut source, &cam.join("a"), "a", Some(&[5.0, 1.0]), 0);
        add_session(&mut source, &cam.join("b"), "b", Some(&[]), 0);
        add_session(&mut source, &cam.join("c"), "c", None, 2);
        add_session(&mut source, &cam.join("day/d"), "d", Some(&[10.0, 10.0]), 0);
        fs::create_dir_all(cam.join("notes")).unwrap();
        fs::write(cam.join("notes/readme.txt"), b"").unwrap();

        source
    }

    fn ledger_names(path: &Path) -> Vec<String> {
        let mut names = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| {
                Path::new(l)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    fn check_cam01(root: &Path, outcome: &FolderOutcome) {
        let save_dir = root.join("cam01_optical_flow");

        assert_eq!(outcome.save_dir, save_dir);
        assert_eq!(outcome.processed, 4);
        assert_eq!(outcome.skipped, 0);

        assert_eq!(
            ledger_names(&save_dir.join(MOVING_LEDGER)),
            ["a0.jpg", "a1.jpg", "d0.jpg", "d1.jpg", "d2.jpg"]
        );
        assert_eq!(
            ledger_names(&save_dir.join(STILL_LEDGER)),
            ["a2.jpg", "b0.jpg", "c0.jpg", "c1.jpg"]
        );

        let report = &outcome.report;
        assert_eq!(report.moving.count, 1);
        assert_approx_eq!(report.moving.mean, 10.0);
        assert_eq!(report.moving.std_dev, 0.0);
        assert_eq!(report.still.count, 3);
        assert_approx_eq!(report.still.mean, 1.0);
        assert_approx_eq!(report.still.std_dev, 2f64.sqrt());
        assert_eq!(
            report.ledgers,
            Some(LedgerCounts {
                moving: 5,
                still: 4
            })
        );

        let written = fs::read_to_string(save_dir.join(REPORT_FILE)).unwrap();
        assert_eq!(written, report.render());
        assert!(written.contains("Still Count: 4\n 133.3333%\n"));
        assert!(written.contains("Move Count: 5\n 500.0000%\n"));
    }

    #[test]
    fn folder_mode_run() {
        let dir = tempfile::tempdir().unwrap();
        let source = setup(dir.path());

        let runner =
            BatchRunner::new(Config::new(dir.path(), 3.0), source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        check_cam01(dir.path(), &outcomes[0]);
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let source = setup(dir.path());

        let mut config = Config::new(dir.path(), 3.0);
        config.parallel = true;

        let runner = BatchRunner::new(config, source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        check_cam01(dir.path(), &outcomes[0]);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn unlistable_subdirectory_keeps_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = setup(dir.path());
        unlistable_directory(&dir.path().join("cam01/zz"));

        let runner =
            BatchRunner::new(Config::new(dir.path(), 3.0), source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        check_cam01(dir.path(), &outcomes[0]);
    }

    #[test]
    fn unwritable_ledger_skips_whole_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ScriptedSource::default();
        add_session(
            &mut source,
            &dir.path().join("cam01/a"),
            "a",
            Some(&[5.0, 1.0]),
            0,
        );
        let save_dir = dir.path().join("cam01_optical_flow");
        fs::create_dir_all(save_dir.join(STILL_LEDGER)).unwrap();

        let runner =
            BatchRunner::new(Config::new(dir.path(), 3.0), source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].processed, 0);
        assert_eq!(outcomes[0].skipped, 1);
        assert_eq!(outcomes[0].report.moving.count, 0);
        assert_eq!(outcomes[0].report.still.count, 0);
        assert!(!save_dir.join(MOVING_LEDGER).exists());
    }

    #[test]
    fn frame_mode_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ScriptedSource::default();
        add_session(
            &mut source,
            &dir.path().join("cam01/s"),
            "s",
            Some(&[1.0, 5.0, 1.0, 0.0]),
            0,
        );

        let mut config = Config::new(dir.path(), 3.0);
        config.classify_by = ClassifyBy::Frame;

        let runner = BatchRunner::new(config, source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();
        let save_dir = dir.path().join("cam01_optical_flow");

        assert_eq!(
            ledger_names(&save_dir.join(MOVING_LEDGER)),
            ["s1.jpg", "s2.jpg"]
        );
        assert_eq!(
            ledger_names(&save_dir.join(STILL_LEDGER)),
            ["s0.jpg", "s3.jpg", "s4.jpg"]
        );
        // Directory mean is 1.75, below threshold.
        assert_eq!(outcomes[0].report.still.count, 1);
        assert_approx_eq!(outcomes[0].report.still.mean, 1.75);
    }

    #[test]
    fn empty_directory_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let source = setup(dir.path());
        let runner =
            BatchRunner::new(Config::new(dir.path(), 3.0), source, DiffEstimator).unwrap();

        let sink = Mutex::new(LedgerSink::create(dir.path().join("out")).unwrap());
        let cohorts = Mutex::new(CohortAccumulator::new());

        let res = runner.process_directory(&dir.path().join("cam01/notes"), &sink, &cohorts);
        assert!(matches!(res, Err(Error::EmptyDirectory(_))));

        let summary = runner
            .process_directory(&dir.path().join("cam01/a"), &sink, &cohorts)
            .unwrap();
        assert_eq!(summary.label, Label::Still);

        let cohorts = cohorts.into_inner().unwrap();
        assert_eq!(cohorts.count(Label::Still), 1);
        assert_eq!(cohorts.count(Label::Moving), 0);
    }

    #[test]
    fn unwritable_output_skips_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = setup(dir.path());
        add_session(
            &mut source,
            &dir.path().join("cam02/x"),
            "x",
            Some(&[1.0]),
            0,
        );
        // Output path of cam02 is occupied by a regular file.
        fs::write(dir.path().join("cam02_optical_flow"), b"").unwrap();

        let runner =
            BatchRunner::new(Config::new(dir.path(), 3.0), source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].folder, dir.path().join("cam01"));
    }

    #[test]
    fn selected_folders_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = setup(dir.path());
        add_session(
            &mut source,
            &dir.path().join("cam02/x"),
            "x",
            Some(&[1.0]),
            0,
        );

        let mut config = Config::new(dir.path(), 3.0);
        config.folders = Some(vec!["cam02".into()]);

        let runner = BatchRunner::new(config, source, DiffEstimator).unwrap();
        let outcomes = runner.run().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].processed, 1);
        assert!(!dir.path().join("cam01_optical_flow").exists());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = Config::new("/data", f32::NAN);
        assert!(matches!(
            BatchRunner::new(config, ScriptedSource::default(), DiffEstimator),
            Err(Error::Config(_))
        ));
    }
}
