//! # Optical Flow Frame Sorting Library
//!
//! This library classifies directories of time-ordered frames into "moving" and "still" sets
//! based on the dense optical flow between consecutive frames, and aggregates per-directory
//! motion statistics over a batch run.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use flowsort::prelude::v1::*;
//! ```
//!
//! Frame decoding and flow estimation are provided through the [`FrameSource`] and
//! [`MotionEstimator`] traits, see the `frame-loader` and `horn-schunck-estimator` crates.
//!
//! [`FrameSource`]: crate::frame::FrameSource
//! [`MotionEstimator`]: crate::estimator::MotionEstimator

pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod ledger;
pub mod motion_field;
pub mod scorer;
pub mod statistics;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            aggregator::{DirectoryMotionAggregator, DirectoryMotionSummary, Label},
            batch::{BatchRunner, FolderOutcome},
            classifier::{classify, ClassifyBy, FrameClassification},
            config::Config,
            error::{Error, Result},
            estimator::MotionEstimator,
            frame::{FrameSequence, FrameSource, GrayFrame},
            ledger::{LedgerSink, ResultSink},
            motion_field::MotionField,
            scorer::{MotionSample, MotionScorer, PairScore},
            statistics::{CohortAccumulator, CohortStats, LedgerCounts, Report},
        };
    }
}
