use thiserror::Error;

use crate::config::ConfigError;
use crate::model::entity::MovieId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoreError {
    #[error("{kind} reference has {found} bins, the {kind} schema expects {expected}")]
    ReferenceShapeMismatch {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("calibration bounds collapse to {0}")]
    DegenerateCalibration(f64),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OptimizeError {
    #[error("every movie of the universe is already in the pool")]
    ExhaustedUniverse,
    #[error("cannot draw {requested} distinct movies from a universe of {available}")]
    UniverseTooSmall { requested: usize, available: usize },
    #[error("final size {final_size} is below the initial size {initial_size}")]
    ShrinkingGrowth { initial_size: usize, final_size: usize },
    #[error("movie {0} is not part of the universe")]
    UnknownMovie(MovieId),
    #[error("no pool was sampled")]
    NoSample,
    #[error(transparent)]
    Score(#[from] ScoreError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}
