//! Representativeness scoring of movie pools against population statistics, greedy search
//! for representative pools, and cross-genre similarity matching.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod matching;
pub mod model;
pub mod optimizer;
pub mod score;
pub mod shaping;
pub mod source;
pub mod stats;

use std::collections::BTreeSet;

pub use aggregate::{representativeness_score, ScoreKey, ScoreKind, ScoreVector, Weights};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, OptimizeError, ScoreError};
pub use matching::{match_genres, similarity, MatchingParams, SimilarityMatcher};
pub use model::condition::{HistogramReference, ParityReference, ReferenceSet};
pub use model::entity::{ActorRecord, Gender, MovieId, MovieRecord};
pub use model::group::{ActorTable, MovieTable, Pool, PoolView};
pub use optimizer::{Candidate, OptimizerParams, PoolOptimizer};
pub use shaping::{normalize, shape};
pub use source::{DataAccess, ReferenceProvider};

/// Grows the best random pool of `initial_size` movies to `final_size` with default
/// weights and search parameters.
pub fn grow(
    initial_size: usize,
    final_size: usize,
    universe: &BTreeSet<MovieId>,
    table: &ActorTable,
    references: &ReferenceSet,
) -> Result<Pool, OptimizeError> {
    let mut optimizer =
        PoolOptimizer::new(table, universe, references, Weights::default(), OptimizerParams::default());
    Ok(optimizer.grow(initial_size, final_size)?.pool)
}

/// Runs the configured search over the movies and references of the collaborators.
pub fn best_pool(
    data: &impl DataAccess,
    references: &impl ReferenceProvider,
    config: &EngineConfig,
    final_size: usize,
) -> Result<Candidate, EngineError> {
    let references = references.reference_set()?;
    let universe = data.movie_universe();
    let mut optimizer = PoolOptimizer::new(
        data.actor_table(),
        &universe,
        &references,
        config.weights.clone(),
        config.optimizer.clone(),
    );
    Ok(optimizer.grow(config.optimizer.sample_size, final_size)?)
}
