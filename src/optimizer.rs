use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use crate::aggregate::{score_population, ScoreKind, ScoreVector, Weights};
use crate::cache::{MovieCache, Population};
use crate::error::{OptimizeError, ScoreError};
use crate::model::condition::{ReferenceSet, Score};
use crate::model::entity::MovieId;
use crate::model::group::{ActorTable, Pool};
use crate::stats::ScoreDistribution;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    /// Random pools drawn to seed the growth.
    pub sample_count: usize,
    /// Size of each random pool.
    pub sample_size: usize,
    /// Stop growing once the best addition no longer raises the score.
    pub stop_on_plateau: bool,
    pub seed: Option<u64>,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        OptimizerParams { sample_count: 1000, sample_size: 20, stop_on_plateau: false, seed: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub pool: Pool,
    pub score: ScoreVector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub candidate: Candidate,
    pub added: MovieId,
    /// Change in `tot` from the pool before the addition.
    pub delta: Score,
}

/// Greedy search for representative pools over a fixed movie universe.
pub struct PoolOptimizer<'a> {
    cache: MovieCache,
    universe: Vec<MovieId>,
    references: &'a ReferenceSet,
    weights: Weights,
    params: OptimizerParams,
    rng: SmallRng,
}

impl<'a> PoolOptimizer<'a> {
    pub fn new(
        table: &ActorTable,
        universe: &BTreeSet<MovieId>,
        references: &'a ReferenceSet,
        weights: Weights,
        params: OptimizerParams,
    ) -> PoolOptimizer<'a> {
        let rng = match params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        PoolOptimizer {
            cache: MovieCache::create(table),
            universe: universe.iter().copied().collect(),
            references,
            weights,
            params,
            rng,
        }
    }

    pub fn universe(&self) -> &[MovieId] {
        &self.universe
    }

    pub fn population(&self, pool: &Pool) -> Population {
        self.cache.pool_population(pool)
    }

    pub fn evaluate(&self, pool: &Pool) -> Result<ScoreVector, ScoreError> {
        score_population(&self.population(pool), self.references, &self.weights)
    }

    fn draw(&mut self, size: usize) -> Result<Pool, OptimizeError> {
        if size > self.universe.len() {
            return Err(OptimizeError::UniverseTooSmall { requested: size, available: self.universe.len() });
        }
        Ok(self.universe.choose_multiple(&mut self.rng, size).copied().collect())
    }

    /// A pool of `size` distinct movies drawn uniformly from the universe.
    pub fn sample(&mut self, size: usize) -> Result<Candidate, OptimizeError> {
        let pool = self.draw(size)?;
        let score = self.evaluate(&pool)?;
        Ok(Candidate { pool, score })
    }

    /// Best of `count` random pools by `tot`; the first drawn wins ties.
    pub fn best_sample(&mut self, count: usize, size: usize) -> Result<Candidate, OptimizeError> {
        let kind = ScoreKind::Total(self.weights.clone());
        let distribution = self.scores_distribution(&kind, count, size)?;
        let pool = distribution.best().ok_or(OptimizeError::NoSample)?.0.clone();
        let score = self.evaluate(&pool)?;
        info!(samples = count, size, tot = score.tot, "best sampled pool");
        Ok(Candidate { pool, score })
    }

    /// Values of `kind` over `n_test` random pools of `pool_size` movies.
    pub fn scores_distribution(&mut self, kind: &ScoreKind, n_test: usize, pool_size: usize) -> Result<ScoreDistribution, OptimizeError> {
        let mut distribution = ScoreDistribution::default();
        for _ in 0..n_test {
            let pool = self.draw(pool_size)?;
            let value = kind.evaluate(&self.population(&pool), self.references)?;
            distribution.push(pool, value);
        }
        Ok(distribution)
    }

    /// Adds the single movie that raises `tot` the most.
    ///
    /// Candidates are scanned in ascending id order and the first maximum wins, so the
    /// result does not depend on how the scan is split across threads.
    pub fn improve(&self, current: &Candidate) -> Result<Step, OptimizeError> {
        let base = self.population(&current.pool);
        let candidates: Vec<MovieId> = self.universe
            .iter()
            .copied()
            .filter(|movie| !current.pool.contains(*movie))
            .collect();
        if candidates.is_empty() {
            return Err(OptimizeError::ExhaustedUniverse);
        }
        let scored = candidates
            .par_iter()
            .map(|&movie| {
                let population = base.clone() + self.cache.population(movie);
                score_population(&population, self.references, &self.weights).map(|score| (movie, score))
            })
            .collect::<Result<Vec<_>, ScoreError>>()?;

        let mut best: Option<(MovieId, ScoreVector)> = None;
        for (movie, score) in scored {
            if best.as_ref().map_or(true, |(_, b)| score.tot > b.tot) {
                best = Some((movie, score));
            }
        }
        let (added, score) = best.ok_or(OptimizeError::ExhaustedUniverse)?;
        let delta = score.tot as Score - current.score.tot as Score;
        Ok(Step { candidate: Candidate { pool: current.pool.with(added), score }, added, delta })
    }

    /// Applies [`improve`](Self::improve) to `seed` until the pool holds `final_size` movies.
    pub fn grow_from(&self, seed: Candidate, final_size: usize) -> Result<Candidate, OptimizeError> {
        if let Some(movie) = seed.pool.iter().find(|movie| self.universe.binary_search(movie).is_err()) {
            return Err(OptimizeError::UnknownMovie(movie));
        }
        if final_size < seed.pool.len() {
            return Err(OptimizeError::ShrinkingGrowth { initial_size: seed.pool.len(), final_size });
        }
        let mut current = seed;
        while current.pool.len() < final_size {
            let step = self.improve(&current)?;
            if self.params.stop_on_plateau && step.delta <= 0.0 {
                debug!(movie = step.added, delta = step.delta, "no improving addition left");
                break;
            }
            info!(size = step.candidate.pool.len(), movie = step.added, tot = step.candidate.score.tot, "pool grown");
            current = step.candidate;
        }
        Ok(current)
    }

    /// Grows the best of the sampled pools of `initial_size` up to `final_size` movies.
    pub fn grow(&mut self, initial_size: usize, final_size: usize) -> Result<Candidate, OptimizeError> {
        if final_size < initial_size {
            return Err(OptimizeError::ShrinkingGrowth { initial_size, final_size });
        }
        let seed = self.best_sample(self.params.sample_count, initial_size)?;
        self.grow_from(seed, final_size)
    }
}
