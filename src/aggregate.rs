use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::Population;
use crate::error::ScoreError;
use crate::model::condition::{ReferenceSet, Score};
use crate::model::group::PoolView;
use crate::score;
use crate::shaping::{Calibration, ShapeParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKey {
    Par,
    Div,
    Age,
    Hei,
}

impl ScoreKey {
    pub const ALL: [ScoreKey; 4] = [ScoreKey::Par, ScoreKey::Div, ScoreKey::Age, ScoreKey::Hei];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKey::Par => "par",
            ScoreKey::Div => "div",
            ScoreKey::Age => "age",
            ScoreKey::Hei => "hei",
        }
    }
}

impl fmt::Display for ScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<ScoreKey, f64>);

impl Weights {
    pub fn new(weights: impl IntoIterator<Item = (ScoreKey, f64)>) -> Weights {
        Weights(weights.into_iter().collect())
    }
    pub fn only(key: ScoreKey) -> Weights {
        Weights::new([(key, 1.0)])
    }
    pub fn get(&self, key: ScoreKey) -> Option<f64> {
        self.0.get(&key).copied()
    }
    pub fn iter(&self) -> impl Iterator<Item = (ScoreKey, f64)> + '_ {
        self.0.iter().map(|(key, weight)| (*key, *weight))
    }
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl Default for Weights {
    fn default() -> Self {
        Weights::new([(ScoreKey::Par, 2.0), (ScoreKey::Div, 2.0), (ScoreKey::Age, 1.0), (ScoreKey::Hei, 1.0)])
    }
}

/// Sub-scores of one pool plus their weighted aggregate.
///
/// `weighted` is the unrounded aggregate in [0, 1] (0 when undefined), `tot` the same value
/// on the 0..=100 scale, truncated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreVector {
    pub components: BTreeMap<ScoreKey, Score>,
    pub weighted: Score,
    pub tot: u32,
}

impl ScoreVector {
    pub fn get(&self, key: ScoreKey) -> Option<Score> {
        self.components.get(&key).copied()
    }
}

/// Every score the engine can compute, each with its own tuning.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreKind {
    Parity(ShapeParams),
    Diversity(Calibration),
    Age(ShapeParams),
    Height(ShapeParams),
    RescuedAge(ShapeParams, Calibration),
    RescuedHeight(ShapeParams, Calibration),
    Total(Weights),
}

impl ScoreKind {
    /// The scorer behind an aggregate key, with default tuning.
    pub fn for_key(key: ScoreKey) -> ScoreKind {
        match key {
            ScoreKey::Par => ScoreKind::Parity(ShapeParams::PARITY),
            ScoreKey::Div => ScoreKind::Diversity(Calibration::DIVERSITY),
            ScoreKey::Age => ScoreKind::RescuedAge(ShapeParams::AGE, Calibration::AGE),
            ScoreKey::Hei => ScoreKind::RescuedHeight(ShapeParams::HEIGHT, Calibration::HEIGHT),
        }
    }

    /// A single number for any kind; `Total` yields its `tot` value.
    pub fn evaluate(&self, population: &Population, references: &ReferenceSet) -> Result<Score, ScoreError> {
        match self {
            ScoreKind::Parity(params) => Ok(score::parity_score(population, &references.parity, *params)),
            ScoreKind::Diversity(calibration) => score::diversity_score(population, *calibration),
            ScoreKind::Age(params) => score::age_score(population, &references.age, *params),
            ScoreKind::Height(params) => score::height_score(population, &references.height, *params),
            ScoreKind::RescuedAge(params, calibration) => {
                score::rescued_age_score(population, &references.age, *params, *calibration)
            }
            ScoreKind::RescuedHeight(params, calibration) => {
                score::rescued_height_score(population, &references.height, *params, *calibration)
            }
            ScoreKind::Total(weights) => Ok(score_population(population, references, weights)?.tot as Score),
        }
    }
}

pub fn score_population(population: &Population, references: &ReferenceSet, weights: &Weights) -> Result<ScoreVector, ScoreError> {
    let mut components = BTreeMap::new();
    let mut aggregate = 0.0;
    for (key, weight) in weights.iter() {
        let score = ScoreKind::for_key(key).evaluate(population, references)?;
        components.insert(key, score);
        aggregate += weight * score;
    }
    let mut weighted = aggregate / weights.total();
    if weighted.is_nan() {
        weighted = 0.0;
    }
    let tot = (weighted * 100.0).trunc().clamp(0.0, u32::MAX as f64) as u32;
    Ok(ScoreVector { components, weighted, tot })
}

/// Representativeness of the pool behind `view`, from 0 (far from `references`) to 100.
pub fn representativeness_score(view: &PoolView<'_>, references: &ReferenceSet, weights: &Weights) -> Result<ScoreVector, ScoreError> {
    score_population(&view.population(), references, weights)
}
