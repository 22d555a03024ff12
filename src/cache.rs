use std::collections::{BTreeSet, HashMap};
use std::ops::Add;

use itertools::{EitherOrBoth, Itertools};

use crate::model::condition::BinSchema;
use crate::model::entity::{ActorRecord, Ethnicity, Gender, MovieId};
use crate::model::group::{ActorTable, Pool};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EthnicityCounter(HashMap<Ethnicity, usize>);

impl EthnicityCounter {
    pub fn record(&mut self, ethnicity: &Ethnicity) {
        *self.0.entry(ethnicity.clone()).or_insert(0) += 1;
    }
    pub fn distinct(&self) -> usize {
        self.0.len()
    }
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

impl Add for EthnicityCounter {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut counter = self.0;
        for (ethnicity, count) in rhs.0 {
            *counter.entry(ethnicity).or_insert(0) += count;
        }
        EthnicityCounter(counter)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinCounts(Vec<usize>);

impl BinCounts {
    fn record(&mut self, schema: &BinSchema, raw: f64) {
        if let Some(index) = schema.index(raw) {
            if self.0.len() < schema.bins {
                self.0.resize(schema.bins, 0);
            }
            self.0[index] += 1;
        }
    }
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
    /// Bin densities as `count / (total * width)`, `None` when no value fell in range.
    pub fn density(&self, schema: &BinSchema) -> Option<Vec<f64>> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let norm = total as f64 * schema.width;
        Some((0..schema.bins)
            .map(|index| self.0.get(index).copied().unwrap_or(0) as f64 / norm)
            .collect())
    }
}

impl Add for BinCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        BinCounts(self.0
            .into_iter()
            .zip_longest(rhs.0)
            .map(|pair| match pair {
                EitherOrBoth::Both(a, b) => a + b,
                EitherOrBoth::Left(count) | EitherOrBoth::Right(count) => count,
            })
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenderBins {
    pub male: BinCounts,
    pub female: BinCounts,
}

impl GenderBins {
    pub fn get(&self, gender: Gender) -> &BinCounts {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }
    fn get_mut(&mut self, gender: Gender) -> &mut BinCounts {
        match gender {
            Gender::Male => &mut self.male,
            Gender::Female => &mut self.female,
        }
    }
}

impl Add for GenderBins {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        GenderBins { male: self.male + rhs.male, female: self.female + rhs.female }
    }
}

/// Everything the sub-scorers read from a set of actor records, folded once.
///
/// Summaries of disjoint record sets merge with `+`, so a pool's population is the sum of
/// its movies' populations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    pub actors: usize,
    pub males: usize,
    pub females: usize,
    pub ethnicities: EthnicityCounter,
    pub ages: GenderBins,
    pub heights: GenderBins,
}

impl Population {
    pub fn record(&mut self, actor: &ActorRecord) {
        self.actors += 1;
        if let Some(ethnicity) = &actor.ethnicity {
            self.ethnicities.record(ethnicity);
        }
        let Some(gender) = actor.gender else {
            return;
        };
        match gender {
            Gender::Male => self.males += 1,
            Gender::Female => self.females += 1,
        }
        if let Some(age) = actor.age {
            self.ages.get_mut(gender).record(&BinSchema::AGE, age);
        }
        if let Some(height) = actor.height {
            self.heights.get_mut(gender).record(&BinSchema::HEIGHT, height);
        }
    }

    pub fn known_gender(&self) -> usize {
        self.males + self.females
    }

    /// Share of men among records with a known gender.
    pub fn male_ratio(&self) -> Option<f64> {
        match self.known_gender() {
            0 => None,
            known => Some(self.males as f64 / known as f64),
        }
    }

    pub fn female_ratio(&self) -> Option<f64> {
        self.male_ratio().map(|ratio| 1.0 - ratio)
    }
}

impl<'a> FromIterator<&'a ActorRecord> for Population {
    fn from_iter<I: IntoIterator<Item = &'a ActorRecord>>(iter: I) -> Self {
        let mut population = Population::default();
        iter.into_iter().for_each(|actor| population.record(actor));
        population
    }
}

impl Add for Population {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Population {
            actors: self.actors + rhs.actors,
            males: self.males + rhs.males,
            females: self.females + rhs.females,
            ethnicities: self.ethnicities + rhs.ethnicities,
            ages: self.ages + rhs.ages,
            heights: self.heights + rhs.heights,
        }
    }
}

impl<'a> Add<&'a Population> for Population {
    type Output = Self;

    fn add(self, rhs: &'a Population) -> Self::Output {
        self + rhs.clone()
    }
}

/// Per-movie populations, folded once from the actor table.
#[derive(Debug, Clone, Default)]
pub struct MovieCache {
    movies: HashMap<MovieId, Population>,
    empty: Population,
}

impl MovieCache {
    pub fn create(table: &ActorTable) -> MovieCache {
        let mut movies: HashMap<MovieId, Population> = HashMap::new();
        for actor in table.records() {
            movies.entry(actor.movie).or_default().record(actor);
        }
        MovieCache { movies, empty: Population::default() }
    }

    /// Movies absent from the table have no actors and an empty population.
    pub fn population(&self, movie: MovieId) -> &Population {
        self.movies.get(&movie).unwrap_or(&self.empty)
    }

    pub fn pool_population(&self, pool: &Pool) -> Population {
        pool.iter().fold(Population::default(), |acc, movie| acc + self.population(movie))
    }

    pub fn movies(&self) -> BTreeSet<MovieId> {
        self.movies.keys().copied().collect()
    }
}
