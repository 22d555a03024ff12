pub mod entity {
    use serde::{Deserialize, Serialize};

    pub type MovieId = u32;
    pub type Ethnicity = String;
    pub type Genre = String;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum Gender {
        #[serde(rename = "M")]
        Male,
        #[serde(rename = "F")]
        Female,
    }

    /// One (movie, character, actor) appearance. Missing attributes stay `None`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ActorRecord {
        pub movie: MovieId,
        pub gender: Option<Gender>,
        pub ethnicity: Option<Ethnicity>,
        pub age: Option<f64>,
        pub height: Option<f64>,
    }

    impl ActorRecord {
        pub fn new(movie: MovieId) -> ActorRecord {
            ActorRecord { movie, gender: None, ethnicity: None, age: None, height: None }
        }
        pub fn gender(mut self, gender: Gender) -> ActorRecord {
            self.gender = Some(gender);
            self
        }
        pub fn ethnicity(mut self, ethnicity: impl Into<Ethnicity>) -> ActorRecord {
            self.ethnicity = Some(ethnicity.into());
            self
        }
        pub fn age(mut self, age: f64) -> ActorRecord {
            self.age = Some(age);
            self
        }
        pub fn height(mut self, height: f64) -> ActorRecord {
            self.height = Some(height);
            self
        }
    }

    /// One (movie, genre) row of the matching table.
    #[derive(Debug, Clone, PartialEq)]
    pub struct MovieRecord {
        pub movie: MovieId,
        pub genre: Genre,
        pub languages: Vec<String>,
        pub countries: Vec<String>,
        pub box_office_revenue: Option<f64>,
    }
}


pub mod group {
    use std::collections::BTreeSet;

    use super::entity::{ActorRecord, MovieId, MovieRecord};
    use crate::cache::Population;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct ActorTable {
        records: Vec<ActorRecord>,
    }

    impl ActorTable {
        pub fn new(records: Vec<ActorRecord>) -> ActorTable {
            ActorTable { records }
        }
        pub fn records(&self) -> &[ActorRecord] {
            &self.records
        }
        pub fn len(&self) -> usize {
            self.records.len()
        }
        pub fn is_empty(&self) -> bool {
            self.records.is_empty()
        }
        pub fn universe(&self) -> BTreeSet<MovieId> {
            self.records.iter().map(|record| record.movie).collect()
        }
    }

    impl FromIterator<ActorRecord> for ActorTable {
        fn from_iter<I: IntoIterator<Item = ActorRecord>>(iter: I) -> Self {
            ActorTable::new(iter.into_iter().collect())
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
    pub struct Pool {
        movies: BTreeSet<MovieId>,
    }

    impl Pool {
        pub fn new() -> Pool {
            Pool::default()
        }
        pub fn contains(&self, movie: MovieId) -> bool {
            self.movies.contains(&movie)
        }
        pub fn len(&self) -> usize {
            self.movies.len()
        }
        pub fn is_empty(&self) -> bool {
            self.movies.is_empty()
        }
        pub fn iter(&self) -> impl Iterator<Item = MovieId> + '_ {
            self.movies.iter().copied()
        }
        pub fn insert(&mut self, movie: MovieId) -> bool {
            self.movies.insert(movie)
        }
        pub fn with(&self, movie: MovieId) -> Pool {
            let mut pool = self.clone();
            pool.insert(movie);
            pool
        }
        pub fn view<'a>(&'a self, table: &'a ActorTable) -> PoolView<'a> {
            PoolView { pool: self, table }
        }
    }

    impl FromIterator<MovieId> for Pool {
        fn from_iter<I: IntoIterator<Item = MovieId>>(iter: I) -> Self {
            Pool { movies: iter.into_iter().collect() }
        }
    }

    /// The actor records of a pool's movies, filtered from the table on every access.
    #[derive(Debug, Clone, Copy)]
    pub struct PoolView<'a> {
        pool: &'a Pool,
        table: &'a ActorTable,
    }

    impl<'a> PoolView<'a> {
        pub fn pool(&self) -> &'a Pool {
            self.pool
        }
        pub fn records(&self) -> impl Iterator<Item = &'a ActorRecord> + 'a {
            let (pool, table) = (self.pool, self.table);
            table.records.iter().filter(move |record| pool.contains(record.movie))
        }
        pub fn population(&self) -> Population {
            self.records().collect()
        }
        pub fn movie_count(&self) -> usize {
            self.pool.len()
        }
        pub fn actor_count(&self) -> usize {
            self.records().count()
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct MovieTable {
        rows: Vec<MovieRecord>,
    }

    impl MovieTable {
        pub fn new(rows: Vec<MovieRecord>) -> MovieTable {
            MovieTable { rows }
        }
        pub fn rows(&self) -> &[MovieRecord] {
            &self.rows
        }
        pub fn len(&self) -> usize {
            self.rows.len()
        }
        pub fn is_empty(&self) -> bool {
            self.rows.is_empty()
        }
        pub fn genre<'a>(&'a self, genre: &'a str) -> impl Iterator<Item = &'a MovieRecord> + 'a {
            self.rows.iter().filter(move |row| row.genre == genre)
        }
        pub fn restrict_to_genres(&self, genres: &[&str]) -> MovieTable {
            self.rows
                .iter()
                .filter(|row| genres.contains(&row.genre.as_str()))
                .cloned()
                .collect()
        }
        pub fn movie_ids(&self) -> BTreeSet<MovieId> {
            self.rows.iter().map(|row| row.movie).collect()
        }
    }

    impl FromIterator<MovieRecord> for MovieTable {
        fn from_iter<I: IntoIterator<Item = MovieRecord>>(iter: I) -> Self {
            MovieTable::new(iter.into_iter().collect())
        }
    }
}

pub mod condition {
    use serde::Deserialize;

    pub type Score = f64;

    #[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
    pub struct ParityReference {
        pub female: f64,
    }

    /// Per-gender reference frequencies, one entry per bin of the matching schema.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct HistogramReference {
        pub male: Vec<f64>,
        pub female: Vec<f64>,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct ReferenceSet {
        pub parity: ParityReference,
        pub age: HistogramReference,
        pub height: HistogramReference,
    }

    /// Equal-width bins over `[start, start + width * bins]`, last bin closed.
    /// Raw values are multiplied by `scale` before binning.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct BinSchema {
        pub name: &'static str,
        pub start: f64,
        pub width: f64,
        pub bins: usize,
        pub scale: f64,
    }

    impl BinSchema {
        pub const AGE: BinSchema = BinSchema { name: "age", start: 0.0, width: 5.0, bins: 16, scale: 1.0 };
        // heights are stored in meters, binned in centimeters
        pub const HEIGHT: BinSchema = BinSchema { name: "height", start: 142.0, width: 3.0, bins: 17, scale: 100.0 };

        pub fn end(&self) -> f64 {
            self.start + self.width * self.bins as f64
        }

        pub fn index(&self, raw: f64) -> Option<usize> {
            let value = raw * self.scale;
            if !(self.start..=self.end()).contains(&value) {
                return None;
            }
            let index = ((value - self.start) / self.width).floor() as usize;
            Some(index.min(self.bins - 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::condition::BinSchema;
    use super::entity::{ActorRecord, Gender, MovieRecord};
    use super::group::{ActorTable, MovieTable, Pool};

    #[test]
    fn view_filters_records_by_membership() {
        let table: ActorTable = vec![
            ActorRecord::new(1).gender(Gender::Male),
            ActorRecord::new(2).gender(Gender::Female),
            ActorRecord::new(2),
            ActorRecord::new(3),
        ]
        .into_iter()
        .collect();
        let pool: Pool = [2, 3].into_iter().collect();
        let view = pool.view(&table);
        assert_eq!(view.actor_count(), 3);
        assert_eq!(view.movie_count(), 2);
        assert!(view.records().all(|record| record.movie != 1));
    }

    #[test]
    fn pool_with_leaves_original_untouched() {
        let pool: Pool = [1, 2].into_iter().collect();
        let grown = pool.with(5);
        assert_eq!(pool.len(), 2);
        assert_eq!(grown.len(), 3);
        assert!(grown.contains(5));
        assert_eq!(pool.with(1), pool);
    }

    #[test]
    fn restrict_to_genres_keeps_matching_rows_in_order() {
        let row = |movie, genre: &str| MovieRecord {
            movie,
            genre: genre.to_string(),
            languages: vec![],
            countries: vec![],
            box_office_revenue: None,
        };
        let table = MovieTable::new(vec![
            row(7, "Drama"),
            row(3, "Comedy"),
            row(7, "Horror"),
            row(1, "Drama"),
            row(5, "Western"),
            row(3, "Drama"),
        ]);
        let restricted = table.restrict_to_genres(&["Drama", "Western"]);
        let rows: Vec<(u32, &str)> = restricted.rows().iter().map(|r| (r.movie, r.genre.as_str())).collect();
        assert_eq!(rows, vec![(7, "Drama"), (1, "Drama"), (5, "Western"), (3, "Drama")]);
        assert!(table.restrict_to_genres(&[]).is_empty());
    }

    #[test]
    fn universe_is_distinct_and_sorted() {
        let table: ActorTable = [4, 1, 4, 2].into_iter().map(ActorRecord::new).collect();
        assert_eq!(table.universe().into_iter().collect::<Vec<_>>(), vec![1, 2, 4]);
    }

    #[test]
    fn bin_schema_edges() {
        assert_eq!(BinSchema::AGE.index(0.0), Some(0));
        assert_eq!(BinSchema::AGE.index(4.99), Some(0));
        assert_eq!(BinSchema::AGE.index(5.0), Some(1));
        assert_eq!(BinSchema::AGE.index(80.0), Some(15));
        assert_eq!(BinSchema::AGE.index(80.5), None);
        assert_eq!(BinSchema::HEIGHT.index(1.41), None);
        assert_eq!(BinSchema::HEIGHT.index(1.42), Some(0));
        assert_eq!(BinSchema::HEIGHT.index(1.93), Some(16));
        assert_eq!(BinSchema::HEIGHT.index(1.80), Some(12));
    }
}
