use itertools::Itertools;

use crate::model::condition::Score;
use crate::model::group::Pool;

/// Scores of randomly drawn pools, kept alongside the pools themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreDistribution {
    values: Vec<Score>,
    pools: Vec<Pool>,
}

impl ScoreDistribution {
    pub fn push(&mut self, pool: Pool, value: Score) {
        self.pools.push(pool);
        self.values.push(value);
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn values(&self) -> &[Score] {
        &self.values
    }
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }
    pub fn min(&self) -> Option<Score> {
        self.values.iter().copied().reduce(f64::min)
    }
    pub fn max(&self) -> Option<Score> {
        self.values.iter().copied().reduce(f64::max)
    }
    /// First pool reaching the maximum value.
    pub fn best(&self) -> Option<(&Pool, Score)> {
        let max = self.max()?;
        let index = self.values.iter().position(|value| *value == max)?;
        Some((&self.pools[index], max))
    }
}

/// The `n` most frequent genres with their counts, most frequent first, ties by name.
pub fn most_common_genres<'a>(genres: impl IntoIterator<Item = &'a str>, n: usize) -> Vec<(&'a str, usize)> {
    genres
        .into_iter()
        .counts()
        .into_iter()
        .sorted_by(|(a_genre, a_count), (b_genre, b_count)| b_count.cmp(a_count).then(a_genre.cmp(b_genre)))
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_tracks_extremes() {
        let mut distribution = ScoreDistribution::default();
        assert_eq!(distribution.max(), None);
        distribution.push([1, 2].into_iter().collect(), 40.0);
        distribution.push([3, 4].into_iter().collect(), 72.0);
        distribution.push([5, 6].into_iter().collect(), 72.0);
        distribution.push([7, 8].into_iter().collect(), 12.0);
        assert_eq!(distribution.min(), Some(12.0));
        assert_eq!(distribution.max(), Some(72.0));
        let (pool, value) = distribution.best().unwrap();
        assert!(pool.contains(3));
        assert_eq!(value, 72.0);
    }

    #[test]
    fn most_common_genres_orders_by_count_then_name() {
        let genres = ["Drama", "Comedy", "Drama", "Thriller", "Comedy", "Drama", "Action"];
        assert_eq!(
            most_common_genres(genres, 3),
            vec![("Drama", 3), ("Comedy", 2), ("Action", 1)]
        );
        assert!(most_common_genres(genres, 0).is_empty());
    }
}
