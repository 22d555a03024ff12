//! Sub-scores of a population against reference statistics, each in roughly [0, 1].

use crate::cache::{GenderBins, Population};
use crate::error::ScoreError;
use crate::model::condition::{BinSchema, HistogramReference, ParityReference, Score};
use crate::model::entity::Gender;
use crate::shaping::{normalize, shape, Calibration, ShapeParams};

/// Per-bin importance of the age histogram, youngest bin first.
pub const AGE_BIN_WEIGHTS: [f64; 16] = [5., 5., 5., 5., 1., 1., 1., 1., 1., 3., 3., 3., 3., 5., 5., 5.];
/// Per-bin importance of the height histogram, shortest bin first.
pub const HEIGHT_BIN_WEIGHTS: [f64; 17] = [3., 3., 3., 3., 2., 2., 1., 1., 1., 2., 2., 2., 3., 3., 3., 3., 3.];

pub fn parity_score(population: &Population, reference: &ParityReference, params: ShapeParams) -> Score {
    match population.female_ratio() {
        Some(ratio) => shape(ratio, reference.female, params),
        None => 0.0,
    }
}

/// Distinct ethnicities per actor with a known ethnicity, spread over `calibration`.
pub fn diversity_score(population: &Population, calibration: Calibration) -> Result<Score, ScoreError> {
    let actors = population.ethnicities.total();
    let ratio = if actors == 0 {
        0.0
    } else {
        population.ethnicities.distinct() as f64 / actors as f64
    };
    normalize(ratio, calibration)
}

pub fn age_score(population: &Population, reference: &HistogramReference, params: ShapeParams) -> Result<Score, ScoreError> {
    histogram_score(population, &population.ages, reference, &BinSchema::AGE, &AGE_BIN_WEIGHTS, params)
}

pub fn height_score(population: &Population, reference: &HistogramReference, params: ShapeParams) -> Result<Score, ScoreError> {
    histogram_score(population, &population.heights, reference, &BinSchema::HEIGHT, &HEIGHT_BIN_WEIGHTS, params)
}

pub fn rescued_age_score(
    population: &Population,
    reference: &HistogramReference,
    params: ShapeParams,
    calibration: Calibration,
) -> Result<Score, ScoreError> {
    normalize(age_score(population, reference, params)?, calibration)
}

pub fn rescued_height_score(
    population: &Population,
    reference: &HistogramReference,
    params: ShapeParams,
    calibration: Calibration,
) -> Result<Score, ScoreError> {
    normalize(height_score(population, reference, params)?, calibration)
}

fn check_shape(schema: &BinSchema, reference: &[f64], weights: &[f64]) -> Result<(), ScoreError> {
    for found in [reference.len(), weights.len()] {
        if found != schema.bins {
            return Err(ScoreError::ReferenceShapeMismatch { kind: schema.name, expected: schema.bins, found });
        }
    }
    Ok(())
}

fn histogram_score(
    population: &Population,
    bins: &GenderBins,
    reference: &HistogramReference,
    schema: &BinSchema,
    weights: &[f64],
    params: ShapeParams,
) -> Result<Score, ScoreError> {
    check_shape(schema, &reference.male, weights)?;
    check_shape(schema, &reference.female, weights)?;
    let Some(male_ratio) = population.male_ratio() else {
        return Ok(0.0);
    };
    let mut score = 0.0;
    if male_ratio != 0.0 {
        score += male_ratio * gender_score(bins, Gender::Male, &reference.male, schema, weights, params);
    }
    if male_ratio != 1.0 {
        score += (1.0 - male_ratio) * gender_score(bins, Gender::Female, &reference.female, schema, weights, params);
    }
    Ok(score)
}

fn gender_score(
    bins: &GenderBins,
    gender: Gender,
    reference: &[f64],
    schema: &BinSchema,
    weights: &[f64],
    params: ShapeParams,
) -> Score {
    let Some(density) = bins.get(gender).density(schema) else {
        return 0.0;
    };
    let total_weight: f64 = weights.iter().sum();
    let weighted: f64 = density
        .iter()
        .zip(reference)
        .zip(weights)
        .map(|((value, target), weight)| shape(*value, *target, params) * weight)
        .sum();
    weighted / total_weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::ActorRecord;
    use rstest::rstest;

    fn population(actors: &[ActorRecord]) -> Population {
        actors.iter().collect()
    }

    fn flat_reference(bins: usize, value: f64) -> HistogramReference {
        HistogramReference { male: vec![value; bins], female: vec![value; bins] }
    }

    fn mixed(women: usize, men: usize) -> Population {
        let actors: Vec<ActorRecord> = (0..women)
            .map(|_| ActorRecord::new(1).gender(Gender::Female))
            .chain((0..men).map(|_| ActorRecord::new(1).gender(Gender::Male)))
            .collect();
        population(&actors)
    }

    #[rstest]
    #[case(4, 4, 0.5)]
    #[case(1, 3, 0.25)]
    #[case(3, 0, 1.0)]
    fn parity_peaks_on_reference(#[case] women: usize, #[case] men: usize, #[case] female: f64) {
        let score = parity_score(&mixed(women, men), &ParityReference { female }, ShapeParams::PARITY);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parity_drops_away_from_reference() {
        let reference = ParityReference { female: 0.5 };
        let balanced = parity_score(&mixed(5, 5), &reference, ShapeParams::PARITY);
        let skewed = parity_score(&mixed(2, 8), &reference, ShapeParams::PARITY);
        assert!(skewed < balanced);
    }

    #[test]
    fn parity_ignores_missing_gender() {
        let mut actors = vec![ActorRecord::new(1).gender(Gender::Female), ActorRecord::new(1).gender(Gender::Male)];
        actors.extend((0..6).map(|_| ActorRecord::new(1)));
        let score = parity_score(&population(&actors), &ParityReference { female: 0.5 }, ShapeParams::PARITY);
        assert_eq!(score, 1.0);
        assert_eq!(parity_score(&population(&[ActorRecord::new(1)]), &ParityReference { female: 0.5 }, ShapeParams::PARITY), 0.0);
    }

    #[test]
    fn diversity_is_zero_without_known_ethnicity() {
        let population = population(&[ActorRecord::new(1), ActorRecord::new(2).gender(Gender::Male)]);
        assert_eq!(diversity_score(&population, Calibration::DIVERSITY), Ok(0.0));
    }

    #[rstest]
    #[case(&["a", "a", "a", "a"], 0.0)]
    #[case(&["a", "b", "a", "b"], 0.5)]
    #[case(&["a", "b", "c", "d"], 1.0)]
    fn diversity_spreads_distinct_ratio(#[case] ethnicities: &[&str], #[case] expected: f64) {
        let actors: Vec<ActorRecord> = ethnicities.iter().map(|e| ActorRecord::new(1).ethnicity(*e)).collect();
        let score = diversity_score(&population(&actors), Calibration::DIVERSITY).unwrap();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn age_matches_reference_density() {
        // every man and woman in the 30-35 bin: density 1 / 5 there, 0 elsewhere
        let actors: Vec<ActorRecord> = [Gender::Male, Gender::Female, Gender::Male]
            .into_iter()
            .map(|gender| ActorRecord::new(1).gender(gender).age(31.0))
            .collect();
        let mut reference = flat_reference(16, 0.0);
        reference.male[6] = 0.2;
        reference.female[6] = 0.2;
        let score = age_score(&population(&actors), &reference, ShapeParams::AGE).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn age_skips_absent_gender() {
        let actors = [ActorRecord::new(1).gender(Gender::Female).age(31.0)];
        let mut reference = flat_reference(16, 0.0);
        reference.female[6] = 0.2;
        let score = age_score(&population(&actors), &reference, ShapeParams::AGE).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn age_without_known_ages_scores_zero_for_that_gender() {
        let actors = [
            ActorRecord::new(1).gender(Gender::Female).age(31.0),
            ActorRecord::new(1).gender(Gender::Male),
        ];
        let mut reference = flat_reference(16, 0.0);
        reference.female[6] = 0.2;
        let score = age_score(&population(&actors), &reference, ShapeParams::AGE).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn height_bins_heights_in_centimeters() {
        let actors = [
            ActorRecord::new(1).gender(Gender::Male).height(1.80),
            ActorRecord::new(1).gender(Gender::Female).height(1.66),
        ];
        let mut reference = flat_reference(17, 0.0);
        reference.male[12] = 1.0 / 3.0;
        reference.female[8] = 1.0 / 3.0;
        let score = height_score(&population(&actors), &reference, ShapeParams::HEIGHT).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(15, 16)]
    #[case(17, 17)]
    fn histogram_reference_must_match_schema(#[case] age_bins: usize, #[case] height_bins: usize) {
        let population = mixed(1, 1);
        let age = age_score(&population, &flat_reference(age_bins, 0.0), ShapeParams::AGE);
        let height = height_score(&population, &flat_reference(height_bins, 0.0), ShapeParams::HEIGHT);
        assert!(age.is_err() || height.is_err());
        if let Err(err) = age {
            assert_eq!(err, ScoreError::ReferenceShapeMismatch { kind: "age", expected: 16, found: age_bins });
        }
        if let Err(err) = height {
            assert_eq!(err, ScoreError::ReferenceShapeMismatch { kind: "height", expected: 17, found: height_bins });
        }
    }

    #[test]
    fn rescued_scores_stay_in_unit_range() {
        let population = mixed(2, 2);
        let age = rescued_age_score(&population, &flat_reference(16, 0.01), ShapeParams::AGE, Calibration::AGE).unwrap();
        let height = rescued_height_score(&population, &flat_reference(17, 0.01), ShapeParams::HEIGHT, Calibration::HEIGHT).unwrap();
        assert!((0.0..=1.0).contains(&age));
        assert!((0.0..=1.0).contains(&height));
    }

    #[rstest]
    #[case(Calibration::AGE, 0.12, 0.0)]
    #[case(Calibration::AGE, 0.235, 0.5)]
    #[case(Calibration::AGE, 0.35, 1.0)]
    #[case(Calibration::HEIGHT, 0.5, 0.0)]
    #[case(Calibration::HEIGHT, 0.7, 0.5)]
    #[case(Calibration::HEIGHT, 0.9, 1.0)]
    fn rescue_bounds_map_raw_scores(#[case] calibration: Calibration, #[case] raw: f64, #[case] expected: f64) {
        assert!((normalize(raw, calibration).unwrap() - expected).abs() < 1e-9);
    }
}
