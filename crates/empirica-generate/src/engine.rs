use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use tracing::info;

use empirica_core::{Column, Dataset};

use crate::errors::GenerationError;
use crate::model::{GenerateOptions, Variant};

const AGE_MEAN: f64 = 35.0;
const AGE_SD: f64 = 10.0;
const AGE_MIN: f64 = 18.0;
const AGE_MAX: f64 = 80.0;
const INCOME_MU: f64 = 10.5;
const INCOME_SIGMA: f64 = 0.5;
const INCOME_FLOOR: f64 = 5000.0;
const TREATMENT_RATE: f64 = 0.5;

const EDUCATION_YEARS: &[i64] = &[12, 14, 16, 18, 20];
const EDUCATION_YEARS_WEIGHTS: &[f64] = &[0.2, 0.25, 0.3, 0.15, 0.1];
const EDUCATION_LEVELS: &[&str] = &["High School", "Bachelor", "Master", "PhD"];
const EDUCATION_LEVELS_WEIGHTS: &[f64] = &[0.3, 0.4, 0.2, 0.1];

/// Entry point for generating synthetic datasets.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn run(&self) -> Result<Dataset, GenerationError> {
        let GenerateOptions {
            rows,
            seed,
            variant,
        } = self.options;
        if rows == 0 {
            return Err(GenerationError::InvalidOptions(
                "rows must be greater than 0".to_string(),
            ));
        }

        let start = Instant::now();
        info!(rows, seed, variant = %variant, "generation started");

        let dataset = match variant {
            Variant::Sample => sample_dataset(rows, seed)?,
            Variant::Fake => fake_dataset(rows, seed)?,
        };

        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );
        Ok(dataset)
    }
}

fn sample_dataset(rows: usize, seed: u64) -> Result<Dataset, GenerationError> {
    let variant = Variant::Sample;
    let treatment = treatment_column(rows, seed);

    let age_dist = normal(AGE_MEAN, AGE_SD)?;
    let mut rng = column_rng(seed, "age");
    let age: Vec<i64> = (0..rows)
        .map(|_| age_dist.sample(&mut rng).round().clamp(AGE_MIN, AGE_MAX) as i64)
        .collect();

    let income_dist = log_normal(INCOME_MU, INCOME_SIGMA)?;
    let mut rng = column_rng(seed, "income");
    let income: Vec<f64> = (0..rows)
        .map(|_| round_to(income_dist.sample(&mut rng), 2).max(INCOME_FLOOR))
        .collect();

    let mut rng = column_rng(seed, "education_years");
    let education_years: Vec<i64> = (0..rows)
        .map(|_| EDUCATION_YEARS[weighted_index(&mut rng, EDUCATION_YEARS_WEIGHTS)])
        .collect();

    let base_dist = normal(variant.outcome_baseline(), 15.0)?;
    let noise_dist = normal(0.0, 5.0)?;
    let mut base_rng = column_rng(seed, "outcome");
    let mut noise_rng = column_rng(seed, "outcome_noise");
    let outcome: Vec<f64> = treatment
        .iter()
        .map(|&treated| {
            let base = round_to(base_dist.sample(&mut base_rng), 2);
            let noise = noise_dist.sample(&mut noise_rng);
            round_to(
                base + treated as f64 * variant.treatment_effect() + noise,
                2,
            )
        })
        .collect();

    let dataset = Dataset::new(vec![
        id_column(rows),
        Column::int("treatment", treatment),
        Column::int("age", age),
        Column::float("income", income),
        Column::int("education_years", education_years),
        Column::float("outcome", outcome),
    ])?;
    Ok(dataset)
}

fn fake_dataset(rows: usize, seed: u64) -> Result<Dataset, GenerationError> {
    let variant = Variant::Fake;
    let treatment = treatment_column(rows, seed);

    let age_dist = normal(AGE_MEAN, AGE_SD)?;
    let mut rng = column_rng(seed, "age");
    let age: Vec<i64> = (0..rows)
        .map(|_| age_dist.sample(&mut rng).clamp(AGE_MIN, AGE_MAX).trunc() as i64)
        .collect();

    let income_dist = log_normal(INCOME_MU, INCOME_SIGMA)?;
    let mut rng = column_rng(seed, "income");
    let income: Vec<f64> = (0..rows).map(|_| income_dist.sample(&mut rng)).collect();

    let mut rng = column_rng(seed, "education");
    let education: Vec<&str> = (0..rows)
        .map(|_| EDUCATION_LEVELS[weighted_index(&mut rng, EDUCATION_LEVELS_WEIGHTS)])
        .collect();

    let mut rng = column_rng(seed, "satisfaction");
    let satisfaction: Vec<i64> = (0..rows).map(|_| rng.random_range(1..=10)).collect();

    let noise_dist = normal(0.0, 10.0)?;
    let mut rng = column_rng(seed, "outcome");
    let outcome: Vec<f64> = treatment
        .iter()
        .zip(&age)
        .map(|(&treated, &age)| {
            variant.outcome_baseline()
                + treated as f64 * variant.treatment_effect()
                + (age as f64 - AGE_MEAN) * 0.2
                + noise_dist.sample(&mut rng)
        })
        .collect();

    let dataset = Dataset::new(vec![
        id_column(rows),
        Column::int("treatment", treatment),
        Column::int("age", age),
        Column::float("income", income),
        Column::text("education", education),
        Column::int("satisfaction", satisfaction),
        Column::float("outcome", outcome),
    ])?;
    Ok(dataset)
}

fn id_column(rows: usize) -> Column {
    Column::int("id", 1..=rows as i64)
}

fn treatment_column(rows: usize, seed: u64) -> Vec<i64> {
    let mut rng = column_rng(seed, "treatment");
    (0..rows)
        .map(|_| i64::from(rng.random_bool(TREATMENT_RATE)))
        .collect()
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>, GenerationError> {
    Normal::new(mean, sd).map_err(|err| GenerationError::Distribution(err.to_string()))
}

fn log_normal(mu: f64, sigma: f64) -> Result<LogNormal<f64>, GenerationError> {
    LogNormal::new(mu, sigma).map_err(|err| GenerationError::Distribution(err.to_string()))
}

/// Draw an index with probability proportional to `weights`.
fn weighted_index(rng: &mut ChaCha8Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut roll = rng.random_range(0.0..total);
    for (idx, weight) in weights.iter().enumerate() {
        if roll < *weight {
            return idx;
        }
        roll -= weight;
    }
    weights.len() - 1
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Independent stream per column so adding a column never shifts the others.
fn column_rng(seed: u64, column: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_seed(seed, column))
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_seeds_differ_by_name() {
        assert_ne!(hash_seed(42, "age"), hash_seed(42, "income"));
        assert_ne!(hash_seed(1, "age"), hash_seed(2, "age"));
    }

    #[test]
    fn weighted_index_respects_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let idx = weighted_index(&mut rng, &[0.0, 1.0, 0.0]);
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn weighted_index_tracks_probabilities() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut counts = [0_usize; 5];
        for _ in 0..20_000 {
            counts[weighted_index(&mut rng, EDUCATION_YEARS_WEIGHTS)] += 1;
        }
        for (count, weight) in counts.iter().zip(EDUCATION_YEARS_WEIGHTS) {
            let share = *count as f64 / 20_000.0;
            assert!((share - weight).abs() < 0.02, "share {share} vs {weight}");
        }
    }

    #[test]
    fn zero_rows_is_rejected() {
        let engine = GenerationEngine::new(GenerateOptions {
            rows: 0,
            ..GenerateOptions::default()
        });
        assert!(matches!(
            engine.run(),
            Err(GenerationError::InvalidOptions(_))
        ));
    }
}
