use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::factors::FactorType;
use crate::core::model::{AgingDataset, Channel, Module, ResultsDocument};
use crate::error::{GridError, GridResult};

/// Lower bound of generated base factors.
pub const EXAMPLE_FACTOR_MIN: f64 = 0.5;
/// Upper bound of generated base factors.
pub const EXAMPLE_FACTOR_MAX: f64 = 1.2;

const EXAMPLE_START: (i32, u32, u32) = (2024, 1, 1);
const EXAMPLE_DATE_STEP_DAYS: u64 = 30;
const EXAMPLE_DECAY_PER_DATASET: f64 = 0.05;
const EXAMPLE_JITTER: f64 = 0.1;

/// Shape of a synthetic results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleDataConfig {
    pub detector: String,
    pub num_datasets: usize,
    pub modules_per_dataset: usize,
    pub channels_per_module: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ExampleDataConfig {
    fn default() -> Self {
        Self {
            detector: "fta".to_owned(),
            num_datasets: 3,
            modules_per_dataset: 2,
            channels_per_module: 12,
            seed: None,
        }
    }
}

impl ExampleDataConfig {
    #[must_use]
    pub fn for_detector(detector: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_shape(
        mut self,
        num_datasets: usize,
        modules_per_dataset: usize,
        channels_per_module: usize,
    ) -> Self {
        self.num_datasets = num_datasets;
        self.modules_per_dataset = modules_per_dataset;
        self.channels_per_module = channels_per_module;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// `A` modules for the `fta` detector, `C` for everything else.
    #[must_use]
    pub fn module_prefix(&self) -> &'static str {
        if self.detector == "fta" { "A" } else { "C" }
    }
}

/// Generates a document that always passes validation.
///
/// Base factors decay by 0.05 per dataset with +/-0.1 jitter, clamped to
/// [`EXAMPLE_FACTOR_MIN`, `EXAMPLE_FACTOR_MAX`]; every known factor type is
/// derived from the base and rounded to 3 decimals.
pub fn generate_example_data(config: &ExampleDataConfig) -> GridResult<ResultsDocument> {
    if config.num_datasets == 0 || config.modules_per_dataset == 0 || config.channels_per_module == 0
    {
        return Err(GridError::InvalidData(
            "example data needs at least one dataset, module and channel".to_owned(),
        ));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (year, month, day) = EXAMPLE_START;
    let start = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| GridError::InvalidData("invalid example start date".to_owned()))?;
    let prefix = config.module_prefix();

    let mut datasets = Vec::with_capacity(config.num_datasets);
    for dataset_index in 0..config.num_datasets {
        let date = start
            .checked_add_days(Days::new(dataset_index as u64 * EXAMPLE_DATE_STEP_DAYS))
            .ok_or_else(|| GridError::InvalidData("example date out of range".to_owned()))?;

        let modules = (0..config.modules_per_dataset)
            .map(|module_index| {
                let channels = (1..=config.channels_per_module)
                    .map(|channel_number| {
                        let jitter = rng.random_range(-EXAMPLE_JITTER..EXAMPLE_JITTER);
                        let base = (1.0 - dataset_index as f64 * EXAMPLE_DECAY_PER_DATASET
                            + jitter)
                            .clamp(EXAMPLE_FACTOR_MIN, EXAMPLE_FACTOR_MAX);
                        example_channel(channel_number, base)
                    })
                    .collect();
                Module::new(format!("{prefix}{module_index}"), channels)
            })
            .collect();

        datasets.push(AgingDataset::new(date.format("%Y-%m-%d").to_string(), modules));
    }

    debug!(
        detector = %config.detector,
        datasets = datasets.len(),
        "generated example data"
    );
    Ok(ResultsDocument::new(datasets)?)
}

fn example_channel(channel_number: usize, base: f64) -> Channel {
    Channel::new(format!("CH{channel_number:02}"))
        .with_factor(
            FactorType::NormalizedGaussAgeingFactor.as_str(),
            round3(base),
        )
        .with_factor(
            FactorType::NormalizedWeightedAgeingFactor.as_str(),
            round3(base * 0.98),
        )
        .with_factor(FactorType::GaussianAgeingFactor.as_str(), round3(base * 1.1))
        .with_factor(FactorType::WeightedAgeingFactor.as_str(), round3(base * 1.05))
        .with_factor(FactorType::AgeingFactor.as_str(), round3(base))
}

fn round3(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|decimal| decimal.round_dp(3))
        .and_then(|decimal| decimal.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round3_matches_decimal_rounding() {
        assert_eq!(round3(0.95349), 0.953);
        assert_eq!(round3(1.0), 1.0);
        assert_eq!(round3(0.5), 0.5);
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let config = ExampleDataConfig::default().with_seed(7);
        let first = generate_example_data(&config).expect("first");
        let second = generate_example_data(&config).expect("second");
        assert_eq!(first, second);
    }
}
