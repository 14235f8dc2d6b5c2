use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::key::ChannelKey;
use crate::core::model::{AgingDataset, ResultsDocument};

/// Value used for cells whose factor is absent or not numeric (no ageing).
pub const DEFAULT_FACTOR_VALUE: f64 = 1.0;

/// Resolved factor value per canonical key, in dataset order.
pub type RenderedFactors = IndexMap<ChannelKey, f64>;

/// The well-known ageing-factor types produced by the analysis pipeline.
///
/// Documents may carry additional custom types; those are addressed by plain
/// string and discovered through [`available_parameters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorType {
    #[default]
    NormalizedGaussAgeingFactor,
    NormalizedWeightedAgeingFactor,
    GaussianAgeingFactor,
    WeightedAgeingFactor,
    AgeingFactor,
}

impl FactorType {
    pub const ALL: [Self; 5] = [
        Self::NormalizedGaussAgeingFactor,
        Self::NormalizedWeightedAgeingFactor,
        Self::GaussianAgeingFactor,
        Self::WeightedAgeingFactor,
        Self::AgeingFactor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NormalizedGaussAgeingFactor => "normalized_gauss_ageing_factor",
            Self::NormalizedWeightedAgeingFactor => "normalized_weighted_ageing_factor",
            Self::GaussianAgeingFactor => "gaussian_ageing_factor",
            Self::WeightedAgeingFactor => "weighted_ageing_factor",
            Self::AgeingFactor => "ageing_factor",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NormalizedGaussAgeingFactor => "Normalized Gaussian",
            Self::NormalizedWeightedAgeingFactor => "Normalized Weighted",
            Self::GaussianAgeingFactor => "Gaussian",
            Self::WeightedAgeingFactor => "Weighted",
            Self::AgeingFactor => "Ageing Factor",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|factor| factor.as_str() == name)
    }
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable name for any factor type, known or custom.
#[must_use]
pub fn factor_display_name(factor_type: &str) -> String {
    match FactorType::from_name(factor_type) {
        Some(known) => known.display_name().to_owned(),
        None => format_parameter_name(factor_type),
    }
}

/// Turns `snake_case_name` into `Snake Case Name`.
///
/// Title-casing starts a new word after any non-alphabetic character, so
/// `"testparameter"` stays one word (`"Testparameter"`).
#[must_use]
pub fn format_parameter_name(parameter: &str) -> String {
    let mut formatted = String::with_capacity(parameter.len());
    let mut previous_is_letter = false;
    for ch in parameter.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if previous_is_letter {
                formatted.extend(ch.to_lowercase());
            } else {
                formatted.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            formatted.push(ch);
            previous_is_letter = false;
        }
    }
    formatted
}

/// Picks the dataset to render: the last one in document order when no date is
/// given, otherwise the first exact date match.
#[must_use]
pub fn select_dataset<'a>(
    document: &'a ResultsDocument,
    selected_date: Option<&str>,
) -> Option<&'a AgingDataset> {
    match selected_date {
        None => document.latest(),
        Some(date) => document.dataset_for_date(date),
    }
}

/// Resolves one factor value per channel of the selected dataset.
///
/// An unknown date yields an empty map. Every channel of the selected dataset
/// contributes an entry. Booleans count as `1.0`/`0.0`; absent, string and
/// other non-numeric values become [`DEFAULT_FACTOR_VALUE`].
#[must_use]
pub fn extract_factors(
    document: &ResultsDocument,
    selected_date: Option<&str>,
    factor_type: &str,
) -> RenderedFactors {
    let mut factors = RenderedFactors::new();

    let Some(dataset) = select_dataset(document, selected_date) else {
        warn!(date = ?selected_date, "no dataset found for date");
        return factors;
    };

    for (module, channel) in dataset.channels() {
        let key = ChannelKey::normalize(&module.identifier, &channel.name);
        let value = match channel.ageing_factors.get(factor_type) {
            Some(Value::Number(number)) => number.as_f64().unwrap_or_else(|| {
                warn!(%key, %number, "ageing factor not representable as f64");
                DEFAULT_FACTOR_VALUE
            }),
            Some(Value::Bool(flag)) => {
                debug!(%key, flag = *flag, "boolean ageing factor coerced to number");
                if *flag { 1.0 } else { 0.0 }
            }
            None | Some(Value::String(_)) => {
                debug!(%key, factor_type, "no valid ageing factor");
                DEFAULT_FACTOR_VALUE
            }
            Some(other) => {
                warn!(%key, value = %other, "invalid ageing factor");
                DEFAULT_FACTOR_VALUE
            }
        };
        factors.insert(key, value);
    }

    info!(
        count = factors.len(),
        factor_type,
        date = %dataset.date,
        "extracted ageing factors"
    );
    factors
}

/// Every factor-type name seen on any channel of any dataset.
#[must_use]
pub fn available_parameters(document: &ResultsDocument) -> BTreeSet<String> {
    document
        .datasets()
        .iter()
        .flat_map(|dataset| dataset.channels())
        .flat_map(|(_, channel)| channel.ageing_factors.keys().cloned())
        .collect()
}

/// Dataset dates sorted ascending by string order.
#[must_use]
pub fn available_dates(document: &ResultsDocument) -> Vec<String> {
    let mut dates: Vec<String> = document
        .datasets()
        .iter()
        .map(|dataset| dataset.date.clone())
        .filter(|date| !date.is_empty())
        .collect();
    dates.sort();
    dates
}

/// Overview of a loaded document, as printed by `--summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub total_datasets: usize,
    pub dates: Vec<String>,
    pub modules_per_dataset: Vec<usize>,
    pub total_channels: usize,
    pub modules: Vec<String>,
    pub unique_modules: usize,
}

impl DocumentSummary {
    #[must_use]
    pub fn of(document: &ResultsDocument) -> Self {
        let datasets = document.datasets();
        let modules: BTreeSet<String> = datasets
            .iter()
            .flat_map(|dataset| dataset.modules.iter())
            .map(|module| module.identifier.clone())
            .filter(|identifier| !identifier.is_empty())
            .collect();

        Self {
            total_datasets: datasets.len(),
            dates: datasets.iter().map(|dataset| dataset.date.clone()).collect(),
            modules_per_dataset: datasets.iter().map(|dataset| dataset.modules.len()).collect(),
            total_channels: datasets.iter().map(AgingDataset::channel_count).sum(),
            unique_modules: modules.len(),
            modules: modules.into_iter().collect(),
        }
    }
}
