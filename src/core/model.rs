use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::validation;
use crate::error::{GridError, GridResult, ValidationError};

/// Ageing-factor values keyed by factor-type name, in authored order.
///
/// Values stay raw JSON so non-numeric entries survive loading and can be
/// defaulted per cell at extraction time.
pub type AgeingFactors = IndexMap<String, Value>;

/// One measured channel of a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub name: String,
    pub ageing_factors: AgeingFactors,
}

impl Channel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ageing_factors: AgeingFactors::new(),
        }
    }

    #[must_use]
    pub fn with_factor(mut self, factor_type: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ageing_factors.insert(factor_type.into(), value.into());
        self
    }

    /// Numeric value of `factor_type`, if present and a JSON number.
    #[must_use]
    pub fn factor(&self, factor_type: &str) -> Option<f64> {
        self.ageing_factors.get(factor_type).and_then(Value::as_f64)
    }
}

/// One photomultiplier module (`identifier` like `"A6"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub identifier: String,
    pub channels: Vec<Channel>,
}

impl Module {
    #[must_use]
    pub fn new(identifier: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            identifier: identifier.into(),
            channels,
        }
    }
}

/// One point-in-time measurement snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingDataset {
    pub date: String,
    pub modules: Vec<Module>,
}

impl AgingDataset {
    #[must_use]
    pub fn new(date: impl Into<String>, modules: Vec<Module>) -> Self {
        Self {
            date: date.into(),
            modules,
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = (&Module, &Channel)> {
        self.modules
            .iter()
            .flat_map(|module| module.channels.iter().map(move |channel| (module, channel)))
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.modules.iter().map(|module| module.channels.len()).sum()
    }
}

/// Root results entity: a non-empty, ordered list of datasets.
///
/// Construction always goes through structural validation, so every
/// instance satisfies the container invariants (non-empty datasets, modules
/// and channels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ResultsDocument {
    datasets: Vec<AgingDataset>,
}

impl ResultsDocument {
    pub fn new(datasets: Vec<AgingDataset>) -> Result<Self, ValidationError> {
        validation::check_containers(&datasets)?;
        Ok(Self { datasets })
    }

    /// Validates a parsed JSON value and converts it into typed records.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let datasets = validation::validate_document(value)?;
        Ok(Self { datasets })
    }

    pub fn from_json_str(input: &str) -> GridResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Ok(Self::from_value(&value)?)
    }

    pub fn to_json_pretty(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(GridError::from)
    }

    #[must_use]
    pub fn datasets(&self) -> &[AgingDataset] {
        &self.datasets
    }

    /// Last dataset in document order.
    #[must_use]
    pub fn latest(&self) -> Option<&AgingDataset> {
        self.datasets.last()
    }

    /// First dataset in document order; used as the comparison reference in titles.
    #[must_use]
    pub fn reference(&self) -> Option<&AgingDataset> {
        self.datasets.first()
    }

    /// First dataset whose date matches exactly.
    #[must_use]
    pub fn dataset_for_date(&self, date: &str) -> Option<&AgingDataset> {
        self.datasets.iter().find(|dataset| dataset.date == date)
    }

    #[must_use]
    pub fn into_datasets(self) -> Vec<AgingDataset> {
        self.datasets
    }
}

impl TryFrom<Value> for ResultsDocument {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}
