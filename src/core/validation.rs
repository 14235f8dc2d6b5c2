use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::factors::FactorType;
use crate::core::model::{AgeingFactors, AgingDataset, Channel, Module};
use crate::error::ValidationError;

const DATASETS_FIELD: &str = "datasets";
const DATE_FIELD: &str = "date";
const MODULES_FIELD: &str = "modules";
const IDENTIFIER_FIELD: &str = "identifier";
const LEGACY_ID_FIELD: &str = "id";
const CHANNELS_FIELD: &str = "channels";
const NAME_FIELD: &str = "name";
const AGEING_FACTORS_FIELD: &str = "ageing_factors";

const DOCUMENT_LOCATION: &str = "document";

/// Walks a parsed document top-down and returns typed datasets.
///
/// The first structural violation is returned. Channels without any numeric
/// known factor type only produce a warning.
pub(crate) fn validate_document(value: &Value) -> Result<Vec<AgingDataset>, ValidationError> {
    let root = as_object(value, DOCUMENT_LOCATION)?;
    let datasets = non_empty_array(root, DOCUMENT_LOCATION, DATASETS_FIELD)?;

    let datasets = datasets
        .iter()
        .enumerate()
        .map(|(index, dataset)| validate_dataset(dataset, index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(datasets = datasets.len(), "validated results document");
    Ok(datasets)
}

/// Container invariants for datasets assembled in code rather than parsed.
pub(crate) fn check_containers(datasets: &[AgingDataset]) -> Result<(), ValidationError> {
    if datasets.is_empty() {
        return Err(ValidationError::EmptySequence {
            location: DOCUMENT_LOCATION.to_owned(),
            field: DATASETS_FIELD,
        });
    }
    for (dataset_index, dataset) in datasets.iter().enumerate() {
        if dataset.modules.is_empty() {
            return Err(ValidationError::EmptySequence {
                location: dataset_location(dataset_index),
                field: MODULES_FIELD,
            });
        }
        for (module_index, module) in dataset.modules.iter().enumerate() {
            if module.channels.is_empty() {
                return Err(ValidationError::EmptySequence {
                    location: module_location(dataset_index, module_index),
                    field: CHANNELS_FIELD,
                });
            }
        }
    }
    Ok(())
}

fn validate_dataset(value: &Value, index: usize) -> Result<AgingDataset, ValidationError> {
    let location = dataset_location(index);
    let dataset = as_object(value, &location)?;

    require_fields(dataset, &location, &[DATE_FIELD, MODULES_FIELD])?;
    let date = dataset[DATE_FIELD]
        .as_str()
        .ok_or_else(|| ValidationError::WrongType {
            location: location.clone(),
            field: DATE_FIELD,
            expected: "a string",
        })?;

    let modules = non_empty_array(dataset, &location, MODULES_FIELD)?
        .iter()
        .enumerate()
        .map(|(module_index, module)| validate_module(module, index, module_index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AgingDataset::new(date, modules))
}

fn validate_module(
    value: &Value,
    dataset_index: usize,
    module_index: usize,
) -> Result<Module, ValidationError> {
    let location = module_location(dataset_index, module_index);
    let module = as_object(value, &location)?;

    let (field, identifier) = match (module.get(IDENTIFIER_FIELD), module.get(LEGACY_ID_FIELD)) {
        (Some(identifier), _) => (IDENTIFIER_FIELD, identifier),
        (None, Some(id)) => (LEGACY_ID_FIELD, id),
        (None, None) => return Err(ValidationError::MissingIdentifier { location }),
    };
    let identifier = match identifier {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => {
            return Err(ValidationError::WrongType {
                location,
                field,
                expected: "a string or number",
            });
        }
    };

    require_fields(module, &location, &[CHANNELS_FIELD])?;
    let channels = non_empty_array(module, &location, CHANNELS_FIELD)?
        .iter()
        .enumerate()
        .map(|(channel_index, channel)| {
            validate_channel(channel, dataset_index, module_index, channel_index)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Module::new(identifier, channels))
}

fn validate_channel(
    value: &Value,
    dataset_index: usize,
    module_index: usize,
    channel_index: usize,
) -> Result<Channel, ValidationError> {
    let location = format!(
        "{}, channel {channel_index}",
        module_location(dataset_index, module_index)
    );
    let channel = as_object(value, &location)?;

    require_fields(channel, &location, &[NAME_FIELD, AGEING_FACTORS_FIELD])?;
    let name = channel[NAME_FIELD]
        .as_str()
        .ok_or_else(|| ValidationError::WrongType {
            location: location.clone(),
            field: NAME_FIELD,
            expected: "a string",
        })?;
    let factors = channel[AGEING_FACTORS_FIELD].as_object().ok_or_else(|| {
        ValidationError::WrongType {
            location: location.clone(),
            field: AGEING_FACTORS_FIELD,
            expected: "a dictionary",
        }
    })?;

    let has_known_numeric = FactorType::ALL
        .iter()
        .any(|factor_type| factors.get(factor_type.as_str()).is_some_and(Value::is_number));
    if !has_known_numeric {
        warn!(%location, "no valid ageing factors found");
    }

    let ageing_factors: AgeingFactors = factors
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(Channel {
        name: name.to_owned(),
        ageing_factors,
    })
}

fn as_object<'a>(value: &'a Value, location: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| ValidationError::NotAnObject {
        location: location.to_owned(),
    })
}

fn require_fields(
    object: &Map<String, Value>,
    location: &str,
    fields: &[&'static str],
) -> Result<(), ValidationError> {
    match fields.iter().find(|field| !object.contains_key(**field)) {
        Some(field) => Err(ValidationError::MissingField {
            location: location.to_owned(),
            field: *field,
        }),
        None => Ok(()),
    }
}

fn non_empty_array<'a>(
    object: &'a Map<String, Value>,
    location: &str,
    field: &'static str,
) -> Result<&'a [Value], ValidationError> {
    let value = object.get(field).ok_or_else(|| ValidationError::MissingField {
        location: location.to_owned(),
        field,
    })?;
    let items = value.as_array().ok_or_else(|| ValidationError::WrongType {
        location: location.to_owned(),
        field,
        expected: "a list",
    })?;
    if items.is_empty() {
        return Err(ValidationError::EmptySequence {
            location: location.to_owned(),
            field,
        });
    }
    Ok(items)
}

fn dataset_location(index: usize) -> String {
    format!("dataset {index}")
}

fn module_location(dataset_index: usize, module_index: usize) -> String {
    format!("dataset {dataset_index}, module {module_index}")
}
