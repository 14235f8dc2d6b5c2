use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::core::{DocumentSummary, ExampleDataConfig, ResultsDocument, generate_example_data};
use crate::error::{GridError, GridResult};

/// Parses and validates a results document from JSON text.
pub fn load_document_from_str(input: &str) -> GridResult<ResultsDocument> {
    let document = ResultsDocument::from_json_str(input)?;
    debug!(datasets = document.datasets().len(), "validated results document");
    Ok(document)
}

/// Reads, parses and validates a results document file.
pub fn load_document_from_path(path: &Path) -> GridResult<ResultsDocument> {
    let input = fs::read_to_string(path).map_err(|source| GridError::io(path, source))?;
    let document = load_document_from_str(&input)?;
    let summary = DocumentSummary::of(&document);
    info!(
        path = %path.display(),
        datasets = summary.total_datasets,
        channels = summary.total_channels,
        "loaded results document"
    );
    Ok(document)
}

/// Generates example data and writes it as pretty JSON.
pub fn write_example_document(path: &Path, config: &ExampleDataConfig) -> GridResult<ResultsDocument> {
    let document = generate_example_data(config)?;
    let json = document.to_json_pretty()?;
    fs::write(path, json).map_err(|source| GridError::io(path, source))?;
    info!(
        path = %path.display(),
        detector = %config.detector,
        datasets = config.num_datasets,
        "wrote example results document"
    );
    Ok(document)
}
