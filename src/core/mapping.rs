use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::key::ChannelKey;
use crate::error::{GridError, GridResult};

const LABEL_COLUMN: &str = "PM:Channel";
const ROW_COLUMN: &str = "row";
const COL_COLUMN: &str = "col";
const MAPPING_EXTENSION: &str = "csv";

/// Physical placement of one channel on the detector grid.
///
/// Positions are cell centres; fractional values are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: f64,
    pub col: f64,
}

impl GridPosition {
    #[must_use]
    pub const fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

/// Canonical key to grid position for one detector, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelMapping {
    name: String,
    source_path: Option<PathBuf>,
    cells: IndexMap<ChannelKey, GridPosition>,
    row_count: usize,
}

#[derive(Debug, Deserialize)]
struct MappingRow {
    #[serde(rename = "PM:Channel")]
    label: String,
    row: String,
    col: String,
}

impl ChannelMapping {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a mapping from already-normalized cells (tests, programmatic layouts).
    #[must_use]
    pub fn from_cells(
        name: impl Into<String>,
        cells: impl IntoIterator<Item = (ChannelKey, GridPosition)>,
    ) -> Self {
        let mut mapping = Self::new(name);
        for (key, position) in cells {
            mapping.insert(key, position);
        }
        mapping
    }

    /// Parses mapping CSV text with at least `PM:Channel`, `row` and `col` columns.
    ///
    /// Rows with non-numeric positions or too few fields are skipped with a
    /// warning. A header missing a required column fails the whole file.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> GridResult<Self> {
        let mut mapping = Self::new(name);
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in [LABEL_COLUMN, ROW_COLUMN, COL_COLUMN] {
            if !headers.iter().any(|header| header == column) {
                return Err(GridError::InvalidData(format!(
                    "mapping `{}` is missing the `{column}` column",
                    mapping.name
                )));
            }
        }

        for (line, record) in csv_reader.deserialize::<MappingRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(err) => {
                    warn!(mapping = %mapping.name, line = line + 2, error = %err, "skipping malformed mapping row");
                    continue;
                }
            };
            if row.label.is_empty() {
                continue;
            }
            let position = match (row.row.parse::<f64>(), row.col.parse::<f64>()) {
                (Ok(r), Ok(c)) if r.is_finite() && c.is_finite() => GridPosition::new(r, c),
                _ => {
                    warn!(
                        mapping = %mapping.name,
                        label = %row.label,
                        row = %row.row,
                        col = %row.col,
                        "invalid position values"
                    );
                    continue;
                }
            };
            let key = ChannelKey::from_label(&row.label);
            if mapping.insert(key.clone(), position).is_some() {
                warn!(mapping = %mapping.name, %key, "duplicate channel in mapping, keeping last position");
            }
        }

        Ok(mapping)
    }

    pub fn from_path(path: &Path) -> GridResult<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = fs::File::open(path).map_err(|err| GridError::io(path, err))?;
        let mut mapping = Self::from_reader(name, file)?;
        mapping.source_path = Some(path.to_path_buf());
        Ok(mapping)
    }

    fn insert(&mut self, key: ChannelKey, position: GridPosition) -> Option<GridPosition> {
        self.row_count += 1;
        self.cells.insert(key, position)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<GridPosition> {
        self.cells.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelKey, &GridPosition)> {
        self.cells.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of accepted CSV rows, duplicates included.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            name: self.name.clone(),
            channel_count: self.cells.len(),
            file_path: self.source_path.clone(),
        }
    }
}

/// Listing entry for `--list-mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    pub name: String,
    pub channel_count: usize,
    pub file_path: Option<PathBuf>,
}

/// In-memory cache of every detector mapping found in one directory.
///
/// Owned by the caller; it is only mutated through [`MappingCache::refresh`].
#[derive(Debug, Clone, Default)]
pub struct MappingCache {
    directory: PathBuf,
    mappings: IndexMap<String, ChannelMapping>,
}

impl MappingCache {
    /// Loads every `*.csv` in `directory`. A missing directory yields an empty cache.
    #[must_use]
    pub fn load_dir(directory: impl Into<PathBuf>) -> Self {
        let mut cache = Self {
            directory: directory.into(),
            mappings: IndexMap::new(),
        };
        cache.reload();
        cache
    }

    /// Clears and rebuilds the cache from the same directory.
    pub fn refresh(&mut self) {
        self.mappings.clear();
        self.reload();
    }

    fn reload(&mut self) {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(directory = %self.directory.display(), error = %err, "mappings directory not readable");
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|extension| extension.eq_ignore_ascii_case(MAPPING_EXTENSION))
            })
            .collect();
        paths.sort();

        for path in paths {
            match ChannelMapping::from_path(&path) {
                Ok(mapping) => {
                    info!(
                        mapping = mapping.name(),
                        channels = mapping.len(),
                        "loaded mapping"
                    );
                    self.mappings.insert(mapping.name().to_owned(), mapping);
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to load mapping file");
                }
            }
        }

        if self.mappings.is_empty() {
            warn!(directory = %self.directory.display(), "no mapping files were loaded");
        } else {
            debug!(count = self.mappings.len(), "mapping cache rebuilt");
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Mapping for a detector identifier such as `"fta"`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ChannelMapping> {
        self.mappings.get(name)
    }

    /// Summaries of all loaded mappings, sorted by name.
    #[must_use]
    pub fn available(&self) -> Vec<MappingSummary> {
        let mut summaries: Vec<MappingSummary> =
            self.mappings.values().map(ChannelMapping::summary).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
