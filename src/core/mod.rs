pub mod example_data;
pub mod factors;
pub mod key;
pub mod mapping;
pub mod model;
pub mod types;
mod validation;

pub use example_data::{
    EXAMPLE_FACTOR_MAX, EXAMPLE_FACTOR_MIN, ExampleDataConfig, generate_example_data,
};
pub use factors::{
    DEFAULT_FACTOR_VALUE, DocumentSummary, FactorType, RenderedFactors, available_dates,
    available_parameters, extract_factors, factor_display_name, format_parameter_name,
    select_dataset,
};
pub use key::{ChannelKey, normalize_channel_key};
pub use mapping::{ChannelMapping, GridPosition, MappingCache, MappingSummary};
pub use model::{AgeingFactors, AgingDataset, Channel, Module, ResultsDocument};
pub use types::Viewport;
