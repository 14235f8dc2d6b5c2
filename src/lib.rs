//! detector-grid: detector ageing results rendered onto physical channel grids.
//!
//! Results documents are validated into typed records, channel labels from
//! both the results and the CSV layouts are normalized into one key space,
//! and the extracted factors are drawn through backend-agnostic render
//! frames into PNG, JPEG, SVG or animated GIF output.

pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api::{GridVisualizationService, VisualizationConfig};
pub use error::{GridError, GridResult, ValidationError};
