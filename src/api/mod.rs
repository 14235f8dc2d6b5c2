mod animation;
mod config;
mod grid_image;
mod loader;
mod service;

pub use animation::{AnimationFrame, AnimationTiming, FrameOutcome, GridAnimation};
pub use config::{
    VISUALIZATION_CONFIG_JSON_SCHEMA_V1, VisualizationConfig, VisualizationConfigJsonContractV1,
    default_mappings_dir,
};
pub use grid_image::{
    GridCell, GridImage, GridRenderOptions, NO_DATA_MESSAGE, OutputFormat, grid_title,
    label_color_for, render_grid,
};
pub use loader::{load_document_from_path, load_document_from_str, write_example_document};
pub use service::GridVisualizationService;
