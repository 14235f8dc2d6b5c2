use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{FactorType, Viewport};
use crate::error::{GridError, GridResult};
use crate::render::{ColorScale, ColorScaleRange};

use super::AnimationTiming;

pub const VISUALIZATION_CONFIG_JSON_SCHEMA_V1: u32 = 1;

const MAPPINGS_DIR_NAME: &str = "mappings";

/// Rendering and catalogue settings shared by the service and the CLI.
///
/// Serializable so hosts can persist a setup as JSON. Every field has a
/// default, so partial documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_mappings_dir")]
    pub mappings_dir: PathBuf,
    #[serde(default = "default_factor_type")]
    pub factor_type: String,
    #[serde(default = "default_color_scale")]
    pub color_scale: String,
    /// Hex palette used when `color_scale` is `custom`; empty keeps the built-in one.
    #[serde(default)]
    pub custom_colors: Vec<String>,
    #[serde(default = "default_scale_min")]
    pub scale_min: f64,
    #[serde(default = "default_scale_max")]
    pub scale_max: f64,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default = "default_frame_duration_ms")]
    pub frame_duration_ms: u32,
    /// GIF repeat count; `0` loops forever.
    #[serde(default)]
    pub loop_count: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfigJsonContractV1 {
    pub schema_version: u32,
    pub config: VisualizationConfig,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            mappings_dir: default_mappings_dir(),
            factor_type: default_factor_type(),
            color_scale: default_color_scale(),
            custom_colors: Vec::new(),
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
            viewport: Viewport::default(),
            frame_duration_ms: default_frame_duration_ms(),
            loop_count: 0,
        }
    }
}

impl VisualizationConfig {
    #[must_use]
    pub fn with_mappings_dir(mut self, mappings_dir: impl Into<PathBuf>) -> Self {
        self.mappings_dir = mappings_dir.into();
        self
    }

    #[must_use]
    pub fn with_factor_type(mut self, factor_type: impl Into<String>) -> Self {
        self.factor_type = factor_type.into();
        self
    }

    #[must_use]
    pub fn with_color_scale(mut self, color_scale: impl Into<String>) -> Self {
        self.color_scale = color_scale.into();
        self
    }

    #[must_use]
    pub fn with_custom_colors(mut self, custom_colors: Vec<String>) -> Self {
        self.custom_colors = custom_colors;
        self
    }

    #[must_use]
    pub fn with_scale_range(mut self, scale_min: f64, scale_max: f64) -> Self {
        self.scale_min = scale_min;
        self.scale_max = scale_max;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_frame_duration_ms(mut self, frame_duration_ms: u32) -> Self {
        self.frame_duration_ms = frame_duration_ms;
        self
    }

    #[must_use]
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Resolved color scale, including a user palette when configured.
    pub fn resolved_color_scale(&self) -> GridResult<ColorScale> {
        ColorScale::from_name(&self.color_scale, &self.custom_colors)
    }

    pub fn color_range(&self) -> GridResult<ColorScaleRange> {
        ColorScaleRange::new(self.scale_min, self.scale_max)
    }

    #[must_use]
    pub fn animation_timing(&self) -> AnimationTiming {
        AnimationTiming::new(self.frame_duration_ms, self.loop_count)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.factor_type.trim().is_empty() {
            return Err(GridError::InvalidData(
                "factor type must not be empty".to_owned(),
            ));
        }
        if !self.viewport.is_valid() {
            return Err(GridError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if self.frame_duration_ms == 0 {
            return Err(GridError::InvalidData(
                "frame duration must be > 0 ms".to_owned(),
            ));
        }
        self.color_range()?;
        self.resolved_color_scale()?;
        Ok(())
    }

    /// Whether the configured factor type is one of the well-known names.
    #[must_use]
    pub fn has_known_factor_type(&self) -> bool {
        FactorType::from_name(&self.factor_type).is_some()
    }

    pub fn to_json_pretty(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            GridError::InvalidData(format!("failed to serialize visualization config: {e}"))
        })
    }

    pub fn to_json_contract_v1_pretty(&self) -> GridResult<String> {
        let payload = VisualizationConfigJsonContractV1 {
            schema_version: VISUALIZATION_CONFIG_JSON_SCHEMA_V1,
            config: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            GridError::InvalidData(format!(
                "failed to serialize visualization config contract v1: {e}"
            ))
        })
    }

    /// Parses either a bare config object or a versioned contract payload,
    /// then validates it.
    pub fn from_json_compat_str(input: &str) -> GridResult<Self> {
        let config = match serde_json::from_str::<VisualizationConfigJsonContractV1>(input) {
            Ok(payload) => {
                if payload.schema_version != VISUALIZATION_CONFIG_JSON_SCHEMA_V1 {
                    return Err(GridError::InvalidData(format!(
                        "unsupported visualization config schema version: {}",
                        payload.schema_version
                    )));
                }
                payload.config
            }
            Err(_) => serde_json::from_str::<Self>(input).map_err(|e| {
                GridError::InvalidData(format!("failed to parse visualization config: {e}"))
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> GridResult<Self> {
        let input = fs::read_to_string(path).map_err(|source| GridError::io(path, source))?;
        Self::from_json_compat_str(&input)
    }
}

/// `mappings` in the working directory when it exists, otherwise `mappings`
/// next to the running executable, otherwise the relative `mappings` path.
#[must_use]
pub fn default_mappings_dir() -> PathBuf {
    resolve_mappings_dir(env::current_exe().ok().as_deref())
}

fn resolve_mappings_dir(executable: Option<&Path>) -> PathBuf {
    let relative = PathBuf::from(MAPPINGS_DIR_NAME);
    if relative.is_dir() {
        return relative;
    }
    executable
        .and_then(Path::parent)
        .map(|dir| dir.join(MAPPINGS_DIR_NAME))
        .filter(|candidate| candidate.is_dir())
        .unwrap_or(relative)
}

fn default_factor_type() -> String {
    FactorType::default().as_str().to_owned()
}

fn default_color_scale() -> String {
    ColorScale::default().name().to_owned()
}

fn default_scale_min() -> f64 {
    ColorScaleRange::default().min()
}

fn default_scale_max() -> f64 {
    ColorScaleRange::default().max()
}

fn default_frame_duration_ms() -> u32 {
    500
}
