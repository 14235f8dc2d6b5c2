use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::render::Color;

/// Black-brown-orange-yellow-green palette used by default for ageing maps.
pub const DEFAULT_CUSTOM_PALETTE: [&str; 15] = [
    "#000000", "#623200", "#944A00", "#C66300", "#F77B02", "#FF9B19", "#FFC642", "#FFEE6B",
    "#EEF773", "#C5DE62", "#9BC64A", "#73AD39", "#4A8C22", "#207311", "#016300",
];

const RD_YL_GN: [&str; 11] = [
    "#A50026", "#D73027", "#F46D43", "#FDAE61", "#FEE08B", "#FFFFBF", "#D9EF8B", "#A6D96A",
    "#66BD63", "#1A9850", "#006837",
];
const VIRIDIS: [&str; 10] = [
    "#440154", "#482878", "#3E4989", "#31688E", "#26828E", "#1F9E89", "#35B779", "#6ECE58",
    "#B5DE2B", "#FDE725",
];
const PLASMA: [&str; 10] = [
    "#0D0887", "#46039F", "#7201A8", "#9C179E", "#BD3786", "#D8576B", "#ED7953", "#FB9F3A",
    "#FDCA26", "#F0F921",
];
const COOLWARM: [&str; 8] = [
    "#3B4CC0", "#6788EE", "#9ABBFF", "#C9D7F0", "#EDD1C2", "#F7A889", "#E26952", "#B40426",
];
const RD_BU: [&str; 11] = [
    "#67001F", "#B2182B", "#D6604D", "#F4A582", "#FDDBC7", "#F7F7F7", "#D1E5F0", "#92C5DE",
    "#4393C3", "#2166AC", "#053061",
];
const SEISMIC: [&str; 5] = ["#00004D", "#0000FF", "#FFFFFF", "#FF0000", "#800000"];

/// Value-to-color mapping applied to normalized values in `0..=1`.
///
/// Named gradients interpolate linearly between their stops. `Custom` and
/// `Listed` palettes are sampled as equal-width discrete bins.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColorScale {
    #[default]
    Custom,
    RdYlGn,
    Viridis,
    Plasma,
    Coolwarm,
    RdBu,
    Seismic,
    Listed(Vec<Color>),
}

impl ColorScale {
    pub const NAMED: [Self; 7] = [
        Self::Custom,
        Self::RdYlGn,
        Self::Viridis,
        Self::Plasma,
        Self::Coolwarm,
        Self::RdBu,
        Self::Seismic,
    ];

    /// Resolves a scale name; `"custom"` with a non-empty palette becomes `Listed`.
    pub fn from_name(name: &str, custom_colors: &[String]) -> GridResult<Self> {
        let scale: Self = name.parse()?;
        if scale == Self::Custom && !custom_colors.is_empty() {
            return Self::listed(custom_colors);
        }
        Ok(scale)
    }

    pub fn listed<S: AsRef<str>>(hex_colors: &[S]) -> GridResult<Self> {
        if hex_colors.is_empty() {
            return Err(GridError::InvalidData(
                "listed color scale needs at least one color".to_owned(),
            ));
        }
        hex_colors
            .iter()
            .map(|hex| Color::from_hex(hex.as_ref()))
            .collect::<GridResult<Vec<_>>>()
            .map(Self::Listed)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::RdYlGn => "RdYlGn",
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::Coolwarm => "coolwarm",
            Self::RdBu => "RdBu",
            Self::Seismic => "seismic",
            Self::Listed(_) => "listed",
        }
    }

    /// Color for a normalized position; inputs outside `0..=1` are clamped.
    #[must_use]
    pub fn sample(&self, t: f64) -> Color {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Self::Custom => sample_listed(&palette(&DEFAULT_CUSTOM_PALETTE), t),
            Self::RdYlGn => sample_gradient(&palette(&RD_YL_GN), t),
            Self::Viridis => sample_gradient(&palette(&VIRIDIS), t),
            Self::Plasma => sample_gradient(&palette(&PLASMA), t),
            Self::Coolwarm => sample_gradient(&palette(&COOLWARM), t),
            Self::RdBu => sample_gradient(&palette(&RD_BU), t),
            Self::Seismic => sample_gradient(&palette(&SEISMIC), t),
            Self::Listed(colors) => sample_listed(colors, t),
        }
    }
}

impl FromStr for ColorScale {
    type Err = GridError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::NAMED
            .into_iter()
            .find(|scale| scale.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                GridError::InvalidData(format!(
                    "unknown color scale `{name}` (expected one of: custom, RdYlGn, viridis, plasma, coolwarm, RdBu, seismic)"
                ))
            })
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value domain mapped onto the color scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScaleRange {
    min: f64,
    max: f64,
}

impl ColorScaleRange {
    pub fn new(min: f64, max: f64) -> GridResult<Self> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(GridError::InvalidData(format!(
                "color scale range must be finite with min < max (got {min}..{max})"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> f64 {
        self.max
    }

    /// `(value - min) / (max - min)` clamped to `0..=1`.
    #[must_use]
    pub fn normalize(self, value: f64) -> f64 {
        let normalized = (value - self.min) / (self.max - self.min);
        if normalized.is_nan() {
            return 0.0;
        }
        normalized.clamp(0.0, 1.0)
    }

    /// Evenly spaced tick values from `min` to `max` inclusive.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => (0..count)
                .map(|index| self.min + (self.max - self.min) * index as f64 / (count - 1) as f64)
                .collect(),
        }
    }
}

impl Default for ColorScaleRange {
    fn default() -> Self {
        Self { min: 0.4, max: 1.2 }
    }
}

fn palette(stops: &[&str]) -> Vec<Color> {
    stops
        .iter()
        .filter_map(|hex| Color::from_hex(hex).ok())
        .collect()
}

fn sample_gradient(stops: &[Color], t: f64) -> Color {
    match stops {
        [] => Color::BLACK,
        [only] => *only,
        _ => {
            let position = t * (stops.len() - 1) as f64;
            let index = (position.floor() as usize).min(stops.len() - 2);
            stops[index].lerp(stops[index + 1], position - index as f64)
        }
    }
}

fn sample_listed(colors: &[Color], t: f64) -> Color {
    if colors.is_empty() {
        return Color::BLACK;
    }
    let index = ((t * colors.len() as f64).floor() as usize).min(colors.len() - 1);
    colors[index]
}
