use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::{
    ChannelMapping, MappingCache, MappingSummary, RenderedFactors, ResultsDocument,
    available_dates, available_parameters, extract_factors,
};
use crate::error::{GridError, GridResult};

use super::{
    AnimationTiming, FrameOutcome, GridAnimation, GridImage, GridRenderOptions,
    VisualizationConfig, render_grid,
};

/// Entry point tying the mapping catalogue to extraction and rendering.
///
/// The service owns its [`MappingCache`]; mappings change only through
/// [`GridVisualizationService::refresh_mappings`]. Rendering itself keeps no
/// state between calls.
#[derive(Debug, Clone)]
pub struct GridVisualizationService {
    config: VisualizationConfig,
    mappings: MappingCache,
}

impl GridVisualizationService {
    /// Loads every mapping in `mappings_dir` with default rendering settings.
    #[must_use]
    pub fn new(mappings_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(VisualizationConfig::default().with_mappings_dir(mappings_dir))
    }

    #[must_use]
    pub fn with_config(config: VisualizationConfig) -> Self {
        let mappings = MappingCache::load_dir(config.mappings_dir.clone());
        Self { config, mappings }
    }

    /// Wraps an already-built cache, for hosts that load mappings themselves.
    #[must_use]
    pub fn from_cache(config: VisualizationConfig, mappings: MappingCache) -> Self {
        Self { config, mappings }
    }

    #[must_use]
    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    #[must_use]
    pub fn mappings_dir(&self) -> &Path {
        self.mappings.directory()
    }

    /// Clears and reloads every mapping from disk.
    pub fn refresh_mappings(&mut self) {
        self.mappings.refresh();
        info!(count = self.mappings.len(), "mappings refreshed");
    }

    #[must_use]
    pub fn available_mappings(&self) -> Vec<MappingSummary> {
        self.mappings.available()
    }

    #[must_use]
    pub fn mapping(&self, name: &str) -> Option<&ChannelMapping> {
        self.mappings.get(name)
    }

    #[must_use]
    pub fn available_dates(&self, document: &ResultsDocument) -> Vec<String> {
        available_dates(document)
    }

    #[must_use]
    pub fn available_parameters(&self, document: &ResultsDocument) -> BTreeSet<String> {
        available_parameters(document)
    }

    #[must_use]
    pub fn extract_factors(
        &self,
        document: &ResultsDocument,
        selected_date: Option<&str>,
        factor_type: &str,
    ) -> RenderedFactors {
        extract_factors(document, selected_date, factor_type)
    }

    /// Render options derived from the service configuration.
    pub fn default_options(&self) -> GridResult<GridRenderOptions> {
        GridRenderOptions::from_config(&self.config)
    }

    /// Renders one grid for `detector`; `Ok(None)` when no such mapping exists.
    ///
    /// The first dataset of `document` is used as the title's reference date.
    pub fn render_grid(
        &self,
        detector: &str,
        document: &ResultsDocument,
        options: &GridRenderOptions,
    ) -> GridResult<Option<GridImage>> {
        let Some(mapping) = self.lookup(detector) else {
            return Ok(None);
        };
        render_for_date(mapping, document, options, options.selected_date.as_deref()).map(Some)
    }

    /// Renders one frame per available date and assembles the animation.
    ///
    /// `Ok(None)` for an unknown detector; [`GridError::NoFrames`] when no
    /// frame could be produced.
    pub fn render_animation(
        &self,
        detector: &str,
        document: &ResultsDocument,
        options: &GridRenderOptions,
        timing: AnimationTiming,
    ) -> GridResult<Option<GridAnimation>> {
        let Some(mapping) = self.lookup(detector) else {
            return Ok(None);
        };

        let dates = available_dates(document);
        if dates.is_empty() {
            warn!(detector, "no dates available for animation");
            return Err(GridError::NoFrames);
        }

        let outcomes: Vec<FrameOutcome> = dates
            .into_iter()
            .map(|date| {
                let result = render_for_date(mapping, document, options, Some(&date));
                FrameOutcome::new(date, result)
            })
            .collect();

        GridAnimation::from_outcomes(outcomes, timing).map(Some)
    }

    fn lookup(&self, detector: &str) -> Option<&ChannelMapping> {
        let mapping = self.mappings.get(detector);
        if mapping.is_none() {
            let available: Vec<String> = self
                .mappings
                .available()
                .into_iter()
                .map(|summary| summary.name)
                .collect();
            warn!(detector, ?available, "mapping not found");
        }
        mapping
    }
}

fn render_for_date(
    mapping: &ChannelMapping,
    document: &ResultsDocument,
    options: &GridRenderOptions,
    selected_date: Option<&str>,
) -> GridResult<GridImage> {
    let factors = extract_factors(document, selected_date, &options.factor_type);
    let options = options.clone().with_dates(
        selected_date.map(str::to_owned),
        document.reference().map(|dataset| dataset.date.clone()),
    );
    render_grid(mapping, &factors, &options)
}
