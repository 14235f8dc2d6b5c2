use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{GridError, GridResult};

use super::GridImage;

/// Per-frame display time and GIF repeat behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationTiming {
    pub frame_duration_ms: u32,
    /// `0` loops forever, `n` repeats `n` times.
    pub loop_count: u16,
}

impl AnimationTiming {
    #[must_use]
    pub const fn new(frame_duration_ms: u32, loop_count: u16) -> Self {
        Self {
            frame_duration_ms,
            loop_count,
        }
    }

    #[must_use]
    pub fn repeat(self) -> Repeat {
        match self.loop_count {
            0 => Repeat::Infinite,
            count => Repeat::Finite(count),
        }
    }

    #[must_use]
    pub fn delay(self) -> Delay {
        Delay::from_numer_denom_ms(self.frame_duration_ms, 1)
    }
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self::new(500, 0)
    }
}

/// Result of rendering the grid for one date.
#[derive(Debug)]
pub struct FrameOutcome {
    pub date: String,
    pub result: GridResult<GridImage>,
}

impl FrameOutcome {
    #[must_use]
    pub fn new(date: impl Into<String>, result: GridResult<GridImage>) -> Self {
        Self {
            date: date.into(),
            result,
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// One successfully rendered animation frame.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub date: String,
    pub grid: GridImage,
    pub bitmap: RgbaImage,
}

/// Ordered frames ready to be encoded as an animated GIF.
#[derive(Debug, Clone)]
pub struct GridAnimation {
    frames: Vec<AnimationFrame>,
    skipped_dates: Vec<String>,
    timing: AnimationTiming,
}

impl GridAnimation {
    /// Keeps every frame that rendered and rasterized, in outcome order.
    ///
    /// Failed frames are logged and skipped; fails with
    /// [`GridError::NoFrames`] when none is left.
    pub fn from_outcomes(
        outcomes: impl IntoIterator<Item = FrameOutcome>,
        timing: AnimationTiming,
    ) -> GridResult<Self> {
        let mut frames = Vec::new();
        let mut skipped_dates = Vec::new();

        for outcome in outcomes {
            let rendered = outcome
                .result
                .and_then(|grid| grid.to_rgba_image().map(|bitmap| (grid, bitmap)));
            match rendered {
                Ok((grid, bitmap)) => frames.push(AnimationFrame {
                    date: outcome.date,
                    grid,
                    bitmap,
                }),
                Err(err) => {
                    error!(date = %outcome.date, error = %err, "failed to render animation frame");
                    skipped_dates.push(outcome.date);
                }
            }
        }

        if frames.is_empty() {
            return Err(GridError::NoFrames);
        }
        if !skipped_dates.is_empty() {
            warn!(
                rendered = frames.len(),
                skipped = skipped_dates.len(),
                "animation built with missing frames"
            );
        }

        Ok(Self {
            frames,
            skipped_dates,
            timing,
        })
    }

    #[must_use]
    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn dates(&self) -> Vec<&str> {
        self.frames.iter().map(|frame| frame.date.as_str()).collect()
    }

    #[must_use]
    pub fn skipped_dates(&self) -> &[String] {
        &self.skipped_dates
    }

    #[must_use]
    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    /// Encodes all frames as one GIF stream.
    pub fn encode_gif<W: Write>(&self, writer: W) -> GridResult<()> {
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(self.timing.repeat())?;
        let delay = self.timing.delay();
        encoder.encode_frames(
            self.frames
                .iter()
                .map(|frame| Frame::from_parts(frame.bitmap.clone(), 0, 0, delay)),
        )?;
        Ok(())
    }

    pub fn to_gif_bytes(&self) -> GridResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.encode_gif(&mut bytes)?;
        Ok(bytes)
    }

    /// Writes the GIF to `path` whatever its extension.
    pub fn save(&self, path: &Path) -> GridResult<()> {
        let is_gif = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("gif"));
        if !is_gif {
            warn!(path = %path.display(), "animation written as gif despite file extension");
        }

        let file = File::create(path).map_err(|source| GridError::io(path, source))?;
        let mut writer = BufWriter::new(file);
        self.encode_gif(&mut writer)?;
        writer
            .flush()
            .map_err(|source| GridError::io(path, source))?;

        info!(
            path = %path.display(),
            frames = self.frames.len(),
            duration_ms = self.timing.frame_duration_ms,
            loop_count = self.timing.loop_count,
            "saved grid animation"
        );
        Ok(())
    }
}
