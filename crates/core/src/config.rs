//! Deck configuration.
//!
//! Every knob of a run lives in [`DeckConfig`]. The defaults reproduce the
//! classic setup: a 320pt bold black word, shrunk in 5pt steps until it fits
//! an 8.5in line, advancing every 3 seconds with mouse clicks disabled.

use crate::error::{Error, Result};
use crate::fit::FitParams;
use crate::types::{AdvanceTiming, Rgb, TextBox};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest size a run can carry (`sz` tops out at 400000 hundredths).
pub const MAX_FONT_SIZE: u32 = 4000;

/// Configuration for a complete deck build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Spreadsheet (or word list) to read.
    pub input: PathBuf,

    /// Sheet holding the words in its first column.
    pub sheet: String,

    /// Where the presentation is written.
    pub output: PathBuf,

    pub font: FontConfig,

    /// Text box position and size.
    pub text_box: TextBox,

    /// Width the word must fit into, in inches.
    pub max_text_width: f64,

    /// Shuffle words before building slides.
    pub randomize: bool,

    pub timing: TimingConfig,

    pub progress: ProgressConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/words.xlsx"),
            sheet: "Sheet1".to_string(),
            output: PathBuf::from("output/words_presentation.pptx"),
            font: FontConfig::default(),
            text_box: TextBox::default(),
            max_text_width: 8.5,
            randomize: true,
            timing: TimingConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl DeckConfig {
    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        let font = &self.font;
        if font.step == 0 {
            return Err(Error::InvalidConfig("font size step must be positive".into()));
        }
        if font.min_size == 0 {
            return Err(Error::InvalidConfig("minimum font size must be positive".into()));
        }
        if font.max_size < font.min_size {
            return Err(Error::InvalidConfig(format!(
                "maximum font size {} is below minimum {}",
                font.max_size, font.min_size
            )));
        }
        if font.max_size > MAX_FONT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "maximum font size {} exceeds {}pt",
                font.max_size, MAX_FONT_SIZE
            )));
        }
        if !(font.width_factor > 0.0) {
            return Err(Error::InvalidConfig("glyph width factor must be positive".into()));
        }
        if font.family.trim().is_empty() {
            return Err(Error::InvalidConfig("font family is empty".into()));
        }
        if !(self.max_text_width > 0.0) {
            return Err(Error::InvalidConfig("maximum text width must be positive".into()));
        }
        if !(self.text_box.width > 0.0 && self.text_box.height > 0.0) {
            return Err(Error::InvalidConfig("text box must have a positive size".into()));
        }
        if self.timing.seconds == 0 {
            return Err(Error::InvalidConfig("auto-advance delay must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Parameters for the font-size fitter.
    pub fn fit_params(&self) -> FitParams {
        FitParams {
            max_width_inches: self.max_text_width,
            max_size: self.font.max_size,
            min_size: self.font.min_size,
            step: self.font.step,
            width_factor: self.font.width_factor,
        }
    }

    /// Deck-wide auto-advance settings.
    pub fn advance_timing(&self) -> AdvanceTiming {
        AdvanceTiming {
            seconds: self.timing.seconds,
            click_advance: !self.timing.disable_click,
        }
    }
}

/// Font family, size ladder and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub max_size: u32,
    pub min_size: u32,
    /// Decrement between candidate sizes.
    pub step: u32,
    pub bold: bool,
    pub color: Rgb,
    /// Average glyph width as a fraction of the font size.
    pub width_factor: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "DCH-Basisschrift".to_string(),
            max_size: 320,
            min_size: 20,
            step: 5,
            bold: true,
            color: Rgb::BLACK,
            width_factor: 0.6,
        }
    }
}

/// Auto-advance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds each slide stays on screen.
    pub seconds: u32,
    /// Ignore mouse clicks during playback.
    pub disable_click: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            seconds: 3,
            disable_click: true,
        }
    }
}

/// How often slide progress is logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Log every Nth slide.
    pub every: usize,
    /// Always log the first N slides.
    pub first: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { every: 20, first: 10 }
    }
}

impl ProgressConfig {
    /// Whether the slide at 0-based `index` should be reported.
    pub fn should_report(&self, index: usize) -> bool {
        index < self.first || (self.every > 0 && index % self.every == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DeckConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_size_range() {
        let mut config = DeckConfig::default();
        config.font.max_size = 10;
        config.font.min_size = 20;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_oversized_font() {
        let mut config = DeckConfig::default();
        config.font.max_size = MAX_FONT_SIZE + 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.font.max_size = MAX_FONT_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_step_and_delay() {
        let mut config = DeckConfig::default();
        config.font.step = 0;
        assert!(config.validate().is_err());

        let mut config = DeckConfig::default();
        config.timing.seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_advance_timing_inverts_click_flag() {
        let mut config = DeckConfig::default();
        assert!(!config.advance_timing().click_advance);

        config.timing.disable_click = false;
        assert!(config.advance_timing().click_advance);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DeckConfig =
            serde_json::from_str(r#"{"sheet": "Words", "font": {"max_size": 200}}"#).unwrap();
        assert_eq!(config.sheet, "Words");
        assert_eq!(config.font.max_size, 200);
        assert_eq!(config.font.min_size, 20);
        assert_eq!(config.timing.seconds, 3);
    }

    #[test]
    fn test_progress_cadence() {
        let progress = ProgressConfig::default();
        assert!(progress.should_report(0));
        assert!(progress.should_report(9));
        assert!(!progress.should_report(10));
        assert!(progress.should_report(20));
        assert!(!progress.should_report(21));
    }
}
