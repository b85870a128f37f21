//! Deck building: one slide per word, then timing, then save.

use crate::config::DeckConfig;
use crate::error::{Error, Result};
use crate::fit::fit;
use crate::stats::SizeTally;
use crate::types::{AdvanceTiming, FontSpec, SlideRecord, TransitionOutcome, WordList};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of leading words kept in the report.
const REPORTED_WORDS: usize = 5;

/// A presentation backend the builder writes slides into.
pub trait DeckWriter {
    /// Append a slide holding one centered word.
    fn add_slide(&mut self, slide: &SlideRecord) -> Result<()>;

    /// Replace every slide's transition with the given auto-advance timing.
    ///
    /// Returns the number of slides updated. An error leaves slide content
    /// untouched.
    fn set_auto_advance(&mut self, timing: &AdvanceTiming) -> Result<usize>;

    /// Write the finished deck to `path`, replacing any existing file.
    fn save(&self, path: &Path) -> Result<()>;

    fn slide_count(&self) -> usize;
}

/// Summary of a finished build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub slide_count: usize,

    /// Leading words in slide order.
    pub first_words: Vec<String>,

    pub tally: SizeTally,

    pub transitions: TransitionOutcome,

    pub output: PathBuf,
}

/// Turns a word list into a saved deck.
#[derive(Debug)]
pub struct DeckBuilder<'a> {
    config: &'a DeckConfig,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(config: &'a DeckConfig) -> Self {
        Self { config }
    }

    /// Build and save a deck from `words`.
    ///
    /// An invalid configuration or an empty word list is rejected before any
    /// slide is created.
    pub fn build<W, R>(&self, mut words: WordList, writer: &mut W, rng: &mut R) -> Result<BuildReport>
    where
        W: DeckWriter + ?Sized,
        R: Rng + ?Sized,
    {
        self.config.validate()?;
        if words.is_empty() {
            return Err(Error::NoWords(self.config.input.display().to_string()));
        }

        if self.config.randomize {
            words.shuffle(rng);
            log::info!("Words randomized. First few: {:?}", words.first_few(REPORTED_WORDS));
        } else {
            log::info!("Words in original order. First few: {:?}", words.first_few(REPORTED_WORDS));
        }
        log::info!("Creating presentation with {} words", words.len());

        let params = self.config.fit_params();
        let mut tally = SizeTally::new(params.max_size);

        for (idx, word) in words.iter().enumerate() {
            let size = fit(word, &params);
            let slide = self.slide_record(idx + 1, word, size);
            writer.add_slide(&slide)?;
            tally.record(size);

            if self.config.progress.should_report(idx) {
                if size < params.max_size {
                    log::info!("Slide {}: '{}' (font: {}pt)", slide.number, word, size);
                } else {
                    log::info!("Slide {}: '{}'", slide.number, word);
                }
            }
        }

        let timing = self.config.advance_timing();
        let transitions = match writer.set_auto_advance(&timing) {
            Ok(slides) => {
                log::info!(
                    "Configured transitions on {} slides ({}s auto-advance, mouse click {})",
                    slides,
                    timing.seconds,
                    if timing.click_advance { "enabled" } else { "disabled" }
                );
                TransitionOutcome::Applied { slides }
            }
            Err(e) => {
                log::warn!("Slide transitions not set: {}", e);
                TransitionOutcome::ManualSetupRequired { reason: e.to_string() }
            }
        };

        writer.save(&self.config.output)?;
        log::debug!("Saved {} slides to {}", writer.slide_count(), self.config.output.display());

        Ok(BuildReport {
            slide_count: writer.slide_count(),
            first_words: words.first_few(REPORTED_WORDS).into_iter().map(str::to_string).collect(),
            tally,
            transitions,
            output: self.config.output.clone(),
        })
    }

    fn slide_record(&self, number: usize, word: &str, size: u32) -> SlideRecord {
        let font = &self.config.font;
        SlideRecord {
            number,
            text: word.to_string(),
            text_box: self.config.text_box,
            font: FontSpec {
                family: font.family.clone(),
                size,
                bold: font.bold,
                color: font.color,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// In-memory writer recording what the builder asked for.
    #[derive(Default)]
    struct RecordingWriter {
        slides: Vec<SlideRecord>,
        timing: Option<AdvanceTiming>,
        saved_to: Option<PathBuf>,
        fail_transitions: bool,
        fail_save: bool,
    }

    impl DeckWriter for RecordingWriter {
        fn add_slide(&mut self, slide: &SlideRecord) -> Result<()> {
            self.slides.push(slide.clone());
            Ok(())
        }

        fn set_auto_advance(&mut self, timing: &AdvanceTiming) -> Result<usize> {
            if self.fail_transitions {
                return Err(Error::TransitionError("markup not editable".into()));
            }
            self.timing = Some(*timing);
            Ok(self.slides.len())
        }

        fn save(&self, _path: &Path) -> Result<()> {
            if self.fail_save {
                return Err(Error::StorageError("read-only".into()));
            }
            Ok(())
        }

        fn slide_count(&self) -> usize {
            self.slides.len()
        }
    }

    impl RecordingWriter {
        fn texts(&self) -> Vec<&str> {
            self.slides.iter().map(|s| s.text.as_str()).collect()
        }
    }

    fn ordered_config() -> DeckConfig {
        DeckConfig {
            randomize: false,
            ..DeckConfig::default()
        }
    }

    fn build(config: &DeckConfig, words: &[&str], writer: &mut RecordingWriter) -> Result<BuildReport> {
        let mut rng = StdRng::seed_from_u64(1);
        let result = DeckBuilder::new(config).build(WordList::new(words.iter().copied()), writer, &mut rng);
        if result.is_ok() {
            writer.saved_to = Some(config.output.clone());
        }
        result
    }

    #[test]
    fn test_short_and_long_word() {
        let config = ordered_config();
        let mut writer = RecordingWriter::default();
        let report = build(&config, &["a", "supercalifragilisticexpialidocious"], &mut writer).unwrap();

        assert_eq!(report.slide_count, 2);
        assert_eq!(writer.slides[0].font.size, 320);
        assert!(writer.slides[1].font.size < 320);
        assert_eq!(report.tally.at_max, 1);
        assert_eq!(report.tally.adjustments, 1);
        assert_eq!(writer.saved_to.as_deref(), Some(config.output.as_path()));
    }

    #[test]
    fn test_keeps_order_without_randomize() {
        let config = ordered_config();
        let mut writer = RecordingWriter::default();
        build(&config, &["eins", "zwei", "drei", "vier"], &mut writer).unwrap();

        assert_eq!(writer.texts(), vec!["eins", "zwei", "drei", "vier"]);
        let numbers: Vec<usize> = writer.slides.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_randomize_keeps_every_word() {
        let config = DeckConfig::default();
        let mut writer = RecordingWriter::default();
        let words = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let report = build(&config, &words, &mut writer).unwrap();

        let mut texts = writer.texts();
        texts.sort();
        assert_eq!(texts, words.to_vec());
        assert_eq!(report.first_words.len(), 5);
        assert_eq!(report.first_words[0], writer.slides[0].text);
    }

    #[test]
    fn test_slides_carry_configured_style() {
        let mut config = ordered_config();
        config.font.family = "Arial".to_string();
        config.font.bold = false;
        let mut writer = RecordingWriter::default();
        build(&config, &["Hund"], &mut writer).unwrap();

        let slide = &writer.slides[0];
        assert_eq!(slide.font.family, "Arial");
        assert!(!slide.font.bold);
        assert_eq!(slide.text_box, config.text_box);
    }

    #[test]
    fn test_timing_applied_once() {
        let config = ordered_config();
        let mut writer = RecordingWriter::default();
        let report = build(&config, &["x", "y"], &mut writer).unwrap();

        assert_eq!(report.transitions, TransitionOutcome::Applied { slides: 2 });
        assert_eq!(
            writer.timing,
            Some(AdvanceTiming {
                seconds: 3,
                click_advance: false
            })
        );
    }

    #[test]
    fn test_empty_word_list_is_an_error() {
        let config = ordered_config();
        let mut writer = RecordingWriter::default();
        let result = build(&config, &["", "   "], &mut writer);

        assert!(matches!(result, Err(Error::NoWords(_))));
        assert!(writer.slides.is_empty());
        assert!(writer.saved_to.is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_slides() {
        let mut config = ordered_config();
        config.font.max_size = 5000;
        let mut writer = RecordingWriter::default();
        let result = build(&config, &["Riese"], &mut writer);

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        assert!(writer.slides.is_empty());
        assert!(writer.saved_to.is_none());
    }

    #[test]
    fn test_transition_failure_degrades() {
        let config = ordered_config();
        let mut writer = RecordingWriter {
            fail_transitions: true,
            ..RecordingWriter::default()
        };
        let report = build(&config, &["Sonne"], &mut writer).unwrap();

        assert!(!report.transitions.is_applied());
        assert_eq!(writer.slides.len(), 1);
    }

    #[test]
    fn test_save_failure_is_fatal() {
        let config = ordered_config();
        let mut writer = RecordingWriter {
            fail_save: true,
            ..RecordingWriter::default()
        };
        let result = build(&config, &["Mond"], &mut writer);

        assert!(matches!(result, Err(Error::StorageError(_))));
    }
}
