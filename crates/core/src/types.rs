//! Domain types for representing words and the slides built from them.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EMUs (English Metric Units) per inch, the geometry unit of OOXML.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Typographic points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Ordered list of words, one per slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Create a word list, dropping empty and whitespace-only entries.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words
                .into_iter()
                .map(Into::into)
                .filter(|w| !w.trim().is_empty())
                .collect(),
        }
    }

    /// Build a word list from optional cell values, skipping missing cells.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self::new(cells.into_iter().flatten())
    }

    /// Permute the words uniformly at random.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.words.shuffle(rng);
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate over the words in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// The leading words, for progress output.
    pub fn first_few(&self, n: usize) -> Vec<&str> {
        self.iter().take(n).collect()
    }

    /// Consume the list, returning the words.
    pub fn into_inner(self) -> Vec<String> {
        self.words
    }
}

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Upper-case hex form used by DrawingML `srgbClr`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Accepts `#RRGGBB`, `RRGGBB`, or `r,g,b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(format!("expected three components in '{}'", s));
            }
            let mut channels = [0u8; 3];
            for (slot, part) in channels.iter_mut().zip(&parts) {
                *slot = part
                    .parse()
                    .map_err(|_| format!("invalid color component '{}'", part))?;
            }
            return Ok(Self::new(channels[0], channels[1], channels[2]));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid hex color '{}'", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid hex color '{}': {}", s, e))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A text box rectangle, in inches from the slide's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TextBox {
    /// The rectangle as `(x, y, cx, cy)` in EMUs.
    pub fn to_emu(&self) -> (i64, i64, i64, i64) {
        (
            inches_to_emu(self.left),
            inches_to_emu(self.top),
            inches_to_emu(self.width),
            inches_to_emu(self.height),
        )
    }
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            left: 0.75,
            top: 1.5,
            width: 8.5,
            height: 5.0,
        }
    }
}

/// Convert inches to EMUs, rounding to the nearest unit.
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Run-level font settings for a slide's word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Typeface name.
    pub family: String,

    /// Size in whole points.
    pub size: u32,

    pub bold: bool,

    pub color: Rgb,
}

/// A single slide showing one word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub number: usize,

    /// The word, as shown on the slide.
    pub text: String,

    /// Where the single text box sits.
    pub text_box: TextBox,

    /// Font applied to the word's run.
    pub font: FontSpec,
}

/// Deck-wide auto-advance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceTiming {
    /// Delay before advancing, in whole seconds.
    pub seconds: u32,

    /// Whether a mouse click also advances the slide.
    pub click_advance: bool,
}

impl AdvanceTiming {
    /// The delay in milliseconds, the unit used by slide markup.
    pub fn millis(&self) -> u64 {
        u64::from(self.seconds) * 1000
    }
}

/// What happened when transitions were configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
    /// Every slide carries the requested timing.
    Applied { slides: usize },
    /// The markup could not be edited; the deck must be configured by hand.
    ManualSetupRequired { reason: String },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_word_list_drops_blank_entries() {
        let words = WordList::new(["Haus", "", "  ", "Baum"]);
        assert_eq!(words.into_inner(), vec!["Haus", "Baum"]);
    }

    #[test]
    fn test_word_list_from_cells_skips_missing() {
        let words = WordList::from_cells(vec![Some("a".to_string()), None, Some("b".to_string())]);
        assert_eq!(words.len(), 2);
        assert_eq!(words.first_few(5), vec!["a", "b"]);
    }

    #[test]
    fn test_shuffle_keeps_all_words() {
        let mut words = WordList::new(["one", "two", "three", "four", "five"]);
        let mut rng = StdRng::seed_from_u64(7);
        words.shuffle(&mut rng);

        let mut sorted = words.into_inner();
        sorted.sort();
        assert_eq!(sorted, vec!["five", "four", "one", "three", "two"]);
    }

    #[test]
    fn test_rgb_parsing() {
        assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("0, 0, 0".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert!("#FFF".parse::<Rgb>().is_err());
        assert!("1,2".parse::<Rgb>().is_err());
        assert!("300,0,0".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb::new(10, 171, 255).to_hex(), "0AABFF");
        assert_eq!(Rgb::BLACK.to_string(), "#000000");
    }

    #[test]
    fn test_text_box_to_emu() {
        let (x, y, cx, cy) = TextBox::default().to_emu();
        assert_eq!(x, 685_800);
        assert_eq!(y, 1_371_600);
        assert_eq!(cx, 7_772_400);
        assert_eq!(cy, 4_572_000);
    }

    #[test]
    fn test_advance_millis() {
        let timing = AdvanceTiming {
            seconds: 3,
            click_advance: false,
        };
        assert_eq!(timing.millis(), 3000);
    }
}
