//! CLI tool for building word slide decks from spreadsheets.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_core::{BuildReport, DeckBuilder, DeckConfig, Rgb, TransitionOutcome};
use deck_pptx::{InspectedDeck, PptxDeck, PptxParser};
use deck_xlsx::WordSource;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 60;

/// Build auto-advancing word slide decks.
#[derive(Parser, Debug)]
#[command(name = "word-deck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a presentation with one slide per word
    Build(BuildArgs),
    /// Print the slides and timing of an existing presentation
    Inspect {
        /// Presentation to inspect (.pptx)
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct BuildArgs {
    /// Word source (.xlsx, .txt or .csv)
    input: Option<PathBuf>,

    /// Output presentation
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worksheet holding the words in column A
    #[arg(long)]
    sheet: Option<String>,

    /// JSON configuration file, applied before the flags below
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Font family
    #[arg(long)]
    font: Option<String>,

    /// Largest font size in points
    #[arg(long)]
    max_size: Option<u32>,

    /// Smallest font size in points
    #[arg(long)]
    min_size: Option<u32>,

    /// Distance between tried font sizes
    #[arg(long)]
    step: Option<u32>,

    /// Use regular weight instead of bold
    #[arg(long)]
    no_bold: bool,

    /// Text color as #RRGGBB or r,g,b
    #[arg(long)]
    color: Option<Rgb>,

    /// Seconds before each slide advances
    #[arg(long)]
    seconds: Option<u32>,

    /// Let mouse clicks advance slides too
    #[arg(long)]
    allow_click: bool,

    /// Keep the source order instead of shuffling
    #[arg(long)]
    keep_order: bool,

    /// Seed for a reproducible shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Estimated glyph width as a fraction of the font size
    #[arg(long)]
    width_factor: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Command::Build(args) => run_build(&args),
        Command::Inspect { file } => run_inspect(&file),
    }
}

fn run_build(args: &BuildArgs) -> Result<()> {
    let config = load_config(args)?;
    config.validate()?;

    print_header(&config);

    let source = WordSource::new(&config.input, &config.sheet);
    let words = source
        .read()
        .with_context(|| format!("Failed to read words from {}", config.input.display()))?;
    log::info!("Read {} words from {}", words.len(), config.input.display());

    let title = config
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Words");
    let mut deck = PptxDeck::new().with_title(title);

    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    };

    let report = DeckBuilder::new(&config)
        .build(words, &mut deck, rng.as_mut())
        .with_context(|| format!("Failed to build {}", config.output.display()))?;

    print_summary(&config, &report);
    Ok(())
}

/// Defaults, then the JSON file, then explicit flags.
fn load_config(args: &BuildArgs) -> Result<DeckConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => DeckConfig::default(),
    };
    apply_flags(&mut config, args);
    Ok(config)
}

fn apply_flags(config: &mut DeckConfig, args: &BuildArgs) {
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(sheet) = &args.sheet {
        config.sheet = sheet.clone();
    }
    if let Some(font) = &args.font {
        config.font.family = font.clone();
    }
    if let Some(size) = args.max_size {
        config.font.max_size = size;
    }
    if let Some(size) = args.min_size {
        config.font.min_size = size;
    }
    if let Some(step) = args.step {
        config.font.step = step;
    }
    if args.no_bold {
        config.font.bold = false;
    }
    if let Some(color) = args.color {
        config.font.color = color;
    }
    if let Some(factor) = args.width_factor {
        config.font.width_factor = factor;
    }
    if let Some(seconds) = args.seconds {
        config.timing.seconds = seconds;
    }
    if args.allow_click {
        config.timing.disable_click = false;
    }
    if args.keep_order {
        config.randomize = false;
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn print_header(config: &DeckConfig) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("WORD PRESENTATION GENERATOR");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Input file:   {}", config.input.display());
    println!("Output file:  {}", config.output.display());
    println!(
        "Font:         {} ({}pt - {}pt)",
        config.font.family, config.font.min_size, config.font.max_size
    );
    println!("Randomize:    {}", config.randomize);
    println!("Auto-advance: {} seconds", config.timing.seconds);
    println!("Mouse click:  {}", on_off(!config.timing.disable_click));
    println!("{}", "-".repeat(RULE_WIDTH));
}

fn print_summary(config: &DeckConfig, report: &BuildReport) {
    let tally = &report.tally;
    let seconds = config.timing.seconds;

    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("PRESENTATION CREATED");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("File saved:       {}", report.output.display());
    println!("Total slides:     {}", report.slide_count);
    println!("Font adjustments: {} slides", tally.adjustments);

    println!();
    println!("Size distribution:");
    println!("  Maximum ({}pt): {} words", tally.max_size, tally.at_max);
    println!("  Large (>={}pt): {} words", tally.large_threshold(), tally.large);
    println!("  Medium (>={}pt): {} words", tally.medium_threshold(), tally.medium);
    println!("  Small (<{}pt): {} words", tally.medium_threshold(), tally.small);

    match &report.transitions {
        TransitionOutcome::Applied { .. } => {
            println!();
            println!("Ready to use:");
            println!("  Slides auto-advance every {} seconds", seconds);
            println!("  Mouse click {}", on_off(!config.timing.disable_click));
        }
        TransitionOutcome::ManualSetupRequired { reason } => {
            println!();
            println!("Manual setup required ({}):", reason);
            for (n, step) in manual_steps(config).iter().enumerate() {
                println!("  {}. {}", n + 1, step);
            }
        }
    }

    println!();
    println!("Font note: {} must be installed for proper display", config.font.family);
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Steps to configure the timing by hand in a presentation editor.
fn manual_steps(config: &DeckConfig) -> Vec<String> {
    let mut steps = vec![
        "Open the presentation in PowerPoint".to_string(),
        "Go to the 'Transitions' tab".to_string(),
    ];
    if config.timing.disable_click {
        steps.push("Uncheck 'On Mouse Click'".to_string());
    }
    steps.push(format!(
        "Check 'After' and set it to {:02}:{:02}",
        config.timing.seconds / 60,
        config.timing.seconds % 60
    ));
    steps.push("Click 'Apply To All'".to_string());
    steps
}

fn run_inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let deck = PptxParser::new()
        .parse(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    log::debug!("Found {} slides", deck.slides.len());
    print!("{}", format_inspection(&deck));
    Ok(())
}

fn format_inspection(deck: &InspectedDeck) -> String {
    let mut out = String::new();
    for slide in &deck.slides {
        let size = slide
            .font_size
            .map(|s| format!("{}pt", s))
            .unwrap_or_else(|| "-".to_string());
        let timing = match &slide.transition {
            Some(t) => format!(
                "advance after {}, click {}",
                t.advance_after_ms
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "-".to_string()),
                on_off(t.advance_on_click)
            ),
            None => "no transition".to_string(),
        };
        out.push_str(&format!("{:>4}  {:<30} {:>6}  {}\n", slide.number, slide.text, size, timing));
    }
    out.push_str(&format!("{} slides\n", deck.slides.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_pptx::{InspectedSlide, SlideTiming};
    use std::io::Write;

    #[test]
    fn test_flags_override_defaults() {
        let args = BuildArgs {
            input: Some(PathBuf::from("liste.xlsx")),
            sheet: Some("Tiere".to_string()),
            max_size: Some(200),
            no_bold: true,
            color: Some(Rgb::new(255, 0, 0)),
            seconds: Some(5),
            allow_click: true,
            keep_order: true,
            ..BuildArgs::default()
        };
        let config = load_config(&args).unwrap();

        assert_eq!(config.input, PathBuf::from("liste.xlsx"));
        assert_eq!(config.sheet, "Tiere");
        assert_eq!(config.font.max_size, 200);
        assert_eq!(config.font.min_size, 20);
        assert!(!config.font.bold);
        assert_eq!(config.font.color, Rgb::new(255, 0, 0));
        assert_eq!(config.timing.seconds, 5);
        assert!(!config.timing.disable_click);
        assert!(!config.randomize);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sheet": "Datei", "font": {{"family": "Arial", "step": 10}}}}"#).unwrap();

        let args = BuildArgs {
            config: Some(file.path().to_path_buf()),
            sheet: Some("Flag".to_string()),
            ..BuildArgs::default()
        };
        let config = load_config(&args).unwrap();

        assert_eq!(config.sheet, "Flag");
        assert_eq!(config.font.family, "Arial");
        assert_eq!(config.font.step, 10);
        assert_eq!(config.font.max_size, 320);
    }

    #[test]
    fn test_broken_config_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let args = BuildArgs {
            config: Some(file.path().to_path_buf()),
            ..BuildArgs::default()
        };
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_manual_steps_follow_click_setting() {
        let mut config = DeckConfig::default();
        let steps = manual_steps(&config);
        assert_eq!(steps.len(), 5);
        assert!(steps[3].ends_with("00:03"));

        config.timing.disable_click = false;
        config.timing.seconds = 75;
        let steps = manual_steps(&config);
        assert_eq!(steps.len(), 4);
        assert!(steps[2].ends_with("01:15"));
    }

    #[test]
    fn test_inspection_lists_slides() {
        let deck = InspectedDeck {
            slides: vec![InspectedSlide {
                number: 1,
                text: "Haus".to_string(),
                font_size: Some(320),
                transition_count: 1,
                transition: Some(SlideTiming {
                    speed: Some("fast".to_string()),
                    advance_on_click: false,
                    advance_after_ms: Some(3000),
                    duration_ms: Some(3000),
                }),
                ..InspectedSlide::default()
            }],
        };
        let out = format_inspection(&deck);
        assert!(out.contains("Haus"));
        assert!(out.contains("320pt"));
        assert!(out.contains("advance after 3000ms, click disabled"));
        assert!(out.ends_with("1 slides\n"));
    }

    #[test]
    fn test_cli_parses_build_flags() {
        let cli = Cli::try_parse_from([
            "word-deck", "build", "words.xlsx", "--keep-order", "--seed", "7", "--color", "#00FF00", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.input, Some(PathBuf::from("words.xlsx")));
                assert!(args.keep_order);
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.color, Some(Rgb::new(0, 255, 0)));
            }
            Command::Inspect { .. } => panic!("expected build"),
        }
    }
}
