//! CLI binary for itemlens.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig` / `Extractor` and prints the record.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use itemlens::{
    analyze, AnalysisConfig, AnalysisOutput, Extractor, HeadingTable, ImageInput, LinkKind,
    ResultRecord,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Identify an object (human-readable summary)
  itemlens kettle.jpg

  # JSON record, with a Cloud Vision OCR pre-pass
  itemlens --ocr --json kettle.jpg > kettle.json

  # Keep the raw model answer, then re-parse it offline later
  itemlens --save-answer kettle.txt kettle.jpg
  itemlens --text kettle.txt --json

  # Reproducible similarity scores for unscored similar items
  itemlens --text kettle.txt --seed 42 --json

  # Custom heading vocabulary
  itemlens --print-headings > headings.json
  itemlens --text kettle.txt --headings headings.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     API key for Gemini and Cloud Vision
  ITEMLENS_MODEL     Override model ID (default gemini-1.5-flash)
  RUST_LOG           Override log filter (e.g. itemlens=debug)
"#;

/// Identify objects in photos with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "itemlens",
    version,
    about = "Identify objects in photos with a vision model and print a structured record",
    long_about = "Send an image to Google Gemini, then parse the model's free-form answer into \
a structured record: description, history, technical details, pros and cons, tips, similar \
items, educational resources and links. Saved answers can be re-parsed offline with --text.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file path or data:image/...;base64 URL.
    #[arg(required_unless_present_any = ["text", "print_headings"])]
    image: Option<String>,

    /// Parse a saved model answer instead of calling the model ("-" for stdin).
    #[arg(long, conflicts_with = "image")]
    text: Option<PathBuf>,

    /// Heading table JSON to use instead of the built-in vocabulary.
    #[arg(long, env = "ITEMLENS_HEADINGS")]
    headings: Option<PathBuf>,

    /// Print the heading table as JSON and exit.
    #[arg(long)]
    print_headings: bool,

    /// Output the record as JSON instead of a summary.
    #[arg(long, env = "ITEMLENS_JSON")]
    json: bool,

    /// Include raw answer, OCR text and stats in the JSON output.
    #[arg(long, requires = "json")]
    full: bool,

    /// Write the model's raw answer to this file.
    #[arg(long)]
    save_answer: Option<PathBuf>,

    /// Seed for synthesized similarity scores.
    #[arg(long)]
    seed: Option<u64>,

    /// Confidence stamped on parsed records (0–100).
    #[arg(long, default_value_t = itemlens::record::DEFAULT_CONFIDENCE,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    confidence: u8,

    /// Run Cloud Vision text detection first and pass the text to the model.
    #[arg(long, env = "ITEMLENS_OCR")]
    ocr: bool,

    /// Gemini model ID.
    #[arg(long, env = "ITEMLENS_MODEL", default_value = itemlens::config::DEFAULT_MODEL)]
    model: String,

    /// API key for Gemini (and Cloud Vision with --ocr).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to a text file containing a custom analysis prompt.
    #[arg(long, env = "ITEMLENS_PROMPT")]
    prompt: Option<PathBuf>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.4)]
    temperature: f32,

    /// Max output tokens for the answer.
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Retries on transient upstream failures (timeouts, 429, 5xx).
    #[arg(long, env = "ITEMLENS_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ITEMLENS_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ITEMLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ITEMLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && cli.text.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let headings = match cli.headings {
        Some(ref path) => HeadingTable::from_json_file(path).context("Failed to load heading table")?,
        None => HeadingTable::default(),
    };

    if cli.print_headings {
        println!("{}", headings.to_json().context("Failed to serialise heading table")?);
        return Ok(());
    }

    let mut extractor = Extractor::builder()
        .headings(headings)
        .confidence(cli.confidence);
    if let Some(seed) = cli.seed {
        extractor = extractor.seed(seed);
    }
    let extractor = extractor.build();

    // ── Offline mode ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.text {
        let answer = read_answer(path)?;
        let record = extractor.extract(Some(&answer));
        return print_record(&cli, &record);
    }

    // ── Live analysis ────────────────────────────────────────────────────
    let input = cli
        .image
        .as_deref()
        .context("An image path or data URL is required")?;
    let image = ImageInput::resolve(input).context("Failed to load image")?;
    let config = build_config(&cli).await?;

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analysing");
        bar.set_message(format!("{} with {}", input_label(input), config.model));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = analyze(&image, &config, &extractor).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if !cli.quiet {
                eprintln!("{} {}", red("✘"), red(&e.to_string()));
            }
            return Err(e).context("Analysis failed");
        }
    };

    if let Some(ref path) = cli.save_answer {
        std::fs::write(path, &output.raw_text)
            .with_context(|| format!("Failed to write answer to {}", path.display()))?;
    }

    if cli.json && cli.full {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        print_record(&cli, &output.record)?;
    }

    if !cli.quiet && !cli.json {
        print_stats(&output);
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .model(&cli.model)
        .ocr(cli.ocr)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .timeout_secs(cli.timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }

    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    let config = builder.build().context("Invalid configuration")?;
    config.require_api_key().context("Cannot call the vision model")?;
    Ok(config)
}

fn read_answer(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read answer from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answer from {}", path.display()))
    }
}

/// Short display name for the spinner: file name, or "data URL".
fn input_label(input: &str) -> String {
    if input.starts_with("data:") {
        "data URL".to_string()
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.to_string())
    }
}

fn print_record(cli: &Cli, record: &ResultRecord) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(record).context("Failed to serialise record")?
        );
        return Ok(());
    }
    if cli.quiet {
        println!("{}", record.name);
        return Ok(());
    }

    println!("{} {}", cyan("◆"), bold(&record.name));
    if let Some(ref category) = record.category {
        println!("  {}", dim(category));
    }
    println!();
    println!("{}", record.description);

    if let Some(ref text) = record.extracted_text {
        println!();
        println!("{}", bold("Extracted Text"));
        for line in text.lines() {
            println!("  {}", dim(line));
        }
    }

    let lists: [(&str, &Option<Vec<String>>); 10] = [
        ("Historical Context", &record.historical_context),
        ("Technical Details", &record.technical_details),
        ("Advantages", &record.advantages),
        ("Disadvantages", &record.disadvantages),
        ("Usage & Applications", &record.usage_applications),
        ("Market Information", &record.market_information),
        ("Maintenance & Care", &record.maintenance_care),
        ("Environmental Impact", &record.environmental_impact),
        ("Safety Considerations", &record.safety_considerations),
        ("Expert Tips", &record.expert_tips),
    ];
    for (title, items) in lists {
        if let Some(items) = items {
            println!();
            println!("{}", bold(title));
            for item in items {
                println!("  • {item}");
            }
        }
    }

    if let Some(ref items) = record.similar_items {
        println!();
        println!("{}", bold("Similar Items"));
        for item in items {
            let price = item.price.as_deref().unwrap_or("");
            println!(
                "  • {}  {}  {}",
                item.name,
                green(&format!("{}%", item.similarity)),
                dim(price)
            );
            if let Some(ref url) = item.purchase_url {
                println!("    {}", dim(url));
            }
        }
    }

    if let Some(ref resources) = record.educational_resources {
        println!();
        println!("{}", bold("Educational Resources"));
        for r in resources {
            println!("  • {} {}", r.title, dim(&format!("[{}]", r.kind)));
            if !r.url.is_empty() {
                println!("    {}", dim(&r.url));
            }
        }
    }

    if let Some(ref links) = record.product_links {
        println!();
        println!("{}", bold("Links"));
        for link in links {
            println!("  {:<14} {}", LinkKind::classify(link).label(), dim(link));
        }
    }

    if let Some(ref places) = record.location_suggestions {
        println!();
        println!("{}", bold("Nearby"));
        for p in places {
            println!("  • {} {}", p.name, dim(&format!("({})", p.distance)));
        }
    }

    Ok(())
}

fn print_stats(output: &AnalysisOutput) {
    let s = &output.stats;
    eprintln!();
    eprintln!(
        "{}  {}  {}ms  confidence {}",
        green("✔"),
        s.model,
        s.duration_ms,
        output.record.confidence
    );
    if let (Some(input), Some(out)) = (s.prompt_tokens, s.output_tokens) {
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&input.to_string()),
            dim(&out.to_string())
        );
    }
    if s.retries > 0 {
        eprintln!("   {} retries", cyan(&s.retries.to_string()));
    }
}
