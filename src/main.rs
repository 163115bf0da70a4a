//! Deck Pricing - command line price calculator
//!
//! Reads a deck list from a file or stdin, prices it against a catalog
//! file and prints a report, JSON or CSV.

use clap::{Parser, ValueEnum};
use deck_pricing::{format_price_report, write_csv, Catalog, DeckPricer, PriceTier, PricerConfig};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Price a trading card deck list against a catalog
#[derive(Parser, Debug)]
#[command(name = "deck_pricing")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the catalog JSON produced by the pricing pipeline
    #[arg(short, long)]
    catalog: PathBuf,

    /// Game config JSON (defaults to the built-in Sorcery profile)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Price tier to use (low, mid, high, market)
    #[arg(short, long)]
    tier: Option<PriceTier>,

    /// Default to foil printings
    #[arg(long, default_value_t = false)]
    prefer_foil: bool,

    /// Price each copy of this card separately (repeatable)
    #[arg(long)]
    split: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Deck list file; read from stdin when omitted
    deck: Option<PathBuf>,
}

fn read_deck(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PricerConfig::load(path)?,
        None => PricerConfig::sorcery(),
    };
    if let Some(tier) = args.tier {
        config.price_tier = tier;
    }
    if args.prefer_foil {
        config.prefer_foil = true;
    }

    let catalog = Catalog::load(&args.catalog)?;
    let mut pricer = DeckPricer::new(catalog, &config)?;

    let mut text = read_deck(args.deck.as_ref())?;
    if pricer.needs_formatting(&text) {
        log::info!("Deck list has section headers, formatting it first");
        text = pricer.format_input(&text);
    }

    pricer.calculate(&text)?;
    for name in &args.split {
        pricer.split(name)?;
    }

    let Some(result) = pricer.result() else {
        return Err("no result was produced".into());
    };

    match args.output {
        OutputFormat::Text => print!("{}", format_price_report(result, pricer.price_tier())),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => write_csv(result, io::stdout().lock())?,
    }

    Ok(())
}

fn main() {
    // Initialize logger. Set RUST_LOG environment variable to control log level.
    // Examples: RUST_LOG=info, RUST_LOG=warn, RUST_LOG=deck_pricing=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("Application error: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
