use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use keycoach::config::{ConfigStore, FileConfigStore};
use keycoach::service::{WordFeed, WordFeedResponse};
use keycoach::wordlist::Difficulty;

/// sample practice words from the embedded lists, biased toward weak letters
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Draws practice words through the word-feed boundary: pick a difficulty tier, hand in per-letter error rates, and get back a weighted sample that leans into the letters you miss."
)]
struct Cli {
    /// difficulty tier of the word population
    #[clap(short = 'd', long, value_enum, default_value_t = Difficulty::Easy)]
    difficulty: Difficulty,

    /// number of words to draw (defaults to the configured feed size)
    #[clap(short = 'c', long)]
    count: Option<i64>,

    /// per-letter error rates as an inline JSON object, e.g. '{"z":0.8}'
    #[clap(short = 'r', long)]
    rates: Option<String>,

    /// read per-letter error rates from a JSON file
    #[clap(long, conflicts_with = "rates")]
    rates_file: Option<PathBuf>,

    /// base weight given to every word
    #[clap(long)]
    base_weight: Option<f64>,

    /// multiplier applied to the summed error rates
    #[clap(long)]
    scale: Option<f64>,

    /// seed the random source for reproducible draws
    #[clap(long)]
    seed: Option<u64>,

    /// emit the full JSON response instead of one word per line
    #[clap(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let rates: serde_json::Value = match (&cli.rates, &cli.rates_file) {
        (Some(inline), _) => serde_json::from_str(inline)?,
        (None, Some(path)) => serde_json::from_str(&fs::read_to_string(path)?)?,
        (None, None) => serde_json::Value::Object(Default::default()),
    };

    let config = FileConfigStore::new().load();
    let feed = WordFeed::with_config(config)?;

    let body = serde_json::json!({
        "difficulty": cli.difficulty.code(),
        "errorRates": rates,
        "count": cli.count,
        "baseWeight": cli.base_weight,
        "scale": cli.scale,
    })
    .to_string();

    let response = match cli.seed {
        Some(seed) => feed.handle_with(&body, &mut StdRng::seed_from_u64(seed))?,
        None => feed.handle(&body)?,
    };

    print_response(&response, cli.json)?;

    Ok(())
}

fn print_response(response: &WordFeedResponse, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string(response)?);
    } else {
        for word in &response.words {
            println!("{word}");
        }
    }
    Ok(())
}
