//! Boatrace scraper CLI - fetch race data from boatrace.jp as JSON

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use boatrace_scraper::scraper::get_stadium_name;
use boatrace_scraper::{CodeArg, Dispatcher, Operation, Output, ScraperConfig};

#[derive(Parser)]
#[command(name = "boatrace-scraper")]
#[command(author, version, about = "Race data scraper for boatrace.jp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Minimum delay between requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Site root to scrape
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Write JSON to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long, global = true)]
    pretty: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct RaceArgs {
    /// Race date (YYYYMMDD, YYYY-MM-DD, today, ...)
    #[arg(short, long, default_value = "today")]
    date: String,

    /// Stadium code (1-24). All stadiums racing that day if omitted.
    #[arg(short, long)]
    stadium: Option<String>,

    /// Race number (1-12). All 12 races if omitted.
    #[arg(short, long)]
    race: Option<String>,
}

#[derive(Args)]
struct DayArgs {
    /// Race date (YYYYMMDD, YYYY-MM-DD, today, ...)
    #[arg(short, long, default_value = "today")]
    date: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Win and place odds
    Odds(RaceArgs),

    /// Pre-race information: weather, exhibition, start exhibition
    Preview(RaceArgs),

    /// Race program (entries)
    Program(RaceArgs),

    /// Race results and trifecta payout
    #[command(name = "result")]
    RaceResult(RaceArgs),

    /// Codes of stadiums racing on a date
    StadiumIds(DayArgs),

    /// Names of stadiums racing on a date
    StadiumNames(DayArgs),

    /// Stadiums racing on a date, with event titles
    Stadiums(DayArgs),

    /// Run an operation by name (e.g. fetchOdds, listStadiums)
    Call {
        /// Operation name
        operation: String,

        #[command(flatten)]
        args: RaceArgs,
    },

    /// Print the stadium code table
    Codes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    eprintln!(
        "{}",
        format!("Boatrace Scraper v{}", env!("CARGO_PKG_VERSION")).cyan().bold()
    );

    let (operation, args) = match cli.command {
        Commands::Odds(args) => (Operation::FetchOdds, args),
        Commands::Preview(args) => (Operation::FetchPreview, args),
        Commands::Program(args) => (Operation::FetchProgram, args),
        Commands::RaceResult(args) => (Operation::FetchResult, args),
        Commands::StadiumIds(day) => (Operation::ListStadiumIds, day.into()),
        Commands::StadiumNames(day) => (Operation::ListStadiumNames, day.into()),
        Commands::Stadiums(day) => (Operation::ListStadiums, day.into()),
        Commands::Call { operation, args } => (
            operation
                .parse::<Operation>()
                .with_context(|| format!("Unknown operation '{}'", operation))?,
            args,
        ),
        Commands::Codes => {
            print_stadium_codes();
            return Ok(());
        }
    };

    let mut config = ScraperConfig::from_env().context("Invalid BOATRACE_* environment")?;
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }

    eprintln!("{}: {} ({})", "Running".green(), operation, args.date);

    // Create runtime for async operations
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let mut dispatcher = Dispatcher::new(config);
    let output = rt
        .block_on(dispatcher.execute(
            operation,
            args.date.as_str(),
            args.stadium.map(CodeArg::from),
            args.race.map(CodeArg::from),
        ))
        .with_context(|| format!("{} failed", operation))?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("{}: {:?} ({})", "Saved".green(), path, summarize(&output));
        }
        None => {
            println!("{}", json);
            eprintln!("{}: {}", "Done".green(), summarize(&output));
        }
    }

    Ok(())
}

impl From<DayArgs> for RaceArgs {
    fn from(day: DayArgs) -> Self {
        Self {
            date: day.date,
            stadium: None,
            race: None,
        }
    }
}

fn summarize(output: &Output) -> String {
    match output {
        Output::Races(tree) => {
            let races: usize = tree.values().map(|races| races.len()).sum();
            format!("{} stadium(s), {} race(s)", tree.len(), races)
        }
        Output::StadiumIds(ids) => format!("{} stadium(s)", ids.len()),
        Output::StadiumNames(names) => format!("{} stadium(s)", names.len()),
        Output::Stadiums(records) => format!("{} stadium(s)", records.len()),
    }
}

fn print_stadium_codes() {
    println!("{}", "Stadium Codes:".yellow().bold());
    println!("{}", "-".repeat(40));
    for code in 1..=24u8 {
        println!("  {:2}: {}", code, get_stadium_name(code));
    }
}
