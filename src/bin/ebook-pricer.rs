//! ebook-pricer CLI - price ebook lists in a target currency
//!
//! ## Example Usage
//!
//! ```bash
//! # Price every title in a list
//! ebook-pricer run example_list.csv --output ebooks_data.json
//!
//! # Resolve a single exchange rate through the cache
//! ebook-pricer rate USD 2020-01-18
//!
//! # Inspect the rate cache
//! ebook-pricer cache list --currency EUR
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use ebook_pricer::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process;

/// ebook-pricer: price ebooks in a target currency using historical exchange rates
#[derive(Parser)]
#[command(name = "ebook-pricer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Price ebooks in a target currency using historical exchange rates", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog storefront country code
    #[arg(long, global = true)]
    country: Option<String>,

    /// Exchange rate cache file
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Pause after every external request, in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Days searched per rate resolution, the release date included
    #[arg(long, global = true)]
    max_fallback_days: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price every title of an input list
    Run {
        /// CSV file with author and title columns
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output JSON file
        #[arg(short = 'o', long, default_value = "ebooks_data.json")]
        output: PathBuf,
    },

    /// Resolve a single exchange rate
    Rate {
        /// ISO currency code
        #[arg(value_name = "CURRENCY")]
        currency: String,

        /// Date (YYYY-MM-DD)
        #[arg(value_name = "DATE")]
        date: String,
    },

    /// Inspect the exchange rate cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show the effective configuration
    Info,
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached rates
    List {
        /// Only show this currency
        #[arg(long)]
        currency: Option<String>,
    },
}

impl Cli {
    /// Command-line flags win over the config file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(country) = &self.country {
            config.country = country.clone();
        }
        if let Some(cache) = &self.cache {
            config.cache_path = cache.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.request_delay_ms = delay_ms;
        }
        if let Some(days) = self.max_fallback_days {
            config.max_fallback_days = days;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.verbose {
        println!(
            "{} v{}",
            "ebook-pricer".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Rate cache: {}",
            config.cache_path.display().to_string().dimmed()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::Run { input, output } => runtime.block_on(price_list(&config, input, output)),
        Commands::Rate { currency, date } => runtime.block_on(resolve_rate(&config, &currency, &date)),
        Commands::Cache { action } => handle_cache_action(action, &config),
        Commands::Info => show_info(&config),
    }
}

fn build_resolver(config: &Config) -> Result<RateResolver<NbpRateSource, FixedDelay>> {
    let source = NbpRateSource::new(&config.rate_url, &config.rate_table, config.http_timeout())?;
    let cache = RateCache::load(&config.cache_path)
        .with_context(|| format!("Failed to load rate cache {}", config.cache_path.display()))?;

    Ok(RateResolver::new(
        source,
        FixedDelay::new(config.request_delay()),
        cache,
        ResolverPolicy::from(config),
    ))
}

async fn price_list(config: &Config, input: PathBuf, output: PathBuf) -> Result<()> {
    let resolver = build_resolver(config)?;
    let catalog = ItunesCatalog::new(&config.catalog_url, &config.media, config.http_timeout())?;
    let mut pipeline = Pipeline::new(
        catalog,
        resolver,
        FixedDelay::new(config.request_delay()),
        &config.country,
    );

    let progress = ConsoleProgress::default();
    let summary = pipeline.run(&input, &output, &progress).await?;

    println!();
    println!("{}", "Run Summary".green().bold());
    println!("{}", "===========".green());
    println!("  {} {}", "Items priced:".bold(), summary.items.len());
    println!(
        "  {} {}",
        "Converted to".bold(),
        format!("{}: {}", config.target_currency, summary.converted()).bright_green()
    );
    println!(
        "  {} {}",
        "Cached rates:".bold(),
        pipeline.resolver().cache().len()
    );
    println!(
        "{} Results saved to: {}",
        "✓".green().bold(),
        output.display()
    );

    Ok(())
}

async fn resolve_rate(config: &Config, currency: &str, date: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
    let currency = currency.to_uppercase();

    let mut resolver = build_resolver(config)?;
    let resolved = resolver.resolve(&currency, date).await?;

    println!(
        "{} 1 {} = {} {}",
        "✓".green().bold(),
        currency,
        format!("{}", resolved.rate).bright_green().bold(),
        config.target_currency
    );
    println!("  {} {}", "Table:".bold(), resolved.table_no);
    println!("  {} {}", "Published:".bold(), resolved.effective_date);
    if resolved.days_back > 0 {
        println!(
            "  {} {} days before {}",
            "Fallback:".yellow().bold(),
            resolved.days_back,
            date
        );
    }

    Ok(())
}

fn handle_cache_action(action: CacheAction, config: &Config) -> Result<()> {
    match action {
        CacheAction::List { currency } => {
            let cache = RateCache::load(&config.cache_path)?;
            let currency = currency.map(|c| c.to_uppercase());

            println!(
                "{} {}",
                "Cached rates".cyan().bold(),
                config.cache_path.display().to_string().dimmed()
            );
            println!("{}", "============".dimmed());

            let mut shown = 0;
            for record in cache.records() {
                if currency.as_deref().is_some_and(|c| c != record.currency) {
                    continue;
                }
                println!(
                    "  {}  {}  {:>10}  {}",
                    record.date,
                    record.currency.bold(),
                    record.rate,
                    record.table_no.dimmed()
                );
                shown += 1;
            }

            println!();
            println!("  {} {} of {}", "Records:".bold(), shown, cache.len());
        }
    }

    Ok(())
}

fn show_info(config: &Config) -> Result<()> {
    println!(
        "{} {}",
        "ebook-pricer".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    println!("  {} {}", "Country:".bold(), config.country);
    println!("  {} {}", "Target currency:".bold(), config.target_currency);
    println!("  {} {}", "Historical floor:".bold(), config.historical_floor);
    println!("  {} {}", "Fallback window:".bold(), format!("{} days", config.max_fallback_days));
    println!("  {} {} ms", "Request delay:".bold(), config.request_delay_ms);
    println!("  {} {}", "Rate cache:".bold(), config.cache_path.display());
    println!("  {} {}", "Catalog:".bold(), config.catalog_url);
    println!("  {} {} (table {})", "Rates:".bold(), config.rate_url, config.rate_table);
    println!(
        "  {} {}",
        "Alias fallback rates:".bold(),
        if config.alias_requested_date {
            "enabled".green()
        } else {
            "disabled".red()
        }
    );
    if let Some(path) = Config::default_path() {
        println!("  {} {}", "Config file:".bold(), path.display().to_string().dimmed());
    }
    println!();

    Ok(())
}

/// Phase headings, per-item progress bars and end-of-phase error lists
#[derive(Default)]
struct ConsoleProgress {
    bar: RefCell<Option<ProgressBar>>,
}

impl Progress for ConsoleProgress {
    fn begin(&self, phase: Phase, total: usize) {
        let title = phase.title();
        let pad = 50usize.saturating_sub(title.len());
        println!("{} {} {}", "=".repeat(10), title.cyan().bold(), "=".repeat(pad));

        if total == 0 {
            return;
        }

        let bar = ProgressBar::new(total as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{percent:>3}%|{bar:40.cyan/blue}| {pos}/{len} [{elapsed_precise}<{eta}]")
        {
            bar.set_style(style.progress_chars("█▓░"));
        }
        *self.bar.borrow_mut() = Some(bar);
    }

    fn advance(&self) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.inc(1);
        }
    }

    fn finish(&self, report: &PhaseReport) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish();
        }

        if !report.is_clean() {
            println!("{}", format!("Errors occurred during {}:", phase_noun(report.phase)).yellow());
            for error in &report.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        match report.phase {
            Phase::Input => println!("Found {} ebooks", report.succeeded),
            Phase::Catalog => println!(
                "Could not retrieve catalog data for {} ebooks.",
                report.failed()
            ),
            Phase::Rates => println!(
                "Could not retrieve exchange rates for {} ebooks.",
                report.failed()
            ),
            Phase::Output => {}
        }
    }
}

fn phase_noun(phase: Phase) -> &'static str {
    match phase {
        Phase::Input => "reading the input",
        Phase::Catalog => "catalog lookup",
        Phase::Rates => "rate resolution",
        Phase::Output => "saving",
    }
}
