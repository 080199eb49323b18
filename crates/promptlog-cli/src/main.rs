use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use promptlog_config::{find_config_path, load_config, records_path, save_config, Config};
use promptlog_core::{
    apply_filters, apply_sorting, compute_analytics, distinct_models, distinct_providers,
    AnalyticsSummary, FilterCriteria, Provider, QueryRecord, SortKey, SortOrder,
};

#[derive(Parser)]
#[command(
    name = "promptlog",
    about = "Filter, sort and summarize model query logs",
    version
)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the records JSON file (overrides config)
    #[arg(short, long)]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Field to sort by (e.g. cost, responseTime, timestamp)
        #[arg(short, long)]
        sort: Option<SortKey>,

        /// Sort direction: asc or desc
        #[arg(short, long)]
        order: Option<SortOrder>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show aggregate statistics for records matching the filters
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the distinct models and providers present
    Models,
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep only this model (repeatable)
    #[arg(long = "model")]
    models: Vec<String>,

    /// Keep only this provider (repeatable)
    #[arg(long = "provider")]
    providers: Vec<Provider>,

    /// Earliest timestamp, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,

    /// Latest timestamp, RFC 3339 or YYYY-MM-DD (a bare date covers the whole day)
    #[arg(long)]
    to: Option<String>,

    #[arg(long)]
    min_cost: Option<f64>,

    #[arg(long)]
    max_cost: Option<f64>,

    /// Minimum input + output tokens
    #[arg(long)]
    min_tokens: Option<u64>,

    /// Maximum input + output tokens
    #[arg(long)]
    max_tokens: Option<u64>,

    /// Case-insensitive text to look for in input or output
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> Result<FilterCriteria> {
        let mut criteria = FilterCriteria::new()
            .with_models(self.models)
            .with_providers(self.providers);

        if self.from.is_some() || self.to.is_some() {
            let start = self
                .from
                .as_deref()
                .map(|s| parse_date_bound(s, false))
                .transpose()?;
            let end = self
                .to
                .as_deref()
                .map(|s| parse_date_bound(s, true))
                .transpose()?;
            criteria = criteria.with_date_range(start, end);
        }
        if self.min_cost.is_some() || self.max_cost.is_some() {
            criteria = criteria.with_cost_range(self.min_cost, self.max_cost);
        }
        if self.min_tokens.is_some() || self.max_tokens.is_some() {
            criteria = criteria.with_token_range(self.min_tokens, self.max_tokens);
        }
        if let Some(search) = self.search {
            criteria = criteria.with_search(search);
        }
        Ok(criteria)
    }
}

/// Parse a date bound. A bare date maps to the start of that day, or to its
/// last millisecond when `end_of_day` is set.
fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' (expected RFC 3339 or YYYY-MM-DD)"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    let time = time.context("invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}

fn main() -> Result<()> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(find_config_path);
    let records_arg = cli.records;

    match cli.command {
        Commands::List {
            filters,
            sort,
            order,
            json,
        } => {
            let (config, records) = load_inputs(&config_path, records_arg)?;
            run_list(&records, &config, filters, sort, order, json)
        }
        Commands::Summary { filters, json } => {
            let (_, records) = load_inputs(&config_path, records_arg)?;
            run_summary(&records, filters, json)
        }
        Commands::Models => {
            let (_, records) = load_inputs(&config_path, records_arg)?;
            run_models(&records);
            Ok(())
        }
        Commands::Init { force } => run_init(&config_path, force),
    }
}

/// Load the config and the record file it (or `--records`) points at.
fn load_inputs(
    config_path: &Path,
    records_arg: Option<PathBuf>,
) -> Result<(Config, Vec<QueryRecord>)> {
    let config = load_config(config_path)?;
    let path = records_arg.unwrap_or_else(|| records_path(&config, config_path));
    let records = load_records(&path)?;
    tracing::info!(
        "Loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok((config, records))
}

/// Load a JSON array of records.
fn load_records(path: &Path) -> Result<Vec<QueryRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records '{}'", path.display()))?;
    let records: Vec<QueryRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse records '{}'", path.display()))?;
    Ok(records)
}

fn run_list(
    records: &[QueryRecord],
    config: &Config,
    filters: FilterArgs,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
    json: bool,
) -> Result<()> {
    let key = sort.unwrap_or(config.sort.key);
    let order = order.unwrap_or(config.sort.order);

    let criteria = filters.into_criteria()?;
    let filtered = apply_filters(records, &criteria);
    let sorted = apply_sorting(&filtered, key, order);

    if json {
        println!("{}", serde_json::to_string_pretty(&sorted)?);
        return Ok(());
    }

    if sorted.is_empty() {
        println!("No records match.");
        return Ok(());
    }

    let width = config.display.max_text_width;
    println!(
        "{:<20} {:<18} {:<8} {:>8} {:>10} {:>10}  INPUT",
        "TIMESTAMP", "MODEL", "PROVIDER", "TOKENS", "COST", "LATENCY"
    );
    for rec in &sorted {
        println!(
            "{:<20} {:<18} {:<8} {:>8} {:>10.4} {:>8.0}ms  {}",
            rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate(&rec.model, 18),
            rec.provider,
            rec.total_tokens(),
            rec.cost,
            rec.response_time,
            truncate(&rec.input, width)
        );
    }
    println!();
    println!(
        "{} of {} records (sorted by {key} {order})",
        sorted.len(),
        records.len()
    );
    Ok(())
}

fn run_summary(records: &[QueryRecord], filters: FilterArgs, json: bool) -> Result<()> {
    let criteria = filters.into_criteria()?;
    let filtered = apply_filters(records, &criteria);
    let summary = compute_analytics(&filtered);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, filtered.len());
    }
    Ok(())
}

fn print_summary(summary: &AnalyticsSummary, count: usize) {
    println!("promptlog summary ({count} records)");
    println!();
    println!("  Total cost:        ${:.4}", summary.total_cost);
    println!("  Avg cost:          ${:.4}", summary.avg_cost);
    println!("  Avg response time: {:.1}ms", summary.avg_response_time);
    println!("  Token efficiency:  {:.3}", summary.token_efficiency);

    if summary.model_stats.is_empty() {
        return;
    }
    println!();
    println!(
        "  {:<24} {:>10} {:>12} {:>12}",
        "MODEL", "AVG COST", "AVG TOKENS", "AVG LATENCY"
    );
    for (model, stats) in &summary.model_stats {
        println!(
            "  {:<24} {:>10.4} {:>12.1} {:>10.1}ms",
            truncate(model, 24),
            stats.avg_cost,
            stats.avg_tokens,
            stats.avg_response_time
        );
    }
}

fn run_models(records: &[QueryRecord]) {
    println!("Models:");
    for model in distinct_models(records) {
        println!("  {model}");
    }
    println!("Providers:");
    for provider in distinct_providers(records) {
        println!("  {provider}");
    }
}

fn run_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        println!("Config already exists: {}", config_path.display());
        println!("To reset, run `promptlog init --force`.");
        return Ok(());
    }
    save_config(config_path, &Config::default())?;
    println!("Created config: {}", config_path.display());
    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with "...".
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let keep = max.saturating_sub(3);
    let mut out: String = single_line.chars().take(keep).collect();
    out.push_str("...");
    out
}
