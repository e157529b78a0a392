//! Vaccination / Air Quality Analytics CLI
//!
//! Runs the analytics engine over JSON exports from the dashboard and
//! prints the derived metrics as JSON on stdout.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use health_analytics::{
    AnalyticsConfig, CountryTable, RegionalOffsetTable, UniformDensity, UnknownCityPolicy,
    aggregate_by_timeframe, calculate_correlation, dashboard_metrics, get_risk_category,
    score_locations, try_vulnerability_score,
};
use health_cli::{load_air_quality, load_densities, load_vaccinations, load_values};
use health_domain::Timeframe;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vax-aqi")]
#[command(about = "Vaccination and air quality analytics")]
struct Args {
    /// Seed for unlisted-city offsets and illustrative jitter
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Pad sparse correlations with illustrative points
    #[arg(long, global = true)]
    illustrative: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a single location
    Score {
        /// People vaccinated per hundred
        vaccination_rate: f64,
        /// AQI on the 0-500 scale
        aqi_level: f64,
        /// People per unit area
        population_density: f64,
    },

    /// Rank every city in the air quality data by vulnerability
    Vulnerability {
        #[arg(long)]
        vaccinations: PathBuf,
        #[arg(long)]
        air_quality: PathBuf,
        /// JSON object mapping city name to population density
        #[arg(long)]
        densities: Option<PathBuf>,
        /// Density for cities missing from --densities
        #[arg(long)]
        default_density: Option<f64>,
    },

    /// Correlate vaccination rate with AQI across cities
    Correlate {
        #[arg(long)]
        vaccinations: PathBuf,
        #[arg(long)]
        air_quality: PathBuf,
    },

    /// Bucket records by day, week or month
    Aggregate {
        #[arg(long)]
        input: PathBuf,
        /// daily, weekly or monthly
        #[arg(long, default_value = "daily")]
        timeframe: Timeframe,
        /// Date location, dotted for nested fields (e.g. date.utc)
        #[arg(long, default_value = "date")]
        date_field: String,
    },

    /// Headline dashboard metrics
    Metrics {
        #[arg(long)]
        vaccinations: PathBuf,
        #[arg(long)]
        air_quality: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("health_analytics=info".parse()?)
                .add_directive("health_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = AnalyticsConfig::from_env();
    if let Some(seed) = args.seed {
        config = config.with_unknown_city_policy(UnknownCityPolicy::Seeded(seed));
    }
    if args.illustrative {
        config = config.with_illustrative_fallback(true);
    }
    info!(
        policy = %config.unknown_city_policy,
        illustrative = config.synthesize_when_sparse,
        "Analytics configured"
    );

    match args.command {
        Command::Score {
            vaccination_rate,
            aqi_level,
            population_density,
        } => {
            let index = try_vulnerability_score(vaccination_rate, aqi_level, population_density)?;
            print_json(&json!({
                "vulnerabilityIndex": index,
                "riskCategory": get_risk_category(index),
            }))
        }

        Command::Vulnerability {
            vaccinations,
            air_quality,
            densities,
            default_density,
        } => {
            if let Some(density) = default_density {
                config.default_population_density = density;
            }
            let vaccinations = load_vaccinations(&vaccinations)?;
            let air_quality = load_air_quality(&air_quality)?;
            let countries = CountryTable::default();
            let scores = match densities {
                Some(path) => {
                    let table = load_densities(&path)?;
                    score_locations(&vaccinations, &air_quality, &table, &countries, &config)
                }
                None => score_locations(
                    &vaccinations,
                    &air_quality,
                    &UniformDensity(config.default_population_density),
                    &countries,
                    &config,
                ),
            };
            print_json(&scores)
        }

        Command::Correlate {
            vaccinations,
            air_quality,
        } => {
            let vaccinations = load_vaccinations(&vaccinations)?;
            let air_quality = load_air_quality(&air_quality)?;
            let outcome = calculate_correlation(
                &vaccinations,
                &air_quality,
                &RegionalOffsetTable::default(),
                &config,
            );
            print_json(&outcome)
        }

        Command::Aggregate {
            input,
            timeframe,
            date_field,
        } => {
            let records = load_values(&input)?;
            let buckets = aggregate_by_timeframe(&records, timeframe, &date_field)?;
            print_json(&buckets)
        }

        Command::Metrics {
            vaccinations,
            air_quality,
        } => {
            let vaccinations = load_vaccinations(&vaccinations)?;
            let air_quality = load_air_quality(&air_quality)?;
            let metrics = dashboard_metrics(&vaccinations, &air_quality, &config, Utc::now());
            print_json(&metrics)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
