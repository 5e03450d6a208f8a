mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use yonca_core::{FarmType, Region};

#[derive(Parser)]
#[command(name = "yonca")]
#[command(version, about = "Rule-based farm advisory engine", long_about = None)]
struct Cli {
    /// Data directory holding rules/, constants/ and profiles/
    #[arg(long, global = true, env = "YONCA_DATA_PATH", default_value = "data")]
    data_dir: PathBuf,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a recommendation request (JSON or YAML)
    Evaluate {
        /// Path to the request file
        request: PathBuf,

        /// Evaluate as of this instant (RFC 3339, or YYYY-MM-DDTHH:MM local)
        #[arg(long)]
        at: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Evaluate from a handful of readings
    Quick {
        #[arg(value_parser = parse_farm_type)]
        farm_type: FarmType,

        #[arg(value_parser = parse_region)]
        region: Region,

        /// Air temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        temperature: f64,

        /// Relative humidity (%)
        #[arg(long)]
        humidity: f64,

        #[arg(long, requires = "stage")]
        crop_type: Option<String>,

        #[arg(long, requires = "crop_type")]
        stage: Option<String>,

        #[arg(long, default_value_t = 0)]
        days_since_irrigation: u32,

        /// Soil moisture (%)
        #[arg(long, default_value_t = 50.0)]
        soil_moisture: f64,

        #[arg(long)]
        at: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Inspect the rule catalog
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Lint every rule document against the rule schema
    Validate,
    /// Fetch current weather for an IP (or this machine)
    Weather {
        /// IP address to geolocate
        #[arg(long)]
        ip: Option<String>,

        /// Runtime configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also evaluate a minimal request for this farm type
        #[arg(long, value_parser = parse_farm_type)]
        farm_type: Option<FarmType>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List supported farm types
    Farms,
    /// Show a farm type's profile
    Profile {
        #[arg(value_parser = parse_farm_type)]
        farm_type: FarmType,

        /// Print only the synthetic scenarios
        #[arg(long)]
        scenarios: bool,
    },
    /// Print reference constants (stages, regions, thresholds)
    Constants {
        table: Option<String>,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List rules, optionally for one farm type
    List {
        #[arg(long, value_parser = parse_farm_type)]
        farm_type: Option<FarmType>,
    },
    /// Case-insensitive keyword search over ids, names and messages
    Search { query: String },
    /// Rule counts per farm type and category
    Stats,
    /// Print one rule
    Show { rule_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml,
}

fn parse_farm_type(value: &str) -> Result<FarmType, String> {
    FarmType::parse(value).ok_or_else(|| {
        let known: Vec<_> = FarmType::ALL.iter().map(|f| f.as_str()).collect();
        format!("unknown farm type '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn parse_region(value: &str) -> Result<Region, String> {
    Region::parse(value).ok_or_else(|| {
        let known: Vec<_> = Region::ALL.iter().map(|r| r.as_str()).collect();
        format!("unknown region '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = cli.data_dir;
    match cli.command {
        Commands::Evaluate { request, at, format } => {
            commands::evaluate(&data_dir, &request, at.as_deref(), format)
        }
        Commands::Quick {
            farm_type,
            region,
            temperature,
            humidity,
            crop_type,
            stage,
            days_since_irrigation,
            soil_moisture,
            at,
            format,
        } => {
            let input = commands::QuickInput {
                farm_type,
                region,
                temperature,
                humidity,
                crop: crop_type.zip(stage),
                days_since_irrigation,
                soil_moisture,
            };
            commands::quick(&data_dir, &input, at.as_deref(), format)
        }
        Commands::Rules { command } => match command {
            RulesCommand::List { farm_type } => commands::rules_list(&data_dir, farm_type),
            RulesCommand::Search { query } => commands::rules_search(&data_dir, &query),
            RulesCommand::Stats => commands::rules_stats(&data_dir),
            RulesCommand::Show { rule_id } => commands::rules_show(&data_dir, &rule_id),
        },
        Commands::Validate => commands::validate(&data_dir),
        Commands::Weather {
            ip,
            config,
            farm_type,
            format,
        } => commands::weather(&data_dir, ip.as_deref(), config.as_deref(), farm_type, format).await,
        Commands::Farms => commands::farms(&data_dir),
        Commands::Profile {
            farm_type,
            scenarios,
        } => commands::profile(&data_dir, farm_type, scenarios),
        Commands::Constants { table } => commands::constants(&data_dir, table.as_deref()),
    }
}
