use anyhow::Result;
use clap::{Parser, Subcommand};
use flex_license::analyzer::{CalculateOptions, LicenseAnalyzer};
use flex_license::config::{get_config, Config};
use flex_license::logging;
use serde_json::json;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "flex-license")]
#[command(about = "Minimum software license calculator for install logs")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to flex-license.toml lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the minimum number of licenses for install logs
    Calculate {
        /// Install log CSV file or glob pattern
        #[arg(short, long)]
        input: String,
        /// License rule file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        rule: Option<PathBuf>,
        /// Only count installs of this application
        #[arg(short, long)]
        application_id: Option<u64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Include the per-user breakdown
        #[arg(long)]
        per_user: bool,
    },
    /// Check that a license rule is usable
    ValidateRule {
        /// License rule file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        rule: Option<PathBuf>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = match &cli.command {
        Commands::Calculate { json, .. } | Commands::ValidateRule { json, .. } => *json,
    };

    if let Err(e) = run(cli) {
        handle_error(e, json);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;
    let _guard = logging::init_logging(&config.logging, &config.paths.log_directory);
    let analyzer = LicenseAnalyzer::new(config);

    match cli.command {
        Commands::Calculate {
            input,
            rule,
            application_id,
            json,
            per_user,
        } => {
            let _span = logging::run_span("calculate").entered();
            analyzer.run_calculate(&CalculateOptions {
                input,
                rule_file: rule,
                application_id,
                json_output: json,
                per_user,
            })
        }
        Commands::ValidateRule { rule, json } => {
            let _span = logging::run_span("validate-rule").entered();
            analyzer.run_validate_rule(rule.as_deref(), json).map(|_| ())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from_file(&path)?;
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
        None => Ok(get_config()?.clone()),
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
