use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};

use rental_valuation::config::AppConfig;
use rental_valuation::constants::{DEFAULT_CONFIG_PATH, LOG_DIR};
use rental_valuation::pipeline::ValuationPipeline;
use rental_valuation::{logging, observability};

#[derive(Parser)]
#[command(name = "rental_valuation")]
#[command(about = "Normalize rental listing exports and estimate property values")]
#[command(version)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(LOG_DIR);

    if let Err(e) = observability::init() {
        error!("Failed to initialize metrics: {}", e);
    }

    let config = AppConfig::load(&cli.config)?;
    info!(job = %config.pipeline.job_name, "Loaded configuration");

    let summary = match ValuationPipeline::new(config).run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Pipeline failed: {:#}", e);
            return Err(e);
        }
    };

    println!("\n📊 Job {} ({})", summary.job_name, summary.run_id);
    println!("   Files: {}", summary.files.len());
    println!("   Lines read: {}", summary.outcome.read);
    println!("   Parse failures: {}", summary.outcome.parse_failures);
    println!("   Filtered (no price): {}", summary.outcome.filtered);
    println!("   Written: {}", summary.outcome.written);

    if let Some(snapshot) = observability::render() {
        debug!("Metrics snapshot:\n{}", snapshot);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_the_only_option() {
        let cli = Cli::try_parse_from(["rental_valuation"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));

        let cli = Cli::try_parse_from(["rental_valuation", "--config", "jobs/cairo.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("jobs/cairo.toml"));

        assert!(Cli::try_parse_from(["rental_valuation", "--log-dir", "x"]).is_err());
        assert!(Cli::try_parse_from(["rental_valuation", "normalize", "A1,Room,100"]).is_err());
    }
}
