//! License Analysis Pipeline
//!
//! [`LicenseAnalyzer`] ties the pieces together for the command-line surface:
//!
//! 1. **Rule**: resolved from `--rule`, `paths.rule_file` or the config `[rule]` section
//! 2. **Ingestion**: install logs read from a path or glob pattern
//! 3. **Summarization**: records grouped per user with duplicates removed
//! 4. **Allocation**: the [`LicenseCalculator`] counts licenses per user
//! 5. **Reporting**: the result is rendered as text or JSON
//!
//! Typed failures ([`crate::error::LicenseError`], [`crate::error::SourceError`]) pass
//! through as the root cause of the returned `anyhow::Error`.

use crate::calculator::LicenseCalculator;
use crate::config::Config;
use crate::dedup::summarize_with_stats;
use crate::display::{LicenseReport, ReportDisplayManager};
use crate::models::LicenseRule;
use crate::parser::{IngestionOutcome, InstallLogReader};
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct CalculateOptions {
    /// File path or glob pattern of install logs
    pub input: String,
    pub rule_file: Option<PathBuf>,
    /// Overrides `ingestion.application_id`
    pub application_id: Option<u64>,
    pub json_output: bool,
    pub per_user: bool,
}

pub struct LicenseAnalyzer {
    config: Config,
    display_manager: ReportDisplayManager,
}

impl Default for LicenseAnalyzer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl LicenseAnalyzer {
    pub fn new(config: Config) -> Self {
        let display_manager = ReportDisplayManager::new(config.output.json_pretty, config.output.color);
        Self {
            config,
            display_manager,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn build_report(&self, options: &CalculateOptions) -> Result<LicenseReport> {
        let rule = self.config.resolve_rule(options.rule_file.as_deref())?;
        let calculator = LicenseCalculator::new(rule)
            .context("License rule rejected")?
            .with_parallel(self.config.calculation.parallel);

        let application_id = options.application_id.or(self.config.ingestion.application_id);
        let reader = InstallLogReader::new(&self.config.ingestion).with_application(application_id);
        let outcome = read_input(&reader, &options.input)
            .with_context(|| format!("Failed to ingest install logs from {}", options.input))?;

        let (summaries, stats) = summarize_with_stats(&outcome.records);
        let allocations = calculator
            .allocate(&summaries)
            .context("License calculation failed")?;

        let total_licenses: u64 = allocations.iter().map(|a| a.licenses).sum();
        let total_installs: u64 = summaries.iter().map(|s| s.total_installs()).sum();

        info!(
            files = outcome.files.len(),
            users = summaries.len(),
            installs = total_installs,
            duplicates_removed = stats.duplicates_removed,
            licenses = total_licenses,
            parallel = calculator.is_parallel(),
            "License calculation complete"
        );

        Ok(LicenseReport {
            generated_at: Utc::now(),
            application_id,
            rule: calculator.rule().clone(),
            total_users: summaries.len(),
            users: if options.per_user { allocations } else { Vec::new() },
            total_installs,
            duplicates_removed: stats.duplicates_removed,
            rows_filtered: outcome.rows_filtered,
            total_licenses,
        })
    }

    pub fn run_calculate(&self, options: &CalculateOptions) -> Result<()> {
        let report = self.build_report(options)?;
        self.display_manager.display(&report, options.json_output)
    }

    /// Checks a rule and prints the verdict; an invalid rule is an error.
    pub fn run_validate_rule(&self, rule_file: Option<&Path>, json_output: bool) -> Result<LicenseRule> {
        let rule = self.config.resolve_rule(rule_file)?;

        match rule.validate() {
            Ok(()) => {
                if json_output {
                    println!("{}", json!({ "valid": true, "rule": &rule }));
                } else {
                    println!("Rule is valid: {} installs per license", rule.total_max_install);
                }
                Ok(rule)
            }
            Err(violation) => Err(anyhow::Error::new(violation).context("License rule is invalid")),
        }
    }
}

fn read_input(reader: &InstallLogReader, input: &str) -> Result<IngestionOutcome> {
    let is_pattern = input.contains(|c: char| matches!(c, '*' | '?' | '['));
    let outcome = if is_pattern {
        reader.read_pattern(input)?
    } else {
        reader.read_file(Path::new(input))?
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LicenseError, SourceError};
    use crate::models::Category;
    use std::fs;
    use tempfile::TempDir;

    fn analyzer_with_default_rule() -> LicenseAnalyzer {
        let mut config = Config::default();
        config.rule = Some(LicenseRule::new(2, [(Category::Desktop, 1), (Category::Laptop, 1)]));
        LicenseAnalyzer::new(config)
    }

    fn write_log(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_report_from_log() {
        let dir = TempDir::new().unwrap();
        let input = write_log(
            &dir,
            "installs.csv",
            "ComputerID,UserID,ApplicationID,ComputerType\n1,1,374,DESKTOP\n2,1,374,LAPTOP\n2,1,374,LAPTOP\n3,2,374,desktop\n",
        );

        let report = analyzer_with_default_rule()
            .build_report(&CalculateOptions {
                input,
                per_user: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.total_users, 2);
        assert_eq!(report.total_installs, 3);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.total_licenses, 2);
        assert_eq!(report.users.len(), 2);
    }

    #[test]
    fn test_missing_log_is_source_unavailable() {
        let err = analyzer_with_default_rule()
            .build_report(&CalculateOptions {
                input: "/nonexistent/installs.csv".to_string(),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_infeasible_demand_surfaces_typed_error() {
        let dir = TempDir::new().unwrap();
        let input = write_log(&dir, "installs.csv", "a,b,c,d\n1,7,374,Mobile\n");

        let err = analyzer_with_default_rule()
            .build_report(&CalculateOptions {
                input,
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<LicenseError>(),
            Some(&LicenseError::InfeasibleDemand {
                user_id: 7,
                category: Category::Mobile,
            })
        );
    }

    #[test]
    fn test_glob_input_reads_every_file() {
        let dir = TempDir::new().unwrap();
        write_log(&dir, "a.csv", "a,b,c,d\n1,1,374,Desktop\n");
        write_log(&dir, "b.csv", "a,b,c,d\n1,1,374,Desktop\n2,1,374,Desktop\n");
        let pattern = dir.path().join("*.csv").to_string_lossy().into_owned();

        let report = analyzer_with_default_rule()
            .build_report(&CalculateOptions {
                input: pattern,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.total_licenses, 2);
    }
}
