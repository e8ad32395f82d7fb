//! Flex License Library
//!
//! Computes the minimum number of software licenses needed to cover a set of install
//! records, under a rule that caps how many installs one license covers in total and
//! per device category.
//!
//! ## Architecture Overview
//!
//! - [`models`] - Categories, install records, license rules and per-user demand
//! - [`dedup`] - Per-user demand summaries with duplicate installs removed
//! - [`tracker`] - Per-license usage bookkeeping
//! - [`calculator`] - The greedy allocation engine
//! - [`parser`] - CSV install log ingestion
//! - [`analyzer`] - Pipeline used by the command-line tool
//! - [`display`] - Text and JSON reports
//! - [`config`] - Configuration with file and environment variable support
//! - [`logging`] - Structured logging setup
//! - [`error`] - Typed failures for the calculator and for ingestion
//!
//! ## Main Entry Point
//!
//! ```rust
//! use flex_license::{Category, InstallRecord, LicenseCalculator, LicenseRule};
//!
//! # fn example() -> Result<(), flex_license::LicenseError> {
//! let rule = LicenseRule::new(2, [(Category::Desktop, 1), (Category::Laptop, 1)]);
//! let calculator = LicenseCalculator::new(rule)?;
//!
//! let records = [
//!     InstallRecord::new(374, 1, 1, Category::Desktop),
//!     InstallRecord::new(374, 2, 1, Category::Laptop),
//!     InstallRecord::new(374, 2, 1, Category::Laptop),
//! ];
//! assert_eq!(calculator.compute_from_records(&records)?, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod analyzer;
pub mod calculator;
pub mod config;
pub mod dedup;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod tracker;

pub use analyzer::LicenseAnalyzer;
pub use calculator::{compute_minimum_licenses, LicenseCalculator, UserAllocation};
pub use error::{LicenseError, RuleViolation, SourceError};
pub use models::*;
